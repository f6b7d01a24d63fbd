// Copyright 2025 OStore Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use ostore_fs::Mountpaths;
use ostore_utils::io::write_file_atomic;

use crate::collab::BmdOwner;

/// Identical bucket-metadata copy kept on every available mountpath.
pub const BMD_FILE: &str = "bmd.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketProps {
    pub mirror_copies: u16,
    pub versioning: bool,
}

/// The bucket catalogue, versioned per change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bmd {
    pub version: u64,
    pub buckets: BTreeMap<String, BucketProps>,
}

impl Bmd {
    pub fn set_bucket(&mut self, name: impl Into<String>, props: BucketProps) {
        self.buckets.insert(name.into(), props);
        self.version += 1;
    }

    pub fn remove_bucket(&mut self, name: &str) -> Option<BucketProps> {
        let prev = self.buckets.remove(name);
        if prev.is_some() {
            self.version += 1;
        }
        prev
    }
}

/// Production [`BmdOwner`]: the in-memory catalogue plus the mirror factor
/// its on-disk copies must satisfy.
#[derive(Debug)]
pub struct BmdState {
    doc: RwLock<Bmd>,
    copies: usize,
}

impl BmdState {
    pub fn new(copies: usize) -> Self {
        Self {
            doc: RwLock::new(Bmd::default()),
            copies,
        }
    }

    pub async fn set_bucket(&self, name: impl Into<String>, props: BucketProps) {
        self.doc.write().await.set_bucket(name, props);
    }

    pub async fn version(&self) -> u64 {
        self.doc.read().await.version
    }
}

#[async_trait]
impl BmdOwner for BmdState {
    fn has_enough_copies(&self, mpaths: &Mountpaths) -> bool {
        let want = self.copies.min(mpaths.available().len());
        let have = mpaths
            .available()
            .keys()
            .filter(|p| Path::new(p).join(BMD_FILE).is_file())
            .count();
        have >= want
    }

    async fn persist(&self, mpaths: &Mountpaths) -> anyhow::Result<()> {
        let data = serde_json::to_vec_pretty(&*self.doc.read().await)?;
        for path in mpaths.available().keys() {
            write_file_atomic(Path::new(path).join(BMD_FILE), &data).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ostore_fs::{FsRegistry, NopHook};

    use super::*;

    fn mkdirs(root: &Path, names: &[&str]) -> Vec<String> {
        names
            .iter()
            .map(|n| {
                let p = root.join(n);
                std::fs::create_dir(&p).unwrap();
                p.to_string_lossy().into_owned()
            })
            .collect()
    }

    #[tokio::test]
    async fn persist_mirrors_to_every_available_mountpath() {
        let dir = tempfile::tempdir().unwrap();
        let paths = mkdirs(dir.path(), &["m1", "m2", "m3"]);
        let reg = FsRegistry::new(false);
        for p in &paths {
            reg.add(p, &NopHook).await.unwrap();
        }
        reg.disable(&paths[2], &NopHook).await.unwrap();

        let bmd = BmdState::new(2);
        let snap = reg.get();
        assert!(!bmd.has_enough_copies(&snap));

        bmd.set_bucket("images", BucketProps::default()).await;
        bmd.persist(&snap).await.unwrap();

        assert!(Path::new(&paths[0]).join(BMD_FILE).is_file());
        assert!(Path::new(&paths[1]).join(BMD_FILE).is_file());
        // disabled mountpaths get no copy
        assert!(!Path::new(&paths[2]).join(BMD_FILE).exists());
        assert!(bmd.has_enough_copies(&snap));
    }

    #[tokio::test]
    async fn mirror_factor_caps_at_the_available_count() {
        let dir = tempfile::tempdir().unwrap();
        let paths = mkdirs(dir.path(), &["m1"]);
        let reg = FsRegistry::new(false);
        reg.add(&paths[0], &NopHook).await.unwrap();

        let bmd = BmdState::new(3);
        let snap = reg.get();
        assert!(!bmd.has_enough_copies(&snap));
        bmd.persist(&snap).await.unwrap();
        // one mountpath can hold at most one copy
        assert!(bmd.has_enough_copies(&snap));
    }

    #[test]
    fn catalogue_versioning() {
        let mut doc = Bmd::default();
        doc.set_bucket("a", BucketProps::default());
        doc.set_bucket(
            "a",
            BucketProps {
                mirror_copies: 3,
                versioning: true,
            },
        );
        assert_eq!(doc.version, 2);
        assert!(doc.remove_bucket("a").is_some());
        assert!(doc.remove_bucket("a").is_none());
        assert_eq!(doc.version, 3);
    }
}
