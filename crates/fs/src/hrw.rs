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

use ostore_utils::hash::hrw_weight;

use crate::registry::Mountpaths;

impl Mountpaths {
    /// The available mountpath owning `name` on this target, by the same
    /// rendezvous weighting the cluster uses to pick the target itself.
    /// `None` when no mountpath is in service.
    ///
    /// Each call ranges over one immutable snapshot, so a batch of
    /// placements taken from a single `get()` is coherent even while the
    /// registry mutates.
    pub fn hrw_mountpath(&self, name: &str) -> Option<&str> {
        let mut best: Option<(&str, u32)> = None;
        for path in self.available().keys() {
            let weight = hrw_weight(path, name);
            let wins = match best {
                None => true,
                Some((bp, bw)) => weight > bw || (weight == bw && path.as_str() > bp),
            };
            if wins {
                best = Some((path, weight));
            }
        }
        best.map(|(path, _)| path)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::registry::{FsRegistry, NopHook};

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

    async fn registry_with(paths: &[String]) -> FsRegistry {
        let reg = FsRegistry::new(false);
        for p in paths {
            reg.add(p, &NopHook).await.unwrap();
        }
        reg
    }

    #[tokio::test]
    async fn picks_a_member_and_only_from_available() {
        let dir = tempfile::tempdir().unwrap();
        let paths = mkdirs(dir.path(), &["m1", "m2", "m3"]);
        let reg = registry_with(&paths).await;

        let snap = reg.get();
        for name in ["obj", "bucket/obj", "x/y/z"] {
            let picked = snap.hrw_mountpath(name).unwrap();
            assert!(snap.available().contains_key(picked));
        }

        reg.disable(&paths[0], &NopHook).await.unwrap();
        reg.disable(&paths[1], &NopHook).await.unwrap();
        let snap = reg.get();
        for name in ["obj", "bucket/obj", "x/y/z"] {
            assert_eq!(snap.hrw_mountpath(name).unwrap(), paths[2]);
        }
    }

    #[tokio::test]
    async fn empty_registry_places_nothing() {
        let reg = FsRegistry::new(false);
        assert!(reg.get().hrw_mountpath("obj").is_none());
    }

    #[tokio::test]
    async fn pick_ignores_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths = mkdirs(dir.path(), &["m1", "m2", "m3", "m4"]);
        let forward = registry_with(&paths).await;
        let mut reversed = paths.clone();
        reversed.reverse();
        let backward = registry_with(&reversed).await;

        let (fsnap, bsnap) = (forward.get(), backward.get());
        for i in 0..200 {
            let name = format!("obj-{i}");
            assert_eq!(fsnap.hrw_mountpath(&name), bsnap.hrw_mountpath(&name));
        }
    }

    #[tokio::test]
    async fn an_old_snapshot_keeps_placing_consistently() {
        let dir = tempfile::tempdir().unwrap();
        let paths = mkdirs(dir.path(), &["m1", "m2"]);
        let reg = registry_with(&paths).await;

        let snap = reg.get();
        let before: Vec<_> = (0..50).map(|i| snap.hrw_mountpath(&format!("o{i}")).map(str::to_owned)).collect();
        reg.remove(&paths[0], &NopHook).await.unwrap();
        let after: Vec<_> = (0..50).map(|i| snap.hrw_mountpath(&format!("o{i}")).map(str::to_owned)).collect();
        assert_eq!(before, after);
    }
}
