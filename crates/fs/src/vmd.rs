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

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::fs;

use ostore_utils::io::write_file_atomic;

use crate::error::{FsError, Result};
use crate::registry::Mountpaths;

/// One volume-metadata file per target. Overwritten whole, by rename.
pub const VMD_FILE: &str = "vmd.json";

/// Clean-shutdown marker: holds the generation the VMD had when the target
/// last went down in an orderly fashion.
pub const VMD_CLEAN_FILE: &str = "vmd.clean";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmdMountpath {
    pub path: String,
    pub fsid: u64,
    pub enabled: bool,
}

/// The durable record of a mountpath transition. Readers rebuild the
/// registry from this document at startup.
///
/// ```json
/// {
///   "target_id": "pDztYhhb",
///   "generation": 7,
///   "mountpaths": [
///     { "path": "/ostore/mp1", "fsid": 64768, "enabled": true }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vmd {
    pub target_id: String,
    pub generation: u64,
    pub mountpaths: Vec<VmdMountpath>,
}

impl TryFrom<&[u8]> for Vmd {
    type Error = serde_json::Error;

    fn try_from(data: &[u8]) -> core::result::Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

impl Vmd {
    /// Flatten a registry snapshot, sorted by path so the file is stable
    /// for a given state.
    pub fn from_snapshot(target_id: &str, generation: u64, mpaths: &Mountpaths) -> Self {
        let mut mountpaths: Vec<VmdMountpath> = mpaths
            .available()
            .values()
            .map(|mp| VmdMountpath {
                path: mp.path.clone(),
                fsid: mp.fsid,
                enabled: true,
            })
            .chain(mpaths.disabled().values().map(|mp| VmdMountpath {
                path: mp.path.clone(),
                fsid: mp.fsid,
                enabled: false,
            }))
            .collect();
        mountpaths.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            target_id: target_id.to_string(),
            generation,
            mountpaths,
        }
    }

    pub async fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read(dir.as_ref().join(VMD_FILE)).await?;
        Ok(Self::try_from(data.as_slice())?)
    }

    pub async fn persist(&self, dir: impl AsRef<Path>) -> Result<()> {
        let data = serde_json::to_vec_pretty(self)?;
        write_file_atomic(dir.as_ref().join(VMD_FILE), &data).await?;
        Ok(())
    }
}

/// Owns the on-disk VMD of one target: its directory, the target identity
/// stamped into every write, and the running generation counter.
///
/// `create_new` callers are serialized by the registry's writer lock.
#[derive(Debug)]
pub struct VmdOwner {
    dir: PathBuf,
    target_id: String,
    generation: AtomicU64,
}

impl VmdOwner {
    pub fn new(dir: impl Into<PathBuf>, target_id: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            target_id: target_id.into(),
            generation: AtomicU64::new(0),
        }
    }

    /// Read the VMD from `dir`, if any, and compare its generation against
    /// the clean-shutdown marker. Returns `(owner, document,
    /// needs_resilver)`; `needs_resilver` is set when a previous run's
    /// post-transition work cannot be proven to have completed.
    pub async fn load(dir: impl AsRef<Path>, target_id: &str) -> Result<(Self, Option<Vmd>, bool)> {
        let dir = dir.as_ref();
        let owner = Self::new(dir, target_id);

        let doc = match Vmd::load(dir).await {
            Ok(doc) => doc,
            Err(FsError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok((owner, None, false));
            }
            Err(err) => return Err(err),
        };
        if doc.target_id != target_id {
            return Err(FsError::VmdMismatch {
                expected: target_id.to_string(),
                found: doc.target_id,
            });
        }
        owner.generation.store(doc.generation, Ordering::SeqCst);

        let clean_generation = match fs::read_to_string(dir.join(VMD_CLEAN_FILE)).await {
            Ok(s) => s.trim().parse::<u64>().ok(),
            Err(_) => None,
        };
        let needs_resilver = clean_generation != Some(doc.generation);
        Ok((owner, Some(doc), needs_resilver))
    }

    /// Snapshot `mpaths` into a new VMD generation and persist it.
    pub async fn create_new(&self, mpaths: &Mountpaths) -> Result<Vmd> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let vmd = Vmd::from_snapshot(&self.target_id, generation, mpaths);
        vmd.persist(&self.dir).await?;
        Ok(vmd)
    }

    /// Record that the target is going down with all post-transition work
    /// done; the next startup skips the recovery resilver.
    pub async fn mark_clean_shutdown(&self) -> Result<()> {
        let generation = self.generation.load(Ordering::SeqCst);
        write_file_atomic(self.dir.join(VMD_CLEAN_FILE), generation.to_string().as_bytes()).await?;
        Ok(())
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }
}
