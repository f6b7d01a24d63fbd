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

use std::path::Path;

use dashmap::DashMap;
use path_absolutize::Absolutize;
use tracing::info;

use crate::error::{FsError, Result};

/// A local device the target stores objects under. The `path` is canonical
/// and absolute and is the registry key; `fsid` identifies the backing
/// filesystem so two mountpaths cannot silently share one device.
#[derive(Debug)]
pub struct Mountpath {
    pub path: String,
    pub fsid: u64,
    lom: LomCache,
}

impl Mountpath {
    /// Canonicalize `mpath`, verify it is an existing directory, and stat
    /// its filesystem identity.
    pub fn new(mpath: &str) -> Result<Self> {
        let path = normalize(mpath)?;
        let meta = std::fs::metadata(&path).map_err(|_| FsError::NotFound(path.clone()))?;
        if !meta.is_dir() {
            return Err(FsError::NotDirectory(path));
        }
        let fsid = ostore_utils::os::fs_id(&path)?;
        Ok(Self {
            path,
            fsid,
            lom: LomCache::default(),
        })
    }

    pub fn lom_cache(&self) -> &LomCache {
        &self.lom
    }

    /// Drop every cached object-metadata entry for this mountpath.
    /// Idempotent; called when the mountpath leaves service.
    pub fn evict_lom_cache(&self) {
        let dropped = self.lom.evict();
        info!("evicted {dropped} lom entries from {}", self.path);
    }
}

impl std::fmt::Display for Mountpath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path)
    }
}

/// Absolute path with redundant separators and trailing slashes removed.
pub(crate) fn normalize(mpath: &str) -> Result<String> {
    if mpath.is_empty() {
        return Err(FsError::NotFound(mpath.to_string()));
    }
    let abs = Path::new(mpath).absolutize()?;
    let mut s = abs.to_string_lossy().into_owned();
    while s.len() > 1 && s.ends_with('/') {
        s.pop();
    }
    Ok(s)
}

/// Cached object metadata (LOM), bound to its mountpath.
#[derive(Debug, Default)]
pub struct LomCache {
    entries: DashMap<String, LomEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LomEntry {
    pub size: u64,
    pub atime_ns: i64,
    pub copies: u16,
}

impl LomCache {
    pub fn insert(&self, name: impl Into<String>, entry: LomEntry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn get(&self, name: &str) -> Option<LomEntry> {
        self.entries.get(name).map(|e| e.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear the cache, returning how many entries were dropped.
    pub fn evict(&self) -> usize {
        let dropped = self.entries.len();
        self.entries.clear();
        dropped
    }
}
