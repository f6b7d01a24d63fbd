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

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

use crate::error::{FsError, Result};
use crate::mountpath::{normalize, Mountpath};
use crate::vmd::{Vmd, VmdOwner};

/// An immutable snapshot of the registry: every known mountpath is in
/// exactly one of the two sets.
#[derive(Debug, Clone, Default)]
pub struct Mountpaths {
    pub(crate) available: HashMap<String, Arc<Mountpath>>,
    pub(crate) disabled: HashMap<String, Arc<Mountpath>>,
}

impl Mountpaths {
    pub fn available(&self) -> &HashMap<String, Arc<Mountpath>> {
        &self.available
    }

    pub fn disabled(&self) -> &HashMap<String, Arc<Mountpath>> {
        &self.disabled
    }

    pub fn contains(&self, path: &str) -> bool {
        self.available.contains_key(path) || self.disabled.contains_key(path)
    }

    fn same_fs_in_available(&self, fsid: u64) -> Option<&Arc<Mountpath>> {
        self.available.values().find(|mp| mp.fsid == fsid)
    }
}

/// Invoked on every real transition, inside the registry's writer critical
/// section and before the new snapshot is published, i.e. whatever the
/// hook persists is durable before any reader can observe the change.
#[async_trait]
pub trait MetadataHook: Send + Sync {
    async fn on_change(&self, next: &Mountpaths);
}

/// Hook that does nothing; startup restore and tests.
pub struct NopHook;

#[async_trait]
impl MetadataHook for NopHook {
    async fn on_change(&self, _next: &Mountpaths) {}
}

/// The set of mountpaths known to this target.
///
/// Writers serialize on a single mutex across all four mutators; readers
/// clone the current `Arc<Mountpaths>` and never block. A no-op transition
/// (enable of an enabled path, disable of a disabled one) returns
/// `Ok(None)` and does not run the hook.
#[derive(Debug)]
pub struct FsRegistry {
    wlock: Mutex<()>,
    state: watch::Sender<Arc<Mountpaths>>,
    fsid_check: bool,
}

/// Registry recovered from disk at target startup.
pub struct LoadedRegistry {
    pub registry: FsRegistry,
    pub vmd: VmdOwner,
    /// The volume metadata does not match the last-clean-shutdown marker:
    /// a mountpath transition's follow-up work may have been lost, rerun
    /// resilver unconditionally.
    pub needs_resilver: bool,
}

impl FsRegistry {
    /// An empty registry. `fsid_check` refuses two available mountpaths on
    /// one filesystem; shared-filesystem rigs turn it off.
    pub fn new(fsid_check: bool) -> Self {
        let (state, _) = watch::channel(Arc::new(Mountpaths::default()));
        Self {
            wlock: Mutex::new(()),
            state,
            fsid_check,
        }
    }

    /// Rebuild the registry from persisted volume metadata. Mountpaths that
    /// no longer stat are dropped with a warning; the next transition will
    /// rewrite the record without them.
    pub fn from_vmd(vmd: &Vmd, fsid_check: bool) -> Self {
        let mut mpaths = Mountpaths::default();
        for entry in &vmd.mountpaths {
            let mp = match Mountpath::new(&entry.path) {
                Ok(mp) => Arc::new(mp),
                Err(err) => {
                    warn!("dropping mountpath {}: {err}", entry.path);
                    continue;
                }
            };
            if entry.enabled {
                mpaths.available.insert(mp.path.clone(), mp);
            } else {
                mpaths.disabled.insert(mp.path.clone(), mp);
            }
        }
        let (state, _) = watch::channel(Arc::new(mpaths));
        Self {
            wlock: Mutex::new(()),
            state,
            fsid_check,
        }
    }

    /// Recover the registry and its VMD owner from `dir`.
    pub async fn load(dir: impl AsRef<Path>, target_id: &str, fsid_check: bool) -> Result<LoadedRegistry> {
        let (vmd, doc, needs_resilver) = VmdOwner::load(dir, target_id).await?;
        let registry = match &doc {
            Some(doc) => Self::from_vmd(doc, fsid_check),
            None => Self::new(fsid_check),
        };
        Ok(LoadedRegistry {
            registry,
            vmd,
            needs_resilver,
        })
    }

    /// Current snapshot; never blocks on writers.
    pub fn get(&self) -> Arc<Mountpaths> {
        self.state.borrow().clone()
    }

    fn publish(&self, next: Mountpaths) {
        self.state.send_replace(Arc::new(next));
    }

    /// Add `mpath` as an available mountpath.
    pub async fn add(&self, mpath: &str, hook: &dyn MetadataHook) -> Result<Option<Arc<Mountpath>>> {
        let mp = Mountpath::new(mpath)?;
        let _guard = self.wlock.lock().await;
        let cur = self.get();
        if cur.contains(&mp.path) {
            return Err(FsError::AlreadyExists(mp.path));
        }
        if self.fsid_check {
            if let Some(other) = cur.same_fs_in_available(mp.fsid) {
                return Err(FsError::DuplicateFsid {
                    mpath: mp.path,
                    fsid: mp.fsid,
                    used_by: other.path.clone(),
                });
            }
        }

        let mp = Arc::new(mp);
        let mut next = (*cur).clone();
        next.available.insert(mp.path.clone(), mp.clone());
        hook.on_change(&next).await;
        self.publish(next);
        debug!("added mountpath {mp}");
        Ok(Some(mp))
    }

    /// Remove `mpath` from whichever set holds it. Removing the last
    /// available mountpath is permitted; the lifecycle layer reacts.
    pub async fn remove(&self, mpath: &str, hook: &dyn MetadataHook) -> Result<Option<Arc<Mountpath>>> {
        let path = normalize(mpath)?;
        let _guard = self.wlock.lock().await;
        let cur = self.get();

        let mut next = (*cur).clone();
        let Some(mp) = next.available.remove(&path).or_else(|| next.disabled.remove(&path)) else {
            return Err(FsError::NotFound(path));
        };
        hook.on_change(&next).await;
        self.publish(next);
        debug!("removed mountpath {mp}");
        Ok(Some(mp))
    }

    /// Move `mpath` from `disabled` to `available`. `Ok(None)` when it
    /// already is available.
    pub async fn enable(&self, mpath: &str, hook: &dyn MetadataHook) -> Result<Option<Arc<Mountpath>>> {
        let path = normalize(mpath)?;
        let _guard = self.wlock.lock().await;
        let cur = self.get();
        if cur.available.contains_key(&path) {
            return Ok(None);
        }

        let mut next = (*cur).clone();
        let Some(mp) = next.disabled.remove(&path) else {
            return Err(FsError::NotFound(path));
        };
        if self.fsid_check {
            if let Some(other) = next.same_fs_in_available(mp.fsid) {
                let used_by = other.path.clone();
                return Err(FsError::DuplicateFsid {
                    mpath: path,
                    fsid: mp.fsid,
                    used_by,
                });
            }
        }
        next.available.insert(path, mp.clone());
        hook.on_change(&next).await;
        self.publish(next);
        debug!("enabled mountpath {mp}");
        Ok(Some(mp))
    }

    /// Move `mpath` from `available` to `disabled`. `Ok(None)` when it
    /// already is disabled.
    pub async fn disable(&self, mpath: &str, hook: &dyn MetadataHook) -> Result<Option<Arc<Mountpath>>> {
        let path = normalize(mpath)?;
        let _guard = self.wlock.lock().await;
        let cur = self.get();
        if cur.disabled.contains_key(&path) {
            return Ok(None);
        }

        let mut next = (*cur).clone();
        let Some(mp) = next.available.remove(&path) else {
            return Err(FsError::NotFound(path));
        };
        next.disabled.insert(path, mp.clone());
        hook.on_change(&next).await;
        self.publish(next);
        debug!("disabled mountpath {mp}");
        Ok(Some(mp))
    }
}
