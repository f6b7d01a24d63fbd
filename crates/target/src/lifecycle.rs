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

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use ostore_fs::{FsRegistry, MetadataHook, Mountpath, Mountpaths, Result, VmdOwner};
use ostore_utils::sys::exit_log;

use crate::collab::{BmdOwner, TargetSelf, Xactions};
use crate::config::Config;
use crate::gfn::{GfnGate, GfnScope};

const ACT_ADDED: &str = "Added";
const ACT_ENABLED: &str = "Enabled";
const ACT_REMOVED: &str = "Removed";
const ACT_DISABLED: &str = "Disabled";

/// Orchestrates mountpath transitions on a live target.
///
/// Every operation runs the same protocol: assert the failover gate, apply
/// the registry mutation with the metadata-redistribution hook, bail out on
/// a no-op or error (gate released), otherwise abort mountpath-bound jobs
/// and fan out the follow-up work. The gate stays asserted until the
/// asynchronous follow-ups have run.
pub struct FsPathGroup {
    target_id: String,
    fs: Arc<FsRegistry>,
    vmd: Arc<VmdOwner>,
    gfn: Arc<GfnGate>,
    config: Arc<Config>,
    xact: Arc<dyn Xactions>,
    bmd: Arc<dyn BmdOwner>,
    tself: Arc<dyn TargetSelf>,
}

/// Runs inside the registry's writer critical section: restore the
/// bucket-metadata mirror factor if needed, then stamp a new volume
/// metadata generation. Either write failing leaves the disk inconsistent
/// with what peers are about to observe, so both are fatal.
struct RedistributeMd<'a>(&'a FsPathGroup);

#[async_trait]
impl MetadataHook for RedistributeMd<'_> {
    async fn on_change(&self, next: &Mountpaths) {
        if !self.0.bmd.has_enough_copies(next) {
            if let Err(err) = self.0.bmd.persist(next).await {
                exit_log(&format!("failed to persist bucket metadata: {err}"));
            }
        }
        if let Err(err) = self.0.vmd.create_new(next).await {
            exit_log(&format!("failed to persist volume metadata: {err}"));
        }
    }
}

impl FsPathGroup {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        target_id: impl Into<String>,
        fs: Arc<FsRegistry>,
        vmd: Arc<VmdOwner>,
        gfn: Arc<GfnGate>,
        config: Arc<Config>,
        xact: Arc<dyn Xactions>,
        bmd: Arc<dyn BmdOwner>,
        tself: Arc<dyn TargetSelf>,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            fs,
            vmd,
            gfn,
            config,
            xact,
            bmd,
            tself,
        }
    }

    /// Attach a new device. `Ok(true)` when the mountpath was added.
    pub async fn add_mountpath(&self, mpath: &str) -> Result<bool> {
        let scope = self.gfn.clone().activate();
        let Some(mp) = self.fs.add(mpath, &RedistributeMd(self)).await? else {
            return Ok(false);
        };
        self.add_mpath_event(ACT_ADDED, &mp, scope).await;
        Ok(true)
    }

    /// Bring a disabled mountpath back into service. `Ok(false)` when it
    /// already was enabled.
    pub async fn enable_mountpath(&self, mpath: &str) -> Result<bool> {
        let scope = self.gfn.clone().activate();
        let Some(mp) = self.fs.enable(mpath, &RedistributeMd(self)).await? else {
            return Ok(false);
        };
        self.add_mpath_event(ACT_ENABLED, &mp, scope).await;
        Ok(true)
    }

    /// Take a mountpath out of service, keeping it known. `Ok(false)` when
    /// it already was disabled.
    pub async fn disable_mountpath(&self, mpath: &str) -> Result<bool> {
        let scope = self.gfn.clone().activate();
        let Some(mp) = self.fs.disable(mpath, &RedistributeMd(self)).await? else {
            return Ok(false);
        };
        self.del_mpath_event(ACT_DISABLED, mp, scope).await;
        Ok(true)
    }

    /// Detach a device for good.
    pub async fn remove_mountpath(&self, mpath: &str) -> Result<bool> {
        let scope = self.gfn.clone().activate();
        let Some(mp) = self.fs.remove(mpath, &RedistributeMd(self)).await? else {
            return Ok(false);
        };
        self.del_mpath_event(ACT_REMOVED, mp, scope).await;
        Ok(true)
    }

    /// Startup repair: when the recovered volume metadata could not be
    /// proven clean, the post-transition work of a previous run may have
    /// been lost; rerun resilver unconditionally.
    pub fn recover(&self, needs_resilver: bool) -> Option<JoinHandle<()>> {
        if !needs_resilver {
            return None;
        }
        info!("volume metadata not marked clean, resilvering");
        let xact = Arc::clone(&self.xact);
        Some(tokio::spawn(async move {
            xact.run_resilver(Uuid::new_v4(), false).await;
        }))
    }

    pub fn gfn(&self) -> &Arc<GfnGate> {
        &self.gfn
    }

    async fn add_mpath_event(&self, action: &'static str, mp: &Mountpath, scope: GfnScope) {
        self.xact.abort_all_mountpath_xactions();
        self.dispatch_post_events("add-mp", scope);
        self.check_enable(action, mp).await;
    }

    async fn del_mpath_event(&self, action: &'static str, mp: Arc<Mountpath>, scope: GfnScope) {
        self.xact.abort_all_mountpath_xactions();
        {
            let mp = Arc::clone(&mp);
            tokio::spawn(async move { mp.evict_lom_cache() });
        }
        if self.check_zero_mountpaths(action).await {
            return;
        }
        info!("{action} mountpath {mp}");
        self.dispatch_post_events("del-mp", scope);
    }

    /// Resilver (when enabled) and replica repair, off the caller's path.
    /// The gate scope rides along and is released once both are dispatched.
    fn dispatch_post_events(&self, reason: &'static str, scope: GfnScope) {
        let xact = Arc::clone(&self.xact);
        let resilver = self.config.resilver.enabled;
        tokio::spawn(async move {
            if resilver {
                xact.run_resilver(Uuid::new_v4(), false).await;
            }
            xact.renew_make_n_copies(reason).await;
            drop(scope);
        });
    }

    /// The first mountpath brings the target back: it may have unregistered
    /// itself when it ran out of devices.
    async fn check_enable(&self, action: &str, mp: &Mountpath) {
        if self.fs.get().available().len() > 1 {
            info!("{action} mountpath {mp}");
        } else {
            info!("{action} the first mountpath {mp}");
            if let Err(err) = self.tself.enable().await {
                error!("failed to re-register target {} (self): {err}", self.target_id);
            }
        }
    }

    /// A target with no available mountpaths cannot serve anything;
    /// unregister so the proxies stop routing here. Best effort: the local
    /// transition stands either way.
    async fn check_zero_mountpaths(&self, action: &str) -> bool {
        if !self.fs.get().available().is_empty() {
            return false;
        }
        match self.tself.disable().await {
            Ok(()) => {
                error!(
                    "{action} the last available mountpath and unregistered target {} (self)",
                    self.target_id
                );
            }
            Err(err) => {
                error!(
                    "{action} the last available mountpath, failed to unregister target {} (self): {err}",
                    self.target_id
                );
            }
        }
        true
    }
}
