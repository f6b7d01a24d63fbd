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

//! Capabilities the lifecycle orchestrator needs from the rest of the
//! target. Kept as narrow trait bundles so the orchestrator is testable
//! with fakes.

use async_trait::async_trait;
use uuid::Uuid;

use ostore_fs::Mountpaths;

/// Background-job registry.
#[async_trait]
pub trait Xactions: Send + Sync {
    /// Cancel every in-flight job holding a mountpath reference. Returns
    /// after the jobs are signalled, before new jobs may be dispatched.
    fn abort_all_mountpath_xactions(&self);

    /// Re-locate objects to their current rendezvous owner. Idempotent;
    /// concurrent invocations collapse to one run.
    async fn run_resilver(&self, id: Uuid, skip_glob_misplaced: bool);

    /// Start or refresh the job restoring the configured replica count.
    async fn renew_make_n_copies(&self, reason: &str);
}

/// Persisted bucket metadata, mirrored across mountpaths.
#[async_trait]
pub trait BmdOwner: Send + Sync {
    /// Whether the current mirror factor of the bucket metadata is met for
    /// the given snapshot.
    fn has_enough_copies(&self, mpaths: &Mountpaths) -> bool;

    /// Rewrite the bucket-metadata copies onto the snapshot's available
    /// mountpaths. Errors are fatal to the caller.
    async fn persist(&self, mpaths: &Mountpaths) -> anyhow::Result<()>;
}

/// This target's own cluster registration.
#[async_trait]
pub trait TargetSelf: Send + Sync {
    async fn enable(&self) -> anyhow::Result<()>;
    async fn disable(&self) -> anyhow::Result<()>;
}
