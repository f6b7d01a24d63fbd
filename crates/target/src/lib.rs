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

//! Target-side orchestration of mountpath transitions: every add, enable,
//! disable, and remove is wrapped in a failover-notification window, made
//! durable through the volume metadata, and followed up with rebalancing
//! and replica-repair jobs.

mod bmd;
mod collab;
mod config;
mod gfn;
mod lifecycle;

pub use bmd::{Bmd, BmdState, BucketProps, BMD_FILE};
pub use collab::{BmdOwner, TargetSelf, Xactions};
pub use config::{Config, MirrorConf, ResilverConf};
pub use gfn::{GfnGate, GfnScope};
pub use lifecycle::FsPathGroup;
