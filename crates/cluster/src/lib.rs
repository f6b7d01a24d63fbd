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

mod hrw;
mod node;
mod smap;

pub use hrw::{hrw_target, hrw_target_successor};
pub use node::{Node, Role, FLAG_DECOMMISSION, FLAG_MAINTENANCE};
pub use smap::Smap;

pub type Result<T> = core::result::Result<T, ClusterError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClusterError {
    #[error("cluster map has no eligible targets")]
    NoTargets,

    #[error("cluster map has no fallback target")]
    NoSuccessor,
}
