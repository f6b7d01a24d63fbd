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

use serde::{Deserialize, Serialize};

/// Target configuration snapshot. Shared as `Arc<Config>`; a config reload
/// publishes a new snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resilver: ResilverConf,
    pub mirror: MirrorConf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilverConf {
    pub enabled: bool,
}

impl Default for ResilverConf {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConf {
    /// How many replicas of each object (and of the bucket metadata) this
    /// target maintains across its mountpaths.
    pub copies: usize,
}

impl Default for MirrorConf {
    fn default() -> Self {
        Self { copies: 2 }
    }
}
