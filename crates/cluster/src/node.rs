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

/// The node stays in the cluster map but is draining: reads are still served
/// here, writes must be redirected by the caller.
pub const FLAG_MAINTENANCE: u16 = 1 << 0;

/// The node is leaving for good and is excluded from placement entirely.
pub const FLAG_DECOMMISSION: u16 = 1 << 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Proxy,
    Target,
}

/// A cluster member. Identity is the `id` alone: two nodes with equal ids
/// are the same node regardless of flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub flags: u16,
}

impl Node {
    pub fn target(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Target,
            flags: 0,
        }
    }

    pub fn proxy(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Proxy,
            flags: 0,
        }
    }

    pub fn with_flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn in_maintenance(&self) -> bool {
        self.flags & FLAG_MAINTENANCE != 0
    }

    pub fn decommissioned(&self) -> bool {
        self.flags & FLAG_DECOMMISSION != 0
    }

    pub fn is_target(&self) -> bool {
        self.role == Role::Target
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.role {
            Role::Proxy => write!(f, "p[{}]", self.id),
            Role::Target => write!(f, "t[{}]", self.id),
        }
    }
}
