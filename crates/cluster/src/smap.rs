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

use serde::{Deserialize, Serialize};

use crate::node::{Node, Role};

/// Versioned cluster map. The map is read-mostly: readers hold an
/// `Arc<Smap>` snapshot and never lock, membership changes build and publish
/// a new snapshot with a bumped version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Smap {
    pub version: u64,
    pub primary: Option<String>,
    nodes: HashMap<String, Node>,
}

impl Smap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Insert or replace a member, bumping the version.
    pub fn insert(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
        self.version += 1;
    }

    pub fn remove(&mut self, id: &str) -> Option<Node> {
        let prev = self.nodes.remove(id);
        if prev.is_some() {
            self.version += 1;
        }
        prev
    }

    pub fn set_primary(&mut self, id: impl Into<String>) {
        self.primary = Some(id.into());
        self.version += 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn targets(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|n| n.role == Role::Target)
    }

    pub fn count_targets(&self) -> usize {
        self.targets().count()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_monotonic() {
        let mut smap = Smap::new();
        assert_eq!(smap.version, 0);
        smap.insert(Node::target("t1"));
        smap.insert(Node::proxy("p1"));
        assert_eq!(smap.version, 2);
        smap.remove("t1");
        assert_eq!(smap.version, 3);
        // removing a stranger is not a map change
        smap.remove("t1");
        assert_eq!(smap.version, 3);
    }

    #[test]
    fn targets_excludes_proxies() {
        let mut smap = Smap::new();
        smap.insert(Node::proxy("p1"));
        smap.insert(Node::target("t1"));
        smap.insert(Node::target("t2"));
        assert_eq!(smap.count_targets(), 2);
        assert_eq!(smap.len(), 3);
        assert!(smap.targets().all(|n| n.is_target()));
    }
}
