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

use xxhash_rust::xxh32::xxh32;

/// The fixed seed for placement hashing. DO NOT change: every node in the
/// cluster must compute identical weights for identical inputs, or placement
/// diverges and objects become unfindable.
pub const HRW_SEED: u32 = 1103515245;

/// Rendezvous (highest-random-weight) score of `name` against the entity
/// identified by `id`: a target id when placing across the cluster, a
/// mountpath when placing across local devices.
pub fn hrw_weight(id: &str, name: &str) -> u32 {
    let mut key = String::with_capacity(id.len() + 1 + name.len());
    key.push_str(id);
    key.push(':');
    key.push_str(name);
    xxh32(key.as_bytes(), HRW_SEED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_is_deterministic() {
        assert_eq!(hrw_weight("t3", "obj/key"), hrw_weight("t3", "obj/key"));
        // the key is the plain `id:name` concatenation, nothing else
        assert_eq!(hrw_weight("t3", "obj/key"), xxh32(b"t3:obj/key", HRW_SEED));
    }

    #[test]
    fn weight_depends_on_both_parts() {
        assert_ne!(hrw_weight("t1", "x"), hrw_weight("t2", "x"));
        assert_ne!(hrw_weight("t1", "x"), hrw_weight("t1", "y"));
        // only the joined `id:name` bytes matter
        assert_eq!(hrw_weight("a:b", "c"), hrw_weight("a", "b:c"));
    }
}
