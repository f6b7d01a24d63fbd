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

//! Rendezvous (highest-random-weight) placement over the cluster map.
//!
//! Every node computes the same weights from the same snapshot, so the
//! winner is a cluster-wide agreement without any coordination. Removing a
//! target reassigns only the names it owned; adding one steals on average
//! `1/(N+1)` of the keyspace.

use ostore_utils::hash::hrw_weight;

use crate::node::Node;
use crate::smap::Smap;
use crate::{ClusterError, Result};

/// `(node, weight)` ordering: higher weight wins, equal weights fall back to
/// the lexicographically greater id so that every node breaks ties the same
/// way.
fn beats<'a>(candidate: (&'a Node, u32), best: Option<(&'a Node, u32)>) -> bool {
    match best {
        None => true,
        Some((bn, bw)) => candidate.1 > bw || (candidate.1 == bw && candidate.0.id > bn.id),
    }
}

/// The target owning `name` in `smap`. Decommissioned nodes are out of the
/// running; nodes in maintenance still win reads and carry their flag for
/// the caller to redirect writes.
pub fn hrw_target<'a>(name: &str, smap: &'a Smap) -> Result<&'a Node> {
    let mut best: Option<(&Node, u32)> = None;
    for node in smap.targets() {
        if node.decommissioned() {
            continue;
        }
        let cand = (node, hrw_weight(&node.id, name));
        if beats(cand, best) {
            best = Some(cand);
        }
    }
    best.map(|(node, _)| node).ok_or(ClusterError::NoTargets)
}

/// The runner-up for `name`: the target a peer retries when the owner
/// misses locally under an active rebalance window.
pub fn hrw_target_successor<'a>(name: &str, smap: &'a Smap) -> Result<&'a Node> {
    let mut best: Option<(&Node, u32)> = None;
    let mut second: Option<(&Node, u32)> = None;
    for node in smap.targets() {
        if node.decommissioned() {
            continue;
        }
        let cand = (node, hrw_weight(&node.id, name));
        if beats(cand, best) {
            second = best;
            best = Some(cand);
        } else if beats(cand, second) {
            second = Some(cand);
        }
    }
    if best.is_none() {
        return Err(ClusterError::NoTargets);
    }
    second.map(|(node, _)| node).ok_or(ClusterError::NoSuccessor)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::distributions::Alphanumeric;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use test_case::test_case;

    use super::*;
    use crate::node::{FLAG_DECOMMISSION, FLAG_MAINTENANCE};

    fn smap_of(ids: &[&str]) -> Smap {
        let mut smap = Smap::new();
        for id in ids {
            smap.insert(Node::target(*id));
        }
        smap
    }

    fn names(n: usize, seed: u64) -> Vec<String> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| (&mut rng).sample_iter(&Alphanumeric).take(24).map(char::from).collect())
            .collect()
    }

    #[test_case("image42")]
    #[test_case("a/b/c/deeply/nested/object")]
    #[test_case("")]
    fn winner_is_the_weight_argmax(name: &str) {
        let smap = smap_of(&["a", "b", "c"]);
        let won = hrw_target(name, &smap).unwrap();
        assert!(smap.contains(&won.id));
        for node in smap.targets() {
            assert!(hrw_weight(&node.id, name) <= hrw_weight(&won.id, name));
        }
    }

    #[test]
    fn decision_ignores_insertion_order() {
        let forward = smap_of(&["a", "b", "c", "d", "e"]);
        let backward = smap_of(&["e", "d", "c", "b", "a"]);
        for name in names(500, 1) {
            assert_eq!(
                hrw_target(&name, &forward).unwrap().id,
                hrw_target(&name, &backward).unwrap().id,
            );
        }
    }

    #[test]
    fn proxies_never_own_objects() {
        let mut smap = smap_of(&["t1"]);
        smap.insert(Node::proxy("zzzz-proxy"));
        for name in names(100, 2) {
            assert_eq!(hrw_target(&name, &smap).unwrap().id, "t1");
        }
    }

    #[test]
    fn decommissioned_is_excluded_maintenance_is_not() {
        let mut smap = smap_of(&["t1", "t2", "t3"]);
        smap.insert(Node::target("t2").with_flags(FLAG_DECOMMISSION));
        smap.insert(Node::target("t3").with_flags(FLAG_MAINTENANCE));

        let mut saw_t3 = false;
        for name in names(2000, 3) {
            let won = hrw_target(&name, &smap).unwrap();
            assert_ne!(won.id, "t2");
            if won.id == "t3" {
                assert!(won.in_maintenance());
                saw_t3 = true;
            }
        }
        assert!(saw_t3, "a live maintenance target must keep winning reads");
    }

    #[test]
    fn empty_candidate_set_errors() {
        let mut smap = Smap::new();
        smap.insert(Node::proxy("p1"));
        assert_eq!(hrw_target("x", &smap), Err(ClusterError::NoTargets));

        smap.insert(Node::target("t1").with_flags(FLAG_DECOMMISSION));
        assert_eq!(hrw_target("x", &smap), Err(ClusterError::NoTargets));
    }

    #[test]
    fn successor_is_the_distinct_runner_up() {
        let smap = smap_of(&["a", "b", "c", "d"]);
        for name in names(300, 4) {
            let won = hrw_target(&name, &smap).unwrap();
            let next = hrw_target_successor(&name, &smap).unwrap();
            assert_ne!(won.id, next.id);
            // the runner-up outweighs everything except the winner
            for node in smap.targets() {
                if node.id != won.id {
                    assert!(hrw_weight(&node.id, &name) <= hrw_weight(&next.id, &name));
                }
            }
        }
    }

    #[test]
    fn successor_needs_two_targets() {
        let smap = smap_of(&["only"]);
        assert_eq!(hrw_target_successor("x", &smap), Err(ClusterError::NoSuccessor));
    }

    #[test]
    fn removing_a_target_moves_only_its_names() {
        let full = smap_of(&["a", "b", "c", "d", "e"]);
        let mut shrunk = full.clone();
        shrunk.remove("b");

        let corpus = names(10_000, 5);
        let mut moved = 0usize;
        for name in &corpus {
            let before = hrw_target(name, &full).unwrap();
            let after = hrw_target(name, &shrunk).unwrap();
            if before.id == "b" {
                moved += 1;
                assert_ne!(after.id, "b");
            } else {
                // names not owned by the leaver must not move at all
                assert_eq!(before.id, after.id);
            }
        }
        // the leaver owned ~1/5 of the keyspace
        let frac = moved as f64 / corpus.len() as f64;
        assert!((0.15..=0.25).contains(&frac), "moved fraction {frac}");
    }

    #[test]
    fn adding_a_target_steals_only_what_it_wins() {
        let old = smap_of(&["a", "b", "c", "d"]);
        let mut new = old.clone();
        new.insert(Node::target("x"));

        let corpus = names(10_000, 6);
        let mut moved = 0usize;
        for name in &corpus {
            let before = hrw_target(name, &old).unwrap();
            let after = hrw_target(name, &new).unwrap();
            if before.id != after.id {
                // a reassigned name can only have gone to the newcomer
                assert_eq!(after.id, "x");
                moved += 1;
            }
        }
        // expected steal is 1/(N+1) = 1/5
        let frac = moved as f64 / corpus.len() as f64;
        assert!((0.15..=0.25).contains(&frac), "moved fraction {frac}");
    }

    #[test]
    fn distribution_is_near_uniform() {
        let ids: Vec<String> = (0..10).map(|i| format!("t{i:02}")).collect();
        let smap = smap_of(&ids.iter().map(String::as_str).collect::<Vec<_>>());

        let corpus = names(100_000, 7);
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for name in &corpus {
            *counts.entry(&hrw_target(name, &smap).unwrap().id).or_default() += 1;
        }

        let expected = corpus.len() as f64 / ids.len() as f64;
        let mut chi2 = 0.0;
        for id in &ids {
            let observed = *counts.get(id.as_str()).unwrap_or(&0) as f64;
            let delta = (observed - expected).abs() / expected;
            assert!(delta < 0.05, "{id} is {delta:.3} off uniform");
            chi2 += (observed - expected) * (observed - expected) / expected;
        }
        // df = 9, the 99.9th percentile is ~27.9
        assert!(chi2 < 27.9, "chi-square {chi2:.1}");
    }
}
