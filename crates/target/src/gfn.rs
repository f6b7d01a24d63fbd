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

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use tracing::warn;

/// The "object may be mid-move" gate. While active, a peer that misses a
/// local read retries the rendezvous runner-up before answering not-found.
///
/// Activations are counted, so overlapping transitions nest: the gate stays
/// asserted until the last scope is released.
#[derive(Debug, Default)]
pub struct GfnGate {
    count: AtomicI64,
}

impl GfnGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assert the gate for the lifetime of the returned scope. The scope
    /// releases exactly one activation when dropped, so every exit path,
    /// early error returns included, restores the gate's balance.
    pub fn activate(self: Arc<Self>) -> GfnScope {
        let prev = self.count.fetch_add(1, Ordering::AcqRel);
        GfnScope {
            gate: self,
            owner: prev == 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.count.load(Ordering::Acquire) > 0
    }

    fn deactivate(&self) {
        let prev = self.count.fetch_sub(1, Ordering::AcqRel);
        if prev <= 0 {
            // a scope can only be dropped once, so this is a logic error
            warn!("gfn gate released below zero");
            self.count.fetch_add(1, Ordering::AcqRel);
        }
    }
}

/// Scoped activation of a [`GfnGate`].
#[must_use = "dropping the scope releases the gate"]
pub struct GfnScope {
    gate: Arc<GfnGate>,
    owner: bool,
}

impl GfnScope {
    /// Whether this activation turned the gate on (the gate was clear
    /// before it).
    pub fn owner(&self) -> bool {
        self.owner
    }
}

impl Drop for GfnScope {
    fn drop(&mut self) {
        self.gate.deactivate();
    }
}
