//! Counter snapshots and delta accounting
//!
//! The synchronization engine exposes cumulative operation counters for the
//! lifetime of a session. A phase is measured by snapshotting them before and
//! after its operation loop and taking the difference for one selected key.

use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of the engine's task-queue counters.
///
/// Counters are cumulative since session start and monotonically
/// non-decreasing for a correctly behaving engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskStatistics {
    pub put: u64,
    pub sync: u64,
    pub push: u64,
}

impl TaskStatistics {
    /// Read the counter selected by `key`.
    pub fn get(&self, key: CounterKey) -> u64 {
        match key {
            CounterKey::Put => self.put,
            CounterKey::Sync => self.sync,
            CounterKey::Push => self.push,
        }
    }
}

/// Selects which counter a phase is measured by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounterKey {
    Put,
    Sync,
    Push,
}

impl CounterKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            CounterKey::Put => "put",
            CounterKey::Sync => "sync",
            CounterKey::Push => "push",
        }
    }
}

/// Increase of a counter between two snapshots.
///
/// Signed: a negative result means the engine violated the monotonic counter
/// invariant. The harness reports it as-is rather than clamping, so an engine
/// bug shows up in the output instead of being hidden.
pub fn delta(before: &TaskStatistics, after: &TaskStatistics, key: CounterKey) -> i64 {
    after.get(key) as i64 - before.get(key) as i64
}
