//! Phase runner - the duration-bounded operation loop
//!
//! Throughput is measured per fixed wall-clock window, not per fixed
//! operation count: the loop checks elapsed time before each operation and
//! exits once the window is exceeded. The overshoot (at most one operation's
//! latency) is reported through the actual elapsed time, so rate computation
//! downstream stays accurate.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::warn;

use crate::counters;
use crate::engine::DocStore;
use crate::error::{BenchError, Result};
use crate::phase::Phase;

/// What a phase does when its operation fails.
///
/// `Abort` is the default: a benchmark that silently continues past a failed
/// operation reports misleading throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    Abort,
    Continue,
}

/// Outcome of one phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseResult {
    pub name: String,
    /// Actual wall-clock time of the phase window, at least the configured
    /// duration.
    #[serde(with = "serde_duration")]
    pub elapsed: Duration,
    /// Increase of the phase's selected counter across the window. Negative
    /// only if the engine violated counter monotonicity.
    pub delta: i64,
    /// Failed operations, always zero under [`FailurePolicy::Abort`].
    pub failures: u64,
}

/// Runs phases against one store/session pair.
pub struct PhaseRunner<'a, S: DocStore> {
    store: &'a S,
    session: &'a S::Session,
    policy: FailurePolicy,
}

impl<'a, S: DocStore> PhaseRunner<'a, S> {
    pub fn new(store: &'a S, session: &'a S::Session, policy: FailurePolicy) -> Self {
        Self {
            store,
            session,
            policy,
        }
    }

    /// Run one phase to its duration bound.
    ///
    /// Counters are snapshotted immediately before the window opens and
    /// immediately after it closes; nothing else may touch the session in
    /// between. The bound check precedes each operation, so even a
    /// zero-duration phase executes its operation once.
    pub async fn run(&self, phase: &Phase) -> Result<PhaseResult> {
        let before = self.store.statistics();
        let start = Instant::now();
        let mut failures = 0u64;

        loop {
            if start.elapsed() > phase.duration {
                break;
            }
            if let Err(e) = phase.op.execute(self.store, self.session).await {
                match self.policy {
                    FailurePolicy::Abort => {
                        return Err(BenchError::Phase {
                            phase: phase.name.clone(),
                            source: e,
                        });
                    }
                    FailurePolicy::Continue => {
                        warn!(phase = %phase.name, error = %e, "operation failed, continuing");
                        failures += 1;
                    }
                }
            }
        }

        let elapsed = start.elapsed();
        let after = self.store.statistics();
        let delta = counters::delta(&before, &after, phase.counter);
        if delta < 0 {
            warn!(
                phase = %phase.name,
                counter = phase.counter.as_str(),
                delta,
                "counter decreased during phase, engine violated monotonicity"
            );
        }

        Ok(PhaseResult {
            name: phase.name.clone(),
            elapsed,
            delta,
            failures,
        })
    }
}

mod serde_duration {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}
