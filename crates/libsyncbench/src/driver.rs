//! Benchmark driver - orchestrates a run end to end
//!
//! Phases execute strictly sequentially: counters are shared session-wide
//! state, and concurrent phases would corrupt their attribution. Between
//! phases the driver sleeps for the configured cool-down so background work
//! started by the previous phase can drain before the next snapshot.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::BenchmarkConfig;
use crate::engine::{DocStore, SyncEngine};
use crate::error::Result;
use crate::phase::Phase;
use crate::remote::RemoteEndpointManager;
use crate::runner::{PhaseResult, PhaseRunner};

pub struct BenchmarkDriver<E: SyncEngine> {
    config: BenchmarkConfig,
    engine: E,
}

impl<E: SyncEngine> BenchmarkDriver<E> {
    pub fn new(config: BenchmarkConfig, engine: E) -> Self {
        Self { config, engine }
    }

    /// Run the given phases in order and return their results.
    ///
    /// Setup happens exactly once: remote pre-cleanup, open-or-create of the
    /// local store, one synchronization session. Teardown of the local store
    /// is best-effort and runs whether or not the phases succeeded; a
    /// teardown failure is logged but never replaces the run's real outcome.
    pub async fn run_all(&self, phases: &[Phase]) -> Result<Vec<PhaseResult>> {
        RemoteEndpointManager::new(self.engine.remote())
            .prepare()
            .await;

        let store = match self.engine.open().await {
            Ok(store) => store,
            Err(e) if e.is_not_found() => {
                debug!("no local store yet, creating one");
                self.engine.create().await?
            }
            Err(e) => return Err(e.into()),
        };

        let outcome = self.run_phases(&store, phases).await;

        if let Err(e) = store.destroy().await {
            warn!(error = %e, "failed to destroy local store");
        }

        outcome
    }

    async fn run_phases<S: DocStore>(
        &self,
        store: &S,
        phases: &[Phase],
    ) -> Result<Vec<PhaseResult>> {
        let session = store.start_sync(&self.config.sync_options()).await?;
        info!(remote = %self.config.remote_url(), "start benchmark");

        let runner = PhaseRunner::new(store, &session, self.config.failure_policy);
        let mut results = Vec::with_capacity(phases.len());

        for (i, phase) in phases.iter().enumerate() {
            if i > 0 {
                debug!(
                    cooldown_ms = self.config.cooldown.as_millis() as u64,
                    "cooling down"
                );
                sleep(self.config.cooldown).await;
            }

            info!(phase = %phase.name, "phase start");
            let result = runner.run(phase).await?;
            info!(
                phase = %result.name,
                elapsed_ms = result.elapsed.as_millis() as u64,
                delta = result.delta,
                "phase complete"
            );
            results.push(result);
        }

        Ok(results)
    }
}
