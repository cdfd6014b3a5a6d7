//! Benchmark configuration

use std::time::Duration;

use crate::engine::SyncOptions;
use crate::runner::FailurePolicy;

/// Name of the remote repository appended to the base URL.
pub const DEFAULT_REPO_NAME: &str = "bench";

/// Configuration for a benchmark run. Immutable once the run starts.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Base URL of the remote namespace, with or without a trailing slash.
    pub remote_base_url: String,
    /// Repository name appended to the base URL.
    pub repo_name: String,
    /// Access credential for the remote.
    pub credential: String,
    /// Polling interval handed to the engine's sync session.
    pub interval: Duration,
    /// Wall-clock window of each phase.
    pub phase_duration: Duration,
    /// Pause between phases, letting engine background work drain before the
    /// next phase's counters are snapshotted. Best-effort: it bounds
    /// cross-phase counter leakage, it cannot eliminate it.
    pub cooldown: Duration,
    /// What a phase does when an operation fails.
    pub failure_policy: FailurePolicy,
}

impl BenchmarkConfig {
    pub fn new(remote_base_url: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            remote_base_url: remote_base_url.into(),
            repo_name: DEFAULT_REPO_NAME.to_string(),
            credential: credential.into(),
            interval: Duration::from_millis(3000),
            phase_duration: Duration::from_millis(30_000),
            cooldown: Duration::from_millis(3000),
            failure_policy: FailurePolicy::Abort,
        }
    }

    /// Full URL of the remote repository, normalizing the trailing slash on
    /// the base.
    pub fn remote_url(&self) -> String {
        if self.remote_base_url.ends_with('/') {
            format!("{}{}", self.remote_base_url, self.repo_name)
        } else {
            format!("{}/{}", self.remote_base_url, self.repo_name)
        }
    }

    /// Session options derived from this configuration.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            remote_url: self.remote_url(),
            interval: self.interval,
            live: false,
            credential: self.credential.clone(),
        }
    }
}
