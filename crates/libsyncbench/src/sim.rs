//! In-memory reference engine
//!
//! Implements the engine contract with just enough behavior for the harness
//! to be exercised end to end: a task-queue statistics surface, configurable
//! per-operation latency, a destructible remote, and failure injection. It
//! is not a document store and speaks no synchronization protocol - the
//! "remote" is a map behind the same process boundary. Real engines
//! implement the [`crate::engine`] traits instead.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::Rng;

use crate::config::BenchmarkConfig;
use crate::counters::TaskStatistics;
use crate::engine::{
    DocStore, Document, EngineError, RemoteEndpoint, SyncEngine, SyncOptions, SyncSession,
};

#[derive(Debug)]
struct Shared {
    remote_url: String,

    // Operation latency range in microseconds; equal bounds mean fixed.
    latency_min_us: AtomicU64,
    latency_max_us: AtomicU64,

    store_created: AtomicBool,
    store_destroyed: AtomicBool,
    local_destroy_fails: AtomicBool,

    remote_missing: AtomicBool,
    remote_destroy_calls: AtomicU64,

    put_count: AtomicU64,
    sync_count: AtomicU64,
    push_count: AtomicU64,

    local_docs: Mutex<HashMap<String, Document>>,
    remote_docs: Mutex<HashMap<String, Document>>,

    // Remaining successes before the operation fails permanently; None never
    // fails.
    sync_budget: Mutex<Option<u64>>,
    push_budget: Mutex<Option<u64>>,

    last_sync_options: Mutex<Option<SyncOptions>>,
}

impl Shared {
    async fn simulate_latency(&self) {
        let min = self.latency_min_us.load(Ordering::Relaxed);
        let max = self.latency_max_us.load(Ordering::Relaxed);
        let us = if max > min {
            rand::thread_rng().gen_range(min..=max)
        } else {
            min
        };
        if us > 0 {
            tokio::time::sleep(Duration::from_micros(us)).await;
        }
    }

    fn consume_budget(budget: &Mutex<Option<u64>>, what: &str) -> Result<(), EngineError> {
        let mut budget = budget
            .lock()
            .map_err(|_| EngineError::Internal("budget lock poisoned".to_string()))?;
        match budget.as_mut() {
            Some(remaining) if *remaining == 0 => {
                Err(EngineError::Network(format!("simulated {what} failure")))
            }
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn statistics(&self) -> TaskStatistics {
        TaskStatistics {
            put: self.put_count.load(Ordering::Relaxed),
            sync: self.sync_count.load(Ordering::Relaxed),
            push: self.push_count.load(Ordering::Relaxed),
        }
    }
}

/// Engine factory. Builder knobs configure latency and failure injection
/// before the run starts. Cloning yields another handle on the same
/// simulated state, which tests use to inspect a run from the outside.
#[derive(Clone)]
pub struct SimEngine {
    shared: Arc<Shared>,
}

impl SimEngine {
    pub fn new(config: &BenchmarkConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                remote_url: config.remote_url(),
                latency_min_us: AtomicU64::new(0),
                latency_max_us: AtomicU64::new(0),
                store_created: AtomicBool::new(false),
                store_destroyed: AtomicBool::new(false),
                local_destroy_fails: AtomicBool::new(false),
                remote_missing: AtomicBool::new(false),
                remote_destroy_calls: AtomicU64::new(0),
                put_count: AtomicU64::new(0),
                sync_count: AtomicU64::new(0),
                push_count: AtomicU64::new(0),
                local_docs: Mutex::new(HashMap::new()),
                remote_docs: Mutex::new(HashMap::new()),
                sync_budget: Mutex::new(None),
                push_budget: Mutex::new(None),
                last_sync_options: Mutex::new(None),
            }),
        }
    }

    /// Fixed latency for every engine operation.
    pub fn with_latency(self, latency: Duration) -> Self {
        let us = latency.as_micros() as u64;
        self.shared.latency_min_us.store(us, Ordering::Relaxed);
        self.shared.latency_max_us.store(us, Ordering::Relaxed);
        self
    }

    /// Uniformly jittered latency between `min` and `max`.
    pub fn with_latency_range(self, min: Duration, max: Duration) -> Self {
        self.shared
            .latency_min_us
            .store(min.as_micros() as u64, Ordering::Relaxed);
        self.shared
            .latency_max_us
            .store(max.as_micros() as u64, Ordering::Relaxed);
        self
    }

    /// Let `successes` sync cycles succeed, then fail every later one.
    pub fn fail_sync_after(self, successes: u64) -> Self {
        if let Ok(mut budget) = self.shared.sync_budget.lock() {
            *budget = Some(successes);
        }
        self
    }

    /// Let `successes` push cycles succeed, then fail every later one.
    pub fn fail_push_after(self, successes: u64) -> Self {
        if let Ok(mut budget) = self.shared.push_budget.lock() {
            *budget = Some(successes);
        }
        self
    }

    /// Make remote destroy report the repository as missing.
    pub fn missing_remote(self) -> Self {
        self.shared.remote_missing.store(true, Ordering::Relaxed);
        self
    }

    /// Make local store destroy fail, for teardown-path tests.
    pub fn failing_local_destroy(self) -> Self {
        self.shared.local_destroy_fails.store(true, Ordering::Relaxed);
        self
    }

    /// Engine-wide counter totals, readable after the store is gone.
    pub fn statistics(&self) -> TaskStatistics {
        self.shared.statistics()
    }

    pub fn local_destroyed(&self) -> bool {
        self.shared.store_destroyed.load(Ordering::Relaxed)
    }

    pub fn remote_destroy_calls(&self) -> u64 {
        self.shared.remote_destroy_calls.load(Ordering::Relaxed)
    }

    /// Options of the most recent `start_sync` call.
    pub fn last_sync_options(&self) -> Option<SyncOptions> {
        self.shared
            .last_sync_options
            .lock()
            .ok()
            .and_then(|options| options.clone())
    }
}

impl SyncEngine for SimEngine {
    type Store = SimStore;
    type Remote = SimRemote;

    async fn open(&self) -> Result<SimStore, EngineError> {
        let created = self.shared.store_created.load(Ordering::SeqCst);
        let destroyed = self.shared.store_destroyed.load(Ordering::SeqCst);
        if !created || destroyed {
            return Err(EngineError::NotFound(format!(
                "no local store for {}",
                self.shared.remote_url
            )));
        }
        Ok(SimStore {
            shared: Arc::clone(&self.shared),
        })
    }

    async fn create(&self) -> Result<SimStore, EngineError> {
        self.shared.store_created.store(true, Ordering::SeqCst);
        self.shared.store_destroyed.store(false, Ordering::SeqCst);
        Ok(SimStore {
            shared: Arc::clone(&self.shared),
        })
    }

    fn remote(&self) -> SimRemote {
        SimRemote {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Open handle on the simulated local store.
#[derive(Debug)]
pub struct SimStore {
    shared: Arc<Shared>,
}

impl DocStore for SimStore {
    type Session = SimSession;

    async fn start_sync(&self, options: &SyncOptions) -> Result<SimSession, EngineError> {
        if options.credential.is_empty() {
            return Err(EngineError::Auth("empty credential".to_string()));
        }
        if let Ok(mut last) = self.shared.last_sync_options.lock() {
            *last = Some(options.clone());
        }
        Ok(SimSession {
            shared: Arc::clone(&self.shared),
        })
    }

    async fn put(&self, doc: Document) -> Result<(), EngineError> {
        self.shared.simulate_latency().await;
        let mut docs = self
            .shared
            .local_docs
            .lock()
            .map_err(|_| EngineError::Internal("store lock poisoned".to_string()))?;
        docs.insert(doc.id.clone(), doc);
        self.shared.put_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn statistics(&self) -> TaskStatistics {
        self.shared.statistics()
    }

    async fn destroy(&self) -> Result<(), EngineError> {
        if self.shared.local_destroy_fails.load(Ordering::Relaxed) {
            return Err(EngineError::Internal(
                "simulated destroy failure".to_string(),
            ));
        }
        let mut docs = self
            .shared
            .local_docs
            .lock()
            .map_err(|_| EngineError::Internal("store lock poisoned".to_string()))?;
        docs.clear();
        self.shared.store_destroyed.store(true, Ordering::SeqCst);
        self.shared.store_created.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Simulated synchronization session.
#[derive(Debug)]
pub struct SimSession {
    shared: Arc<Shared>,
}

impl SimSession {
    fn exchange(&self, push_only: bool) -> Result<(), EngineError> {
        let mut local = self
            .shared
            .local_docs
            .lock()
            .map_err(|_| EngineError::Internal("store lock poisoned".to_string()))?;
        let mut remote = self
            .shared
            .remote_docs
            .lock()
            .map_err(|_| EngineError::Internal("remote lock poisoned".to_string()))?;

        if !push_only {
            for (id, doc) in remote.iter() {
                local.entry(id.clone()).or_insert_with(|| doc.clone());
            }
        }
        for (id, doc) in local.iter() {
            remote.insert(id.clone(), doc.clone());
        }
        Ok(())
    }
}

impl SyncSession for SimSession {
    async fn try_sync(&self) -> Result<(), EngineError> {
        self.shared.simulate_latency().await;
        Shared::consume_budget(&self.shared.sync_budget, "sync")?;
        self.exchange(false)?;
        self.shared.sync_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn try_push(&self) -> Result<(), EngineError> {
        self.shared.simulate_latency().await;
        Shared::consume_budget(&self.shared.push_budget, "push")?;
        self.exchange(true)?;
        self.shared.push_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Simulated remote repository.
pub struct SimRemote {
    shared: Arc<Shared>,
}

impl RemoteEndpoint for SimRemote {
    async fn destroy(&self) -> Result<(), EngineError> {
        self.shared.remote_destroy_calls.fetch_add(1, Ordering::Relaxed);
        if self.shared.remote_missing.load(Ordering::Relaxed) {
            return Err(EngineError::NotFound(format!(
                "repository not found: {}",
                self.shared.remote_url
            )));
        }
        let mut docs = self
            .shared
            .remote_docs
            .lock()
            .map_err(|_| EngineError::Internal("remote lock poisoned".to_string()))?;
        docs.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn engine() -> SimEngine {
        SimEngine::new(&BenchmarkConfig::new("https://example.com/user/", "token"))
    }

    #[tokio::test]
    async fn open_before_create_is_not_found() {
        let engine = engine();
        let err = engine.open().await.unwrap_err();
        assert!(err.is_not_found());

        engine.create().await.unwrap();
        assert!(engine.open().await.is_ok());
    }

    #[tokio::test]
    async fn operations_increment_their_counters() {
        let engine = engine();
        let store = engine.create().await.unwrap();
        let config = BenchmarkConfig::new("https://example.com/user/", "token");
        let session = store.start_sync(&config.sync_options()).await.unwrap();

        store
            .put(Document::new("1", json!({"n": 1})))
            .await
            .unwrap();
        session.try_sync().await.unwrap();
        session.try_push().await.unwrap();
        session.try_push().await.unwrap();

        let stats = store.statistics();
        assert_eq!(stats.put, 1);
        assert_eq!(stats.sync, 1);
        assert_eq!(stats.push, 2);
    }

    #[tokio::test]
    async fn destroy_of_missing_remote_reports_not_found() {
        let engine = engine().missing_remote();
        let remote = engine.remote();

        assert!(remote.destroy().await.unwrap_err().is_not_found());
        assert!(remote.destroy().await.unwrap_err().is_not_found());
        assert_eq!(engine.remote_destroy_calls(), 2);
    }

    #[tokio::test]
    async fn empty_credential_is_rejected() {
        let engine = engine();
        let store = engine.create().await.unwrap();
        let mut config = BenchmarkConfig::new("https://example.com/user/", "token");
        config.credential = String::new();

        let err = store.start_sync(&config.sync_options()).await.unwrap_err();
        assert!(matches!(err, EngineError::Auth(_)));
    }

    #[tokio::test]
    async fn failure_budget_kicks_in_after_allowed_successes() {
        let engine = engine().fail_sync_after(2);
        let store = engine.create().await.unwrap();
        let config = BenchmarkConfig::new("https://example.com/user/", "token");
        let session = store.start_sync(&config.sync_options()).await.unwrap();

        session.try_sync().await.unwrap();
        session.try_sync().await.unwrap();
        assert!(session.try_sync().await.is_err());
        assert!(session.try_sync().await.is_err());
        assert_eq!(store.statistics().sync, 2);
    }
}
