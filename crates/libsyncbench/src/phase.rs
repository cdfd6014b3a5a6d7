//! Phase definitions
//!
//! A phase is pure configuration: a name, a bounded duration, the operation
//! repeated inside the window, and the counter the phase is measured by.

use std::time::Duration;

use serde_json::json;

use crate::counters::CounterKey;
use crate::engine::{DocStore, Document, EngineError, SyncSession};

/// Document id written by the put-based phases. Every write overwrites the
/// same document, so the benchmark measures sync throughput rather than
/// store growth.
pub const BENCH_DOC_ID: &str = "1";

/// The operation a phase repeats against the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    /// One fetch-merge-push cycle with nothing new to push.
    Fetch,
    /// Write one document, then attempt a push-only cycle.
    PutAndPush,
    /// Write one document, then attempt a full sync cycle.
    PutAndSync,
}

impl SyncOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOp::Fetch => "fetch",
            SyncOp::PutAndPush => "put-and-push",
            SyncOp::PutAndSync => "put-and-sync",
        }
    }

    /// Execute the operation once.
    pub(crate) async fn execute<S: DocStore>(
        &self,
        store: &S,
        session: &S::Session,
    ) -> Result<(), EngineError> {
        match self {
            SyncOp::Fetch => session.try_sync().await,
            SyncOp::PutAndPush => {
                store.put(bench_doc()).await?;
                session.try_push().await
            }
            SyncOp::PutAndSync => {
                store.put(bench_doc()).await?;
                session.try_sync().await
            }
        }
    }
}

fn bench_doc() -> Document {
    Document::new(BENCH_DOC_ID, json!({}))
}

/// One bounded-duration benchmark segment.
#[derive(Debug, Clone)]
pub struct Phase {
    pub name: String,
    pub duration: Duration,
    pub op: SyncOp,
    pub counter: CounterKey,
}

impl Phase {
    /// Fetch-only phase, measured by the `sync` counter.
    pub fn fetch(duration: Duration) -> Self {
        Self {
            name: "fetch".to_string(),
            duration,
            op: SyncOp::Fetch,
            counter: CounterKey::Sync,
        }
    }

    /// Write-then-push phase, measured by the `push` counter.
    pub fn put_and_push(duration: Duration) -> Self {
        Self {
            name: "put and push".to_string(),
            duration,
            op: SyncOp::PutAndPush,
            counter: CounterKey::Push,
        }
    }

    /// Write-then-sync phase, measured by the `sync` counter.
    pub fn put_and_sync(duration: Duration) -> Self {
        Self {
            name: "put and fetch and push".to_string(),
            duration,
            op: SyncOp::PutAndSync,
            counter: CounterKey::Sync,
        }
    }

    /// Parse a phase from its selector key: `fetch`, `push`, or `sync`.
    pub fn from_name(name: &str, duration: Duration) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "fetch" => Some(Self::fetch(duration)),
            "push" => Some(Self::put_and_push(duration)),
            "sync" => Some(Self::put_and_sync(duration)),
            _ => None,
        }
    }
}

/// The standard three-phase sequence, in benchmark order.
pub fn default_phases(duration: Duration) -> Vec<Phase> {
    vec![
        Phase::fetch(duration),
        Phase::put_and_push(duration),
        Phase::put_and_sync(duration),
    ]
}
