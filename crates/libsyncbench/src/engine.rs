//! Contract consumed from the synchronization engine
//!
//! The harness never implements storage or the synchronization protocol; it
//! drives an engine through this narrow surface. Real engines implement these
//! traits, [`crate::sim`] provides an in-memory reference implementation.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::counters::TaskStatistics;

/// A document written into the local store, identified by a caller-supplied key.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            body,
        }
    }
}

/// Options for binding a synchronization session to a remote target.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Full URL of the remote repository.
    pub remote_url: String,
    /// Polling interval for the engine's own background scheduling.
    pub interval: Duration,
    /// Whether the engine keeps a live polling loop running. The harness
    /// always issues operations explicitly, so this stays off.
    pub live: bool,
    /// Access credential for the remote.
    pub credential: String,
}

/// Errors surfaced by the engine across the contract boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal engine error: {0}")]
    Internal(String),
}

impl EngineError {
    /// True for the open-or-create path: no local store exists yet.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound(_))
    }
}

/// Entry point of the engine: local store lifecycle plus a handle on the
/// configured remote endpoint.
#[allow(async_fn_in_trait)]
pub trait SyncEngine {
    type Store: DocStore;
    type Remote: RemoteEndpoint;

    /// Open an existing local store. Fails with [`EngineError::NotFound`]
    /// when none exists.
    async fn open(&self) -> Result<Self::Store, EngineError>;

    /// Create a fresh local store.
    async fn create(&self) -> Result<Self::Store, EngineError>;

    /// Handle on the remote endpoint this engine is configured against.
    fn remote(&self) -> Self::Remote;
}

/// An open local document store.
#[allow(async_fn_in_trait)]
pub trait DocStore {
    type Session: SyncSession;

    /// Begin a synchronization session bound to a remote target.
    async fn start_sync(&self, options: &SyncOptions) -> Result<Self::Session, EngineError>;

    /// Write one document.
    async fn put(&self, doc: Document) -> Result<(), EngineError>;

    /// Consistent point-in-time read of the task-queue counters. Callers
    /// guarantee no harness-issued operation is in flight when reading.
    fn statistics(&self) -> TaskStatistics;

    /// Tear down the local store.
    async fn destroy(&self) -> Result<(), EngineError>;
}

/// A live synchronization session.
#[allow(async_fn_in_trait)]
pub trait SyncSession {
    /// Attempt one fetch-merge-push cycle.
    async fn try_sync(&self) -> Result<(), EngineError>;

    /// Attempt one push-only cycle.
    async fn try_push(&self) -> Result<(), EngineError>;
}

/// The remote repository used as the synchronization target.
#[allow(async_fn_in_trait)]
pub trait RemoteEndpoint {
    /// Remove the remote repository. Idempotent; removing a repository that
    /// does not exist reports [`EngineError::NotFound`].
    async fn destroy(&self) -> Result<(), EngineError>;
}
