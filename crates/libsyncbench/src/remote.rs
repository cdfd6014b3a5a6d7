//! Remote endpoint lifecycle

use tracing::{info, warn};

use crate::engine::RemoteEndpoint;

/// Prepares the remote repository before a run.
///
/// The only responsibility is pre-cleanup: destroy whatever repository may be
/// left over from an earlier run. The repository is recreated implicitly by
/// the first successful synchronization, so there is no create step.
pub struct RemoteEndpointManager<R: RemoteEndpoint> {
    endpoint: R,
}

impl<R: RemoteEndpoint> RemoteEndpointManager<R> {
    pub fn new(endpoint: R) -> Self {
        Self { endpoint }
    }

    /// Destroy any pre-existing remote repository.
    ///
    /// Failures are logged and swallowed: on a first run the repository
    /// legitimately does not exist, and a transient cleanup error must not
    /// kill the benchmark before it starts.
    pub async fn prepare(&self) {
        info!("preparing remote repository");
        if let Err(e) = self.endpoint.destroy().await {
            warn!(error = %e, "remote pre-cleanup failed, continuing");
        }
    }
}
