//! Contract of the remote authority that accepts task upserts

use crate::models::Task;

/// Result of one upsert against the remote authority
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertOutcome {
    /// Accepted. `server_task` carries the new `server_version`.
    Success { server_task: Task },
    /// The remote copy diverged and wins until a human decides
    Conflict { server_task: Task, reason: String },
    /// The channel is down; the caller backs off and stops the cycle
    NetworkError { reason: String },
}

impl UpsertOutcome {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Conflict { .. } => "conflict",
            Self::NetworkError { .. } => "network_error",
        }
    }
}

/// Remote authority accepting one upsert at a time.
///
/// Implementations must report timeouts and transport failures as
/// [`UpsertOutcome::NetworkError`], and must give every accepted task a
/// strictly larger `server_version` and a fresh `last_synced_at`.
#[allow(async_fn_in_trait)]
pub trait RemoteEndpoint {
    async fn upsert(&self, local: &Task, online: bool) -> UpsertOutcome;
}

impl<E: RemoteEndpoint> RemoteEndpoint for &E {
    async fn upsert(&self, local: &Task, online: bool) -> UpsertOutcome {
        (**self).upsert(local, online).await
    }
}

impl<E: RemoteEndpoint> RemoteEndpoint for std::sync::Arc<E> {
    async fn upsert(&self, local: &Task, online: bool) -> UpsertOutcome {
        (**self).upsert(local, online).await
    }
}
