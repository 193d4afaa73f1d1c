use greentic_lease_spec::{Error as SpecError, LeaseId};
use thiserror::Error;

/// Result alias for broker and manager operations.
pub type Result<T> = std::result::Result<T, LeaseError>;

/// Errors surfaced while moving leases between backends and the manager.
#[derive(Debug, Error)]
pub enum LeaseError {
    /// Contract violation outside a backend response (e.g. a malformed id).
    #[error("{0}")]
    Spec(#[from] SpecError),
    /// A backend produced a descriptor that failed validation. The backend
    /// operation is treated as failed and nothing reaches the manager.
    #[error("backend `{backend}` produced an invalid lease: {source}")]
    InvalidDescriptor {
        backend: String,
        #[source]
        source: SpecError,
    },
    #[error("internal data for backend `{backend}` is {size} bytes (limit {limit})")]
    InternalDataTooLarge {
        backend: String,
        size: usize,
        limit: usize,
    },
    #[error("backend `{0}` is not registered")]
    UnknownBackend(String),
    #[error("lease {0} not found")]
    UnknownLease(LeaseId),
    #[error("lease {0} is not renewable")]
    NotRenewable(LeaseId),
    #[error("backend `{backend}` failed: {source}")]
    Backend {
        backend: String,
        #[source]
        source: BackendError,
    },
    #[error("lease manager error: {0}")]
    Manager(String),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Builder(String),
}

/// Failures reported by a backend's renew/revoke callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The resource behind the lease no longer exists.
    #[error("resource already revoked")]
    Gone,
    #[error("invalid internal data: {0}")]
    InvalidInternalData(String),
    #[error("{0}")]
    Failed(String),
}

impl From<SpecError> for BackendError {
    fn from(value: SpecError) -> Self {
        match value {
            SpecError::InvalidInternalData(message) => Self::InvalidInternalData(message),
            other => Self::Failed(other.to_string()),
        }
    }
}
