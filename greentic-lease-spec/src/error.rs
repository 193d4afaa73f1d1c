use thiserror::Error;
use time::Duration;

/// Result alias for lease contract operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Canonical lease contract error surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("lease duration must be greater than zero (got {lease})")]
    InvalidLeaseDuration { lease: Duration },
    #[error("lease grace period must not be negative (got {grace})")]
    InvalidGracePeriod { grace: Duration },
    #[error("lease identifier must not be empty")]
    InvalidLeaseId,
    #[error("invalid internal data: {0}")]
    InvalidInternalData(String),
}
