use crate::errors::BackendError;
use async_trait::async_trait;
use greentic_lease_spec::{InternalData, LeaseDescriptor, LeaseId, RenewalRequest};
use std::sync::Arc;

/// Callbacks the lease manager invokes on the backend that issued a secret.
///
/// Issuance itself is backend specific; a backend hands the resulting
/// [`LeaseDescriptor`] to [`crate::LeaseBroker::issue`]. Afterwards the
/// backend only ever sees its own `internal_data` again.
#[async_trait]
pub trait LeaseBackend: Send + Sync {
    /// Extend a lease. The request carries the stored payload and the
    /// caller's requested increment, which may be honoured, shortened or
    /// ignored. The returned descriptor is validated before it is stored.
    async fn renew(
        &self,
        lease_id: &LeaseId,
        request: RenewalRequest,
    ) -> Result<LeaseDescriptor, BackendError>;

    /// Tear down the resource behind a lease.
    ///
    /// May be called more than once for the same lease. A resource that is
    /// already gone must be reported as success (or [`BackendError::Gone`]),
    /// never as a failure.
    async fn revoke(
        &self,
        lease_id: &LeaseId,
        internal_data: &InternalData,
    ) -> Result<(), BackendError>;
}

/// Collapse revoke outcomes so a replayed revoke looks like the first one.
pub fn normalize_revoke(result: Result<(), BackendError>) -> Result<(), BackendError> {
    match result {
        Err(BackendError::Gone) => Ok(()),
        other => other,
    }
}

#[async_trait]
impl<T> LeaseBackend for Arc<T>
where
    T: LeaseBackend + ?Sized,
{
    async fn renew(
        &self,
        lease_id: &LeaseId,
        request: RenewalRequest,
    ) -> Result<LeaseDescriptor, BackendError> {
        (**self).renew(lease_id, request).await
    }

    async fn revoke(
        &self,
        lease_id: &LeaseId,
        internal_data: &InternalData,
    ) -> Result<(), BackendError> {
        (**self).revoke(lease_id, internal_data).await
    }
}

#[async_trait]
impl<T> LeaseBackend for Box<T>
where
    T: LeaseBackend + ?Sized,
{
    async fn renew(
        &self,
        lease_id: &LeaseId,
        request: RenewalRequest,
    ) -> Result<LeaseDescriptor, BackendError> {
        (**self).renew(lease_id, request).await
    }

    async fn revoke(
        &self,
        lease_id: &LeaseId,
        internal_data: &InternalData,
    ) -> Result<(), BackendError> {
        (**self).revoke(lease_id, internal_data).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gone_is_success_other_failures_are_kept() {
        assert_eq!(normalize_revoke(Err(BackendError::Gone)), Ok(()));
        assert_eq!(normalize_revoke(Ok(())), Ok(()));
        assert_eq!(
            normalize_revoke(Err(BackendError::Failed("timeout".into()))),
            Err(BackendError::Failed("timeout".into()))
        );
    }
}
