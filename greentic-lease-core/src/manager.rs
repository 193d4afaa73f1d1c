use crate::errors::Result;
use greentic_lease_spec::{AcceptedLease, LeaseDescriptor, LeaseId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Tracked lease together with the backend that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseRecord {
    pub backend: String,
    pub lease: AcceptedLease,
}

/// Interface of the external lease manager.
///
/// The manager assigns identifiers, persists records and schedules expiry.
/// Descriptors arrive here already validated and are handed over by value.
pub trait LeaseManager: Send + Sync {
    fn register(&self, backend: &str, descriptor: LeaseDescriptor) -> Result<AcceptedLease>;
    fn lookup(&self, lease_id: &LeaseId) -> Result<Option<LeaseRecord>>;
    fn replace(&self, lease_id: &LeaseId, descriptor: LeaseDescriptor) -> Result<AcceptedLease>;
    fn remove(&self, lease_id: &LeaseId) -> Result<Option<LeaseRecord>>;
}

impl<T> LeaseManager for Arc<T>
where
    T: LeaseManager + ?Sized,
{
    fn register(&self, backend: &str, descriptor: LeaseDescriptor) -> Result<AcceptedLease> {
        (**self).register(backend, descriptor)
    }

    fn lookup(&self, lease_id: &LeaseId) -> Result<Option<LeaseRecord>> {
        (**self).lookup(lease_id)
    }

    fn replace(&self, lease_id: &LeaseId, descriptor: LeaseDescriptor) -> Result<AcceptedLease> {
        (**self).replace(lease_id, descriptor)
    }

    fn remove(&self, lease_id: &LeaseId) -> Result<Option<LeaseRecord>> {
        (**self).remove(lease_id)
    }
}

impl<T> LeaseManager for Box<T>
where
    T: LeaseManager + ?Sized,
{
    fn register(&self, backend: &str, descriptor: LeaseDescriptor) -> Result<AcceptedLease> {
        (**self).register(backend, descriptor)
    }

    fn lookup(&self, lease_id: &LeaseId) -> Result<Option<LeaseRecord>> {
        (**self).lookup(lease_id)
    }

    fn replace(&self, lease_id: &LeaseId, descriptor: LeaseDescriptor) -> Result<AcceptedLease> {
        (**self).replace(lease_id, descriptor)
    }

    fn remove(&self, lease_id: &LeaseId) -> Result<Option<LeaseRecord>> {
        (**self).remove(lease_id)
    }
}
