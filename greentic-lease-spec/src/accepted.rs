use crate::descriptor::LeaseDescriptor;
use crate::error::{Error, Result};
use crate::internal_data::InternalData;
use crate::renewal::RenewalRequest;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::{Duration, OffsetDateTime};

/// Manager-assigned handle correlating a descriptor with its tracked lease.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LeaseId(String);

impl LeaseId {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(Error::InvalidLeaseId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LeaseId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for LeaseId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl From<LeaseId> for String {
    fn from(value: LeaseId) -> Self {
        value.0
    }
}

/// A descriptor the lease manager has accepted and now owns.
///
/// Only values of this type carry a [`LeaseId`]. Construction validates the
/// descriptor, so an accepted lease is never partially valid. Once accepted,
/// the descriptor can only be replaced wholesale through [`Self::renewed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AcceptedWire", into = "AcceptedWire")]
pub struct AcceptedLease {
    lease_id: LeaseId,
    descriptor: LeaseDescriptor,
    issued_at: OffsetDateTime,
}

impl AcceptedLease {
    /// Accept a validated descriptor. `issued_at` is truncated to whole
    /// seconds, the resolution it is persisted with.
    pub fn new(
        lease_id: LeaseId,
        descriptor: LeaseDescriptor,
        issued_at: OffsetDateTime,
    ) -> Result<Self> {
        descriptor.validate()?;
        let subsec = Duration::nanoseconds(i64::from(issued_at.nanosecond()));
        Ok(Self {
            lease_id,
            descriptor,
            issued_at: issued_at.saturating_sub(subsec),
        })
    }

    pub fn lease_id(&self) -> &LeaseId {
        &self.lease_id
    }

    pub fn descriptor(&self) -> &LeaseDescriptor {
        &self.descriptor
    }

    pub fn internal_data(&self) -> &InternalData {
        &self.descriptor.internal_data
    }

    pub fn renewable(&self) -> bool {
        self.descriptor.renewable
    }

    /// Start of the current lease term (issuance or latest renewal).
    pub fn issued_at(&self) -> OffsetDateTime {
        self.issued_at
    }

    pub fn expires_at(&self) -> OffsetDateTime {
        self.issued_at.saturating_add(self.descriptor.lease)
    }

    /// Deadline for forced revocation. The grace period is tolerance after
    /// expiry, not additional validity.
    pub fn revoke_after(&self) -> OffsetDateTime {
        self.expires_at()
            .saturating_add(self.descriptor.lease_grace_period)
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at()
    }

    pub fn is_past_grace(&self, now: OffsetDateTime) -> bool {
        now >= self.revoke_after()
    }

    pub fn remaining(&self, now: OffsetDateTime) -> Duration {
        (self.expires_at() - now).max(Duration::ZERO)
    }

    /// Renewal input for the owning backend, echoing the stored payload.
    pub fn renewal_request(&self, requested_increment: Option<Duration>) -> RenewalRequest {
        RenewalRequest::new(self.descriptor.clone(), requested_increment)
    }

    /// Successor record after a renewal, keeping the same identifier.
    pub fn renewed(&self, descriptor: LeaseDescriptor, at: OffsetDateTime) -> Result<Self> {
        Self::new(self.lease_id.clone(), descriptor, at)
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct AcceptedWire {
    lease_id: LeaseId,
    #[serde(with = "time::serde::timestamp")]
    issued_at: OffsetDateTime,
    descriptor: LeaseDescriptor,
}

impl TryFrom<AcceptedWire> for AcceptedLease {
    type Error = Error;

    fn try_from(wire: AcceptedWire) -> Result<Self> {
        Self::new(wire.lease_id, wire.descriptor, wire.issued_at)
    }
}

impl From<AcceptedLease> for AcceptedWire {
    fn from(lease: AcceptedLease) -> Self {
        Self {
            lease_id: lease.lease_id,
            issued_at: lease.issued_at,
            descriptor: lease.descriptor,
        }
    }
}
