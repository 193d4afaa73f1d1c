use crate::error::{Error, Result};
use crate::internal_data::InternalData;
use crate::serde_util::duration_nanos;
use serde::{Deserialize, Serialize};
use time::Duration;

/// Lease attached to a dynamically issued secret, as produced by a backend.
///
/// A descriptor is what a backend returns when it issues a secret and when it
/// answers a renewal. It never carries a lease identifier (the manager assigns
/// one on acceptance, see [`crate::AcceptedLease`]) and never carries a
/// renewal increment (see [`crate::RenewalRequest`]). Decoding rejects both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LeaseDescriptor {
    pub internal_data: InternalData,
    #[serde(with = "duration_nanos")]
    pub lease: Duration,
    #[serde(with = "duration_nanos")]
    pub lease_grace_period: Duration,
    pub renewable: bool,
}

impl LeaseDescriptor {
    /// Non-renewable lease with no grace period and an empty payload.
    pub fn new(lease: Duration) -> Self {
        Self {
            internal_data: InternalData::new(),
            lease,
            lease_grace_period: Duration::ZERO,
            renewable: false,
        }
    }

    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.lease_grace_period = grace;
        self
    }

    pub fn with_renewable(mut self, renewable: bool) -> Self {
        self.renewable = renewable;
        self
    }

    pub fn with_internal_data(mut self, internal_data: InternalData) -> Self {
        self.internal_data = internal_data;
        self
    }

    pub fn internal_data(&self) -> &InternalData {
        &self.internal_data
    }

    /// Structural check applied before a descriptor may reach the lease manager.
    ///
    /// The lease must be strictly positive and the grace period non-negative,
    /// checked in that order. Payload, renewability and identity are not
    /// inspected.
    pub fn validate(&self) -> Result<()> {
        if !self.lease.is_positive() {
            return Err(Error::InvalidLeaseDuration { lease: self.lease });
        }
        if self.lease_grace_period.is_negative() {
            return Err(Error::InvalidGracePeriod {
                grace: self.lease_grace_period,
            });
        }
        Ok(())
    }
}
