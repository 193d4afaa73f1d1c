use crate::descriptor::LeaseDescriptor;
use crate::internal_data::InternalData;
use crate::serde_util::{duration_nanos, option_duration_nanos};
use serde::{Deserialize, Serialize};
use time::Duration;

/// Renewal input handed to the owning backend.
///
/// Carries the descriptor exactly as the manager stored it together with the
/// extension the caller asked for. This is the only place a requested
/// increment exists; responses are plain [`LeaseDescriptor`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RenewalWire", into = "RenewalWire")]
pub struct RenewalRequest {
    current: LeaseDescriptor,
    requested_increment: Option<Duration>,
}

impl RenewalRequest {
    pub fn new(current: LeaseDescriptor, requested_increment: Option<Duration>) -> Self {
        Self {
            current,
            requested_increment,
        }
    }

    /// The stored descriptor, payload included, exactly as issued or last renewed.
    pub fn current(&self) -> &LeaseDescriptor {
        &self.current
    }

    pub fn internal_data(&self) -> &InternalData {
        &self.current.internal_data
    }

    pub fn requested_increment(&self) -> Option<Duration> {
        self.requested_increment
    }

    /// Lease a backend would grant for this request.
    ///
    /// Uses the requested increment when present and positive, otherwise
    /// `default`, then clamps to `max` if given. Never returns less than one
    /// nanosecond.
    pub fn granted_lease(&self, default: Duration, max: Option<Duration>) -> Duration {
        let wanted = self
            .requested_increment
            .filter(|increment| increment.is_positive())
            .unwrap_or(default);
        let capped = match max {
            Some(max) if wanted > max => max,
            _ => wanted,
        };
        capped.max(Duration::NANOSECOND)
    }

    /// Build a response that keeps the stored payload, grace period and
    /// renewability with a fresh lease.
    pub fn respond(&self, lease: Duration) -> LeaseDescriptor {
        LeaseDescriptor {
            lease,
            ..self.current.clone()
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RenewalWire {
    internal_data: InternalData,
    #[serde(with = "duration_nanos")]
    lease: Duration,
    #[serde(with = "duration_nanos")]
    lease_grace_period: Duration,
    renewable: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "option_duration_nanos"
    )]
    lease_increment: Option<Duration>,
}

impl From<RenewalWire> for RenewalRequest {
    fn from(wire: RenewalWire) -> Self {
        Self {
            current: LeaseDescriptor {
                internal_data: wire.internal_data,
                lease: wire.lease,
                lease_grace_period: wire.lease_grace_period,
                renewable: wire.renewable,
            },
            requested_increment: wire.lease_increment,
        }
    }
}

impl From<RenewalRequest> for RenewalWire {
    fn from(request: RenewalRequest) -> Self {
        let current = request.current;
        Self {
            internal_data: current.internal_data,
            lease: current.lease,
            lease_grace_period: current.lease_grace_period,
            renewable: current.renewable,
            lease_increment: request.requested_increment,
        }
    }
}
