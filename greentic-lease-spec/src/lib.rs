//! Lease descriptor contract for dynamically issued secrets.
//!
//! A backend that mints a secret describes its lease with a
//! [`LeaseDescriptor`]. The descriptor must pass [`LeaseDescriptor::validate`]
//! before it reaches the lease manager, which then owns it as an
//! [`AcceptedLease`]. Renewals flow back to the backend as a
//! [`RenewalRequest`]; revocations hand back only the stored [`InternalData`].

pub mod accepted;
pub mod descriptor;
pub mod error;
pub mod internal_data;
pub mod renewal;
pub mod serde_util;

pub use accepted::{AcceptedLease, LeaseId};
pub use descriptor::LeaseDescriptor;
pub use error::{Error, Result};
pub use internal_data::InternalData;
pub use renewal::RenewalRequest;

pub use time::Duration;

pub mod prelude {
    pub use crate::{
        AcceptedLease, Duration, InternalData, LeaseDescriptor, LeaseId, RenewalRequest,
    };
}
