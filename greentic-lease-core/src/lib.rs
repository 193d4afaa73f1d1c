//! Boundary between secret backends and the lease manager.
//!
//! Backends implement [`LeaseBackend`]; the external lease manager sits
//! behind [`LeaseManager`]. [`LeaseBroker`] connects the two and refuses any
//! descriptor that breaks the lease contract from `greentic-lease-spec`.

pub mod backend;
pub mod broker;
pub mod config;
pub mod errors;
pub mod manager;
pub mod memory;

pub use backend::{LeaseBackend, normalize_revoke};
pub use broker::{BrokerBuilder, LeaseBroker};
pub use config::BrokerConfig;
pub use errors::{BackendError, LeaseError, Result};
pub use manager::{LeaseManager, LeaseRecord};
pub use memory::{IssuedToken, MemoryLeaseManager, MemoryTokenBackend};

pub use greentic_lease_spec as spec;
