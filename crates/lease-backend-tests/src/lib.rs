//! Shared conformance suite for lease-issuing backends.
//! Intended for use in integration tests of backend crates.

mod capabilities;
mod contract;
mod suite;

pub use capabilities::*;
pub use contract::*;
pub use suite::*;
