use anyhow::Result;
use async_trait::async_trait;
use greentic_lease_core::LeaseBackend;
use greentic_lease_spec::{InternalData, LeaseDescriptor};

/// What a backend must expose to run the conformance suite.
#[async_trait]
pub trait BackendUnderTest: LeaseBackend {
    /// Mint a fresh secret and return its lease descriptor.
    async fn issue(&self, renewable: bool) -> Result<LeaseDescriptor>;

    /// Whether the resource referenced by `internal_data` still exists.
    async fn exists(&self, internal_data: &InternalData) -> Result<bool>;
}
