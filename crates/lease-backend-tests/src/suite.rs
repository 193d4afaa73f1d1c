use crate::{BackendUnderTest, Capabilities};
use anyhow::{Context, Result, bail};
use greentic_lease_core::normalize_revoke;
use greentic_lease_spec::{AcceptedLease, Duration, LeaseId};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

/// Runs the shared lease contract checks against a backend.
pub struct ConformanceSuite<'a, B: BackendUnderTest> {
    backend_name: String,
    backend: &'a B,
    caps: Capabilities,
}

impl<'a, B: BackendUnderTest> ConformanceSuite<'a, B> {
    pub fn new(backend_name: impl Into<String>, backend: &'a B, caps: Capabilities) -> Self {
        Self {
            backend_name: backend_name.into(),
            backend,
            caps,
        }
    }

    pub async fn run(&self) -> Result<()> {
        let lease = self.issue_and_accept(self.caps.renew).await?;

        if self.caps.renew {
            self.check_renewal(&lease).await?;
        }

        self.check_revoke_idempotent(&lease).await?;
        Ok(())
    }

    async fn issue_and_accept(&self, renewable: bool) -> Result<AcceptedLease> {
        let name = &self.backend_name;
        let descriptor = self
            .backend
            .issue(renewable)
            .await
            .with_context(|| format!("issue failed for {name}"))?;
        descriptor
            .validate()
            .with_context(|| format!("{name} issued an invalid descriptor"))?;
        if descriptor.renewable != renewable {
            bail!("{name} ignored the requested renewability ({renewable})");
        }

        let lease_id = LeaseId::new(format!("{name}/{}", Uuid::new_v4().simple()))?;
        let lease = AcceptedLease::new(lease_id, descriptor, OffsetDateTime::now_utc())?;
        if !self.backend.exists(lease.internal_data()).await? {
            bail!("{name} issued a lease for a resource that does not exist");
        }
        debug!(lease_id = %lease.lease_id(), "conformance lease issued");
        Ok(lease)
    }

    async fn check_renewal(&self, lease: &AcceptedLease) -> Result<()> {
        let name = &self.backend_name;
        let increment = Duration::seconds(90);
        let response = self
            .backend
            .renew(lease.lease_id(), lease.renewal_request(Some(increment)))
            .await
            .with_context(|| format!("renew failed for {name}:{}", lease.lease_id()))?;
        // The increment is advisory. Any valid lease is an acceptable answer.
        response
            .validate()
            .with_context(|| format!("{name} renewed into an invalid descriptor"))?;

        // The issuance payload must still be enough to revoke.
        if !self.backend.exists(lease.internal_data()).await? {
            bail!("{name} lost the resource during renewal");
        }
        Ok(())
    }

    async fn check_revoke_idempotent(&self, lease: &AcceptedLease) -> Result<()> {
        let name = &self.backend_name;
        let first = normalize_revoke(
            self.backend
                .revoke(lease.lease_id(), lease.internal_data())
                .await,
        );
        if let Err(err) = &first {
            bail!("revoke failed for {name}:{}: {err}", lease.lease_id());
        }
        if self.backend.exists(lease.internal_data()).await? {
            bail!("{name} reported revoke success but the resource still exists");
        }

        let second = normalize_revoke(
            self.backend
                .revoke(lease.lease_id(), lease.internal_data())
                .await,
        );
        if second != first {
            bail!(
                "replayed revoke for {name}:{} reported {second:?} after {first:?}",
                lease.lease_id()
            );
        }
        Ok(())
    }
}
