use crate::backend::{LeaseBackend, normalize_revoke};
use crate::config::BrokerConfig;
use crate::errors::{LeaseError, Result};
use crate::manager::{LeaseManager, LeaseRecord};
use crate::memory::MemoryLeaseManager;
use greentic_lease_spec::{AcceptedLease, Duration, LeaseDescriptor, LeaseId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builder for constructing [`LeaseBroker`] instances.
#[derive(Default)]
pub struct BrokerBuilder {
    config: BrokerConfig,
    manager: Option<Arc<dyn LeaseManager>>,
    backends: Vec<(String, Arc<dyn LeaseBackend>)>,
}

impl BrokerBuilder {
    /// Start from limits found in the environment (see [`BrokerConfig::from_env`]).
    pub fn from_env() -> Self {
        Self {
            config: BrokerConfig::from_env(),
            ..Self::default()
        }
    }

    /// Replace the configuration wholesale.
    pub fn config(mut self, config: BrokerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_lease_secs(mut self, secs: u64) -> Self {
        self.config.max_lease_secs = Some(secs.max(1));
        self
    }

    pub fn max_internal_data_bytes(mut self, limit: usize) -> Self {
        self.config.max_internal_data_bytes = Some(limit);
        self
    }

    /// Use a specific lease manager. Defaults to [`MemoryLeaseManager`].
    pub fn manager<M>(mut self, manager: M) -> Self
    where
        M: LeaseManager + 'static,
    {
        self.manager = Some(Arc::new(manager));
        self
    }

    /// Register a backend under the name that prefixes its lease ids.
    pub fn backend<B>(mut self, name: impl Into<String>, backend: B) -> Self
    where
        B: LeaseBackend + 'static,
    {
        self.backends.push((name.into(), Arc::new(backend)));
        self
    }

    pub fn build(self) -> Result<LeaseBroker> {
        if self.backends.is_empty() {
            return Err(LeaseError::Builder(
                "at least one backend must be registered".into(),
            ));
        }

        let mut backends = HashMap::with_capacity(self.backends.len());
        for (name, backend) in self.backends {
            validate_backend_name(&name)?;
            if backends.insert(name.clone(), backend).is_some() {
                return Err(LeaseError::Builder(format!(
                    "backend `{name}` registered twice"
                )));
            }
        }

        let manager = self
            .manager
            .unwrap_or_else(|| Arc::new(MemoryLeaseManager::new()));

        Ok(LeaseBroker {
            config: self.config,
            manager,
            backends,
        })
    }
}

fn validate_backend_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(LeaseError::Builder("backend name must not be empty".into()));
    }
    if !name
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '-' | '_' | '.'))
    {
        return Err(LeaseError::Builder(format!(
            "backend name contains invalid characters: {name}"
        )));
    }
    Ok(())
}

/// Enforces the lease contract between backends and the lease manager.
///
/// Every descriptor a backend produces, at issuance and on each renewal, is
/// validated here. A descriptor that fails is dropped in full and the
/// manager never sees it.
pub struct LeaseBroker {
    config: BrokerConfig,
    manager: Arc<dyn LeaseManager>,
    backends: HashMap<String, Arc<dyn LeaseBackend>>,
}

impl LeaseBroker {
    pub fn builder() -> BrokerBuilder {
        BrokerBuilder::from_env()
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Registered backend names, sorted.
    pub fn backend_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn lookup(&self, lease_id: &LeaseId) -> Result<Option<LeaseRecord>> {
        self.manager.lookup(lease_id)
    }

    /// Accept a freshly issued descriptor from `backend`.
    #[tracing::instrument(skip(self, descriptor))]
    pub fn issue(&self, backend: &str, descriptor: LeaseDescriptor) -> Result<AcceptedLease> {
        self.backend(backend)?;
        let descriptor = self.admit(backend, descriptor)?;
        let lease = self.manager.register(backend, descriptor)?;
        info!(
            lease_id = %lease.lease_id(),
            lease = %lease.descriptor().lease,
            grace = %lease.descriptor().lease_grace_period,
            renewable = lease.renewable(),
            "lease issued"
        );
        Ok(lease)
    }

    /// Extend a lease through its owning backend.
    ///
    /// Non-renewable leases are refused before the backend is called. On any
    /// failure the stored record is left as it was.
    #[tracing::instrument(skip(self, lease_id), fields(lease_id = %lease_id))]
    pub async fn renew(
        &self,
        lease_id: &LeaseId,
        requested_increment: Option<Duration>,
    ) -> Result<AcceptedLease> {
        let record = self
            .manager
            .lookup(lease_id)?
            .ok_or_else(|| LeaseError::UnknownLease(lease_id.clone()))?;
        if !record.lease.renewable() {
            warn!("renewal refused for non-renewable lease");
            return Err(LeaseError::NotRenewable(lease_id.clone()));
        }

        let backend = self.backend(&record.backend)?;
        let request = record.lease.renewal_request(requested_increment);
        let response = backend.renew(lease_id, request).await.map_err(|source| {
            warn!(backend = %record.backend, error = %source, "backend renewal failed");
            LeaseError::Backend {
                backend: record.backend.clone(),
                source,
            }
        })?;

        let descriptor = self.admit(&record.backend, response)?;
        let renewed = self.manager.replace(lease_id, descriptor)?;
        info!(
            lease = %renewed.descriptor().lease,
            renewable = renewed.renewable(),
            "lease renewed"
        );
        Ok(renewed)
    }

    /// Revoke a lease. Safe to call repeatedly for the same id.
    ///
    /// The record is only removed once the backend reports the resource torn
    /// down, so a failed revoke can be retried with the same payload.
    #[tracing::instrument(skip(self, lease_id), fields(lease_id = %lease_id))]
    pub async fn revoke(&self, lease_id: &LeaseId) -> Result<()> {
        let Some(record) = self.manager.lookup(lease_id)? else {
            debug!("no lease record; treating revoke as already done");
            return Ok(());
        };

        let backend = self.backend(&record.backend)?;
        normalize_revoke(backend.revoke(lease_id, record.lease.internal_data()).await).map_err(
            |source| {
                warn!(backend = %record.backend, error = %source, "backend revocation failed");
                LeaseError::Backend {
                    backend: record.backend.clone(),
                    source,
                }
            },
        )?;

        self.manager.remove(lease_id)?;
        info!(backend = %record.backend, "lease revoked");
        Ok(())
    }

    fn backend(&self, name: &str) -> Result<&Arc<dyn LeaseBackend>> {
        self.backends
            .get(name)
            .ok_or_else(|| LeaseError::UnknownBackend(name.to_string()))
    }

    fn admit(&self, backend: &str, mut descriptor: LeaseDescriptor) -> Result<LeaseDescriptor> {
        descriptor.validate().map_err(|source| {
            warn!(backend, error = %source, "rejected invalid lease descriptor");
            LeaseError::InvalidDescriptor {
                backend: backend.to_string(),
                source,
            }
        })?;

        if let Some(limit) = self.config.max_internal_data_bytes {
            let size = serde_json::to_vec(&descriptor.internal_data)?.len();
            if size > limit {
                warn!(backend, size, limit, "rejected oversized internal data");
                return Err(LeaseError::InternalDataTooLarge {
                    backend: backend.to_string(),
                    size,
                    limit,
                });
            }
        }

        if let Some(max) = self.config.max_lease() {
            if descriptor.lease > max {
                debug!(backend, requested = %descriptor.lease, %max, "lease shortened to ceiling");
                descriptor.lease = max;
            }
        }

        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTokenBackend;

    fn builder() -> BrokerBuilder {
        BrokerBuilder::default().backend("tokens", MemoryTokenBackend::new(Duration::minutes(5)))
    }

    #[test]
    fn build_requires_a_backend() {
        let err = BrokerBuilder::default().build().err().unwrap();
        assert!(err.to_string().contains("at least one backend"));
    }

    #[test]
    fn build_rejects_bad_or_duplicate_names() {
        let err = BrokerBuilder::default()
            .backend("Tokens/Prod", MemoryTokenBackend::new(Duration::minutes(1)))
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("invalid characters"));

        let err = builder()
            .backend("tokens", MemoryTokenBackend::new(Duration::minutes(1)))
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("registered twice"));
    }

    #[test]
    fn admit_shortens_to_ceiling() {
        let broker = builder().max_lease_secs(60).build().unwrap();
        let admitted = broker
            .admit("tokens", LeaseDescriptor::new(Duration::hours(2)))
            .unwrap();
        assert_eq!(admitted.lease, Duration::seconds(60));
    }

    #[test]
    fn issue_to_unknown_backend_fails() {
        let broker = builder().build().unwrap();
        let err = broker
            .issue("pki", LeaseDescriptor::new(Duration::seconds(1)))
            .unwrap_err();
        assert!(matches!(err, LeaseError::UnknownBackend(name) if name == "pki"));
    }
}
