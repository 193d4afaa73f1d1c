use crate::backend::LeaseBackend;
use crate::errors::{BackendError, LeaseError, Result};
use crate::manager::{LeaseManager, LeaseRecord};
use async_trait::async_trait;
use greentic_lease_spec::{
    AcceptedLease, Duration, InternalData, LeaseDescriptor, LeaseId, RenewalRequest,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

/// In-memory lease manager suitable for embedded usage and tests.
///
/// Records are held in their persisted JSON encoding and decoded on every
/// read, so stored payloads go through the same round trip a durable store
/// would apply.
#[derive(Default)]
pub struct MemoryLeaseManager {
    state: Mutex<HashMap<LeaseId, Vec<u8>>>,
}

impl MemoryLeaseManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers of every tracked lease, sorted.
    pub fn lease_ids(&self) -> Result<Vec<LeaseId>> {
        let guard = self.state()?;
        let mut ids: Vec<LeaseId> = guard.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn state(&self) -> Result<MutexGuard<'_, HashMap<LeaseId, Vec<u8>>>> {
        self.state
            .lock()
            .map_err(|_| LeaseError::Manager("lease store lock poisoned".into()))
    }
}

fn decode(bytes: &[u8]) -> Result<LeaseRecord> {
    Ok(serde_json::from_slice(bytes)?)
}

impl LeaseManager for MemoryLeaseManager {
    fn register(&self, backend: &str, descriptor: LeaseDescriptor) -> Result<AcceptedLease> {
        let lease_id = LeaseId::new(format!("{backend}/{}", Uuid::new_v4().simple()))?;
        let lease = AcceptedLease::new(lease_id.clone(), descriptor, OffsetDateTime::now_utc())?;
        let record = LeaseRecord {
            backend: backend.to_string(),
            lease,
        };
        let bytes = serde_json::to_vec(&record)?;
        self.state()?.insert(lease_id.clone(), bytes);
        debug!(%lease_id, backend, "lease record stored");
        Ok(record.lease)
    }

    fn lookup(&self, lease_id: &LeaseId) -> Result<Option<LeaseRecord>> {
        let guard = self.state()?;
        guard.get(lease_id).map(|bytes| decode(bytes)).transpose()
    }

    fn replace(&self, lease_id: &LeaseId, descriptor: LeaseDescriptor) -> Result<AcceptedLease> {
        let mut guard = self.state()?;
        let bytes = guard
            .get(lease_id)
            .ok_or_else(|| LeaseError::UnknownLease(lease_id.clone()))?;
        let current = decode(bytes)?;
        let record = LeaseRecord {
            lease: current.lease.renewed(descriptor, OffsetDateTime::now_utc())?,
            backend: current.backend,
        };
        guard.insert(lease_id.clone(), serde_json::to_vec(&record)?);
        debug!(%lease_id, "lease record replaced");
        Ok(record.lease)
    }

    fn remove(&self, lease_id: &LeaseId) -> Result<Option<LeaseRecord>> {
        let removed = self.state()?.remove(lease_id);
        removed.map(|bytes| decode(&bytes)).transpose()
    }
}

/// Reference backend that mints opaque bearer tokens.
///
/// Only the token id is embedded in `internal_data`, so a revoke can be
/// replayed after the token is gone.
pub struct MemoryTokenBackend {
    tokens: Mutex<HashMap<String, String>>,
    default_ttl: Duration,
    max_ttl: Option<Duration>,
    grace_period: Duration,
}

/// Secret material returned to the caller alongside its lease descriptor.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub descriptor: LeaseDescriptor,
}

#[derive(Serialize, Deserialize)]
struct TokenRef {
    token_id: String,
}

impl MemoryTokenBackend {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            default_ttl,
            max_ttl: None,
            grace_period: Duration::ZERO,
        }
    }

    pub fn with_max_ttl(mut self, max_ttl: Duration) -> Self {
        self.max_ttl = Some(max_ttl);
        self
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Mint a token and describe its lease.
    pub fn issue(&self, renewable: bool) -> std::result::Result<IssuedToken, BackendError> {
        let token_id = Uuid::new_v4().simple().to_string();
        let token = random_token();
        self.tokens()?.insert(token_id.clone(), token.clone());

        let internal_data = InternalData::from_serializable(&TokenRef {
            token_id: token_id.clone(),
        })?;
        let descriptor = LeaseDescriptor::new(self.default_ttl)
            .with_grace_period(self.grace_period)
            .with_renewable(renewable)
            .with_internal_data(internal_data);
        debug!(%token_id, renewable, "token issued");
        Ok(IssuedToken { token, descriptor })
    }

    pub fn is_live(&self, internal_data: &InternalData) -> bool {
        let Ok(token_ref) = internal_data.to_typed::<TokenRef>() else {
            return false;
        };
        self.tokens()
            .map(|tokens| tokens.contains_key(&token_ref.token_id))
            .unwrap_or(false)
    }

    pub fn live_tokens(&self) -> usize {
        self.tokens().map(|tokens| tokens.len()).unwrap_or(0)
    }

    fn tokens(&self) -> std::result::Result<MutexGuard<'_, HashMap<String, String>>, BackendError> {
        self.tokens
            .lock()
            .map_err(|_| BackendError::Failed("token store lock poisoned".into()))
    }
}

#[async_trait]
impl LeaseBackend for MemoryTokenBackend {
    async fn renew(
        &self,
        lease_id: &LeaseId,
        request: RenewalRequest,
    ) -> std::result::Result<LeaseDescriptor, BackendError> {
        let token_ref: TokenRef = request.internal_data().to_typed()?;
        if !self.tokens()?.contains_key(&token_ref.token_id) {
            return Err(BackendError::Gone);
        }
        let lease = request.granted_lease(self.default_ttl, self.max_ttl);
        debug!(%lease_id, token_id = %token_ref.token_id, %lease, "token renewed");
        Ok(request.respond(lease))
    }

    async fn revoke(
        &self,
        lease_id: &LeaseId,
        internal_data: &InternalData,
    ) -> std::result::Result<(), BackendError> {
        let token_ref: TokenRef = internal_data.to_typed()?;
        match self.tokens()?.remove(&token_ref.token_id) {
            Some(_) => debug!(%lease_id, token_id = %token_ref.token_id, "token revoked"),
            None => debug!(%lease_id, token_id = %token_ref.token_id, "token already revoked"),
        }
        Ok(())
    }
}

fn random_token() -> String {
    let mut buf = [0u8; 24];
    rand::rng().fill_bytes(&mut buf);
    buf.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manager_assigns_backend_scoped_ids() {
        let manager = MemoryLeaseManager::new();
        let descriptor = LeaseDescriptor::new(Duration::seconds(30));
        let lease = manager.register("tokens", descriptor.clone()).unwrap();

        assert!(lease.lease_id().as_str().starts_with("tokens/"));
        assert_eq!(lease.descriptor(), &descriptor);

        let record = manager.lookup(lease.lease_id()).unwrap().unwrap();
        assert_eq!(record.backend, "tokens");
        assert_eq!(record.lease, lease);
    }

    #[test]
    fn stored_payload_keeps_exact_floats() {
        let manager = MemoryLeaseManager::new();
        let data = InternalData::new()
            .with("ratio", 1.0715660391465826e-75)
            .with("tiny", 5e-324)
            .with("serial", u64::MAX);
        let lease = manager
            .register(
                "tokens",
                LeaseDescriptor::new(Duration::seconds(30)).with_internal_data(data.clone()),
            )
            .unwrap();

        let record = manager.lookup(lease.lease_id()).unwrap().unwrap();
        assert_eq!(record.lease.internal_data(), &data);

        let renewed = manager
            .replace(
                lease.lease_id(),
                LeaseDescriptor::new(Duration::seconds(60)).with_internal_data(data.clone()),
            )
            .unwrap();
        assert_eq!(renewed.internal_data(), &data);
        let removed = manager.remove(lease.lease_id()).unwrap().unwrap();
        assert_eq!(removed.lease.internal_data(), &data);
    }

    #[test]
    fn replace_requires_existing_record() {
        let manager = MemoryLeaseManager::new();
        let missing = LeaseId::new("tokens/none").unwrap();
        let err = manager
            .replace(&missing, LeaseDescriptor::new(Duration::seconds(1)))
            .unwrap_err();
        assert!(matches!(err, LeaseError::UnknownLease(_)));
    }

    #[test]
    fn remove_returns_record_once() {
        let manager = MemoryLeaseManager::new();
        let lease = manager
            .register("tokens", LeaseDescriptor::new(Duration::seconds(1)))
            .unwrap();
        assert!(manager.remove(lease.lease_id()).unwrap().is_some());
        assert!(manager.remove(lease.lease_id()).unwrap().is_none());
        assert!(manager.lease_ids().unwrap().is_empty());
    }

    #[test]
    fn issued_payload_holds_only_the_token_id() {
        let backend = MemoryTokenBackend::new(Duration::minutes(5));
        let issued = backend.issue(true).unwrap();
        let keys: Vec<&str> = issued.descriptor.internal_data.keys().collect();
        assert_eq!(keys, vec!["token_id"]);
        assert!(!serde_json::to_string(&issued.descriptor)
            .unwrap()
            .contains(&issued.token));
        assert!(issued.descriptor.validate().is_ok());
        assert!(backend.is_live(&issued.descriptor.internal_data));
    }
}
