//! Per-service cache of hash rings.
//!
//! Building a ring costs one digest per four virtual nodes, so rings are
//! kept per service name and reused for as long as discovery keeps handing
//! over the same snapshot. A snapshot with a different token replaces the
//! entry wholesale on the very next call; there is no explicit invalidation
//! signal and no eviction.
//!
//! Entries live in a sharded map, so lookups and per-key replacement never
//! contend on a process-wide lock. Two callers racing on a stale entry may
//! both build a ring for the same snapshot; the rings are equivalent and the
//! last insert wins.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use keyroute_ring::{DigestAlgorithm, HashRing, validate_replicas};
use keyroute_types::{Address, AddressSnapshot};
use tracing::debug;

use crate::BalanceError;

/// Thread-safe map from service name to the ring of its current snapshot.
pub struct SelectorCache {
    rings: DashMap<String, Arc<HashRing>>,
    replicas: u32,
    algorithm: DigestAlgorithm,
    /// Total ring constructions since creation.
    rings_built: AtomicU64,
}

impl SelectorCache {
    /// Create an empty cache whose rings use `replicas` virtual nodes per
    /// address.
    pub fn new(replicas: u32, algorithm: DigestAlgorithm) -> Result<Self, BalanceError> {
        validate_replicas(replicas).map_err(BalanceError::Configuration)?;
        Ok(Self {
            rings: DashMap::new(),
            replicas,
            algorithm,
            rings_built: AtomicU64::new(0),
        })
    }

    /// Select the address for `key` among the members of `snapshot`.
    ///
    /// Reuses the cached ring of `service` when it was built from the same
    /// snapshot token, otherwise builds and publishes a new one first.
    pub fn select(
        &self,
        service: &str,
        snapshot: &AddressSnapshot,
        key: &str,
    ) -> Result<Address, BalanceError> {
        let ring = self.ring_for(service, snapshot)?;
        Ok(ring.select(key).clone())
    }

    /// Return the ring for `service` matching `snapshot`, building it if the
    /// cached one is absent or stale.
    pub fn ring_for(
        &self,
        service: &str,
        snapshot: &AddressSnapshot,
    ) -> Result<Arc<HashRing>, BalanceError> {
        if snapshot.is_empty() {
            return Err(BalanceError::empty_address_list());
        }

        if let Some(ring) = self.rings.get(service) {
            if ring.token() == snapshot.token() {
                return Ok(Arc::clone(&ring));
            }
        }

        let ring = Arc::new(HashRing::build_with(
            snapshot.addresses(),
            snapshot.token(),
            self.replicas,
            self.algorithm,
        )?);
        self.rings_built.fetch_add(1, Ordering::Relaxed);

        match self.rings.insert(service.to_string(), Arc::clone(&ring)) {
            Some(old) => debug!(
                service,
                from = %old.token(),
                to = %ring.token(),
                "snapshot changed, replaced hash ring"
            ),
            None => debug!(service, token = %ring.token(), "cached hash ring for new service"),
        }

        Ok(ring)
    }

    /// The ring currently cached for `service`, if any.
    pub fn get(&self, service: &str) -> Option<Arc<HashRing>> {
        self.rings.get(service).map(|ring| Arc::clone(&ring))
    }

    /// Number of services with a cached ring.
    pub fn len(&self) -> usize {
        self.rings.len()
    }

    /// Whether no ring has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    /// How many rings have been built over the cache's lifetime.
    pub fn rings_built(&self) -> u64 {
        self.rings_built.load(Ordering::Relaxed)
    }

    /// Virtual nodes per address used for new rings.
    pub fn replicas(&self) -> u32 {
        self.replicas
    }

    /// Digest algorithm used for new rings.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }
}
