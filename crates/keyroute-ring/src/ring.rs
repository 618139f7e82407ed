//! Consistent hash ring implementation.

use std::collections::{BTreeMap, BTreeSet};

use keyroute_types::{Address, AddressSnapshot, SnapshotToken};
use tracing::{debug, trace};

use crate::RingError;
use crate::digest::{DigestAlgorithm, POSITIONS_PER_DIGEST, slice_to_u32};

/// Virtual nodes per address unless configured otherwise.
pub const DEFAULT_REPLICAS: u32 = 160;

/// Size of the circular position space.
const RING_SPAN: u64 = 1 << 32;

/// A key whose address differs between two ring states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    /// The selection key that moved.
    pub key: String,
    /// Address the key mapped to before.
    pub from: Address,
    /// Address the key maps to now.
    pub to: Address,
}

/// Immutable consistent hash ring for one address snapshot.
///
/// Every address is expanded into `replicas` virtual nodes on a `u32` ring.
/// A key is served by the first virtual node at or after its own position,
/// wrapping around past `u32::MAX`.
#[derive(Debug, Clone)]
pub struct HashRing {
    /// Virtual node positions: ring position -> address.
    vnodes: BTreeMap<u32, Address>,
    /// Snapshot this ring was built from.
    token: SnapshotToken,
    /// Virtual nodes requested per address.
    replicas: u32,
    algorithm: DigestAlgorithm,
    /// Distinct addresses on the ring.
    address_count: usize,
}

impl HashRing {
    /// Build a ring from a discovery snapshot using MD5.
    pub fn build(snapshot: &AddressSnapshot, replicas: u32) -> Result<Self, RingError> {
        Self::build_with(
            snapshot.addresses(),
            snapshot.token(),
            replicas,
            DigestAlgorithm::Md5,
        )
    }

    /// Build a ring from explicit parts.
    ///
    /// For every address, `replicas / 4` digests of `address ++ i` are
    /// computed and each digest contributes four positions. When two virtual
    /// nodes land on the same position the later one wins.
    pub fn build_with(
        addresses: &[Address],
        token: SnapshotToken,
        replicas: u32,
        algorithm: DigestAlgorithm,
    ) -> Result<Self, RingError> {
        if addresses.is_empty() {
            return Err(RingError::EmptyAddressList);
        }
        validate_replicas(replicas)?;

        let mut vnodes = BTreeMap::new();
        let mut collisions = 0usize;
        let groups = replicas / POSITIONS_PER_DIGEST as u32;

        for address in addresses {
            for i in 0..groups {
                let digest = algorithm.digest(format!("{address}{i}").as_bytes());
                for h in 0..POSITIONS_PER_DIGEST {
                    if place(&mut vnodes, slice_to_u32(&digest, h), address) {
                        collisions += 1;
                    }
                }
            }
        }

        let address_count = addresses.iter().collect::<BTreeSet<_>>().len();
        debug!(
            %token,
            addresses = address_count,
            vnodes = vnodes.len(),
            collisions,
            %algorithm,
            "built hash ring"
        );

        Ok(Self {
            vnodes,
            token,
            replicas,
            algorithm,
            address_count,
        })
    }

    /// Pick the address serving `key`.
    pub fn select(&self, key: &str) -> &Address {
        let position = self.algorithm.position(key);
        trace!(key, position, "selecting on ring");
        self.locate(position)
    }

    /// Return the address owning `position`: the first virtual node at or
    /// after it, or the lowest one when `position` is past the last.
    pub fn locate(&self, position: u32) -> &Address {
        self.vnodes
            .range(position..)
            .next()
            .or_else(|| self.vnodes.iter().next())
            .map(|(_, address)| address)
            .expect("hash ring is never empty")
    }

    /// Position `key` hashes to on this ring.
    pub fn position_of(&self, key: &str) -> u32 {
        self.algorithm.position(key)
    }

    /// Compute which keys change address between two ring states.
    pub fn diff<'a, I>(old: &HashRing, new: &HashRing, keys: I) -> Vec<Reassignment>
    where
        I: IntoIterator<Item = &'a str>,
    {
        keys.into_iter()
            .filter_map(|key| {
                let from = old.select(key);
                let to = new.select(key);
                (from != to).then(|| Reassignment {
                    key: key.to_string(),
                    from: from.clone(),
                    to: to.clone(),
                })
            })
            .collect()
    }

    /// Snapshot the ring was built from.
    pub fn token(&self) -> SnapshotToken {
        self.token
    }

    /// Virtual nodes requested per address.
    pub fn replicas(&self) -> u32 {
        self.replicas
    }

    /// Hash function used by this ring.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// Total number of virtual nodes actually on the ring.
    pub fn vnode_count(&self) -> usize {
        self.vnodes.len()
    }

    /// Number of distinct addresses on the ring.
    pub fn address_count(&self) -> usize {
        self.address_count
    }

    /// Virtual nodes owned by each address.
    pub fn vnode_counts(&self) -> BTreeMap<Address, usize> {
        let mut counts = BTreeMap::new();
        for address in self.vnodes.values() {
            *counts.entry(address.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Fraction of the position space owned by each address.
    ///
    /// A virtual node owns the arc between its predecessor (exclusive) and
    /// itself (inclusive). The fractions sum to 1.
    pub fn shares(&self) -> BTreeMap<Address, f64> {
        let mut shares = BTreeMap::new();
        let Some((&last, _)) = self.vnodes.iter().next_back() else {
            return shares;
        };

        let mut prev = last;
        for (&pos, address) in &self.vnodes {
            let arc = if self.vnodes.len() == 1 {
                RING_SPAN
            } else {
                (u64::from(pos) + RING_SPAN - u64::from(prev)) % RING_SPAN
            };
            *shares.entry(address.clone()).or_insert(0.0) += arc as f64 / RING_SPAN as f64;
            prev = pos;
        }
        shares
    }
}

/// Reject replica counts that cannot be split into whole digests.
pub fn validate_replicas(replicas: u32) -> Result<(), RingError> {
    if replicas == 0 || replicas % POSITIONS_PER_DIGEST as u32 != 0 {
        return Err(RingError::InvalidReplicaCount { replicas });
    }
    Ok(())
}

/// Insert a virtual node, overwriting any previous owner of `position`.
/// Returns whether a different address was displaced.
fn place(vnodes: &mut BTreeMap<u32, Address>, position: u32, address: &Address) -> bool {
    match vnodes.insert(position, address.clone()) {
        Some(previous) => previous != *address,
        None => false,
    }
}
