//! Load-balancing strategies used by the RPC client.

use keyroute_ring::DigestAlgorithm;
use keyroute_types::{Address, AddressSnapshot, RpcRequest};

use crate::{BalanceConfig, BalanceError, SelectorCache};

/// Picks the address an outgoing call is sent to.
pub trait LoadBalance: Send + Sync {
    /// Select an address from `snapshot` for `request`.
    ///
    /// Rejects an empty snapshot and short-circuits a single-member one,
    /// delegating everything else to [`LoadBalance::do_select`].
    fn select_service_address(
        &self,
        snapshot: &AddressSnapshot,
        request: &RpcRequest,
    ) -> Result<Address, BalanceError> {
        match snapshot.addresses() {
            [] => Err(BalanceError::empty_address_list()),
            [only] => Ok(only.clone()),
            _ => self.do_select(snapshot, request),
        }
    }

    /// Strategy-specific selection among two or more addresses.
    fn do_select(
        &self,
        snapshot: &AddressSnapshot,
        request: &RpcRequest,
    ) -> Result<Address, BalanceError>;
}

/// Consistent-hash strategy: calls with the same service and arguments keep
/// landing on the same address while membership is unchanged.
pub struct ConsistentHashLoadBalance {
    cache: SelectorCache,
}

impl ConsistentHashLoadBalance {
    /// Create a balancer from configuration.
    ///
    /// Fails with [`BalanceError::Configuration`] when the replica count or
    /// digest algorithm is unusable.
    pub fn new(config: &BalanceConfig) -> Result<Self, BalanceError> {
        let algorithm = config.validate()?;
        Ok(Self {
            cache: SelectorCache::new(config.replicas, algorithm)?,
        })
    }

    /// Select the address for an explicit `service` and `key`.
    pub fn select(
        &self,
        service: &str,
        snapshot: &AddressSnapshot,
        key: &str,
    ) -> Result<Address, BalanceError> {
        self.cache.select(service, snapshot, key)
    }

    /// The underlying ring cache.
    pub fn cache(&self) -> &SelectorCache {
        &self.cache
    }

    /// Digest algorithm in use.
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.cache.algorithm()
    }
}

impl Default for ConsistentHashLoadBalance {
    fn default() -> Self {
        Self {
            cache: SelectorCache::new(keyroute_ring::DEFAULT_REPLICAS, DigestAlgorithm::Md5)
                .expect("default replica count is valid"),
        }
    }
}

impl LoadBalance for ConsistentHashLoadBalance {
    fn do_select(
        &self,
        snapshot: &AddressSnapshot,
        request: &RpcRequest,
    ) -> Result<Address, BalanceError> {
        self.cache.select(
            &request.rpc_service_name(),
            snapshot,
            &request.selection_key(),
        )
    }
}
