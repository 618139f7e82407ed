//! Consistent-hash load balancing for an RPC client.
//!
//! [`SelectorCache`] keeps one [`HashRing`](keyroute_ring::HashRing) per
//! service name and rebuilds it only when discovery hands over a snapshot
//! with a new token. [`ConsistentHashLoadBalance`] wraps the cache behind the
//! [`LoadBalance`] strategy trait, deriving the cache key and the selection
//! key from an [`RpcRequest`](keyroute_types::RpcRequest).

mod balancer;
mod cache;
mod config;
mod error;

pub use balancer::{ConsistentHashLoadBalance, LoadBalance};
pub use cache::SelectorCache;
pub use config::BalanceConfig;
pub use error::BalanceError;
