//! Shared test harness for keyroute integration tests.
//!
//! Provides [`FakeDiscovery`], a stand-in for the service registry that
//! hands out a new [`AddressSnapshot`] every time membership changes, plus
//! helpers for generating addresses and sample keys.

use std::sync::RwLock;

use keyroute_types::{Address, AddressSnapshot, RpcRequest};

/// Three-address membership used across tests.
pub const THREE: [&str; 3] = ["10.0.0.1:8080", "10.0.0.2:8080", "10.0.0.3:8080"];

/// `n` distinct `host:port` addresses.
pub fn addresses(n: usize) -> Vec<Address> {
    (0..n)
        .map(|i| Address::new(format!("10.1.{}.{}:9000", i / 250, i % 250 + 1)))
        .collect()
}

/// `n` distinct selection keys shaped like real request keys.
pub fn sample_keys(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| format!("com.shop.OrderService[{i}, user-{}]", i % 97))
        .collect()
}

/// A request for `com.shop.OrderService` with one parameter.
pub fn order_request(param: impl Into<String>) -> RpcRequest {
    RpcRequest::new("com.shop.OrderService", "get")
        .with_version("1.0")
        .with_param(param)
}

// =========================================================================
// Fake discovery
// =========================================================================

/// In-memory service registry for one service.
///
/// Every mutation publishes a fresh snapshot (new token), mimicking a
/// registry that replaces its address list instance on change.
pub struct FakeDiscovery {
    current: RwLock<AddressSnapshot>,
}

impl FakeDiscovery {
    /// Start with the given members.
    pub fn new<A: Into<Address>>(members: impl IntoIterator<Item = A>) -> Self {
        Self {
            current: RwLock::new(AddressSnapshot::new(members)),
        }
    }

    /// The snapshot currently published.
    pub fn snapshot(&self) -> AddressSnapshot {
        self.current.read().expect("discovery lock poisoned").clone()
    }

    /// Publish a new snapshot with `addr` appended.
    pub fn add(&self, addr: impl Into<Address>) {
        let mut current = self.current.write().expect("discovery lock poisoned");
        let mut members = current.addresses().to_vec();
        members.push(addr.into());
        *current = AddressSnapshot::new(members);
    }

    /// Publish a new snapshot without `addr`.
    pub fn remove(&self, addr: &str) {
        let mut current = self.current.write().expect("discovery lock poisoned");
        let members: Vec<Address> = current
            .addresses()
            .iter()
            .filter(|a| a.as_str() != addr)
            .cloned()
            .collect();
        *current = AddressSnapshot::new(members);
    }

    /// Publish a new snapshot with unchanged members.
    pub fn refresh(&self) {
        let mut current = self.current.write().expect("discovery lock poisoned");
        *current = AddressSnapshot::new(current.addresses().to_vec());
    }
}
