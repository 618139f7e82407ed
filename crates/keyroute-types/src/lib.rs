//! Shared types for keyroute.
//!
//! This crate defines the values exchanged between the selector and its
//! collaborators: service endpoints ([`Address`]), membership snapshots
//! handed over by discovery ([`AddressSnapshot`], [`SnapshotToken`]) and the
//! outgoing call descriptor ([`RpcRequest`]) the selection key is derived
//! from.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// An opaque service endpoint, usually `host:port`.
///
/// The selector never interprets the contents. Cloning is cheap: the string
/// is shared between every virtual node that points at it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Address(Arc<str>);

impl Address {
    /// Create an address from any string-like value.
    pub fn new(addr: impl AsRef<str>) -> Self {
        Self(Arc::from(addr.as_ref()))
    }

    /// Return the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Address {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&String> for Address {
    fn from(s: &String) -> Self {
        Self::new(s)
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0.to_string()
    }
}

impl PartialEq<str> for Address {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Address {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Source of fresh snapshot tokens. Zero is never handed out.
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Identity of one address-list instance.
///
/// Tokens are compared by identity, not by the contents of the list they
/// were issued for: two snapshots holding the same addresses under different
/// tokens are different memberships as far as the selector is concerned.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotToken(u64);

impl SnapshotToken {
    /// Mint a token that has never been returned before in this process.
    pub fn next() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }

    /// Wrap a token value issued by an external discovery layer.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Return the raw token value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SnapshotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Debug for SnapshotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotToken({})", self.0)
    }
}

/// An ordered address list as handed over by service discovery.
///
/// Each call to [`AddressSnapshot::new`] produces a new instance with a new
/// token, even if the addresses are identical to a previous snapshot.
/// Clones share both the list and the token.
#[derive(Clone, Debug)]
pub struct AddressSnapshot {
    token: SnapshotToken,
    addresses: Arc<[Address]>,
}

impl AddressSnapshot {
    /// Create a snapshot with a freshly minted token.
    pub fn new<I, A>(addresses: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Address>,
    {
        Self::with_token(SnapshotToken::next(), addresses)
    }

    /// Create a snapshot under a token chosen by the caller.
    pub fn with_token<I, A>(token: SnapshotToken, addresses: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Address>,
    {
        Self {
            token,
            addresses: addresses.into_iter().map(Into::into).collect(),
        }
    }

    /// The identity of this snapshot.
    pub fn token(&self) -> SnapshotToken {
        self.token
    }

    /// The addresses, in discovery order.
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Number of addresses.
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    /// Whether the snapshot holds no address at all.
    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Descriptor of an outgoing RPC call.
///
/// Only used to derive the cache key ([`RpcRequest::rpc_service_name`]) and
/// the selection key ([`RpcRequest::selection_key`]). Parameters arrive
/// already stringified; their meaning is not inspected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcRequest {
    /// Fully qualified interface name, e.g. `"com.shop.OrderService"`.
    pub interface_name: String,
    /// Method being invoked.
    pub method_name: String,
    /// Service group, distinguishes multiple implementations of one interface.
    pub group: String,
    /// Service version.
    pub version: String,
    /// Call arguments in declaration order.
    pub parameters: Vec<String>,
}

impl RpcRequest {
    /// Create a request for `interface_name` with no group, version or
    /// parameters.
    pub fn new(interface_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            interface_name: interface_name.into(),
            method_name: method_name.into(),
            ..Self::default()
        }
    }

    /// Set the service group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Set the service version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Append one call parameter.
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.parameters.push(param.into());
        self
    }

    /// The name the service is registered under: interface, group and
    /// version concatenated.
    pub fn rpc_service_name(&self) -> String {
        format!("{}{}{}", self.interface_name, self.group, self.version)
    }

    /// Key hashed onto the ring for this call.
    ///
    /// Calls to the same service with the same argument list produce the
    /// same key, so retries of an idempotent call land on the same address.
    pub fn selection_key(&self) -> String {
        format!(
            "{}[{}]",
            self.rpc_service_name(),
            self.parameters.join(", ")
        )
    }
}
