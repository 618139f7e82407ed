//! Ketama-style consistent hash ring.
//!
//! This crate maps selection keys to service addresses. Each address is
//! expanded into a fixed number of virtual nodes (160 by default) whose
//! positions on a `u32` ring come from slicing 128-bit digests of
//! `address ++ index` into four groups. A key is served by the first virtual
//! node at or after the position of its own digest, wrapping around the end
//! of the ring.
//!
//! Rings are built once per membership snapshot and never mutated, so a
//! single [`HashRing`] can be shared by any number of concurrent readers.
//! Adding or removing an address only moves the keys that land on that
//! address's virtual nodes.

pub mod digest;
mod error;
mod ring;

pub use digest::{DigestAlgorithm, DigestBytes, slice_to_u32};
pub use error::RingError;
pub use ring::{DEFAULT_REPLICAS, HashRing, Reassignment, validate_replicas};
