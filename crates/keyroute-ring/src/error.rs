//! Error types for ring construction and hash primitive setup.

/// Errors that can occur while building a hash ring.
///
/// Variants fall into two categories: bad input presented at call time
/// ([`RingError::is_invalid_input`]) and fatal misconfiguration detected at
/// startup ([`RingError::is_configuration`]).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RingError {
    /// The address list was empty.
    #[error("cannot build a hash ring from an empty address list")]
    EmptyAddressList,

    /// The replica count is zero or not a multiple of 4.
    #[error("invalid replica count {replicas}: must be a positive multiple of 4")]
    InvalidReplicaCount {
        /// The rejected replica count.
        replicas: u32,
    },

    /// The configured digest algorithm is not available.
    #[error("unknown digest algorithm: {name:?} (expected \"md5\" or \"blake3\")")]
    UnknownDigest {
        /// The name that failed to parse.
        name: String,
    },
}

impl RingError {
    /// Whether the caller presented bad input for a single selection.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::EmptyAddressList)
    }

    /// Whether this error stems from configuration and can never succeed on retry.
    pub fn is_configuration(&self) -> bool {
        !self.is_invalid_input()
    }
}
