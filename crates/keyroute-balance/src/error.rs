//! Error types for load balancing.

use keyroute_ring::RingError;

/// Errors surfaced to the RPC client when no address can be selected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BalanceError {
    /// The caller presented input that cannot be served, such as an empty
    /// address list. Refresh discovery data before retrying.
    #[error("invalid input: {0}")]
    InvalidInput(RingError),

    /// The selector is misconfigured. Raised at construction, never retried.
    #[error("configuration error: {0}")]
    Configuration(RingError),
}

impl BalanceError {
    /// The error for an empty address list.
    pub fn empty_address_list() -> Self {
        Self::InvalidInput(RingError::EmptyAddressList)
    }
}

impl From<RingError> for BalanceError {
    fn from(err: RingError) -> Self {
        if err.is_invalid_input() {
            Self::InvalidInput(err)
        } else {
            Self::Configuration(err)
        }
    }
}
