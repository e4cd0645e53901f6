use thiserror::Error;

use crate::access::AccessError;
use crate::identity::Identity;
use crate::multihash::MultihashError;
use crate::registry::BalanceError;

/// Errors that can occur during registry operations
///
/// Every error rejects the whole call; no state is written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error(transparent)]
    Unauthorized(#[from] AccessError),

    #[error("Bid not found: {bidder} #{position}")]
    BidNotFound { bidder: Identity, position: u64 },

    #[error("Offer not found: {offerer} -> {bidder} offer #{offer_number}")]
    OfferNotFound {
        offerer: Identity,
        bidder: Identity,
        offer_number: u64,
    },

    #[error("Bid expired: {bidder} #{position}")]
    BidExpired { bidder: Identity, position: u64 },

    #[error("Bid already finalized: {bidder} #{position}")]
    AlreadyFinalized { bidder: Identity, position: u64 },

    #[error("Insufficient payment: offer requires {expected}, attached {attached}")]
    InsufficientPayment { expected: u64, attached: u64 },

    #[error("Invalid expiry: {0}")]
    InvalidExpiry(String),

    #[error("Invalid claim id: {0}")]
    Encoding(#[from] MultihashError),

    #[error("Registry is paused")]
    Paused,

    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    #[error("Offer limit reached: a bid accepts at most {limit} offers")]
    OfferLimitReached { limit: usize },

    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("Balance of {account} would overflow")]
    BalanceOverflow { account: Identity },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Inconsistent snapshot: {0}")]
    InconsistentSnapshot(String),
}

impl From<BalanceError> for RegistryError {
    fn from(err: BalanceError) -> Self {
        match err {
            BalanceError::InsufficientFunds {
                available,
                required,
                ..
            } => RegistryError::InsufficientFunds {
                available,
                required,
            },
            BalanceError::Overflow { account } => RegistryError::BalanceOverflow { account },
        }
    }
}
