use serde::{Deserialize, Serialize};

use crate::claim::ClaimId;
use crate::identity::Identity;

/// Emitted by `register`; carries every stored field so indexers never re-read storage
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRegistered {
    pub who: Identity,
    pub position: u64,
    pub expiry_date: String,
    pub claim_id: ClaimId,
    pub amount: u64,
    pub tag: String,
}

/// Emitted by `offer`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferPlaced {
    pub offerer: Identity,
    pub bidder: Identity,
    pub bid_number: u64,
    pub offer_number: u64,
    pub value: u64,
}

/// Emitted by `finalize` after value moved to the offerer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferFinalized {
    pub bidder: Identity,
    pub offerer: Identity,
    pub bid_number: u64,
    pub offer_number: u64,
    pub value: u64,
}

/// Everything the registry reports to observers
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    BidRegistered(BidRegistered),
    OfferPlaced(OfferPlaced),
    OfferFinalized(OfferFinalized),
    OwnershipTransferred {
        previous_owner: Identity,
        new_owner: Identity,
    },
    Paused {
        by: Identity,
    },
    Unpaused {
        by: Identity,
    },
    Deposited {
        account: Identity,
        amount: u64,
    },
}
