//! Dataset bid registry
//!
//! Parties register time-bounded bids backed by a signed, content-addressed
//! claim over a dataset specification; others make offers against a bid; the
//! bidder finalizes exactly one offer, paying the offerer.
//!
//! - [`multihash`]: content addressing (SHA-256 multihash, base58)
//! - [`identity`]: account identities and signing keys
//! - [`claim`]: building and auditing signed claims
//! - [`access`]: single-owner gate for administrative operations
//! - [`registry`]: the bid/offer/finalize ledger
//! - [`storage`]: sled persistence used by the `bidreg` binary

pub mod access;
pub mod claim;
pub mod identity;
pub mod multihash;
pub mod registry;
pub mod storage;
