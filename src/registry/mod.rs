// Registry module - THE BID LEDGER
// Bids, offers, and the single settlement step that pays an offerer

mod balances;
mod clock;
mod config;
mod error;
mod events;
mod model;
mod state;

pub use balances::{BalanceError, BalanceLedger, InMemoryBalances};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::RegistryConfig;
pub use error::RegistryError;
pub use events::{BidRegistered, OfferFinalized, OfferPlaced, RegistryEvent};
pub use model::{Bid, BidInfo, BidStatus, ExpiryDate, Offer, OfferKey};
pub use state::{BidRegistry, RegistrySnapshot, RegistryStatistics};
