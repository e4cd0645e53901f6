// Bid Registry - the bid/offer/finalize state machine
//
// Every public mutating call validates first and writes last, so a rejected
// call leaves bids, offers and balances exactly as they were.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::access::AccessControl;
use crate::claim::ClaimId;
use crate::identity::Identity;
use crate::registry::{
    BalanceLedger, Bid, BidInfo, BidRegistered, BidStatus, Clock, ExpiryDate, Offer,
    OfferFinalized, OfferKey, OfferPlaced, RegistryConfig, RegistryError, RegistryEvent,
};

/// Offer numbers count per (offerer, bidder)
type OfferPair = (Identity, Identity);

/// Serializable registry state (balances live in the BalanceLedger)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    access: AccessControl,
    paused: bool,
    bids: Vec<Bid>,
    offers: Vec<Offer>,
}

/// Statistics about the registry
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistryStatistics {
    pub bidders: usize,
    pub bids: usize,
    pub finalized_bids: usize,
    pub offers: usize,
    pub total_settled_value: u64,
}

/// The bid ledger
pub struct BidRegistry<B: BalanceLedger, C: Clock> {
    config: RegistryConfig,
    access: AccessControl,
    paused: bool,
    /// Bids per bidder, indexed by position
    bids: HashMap<Identity, Vec<Bid>>,
    /// Offers per (offerer, bidder), indexed by offer number
    offers: HashMap<OfferPair, Vec<Offer>>,
    balances: B,
    clock: C,
    events: Vec<RegistryEvent>,
}

impl<B: BalanceLedger, C: Clock> BidRegistry<B, C> {
    /// Create an empty registry owned by the initializing caller
    pub fn new(
        owner: Identity,
        config: RegistryConfig,
        balances: B,
        clock: C,
    ) -> Result<Self, RegistryError> {
        config.validate()?;
        info!(%owner, "bid registry initialized");
        Ok(Self {
            config,
            access: AccessControl::new(owner),
            paused: false,
            bids: HashMap::new(),
            offers: HashMap::new(),
            balances,
            clock,
            events: Vec::new(),
        })
    }

    /// Restore a registry from a snapshot.
    ///
    /// Rejects snapshots whose numbering or cross references would make
    /// position-indexed lookups return the wrong record.
    pub fn from_snapshot(
        snapshot: RegistrySnapshot,
        config: RegistryConfig,
        balances: B,
        clock: C,
    ) -> Result<Self, RegistryError> {
        config.validate()?;

        let mut bids: HashMap<Identity, Vec<Bid>> = HashMap::new();
        for bid in snapshot.bids {
            bids.entry(bid.bidder().clone()).or_default().push(bid);
        }
        for list in bids.values_mut() {
            list.sort_by_key(|b| b.position());
        }

        let mut offers: HashMap<OfferPair, Vec<Offer>> = HashMap::new();
        for offer in snapshot.offers {
            offers
                .entry((offer.offerer().clone(), offer.bidder().clone()))
                .or_default()
                .push(offer);
        }
        for list in offers.values_mut() {
            list.sort_by_key(|o| o.offer_number());
        }

        check_snapshot(&bids, &offers)?;

        Ok(Self {
            config,
            access: snapshot.access,
            paused: snapshot.paused,
            bids,
            offers,
            balances,
            clock,
            events: Vec::new(),
        })
    }

    /// Export the registry state
    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut bids: Vec<Bid> = self.bids.values().flatten().cloned().collect();
        bids.sort_by(|a, b| {
            (a.bidder(), a.position()).cmp(&(b.bidder(), b.position()))
        });
        let mut offers: Vec<Offer> = self.offers.values().flatten().cloned().collect();
        offers.sort_by(|a, b| {
            (a.offerer(), a.bidder(), a.offer_number()).cmp(&(
                b.offerer(),
                b.bidder(),
                b.offer_number(),
            ))
        });
        RegistrySnapshot {
            access: self.access.clone(),
            paused: self.paused,
            bids,
            offers,
        }
    }

    // ========================================================================
    // BID / OFFER / FINALIZE
    // ========================================================================

    /// Register a bid from its external textual form.
    ///
    /// `expiry_date` is ISO-8601, `claim_id` a base58 multihash.
    pub fn register(
        &mut self,
        caller: &Identity,
        expiry_date: &str,
        claim_id: &str,
        amount: u64,
        tag: &str,
    ) -> Result<BidRegistered, RegistryError> {
        let parsed = ExpiryDate::parse(expiry_date)
            .and_then(|expiry| Ok((expiry, claim_id.parse::<ClaimId>()?)));
        match parsed {
            Ok((expiry, claim_id)) => self.register_bid(caller, expiry, claim_id, amount, tag),
            Err(e) => {
                warn!(bidder = %caller, error = %e, "register rejected");
                Err(e)
            }
        }
    }

    /// Register a bid at the caller's next free position
    pub fn register_bid(
        &mut self,
        caller: &Identity,
        expiry: ExpiryDate,
        claim_id: ClaimId,
        amount: u64,
        tag: &str,
    ) -> Result<BidRegistered, RegistryError> {
        let result = self.try_register(caller, expiry, claim_id, amount, tag);
        if let Err(ref e) = result {
            warn!(bidder = %caller, error = %e, "register rejected");
        }
        result
    }

    fn try_register(
        &mut self,
        caller: &Identity,
        expiry: ExpiryDate,
        claim_id: ClaimId,
        amount: u64,
        tag: &str,
    ) -> Result<BidRegistered, RegistryError> {
        self.ensure_not_paused()?;
        self.validate_tag(tag)?;

        let now = self.clock.now();
        if expiry.at() <= now {
            return Err(RegistryError::InvalidExpiry(format!(
                "{} is not after ledger time {}",
                expiry,
                now.to_rfc3339()
            )));
        }

        let list = self.bids.entry(caller.clone()).or_default();
        let position = list.len() as u64;
        let bid = Bid::new(
            caller.clone(),
            position,
            expiry,
            claim_id,
            amount,
            tag.to_string(),
        );

        let event = BidRegistered {
            who: caller.clone(),
            position,
            expiry_date: bid.expiry().as_str().to_string(),
            claim_id: bid.claim_id().clone(),
            amount,
            tag: bid.tag().to_string(),
        };
        list.push(bid);

        info!(
            bidder = %caller,
            position,
            claim_id = %event.claim_id,
            amount,
            tag = %event.tag,
            "bid registered"
        );
        self.events.push(RegistryEvent::BidRegistered(event.clone()));
        Ok(event)
    }

    /// Place an offer against `bidder`'s bid at `bid_number`.
    ///
    /// Any caller may submit on behalf of `offerer`. No value moves here.
    pub fn offer(
        &mut self,
        caller: &Identity,
        offerer: &Identity,
        bidder: &Identity,
        bid_number: u64,
        value: u64,
    ) -> Result<OfferPlaced, RegistryError> {
        let result = self.try_offer(offerer, bidder, bid_number, value);
        match result {
            Ok(ref placed) => debug!(
                %caller,
                offer_number = placed.offer_number,
                "offer submitted"
            ),
            Err(ref e) => warn!(
                %caller,
                %offerer,
                %bidder,
                bid_number,
                error = %e,
                "offer rejected"
            ),
        }
        result
    }

    fn try_offer(
        &mut self,
        offerer: &Identity,
        bidder: &Identity,
        bid_number: u64,
        value: u64,
    ) -> Result<OfferPlaced, RegistryError> {
        self.ensure_not_paused()?;

        let now = self.clock.now();
        let limit = self.config.max_offers_per_bid;
        let bid = self.bid_ref(bidder, bid_number)?;
        if bid.is_finalized() {
            return Err(RegistryError::AlreadyFinalized {
                bidder: bidder.clone(),
                position: bid_number,
            });
        }
        if bid.is_expired_at(now) {
            return Err(RegistryError::BidExpired {
                bidder: bidder.clone(),
                position: bid_number,
            });
        }
        if bid.offers().len() >= limit {
            return Err(RegistryError::OfferLimitReached { limit });
        }

        let list = self
            .offers
            .entry((offerer.clone(), bidder.clone()))
            .or_default();
        let offer_number = list.len() as u64;
        let offer = Offer::new(
            offerer.clone(),
            bidder.clone(),
            bid_number,
            offer_number,
            value,
        );
        let key = offer.key();
        list.push(offer);

        // The bid was found above and nothing removes bids
        if let Some(bid) = self
            .bids
            .get_mut(bidder)
            .and_then(|l| l.get_mut(bid_number as usize))
        {
            bid.push_offer(key);
        }

        let event = OfferPlaced {
            offerer: offerer.clone(),
            bidder: bidder.clone(),
            bid_number,
            offer_number,
            value,
        };
        info!(%offerer, %bidder, bid_number, offer_number, value, "offer placed");
        self.events.push(RegistryEvent::OfferPlaced(event.clone()));
        Ok(event)
    }

    /// Settle an offer on one of the caller's own bids.
    ///
    /// `attached` is the value sent with the call; it must equal the offer's
    /// value and is moved from the caller to `offerer`. At most one offer per
    /// bid is ever settled.
    pub fn finalize(
        &mut self,
        caller: &Identity,
        offerer: &Identity,
        bid_number: u64,
        offer_number: u64,
        attached: u64,
    ) -> Result<OfferFinalized, RegistryError> {
        let result = self.try_finalize(caller, offerer, bid_number, offer_number, attached);
        if let Err(ref e) = result {
            warn!(
                bidder = %caller,
                %offerer,
                bid_number,
                offer_number,
                attached,
                error = %e,
                "finalize rejected"
            );
        }
        result
    }

    fn try_finalize(
        &mut self,
        caller: &Identity,
        offerer: &Identity,
        bid_number: u64,
        offer_number: u64,
        attached: u64,
    ) -> Result<OfferFinalized, RegistryError> {
        self.ensure_not_paused()?;

        let pair = (offerer.clone(), caller.clone());
        let offer = self
            .offers
            .get(&pair)
            .and_then(|list| list.get(offer_number as usize))
            .filter(|offer| offer.bid_number() == bid_number)
            .ok_or_else(|| RegistryError::OfferNotFound {
                offerer: offerer.clone(),
                bidder: caller.clone(),
                offer_number,
            })?;
        let value = offer.value();

        let now = self.clock.now();
        let bid = self.bid_ref(caller, bid_number)?;
        if bid.is_finalized() {
            return Err(RegistryError::AlreadyFinalized {
                bidder: caller.clone(),
                position: bid_number,
            });
        }
        if bid.is_expired_at(now) {
            return Err(RegistryError::BidExpired {
                bidder: caller.clone(),
                position: bid_number,
            });
        }
        if attached != value {
            return Err(RegistryError::InsufficientPayment {
                expected: value,
                attached,
            });
        }

        // Only fallible write; flags below cannot fail once it succeeds
        self.balances.transfer(caller, offerer, attached)?;

        if let Some(bid) = self
            .bids
            .get_mut(caller)
            .and_then(|l| l.get_mut(bid_number as usize))
        {
            bid.mark_finalized();
        }
        if let Some(offer) = self
            .offers
            .get_mut(&pair)
            .and_then(|l| l.get_mut(offer_number as usize))
        {
            offer.mark_settled();
        }

        let event = OfferFinalized {
            bidder: caller.clone(),
            offerer: offerer.clone(),
            bid_number,
            offer_number,
            value,
        };
        info!(bidder = %caller, %offerer, bid_number, offer_number, value, "offer finalized");
        self.events.push(RegistryEvent::OfferFinalized(event.clone()));
        Ok(event)
    }

    // ========================================================================
    // ADMINISTRATION (owner-gated)
    // ========================================================================

    pub fn owner(&self) -> &Identity {
        self.access.owner()
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Identity,
        new_owner: Identity,
    ) -> Result<(), RegistryError> {
        let previous_owner = self.access.transfer_ownership(caller, new_owner.clone())?;
        info!(%previous_owner, %new_owner, "ownership transferred");
        self.events.push(RegistryEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        });
        Ok(())
    }

    /// Stop register/offer/finalize until `unpause`
    pub fn pause(&mut self, caller: &Identity) -> Result<(), RegistryError> {
        self.access.require_owner(caller)?;
        if !self.paused {
            self.paused = true;
            warn!(by = %caller, "registry paused");
            self.events.push(RegistryEvent::Paused { by: caller.clone() });
        }
        Ok(())
    }

    pub fn unpause(&mut self, caller: &Identity) -> Result<(), RegistryError> {
        self.access.require_owner(caller)?;
        if self.paused {
            self.paused = false;
            info!(by = %caller, "registry unpaused");
            self.events.push(RegistryEvent::Unpaused { by: caller.clone() });
        }
        Ok(())
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Credit an account on the balance ledger (faucet for local deployments)
    pub fn deposit(
        &mut self,
        caller: &Identity,
        account: &Identity,
        amount: u64,
    ) -> Result<(), RegistryError> {
        self.access.require_owner(caller)?;
        self.balances.credit(account, amount)?;
        info!(%account, amount, "deposit credited");
        self.events.push(RegistryEvent::Deposited {
            account: account.clone(),
            amount,
        });
        Ok(())
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// (expiry, claim id, amount, tag) of a bid
    pub fn bidinfo(&self, bidder: &Identity, position: u64) -> Result<BidInfo, RegistryError> {
        debug!(%bidder, position, "bidinfo");
        self.bid_ref(bidder, position).map(Bid::info)
    }

    pub fn bid(&self, bidder: &Identity, position: u64) -> Result<Bid, RegistryError> {
        self.bid_ref(bidder, position).cloned()
    }

    pub fn bid_status(&self, bidder: &Identity, position: u64) -> Result<BidStatus, RegistryError> {
        let now = self.clock.now();
        self.bid_ref(bidder, position).map(|b| b.status_at(now))
    }

    /// Number of bids `bidder` has registered (also their next position)
    pub fn bid_count(&self, bidder: &Identity) -> u64 {
        self.bids.get(bidder).map(|l| l.len() as u64).unwrap_or(0)
    }

    pub fn offer_info(
        &self,
        offerer: &Identity,
        bidder: &Identity,
        offer_number: u64,
    ) -> Result<Offer, RegistryError> {
        self.offers
            .get(&(offerer.clone(), bidder.clone()))
            .and_then(|l| l.get(offer_number as usize))
            .cloned()
            .ok_or_else(|| RegistryError::OfferNotFound {
                offerer: offerer.clone(),
                bidder: bidder.clone(),
                offer_number,
            })
    }

    /// All offers against one bid, in arrival order
    pub fn offers_for_bid(
        &self,
        bidder: &Identity,
        position: u64,
    ) -> Result<Vec<Offer>, RegistryError> {
        let bid = self.bid_ref(bidder, position)?;
        Ok(bid
            .offers()
            .iter()
            .filter_map(|OfferKey { offerer, offer_number }| {
                self.offers
                    .get(&(offerer.clone(), bidder.clone()))
                    .and_then(|l| l.get(*offer_number as usize))
                    .cloned()
            })
            .collect())
    }

    pub fn balance_of(&self, account: &Identity) -> u64 {
        self.balances.balance_of(account)
    }

    pub fn balances(&self) -> &B {
        &self.balances
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn statistics(&self) -> RegistryStatistics {
        let all_bids = self.bids.values().flatten();
        let settled = self.offers.values().flatten().filter(|o| o.is_settled());
        RegistryStatistics {
            bidders: self.bids.len(),
            bids: self.bids.values().map(Vec::len).sum(),
            finalized_bids: all_bids.filter(|b| b.is_finalized()).count(),
            offers: self.offers.values().map(Vec::len).sum(),
            total_settled_value: settled.fold(0u64, |acc, o| acc.saturating_add(o.value())),
        }
    }

    /// Drain queued events
    pub fn poll_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn ensure_not_paused(&self) -> Result<(), RegistryError> {
        if self.paused {
            return Err(RegistryError::Paused);
        }
        Ok(())
    }

    fn validate_tag(&self, tag: &str) -> Result<(), RegistryError> {
        if tag.is_empty() {
            return Err(RegistryError::InvalidTag("tag cannot be empty".into()));
        }
        if tag.len() > self.config.max_tag_len {
            return Err(RegistryError::InvalidTag(format!(
                "tag is {} bytes, limit is {}",
                tag.len(),
                self.config.max_tag_len
            )));
        }
        Ok(())
    }

    fn bid_ref(&self, bidder: &Identity, position: u64) -> Result<&Bid, RegistryError> {
        self.bids
            .get(bidder)
            .and_then(|l| l.get(position as usize))
            .ok_or_else(|| RegistryError::BidNotFound {
                bidder: bidder.clone(),
                position,
            })
    }
}

/// Positions and offer numbers run 0..n, every offer belongs to an existing
/// bid that lists it, and a bid is finalized iff exactly one of its offers settled.
fn check_snapshot(
    bids: &HashMap<Identity, Vec<Bid>>,
    offers: &HashMap<OfferPair, Vec<Offer>>,
) -> Result<(), RegistryError> {
    let inconsistent = |msg: String| -> Result<(), RegistryError> {
        Err(RegistryError::InconsistentSnapshot(msg))
    };

    for (bidder, list) in bids {
        for (index, bid) in list.iter().enumerate() {
            if bid.position() != index as u64 {
                return inconsistent(format!(
                    "bids of {} are not numbered 0..{} (found #{} at index {})",
                    bidder,
                    list.len(),
                    bid.position(),
                    index
                ));
            }
        }
    }

    let find_offer = |offerer: &Identity, bidder: &Identity, number: u64| {
        offers
            .get(&(offerer.clone(), bidder.clone()))
            .and_then(|l| l.get(number as usize))
    };

    let mut listed = HashSet::new();
    for (bidder, list) in bids {
        for bid in list {
            let mut settled = 0usize;
            for OfferKey {
                offerer,
                offer_number,
            } in bid.offers()
            {
                if !listed.insert((offerer, bidder, *offer_number)) {
                    return inconsistent(format!(
                        "offer {} #{} is listed twice",
                        offerer, offer_number
                    ));
                }
                match find_offer(offerer, bidder, *offer_number) {
                    Some(offer) if offer.bid_number() == bid.position() => {
                        settled += usize::from(offer.is_settled());
                    }
                    _ => {
                        return inconsistent(format!(
                            "bid {} #{} lists missing offer {} #{}",
                            bidder,
                            bid.position(),
                            offerer,
                            offer_number
                        ));
                    }
                }
            }

            let expected = usize::from(bid.is_finalized());
            if settled != expected {
                return inconsistent(format!(
                    "bid {} #{} has {} settled offers, finalized={}",
                    bidder,
                    bid.position(),
                    settled,
                    bid.is_finalized()
                ));
            }
        }
    }

    let mut total = 0usize;
    for ((offerer, bidder), list) in offers {
        for (index, offer) in list.iter().enumerate() {
            if offer.offer_number() != index as u64 {
                return inconsistent(format!(
                    "offers {} -> {} are not numbered 0..{}",
                    offerer,
                    bidder,
                    list.len()
                ));
            }
        }
        total += list.len();
    }
    if total != listed.len() {
        return inconsistent(format!(
            "{} offers stored but {} referenced by bids",
            total,
            listed.len()
        ));
    }

    Ok(())
}
