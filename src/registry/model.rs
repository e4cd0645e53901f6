use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::claim::ClaimId;
use crate::identity::Identity;
use crate::registry::RegistryError;

/// Offset-less ISO-8601 forms, tried in order; `T` or a space between date and time
const NAIVE_ISO_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];
const DATE_ONLY_FORMAT: &str = "%Y-%m-%d";

/// An ISO-8601 expiry as submitted, plus the instant it denotes
///
/// The submitted text is kept verbatim so `bidinfo` returns exactly what the
/// bidder sent. Accepts RFC 3339, naive date-times with or without seconds,
/// and bare dates (midnight). Anything without an offset is read as UTC.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExpiryDate {
    raw: String,
    at: DateTime<Utc>,
}

impl ExpiryDate {
    pub fn parse(s: &str) -> Result<Self, RegistryError> {
        let trimmed = s.trim();
        let at = parse_instant(trimmed).ok_or_else(|| {
            RegistryError::InvalidExpiry(format!(
                "'{}' is not an ISO-8601 date or date-time",
                s
            ))
        })?;
        Ok(Self {
            raw: s.to_string(),
            at,
        })
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            raw: at.to_rfc3339(),
            at,
        }
    }

    /// Text exactly as submitted
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.at
    }
}

fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_ISO_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
    {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(s, DATE_ONLY_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl fmt::Display for ExpiryDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for ExpiryDate {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ExpiryDate> for String {
    fn from(expiry: ExpiryDate) -> Self {
        expiry.raw
    }
}

/// Lifecycle of a bid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidStatus {
    /// Accepting offers and settlement
    Open,
    /// Exactly one offer settled; terminal
    Finalized,
    /// Past its expiry without settlement; terminal
    Expired,
}

/// Locates an offer: offer numbers count per (offerer, bidder) pair
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferKey {
    pub offerer: Identity,
    pub offer_number: u64,
}

/// A registered bid
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    bidder: Identity,
    position: u64,
    expiry: ExpiryDate,
    claim_id: ClaimId,
    amount: u64,
    tag: String,
    finalized: bool,
    /// Offers placed against this bid, in arrival order
    offers: Vec<OfferKey>,
}

impl Bid {
    pub(crate) fn new(
        bidder: Identity,
        position: u64,
        expiry: ExpiryDate,
        claim_id: ClaimId,
        amount: u64,
        tag: String,
    ) -> Self {
        Self {
            bidder,
            position,
            expiry,
            claim_id,
            amount,
            tag,
            finalized: false,
            offers: Vec::new(),
        }
    }

    pub fn bidder(&self) -> &Identity {
        &self.bidder
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn expiry(&self) -> &ExpiryDate {
        &self.expiry
    }

    pub fn claim_id(&self) -> &ClaimId {
        &self.claim_id
    }

    /// The bidder's own stated price
    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn offers(&self) -> &[OfferKey] {
        &self.offers
    }

    /// Expired once ledger time passes the expiry instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry.at()
    }

    pub fn status_at(&self, now: DateTime<Utc>) -> BidStatus {
        if self.finalized {
            BidStatus::Finalized
        } else if self.is_expired_at(now) {
            BidStatus::Expired
        } else {
            BidStatus::Open
        }
    }

    pub fn info(&self) -> BidInfo {
        BidInfo {
            expiry_date: self.expiry.as_str().to_string(),
            claim_id: self.claim_id.clone(),
            amount: self.amount,
            tag: self.tag.clone(),
        }
    }

    pub(crate) fn push_offer(&mut self, key: OfferKey) {
        self.offers.push(key);
    }

    pub(crate) fn mark_finalized(&mut self) {
        self.finalized = true;
    }
}

/// The public view of a bid returned by `bidinfo`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidInfo {
    pub expiry_date: String,
    pub claim_id: ClaimId,
    pub amount: u64,
    pub tag: String,
}

/// A monetary offer against a bid
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    offerer: Identity,
    bidder: Identity,
    bid_number: u64,
    offer_number: u64,
    value: u64,
    settled: bool,
}

impl Offer {
    pub(crate) fn new(
        offerer: Identity,
        bidder: Identity,
        bid_number: u64,
        offer_number: u64,
        value: u64,
    ) -> Self {
        Self {
            offerer,
            bidder,
            bid_number,
            offer_number,
            value,
            settled: false,
        }
    }

    pub fn offerer(&self) -> &Identity {
        &self.offerer
    }

    pub fn bidder(&self) -> &Identity {
        &self.bidder
    }

    pub fn bid_number(&self) -> u64 {
        self.bid_number
    }

    pub fn offer_number(&self) -> u64 {
        self.offer_number
    }

    /// Proposed payment
    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn key(&self) -> OfferKey {
        OfferKey {
            offerer: self.offerer.clone(),
            offer_number: self.offer_number,
        }
    }

    pub(crate) fn mark_settled(&mut self) {
        self.settled = true;
    }
}
