// Registry Scenario Tests
// The register -> offer -> finalize cycle end to end, as a deployment would drive it

use bidregistry::claim::{ClaimBuilder, ClaimValidator};
use bidregistry::identity::{Identity, Keypair, Signer};
use bidregistry::registry::{
    BidRegistry, BidStatus, InMemoryBalances, ManualClock, RegistryConfig, RegistryError,
    RegistryEvent,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

const SPEC: &str = r#"{"name": "diabetes-cohort",
 "criteria": {"condition": "SNOMED_ID:394732004", "age": ">=18"}}"#;
const TAG: &str = "SNOMED_ID:394732004";

struct Accounts {
    deployer: Identity,
    bidder: Keypair,
    offerer: Identity,
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn setup() -> (BidRegistry<InMemoryBalances, ManualClock>, Accounts, ManualClock) {
    let accounts = Accounts {
        deployer: Identity::named("accounts[0]"),
        bidder: Keypair::generate(),
        offerer: Identity::named("accounts[2]"),
    };
    let balances = InMemoryBalances::new()
        .with_balance(accounts.bidder.identity(), 100_000)
        .with_balance(accounts.offerer.clone(), 100_000);
    let clock = ManualClock::new(start());
    let registry = BidRegistry::new(
        accounts.deployer.clone(),
        RegistryConfig::default(),
        balances,
        clock.clone(),
    )
    .unwrap();
    (registry, accounts, clock)
}

/// Naive ISO-8601 with microseconds, 60 days after the clock
fn expiry_in_60_days(clock: &ManualClock) -> String {
    use bidregistry::registry::Clock;
    (clock.now() + Duration::days(60))
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Register one bid for `accounts.bidder`; returns the expiry text and claim id text
fn register_sample(
    registry: &mut BidRegistry<InMemoryBalances, ManualClock>,
    accounts: &Accounts,
    clock: &ManualClock,
) -> (String, String) {
    let expiry = expiry_in_60_days(clock);
    let claim_id = ClaimBuilder::build_claim(SPEC.as_bytes(), &accounts.bidder).to_string();
    registry
        .register(&accounts.bidder.identity(), &expiry, &claim_id, 1000, TAG)
        .unwrap();
    (expiry, claim_id)
}

// ============================================================================
// OWNERSHIP
// ============================================================================

#[test]
fn test_owner_is_deployer() {
    let (registry, accounts, _) = setup();
    assert_eq!(registry.owner(), &accounts.deployer);
}

// ============================================================================
// SCENARIO A: REGISTER
// ============================================================================

#[test]
fn test_register_then_bidinfo() {
    let (mut registry, accounts, clock) = setup();
    let expiry = expiry_in_60_days(&clock);
    let claim_id = ClaimBuilder::build_claim(SPEC.as_bytes(), &accounts.bidder);

    let event = registry
        .register(
            &accounts.bidder.identity(),
            &expiry,
            &claim_id.to_string(),
            1000,
            TAG,
        )
        .unwrap();

    assert_eq!(event.who, accounts.bidder.identity());
    assert_eq!(event.position, 0);

    let info = registry.bidinfo(&event.who, event.position).unwrap();
    assert_eq!(info.expiry_date, expiry);
    assert_eq!(info.claim_id, claim_id);
    assert_eq!(info.amount, 1000);
    assert_eq!(info.tag, TAG);
}

/// Test: The stored claim id audits against the off-ledger spec and signature
#[test]
fn test_registered_claim_is_auditable() {
    let (mut registry, accounts, clock) = setup();
    let claim = ClaimBuilder::new()
        .specification(SPEC.as_bytes())
        .signer(&accounts.bidder)
        .build()
        .unwrap();
    let expiry = expiry_in_60_days(&clock);
    let event = registry
        .register(
            &accounts.bidder.identity(),
            &expiry,
            &claim.id().to_string(),
            1000,
            TAG,
        )
        .unwrap();

    let stored = registry.bidinfo(&event.who, event.position).unwrap().claim_id;
    assert!(ClaimValidator::verify_claim(
        SPEC.as_bytes(),
        claim.signature(),
        &stored,
        &accounts.bidder.public_key()
    ));
}

// ============================================================================
// SCENARIO B: OFFER
// ============================================================================

#[test]
fn test_offer_returns_tuple() {
    let (mut registry, accounts, clock) = setup();
    register_sample(&mut registry, &accounts, &clock);
    let bidder = accounts.bidder.identity();

    // Submitted by the deployer on behalf of the offerer
    let placed = registry
        .offer(&accounts.deployer, &accounts.offerer, &bidder, 0, 1005)
        .unwrap();

    assert_eq!(placed.offerer, accounts.offerer);
    assert_eq!(placed.bidder, bidder);
    assert_eq!(placed.bid_number, 0);
    assert_eq!(placed.offer_number, 0);
    assert_eq!(placed.value, 1005);
}

// ============================================================================
// SCENARIO C: FINALIZE
// ============================================================================

#[test]
fn test_finalize_pays_offerer_once() {
    let (mut registry, accounts, clock) = setup();
    register_sample(&mut registry, &accounts, &clock);
    let bidder = accounts.bidder.identity();
    registry
        .offer(&accounts.deployer, &accounts.offerer, &bidder, 0, 1005)
        .unwrap();

    let offerer_before = registry.balance_of(&accounts.offerer);
    let bidder_before = registry.balance_of(&bidder);

    registry
        .finalize(&bidder, &accounts.offerer, 0, 0, 1005)
        .unwrap();

    assert_eq!(
        registry.balance_of(&accounts.offerer),
        offerer_before + 1005
    );
    assert_eq!(registry.balance_of(&bidder), bidder_before - 1005);
    assert_eq!(
        registry.bid_status(&bidder, 0).unwrap(),
        BidStatus::Finalized
    );
    assert!(registry
        .offer_info(&accounts.offerer, &bidder, 0)
        .unwrap()
        .is_settled());

    let second = registry.finalize(&bidder, &accounts.offerer, 0, 0, 1005);
    assert!(matches!(
        second,
        Err(RegistryError::AlreadyFinalized { .. })
    ));
    assert_eq!(
        registry.balance_of(&accounts.offerer),
        offerer_before + 1005
    );
}

// ============================================================================
// SCENARIO D: WRONG PAYMENT
// ============================================================================

#[test]
fn test_wrong_payment_changes_nothing() {
    let (mut registry, accounts, clock) = setup();
    register_sample(&mut registry, &accounts, &clock);
    let bidder = accounts.bidder.identity();
    registry
        .offer(&accounts.deployer, &accounts.offerer, &bidder, 0, 1005)
        .unwrap();
    let snapshot = registry.snapshot();
    let balances = registry.balances().clone();

    for attached in [0, 1000, 1004, 1006] {
        let result = registry.finalize(&bidder, &accounts.offerer, 0, 0, attached);
        assert_eq!(
            result,
            Err(RegistryError::InsufficientPayment {
                expected: 1005,
                attached
            })
        );
    }

    assert_eq!(registry.snapshot(), snapshot);
    assert_eq!(registry.balances(), &balances);
    assert_eq!(registry.bid_status(&bidder, 0).unwrap(), BidStatus::Open);

    // The correct payment still goes through afterwards
    assert!(registry
        .finalize(&bidder, &accounts.offerer, 0, 0, 1005)
        .is_ok());
}

// ============================================================================
// EVENTS
// ============================================================================

#[test]
fn test_cycle_emits_events_in_order() {
    let (mut registry, accounts, clock) = setup();
    register_sample(&mut registry, &accounts, &clock);
    let bidder = accounts.bidder.identity();
    registry
        .offer(&accounts.deployer, &accounts.offerer, &bidder, 0, 1005)
        .unwrap();
    registry
        .finalize(&bidder, &accounts.offerer, 0, 0, 1005)
        .unwrap();

    let events = registry.poll_events();
    assert_eq!(events.len(), 3);
    assert!(matches!(
        &events[0],
        RegistryEvent::BidRegistered(e) if e.who == bidder && e.amount == 1000
    ));
    assert!(matches!(
        &events[1],
        RegistryEvent::OfferPlaced(e) if e.value == 1005
    ));
    assert!(matches!(
        &events[2],
        RegistryEvent::OfferFinalized(e) if e.offerer == accounts.offerer
    ));

    assert!(registry.poll_events().is_empty());
}

/// Test: Past expiry the bid is closed to both offers and settlement
#[test]
fn test_expiry_closes_bid() {
    let (mut registry, accounts, clock) = setup();
    register_sample(&mut registry, &accounts, &clock);
    let bidder = accounts.bidder.identity();
    registry
        .offer(&accounts.deployer, &accounts.offerer, &bidder, 0, 1005)
        .unwrap();

    clock.advance(Duration::days(61));

    assert_eq!(registry.bid_status(&bidder, 0).unwrap(), BidStatus::Expired);
    assert!(matches!(
        registry.offer(&accounts.offerer, &accounts.offerer, &bidder, 0, 2000),
        Err(RegistryError::BidExpired { .. })
    ));
    let before = registry.balance_of(&accounts.offerer);
    assert!(matches!(
        registry.finalize(&bidder, &accounts.offerer, 0, 0, 1005),
        Err(RegistryError::BidExpired { .. })
    ));
    assert_eq!(registry.balance_of(&accounts.offerer), before);
}
