// Store Tests
// Tests for the sled-backed keypair and registry persistence

use bidregistry::identity::{Identity, Keypair};
use bidregistry::multihash::ContentAddresser;
use bidregistry::registry::{
    BidRegistry, BidStatus, Clock, ExpiryDate, InMemoryBalances, ManualClock, RegistryConfig,
};
use bidregistry::storage::RegistryStore;
use chrono::Duration;
use std::path::Path;
use tempfile::TempDir;

/// Reopen a directory whose previous handle was just dropped.
/// sled releases its file lock from a background thread, so the first
/// attempts can still see the lock held.
fn reopen(path: &Path) -> RegistryStore {
    for _ in 0..50 {
        if let Ok(store) = RegistryStore::open(path) {
            return store;
        }
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
    RegistryStore::open(path).unwrap()
}

fn sample_registry(clock: &ManualClock) -> BidRegistry<InMemoryBalances, ManualClock> {
    let owner = Identity::named("owner");
    let bidder = Identity::named("bidder");
    let offerer = Identity::named("offerer");

    let mut registry = BidRegistry::new(
        owner.clone(),
        RegistryConfig::new().with_max_tag_len(32),
        InMemoryBalances::new(),
        clock.clone(),
    )
    .unwrap();
    registry.deposit(&owner, &bidder, 1_000).unwrap();

    let expiry = ExpiryDate::from_datetime(clock.now() + Duration::days(7));
    for tag in ["first", "second"] {
        registry
            .register_bid(
                &bidder,
                expiry.clone(),
                ContentAddresser::address_of(tag.as_bytes()),
                100,
                tag,
            )
            .unwrap();
    }
    registry.offer(&offerer, &offerer, &bidder, 0, 300).unwrap();
    registry.offer(&offerer, &offerer, &bidder, 1, 400).unwrap();
    registry.finalize(&bidder, &offerer, 0, 0, 300).unwrap();
    registry
}

// ============================================================================
// STORE CREATION AND BASIC OPERATIONS
// ============================================================================

#[test]
fn test_store_open_new() {
    let temp_dir = TempDir::new().unwrap();
    let store = RegistryStore::open(temp_dir.path()).unwrap();

    assert!(store.is_empty().unwrap());
    assert_eq!(store.stats().unwrap().key_count, 0);
}

// ============================================================================
// KEYPAIR PERSISTENCE
// ============================================================================

#[test]
fn test_save_load_keypair() {
    let temp_dir = TempDir::new().unwrap();
    let store = RegistryStore::open(temp_dir.path()).unwrap();
    let keypair = Keypair::generate();

    store.save_keypair("alice", &keypair).unwrap();
    let loaded = store.load_keypair("alice").unwrap().unwrap();

    assert_eq!(loaded.identity(), keypair.identity());
    assert_eq!(loaded.to_bytes(), keypair.to_bytes());
}

#[test]
fn test_load_keypair_none_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let store = RegistryStore::open(temp_dir.path()).unwrap();

    assert!(store.load_keypair("nobody").unwrap().is_none());
}

#[test]
fn test_keypair_persists_across_reopens() {
    let temp_dir = TempDir::new().unwrap();
    let keypair = Keypair::generate();

    {
        let store = RegistryStore::open(temp_dir.path()).unwrap();
        store.save_keypair("alice", &keypair).unwrap();
        store.flush().unwrap();
    }

    for _ in 0..3 {
        let store = reopen(temp_dir.path());
        let loaded = store.load_keypair("alice").unwrap().unwrap();
        assert_eq!(loaded.identity(), keypair.identity());
    }
}

#[test]
fn test_keypair_labels_sorted() {
    let temp_dir = TempDir::new().unwrap();
    let store = RegistryStore::open(temp_dir.path()).unwrap();

    for label in ["carol", "alice", "bob"] {
        store.save_keypair(label, &Keypair::generate()).unwrap();
    }

    assert_eq!(
        store.keypair_labels().unwrap(),
        vec!["alice", "bob", "carol"]
    );
}

// ============================================================================
// REGISTRY PERSISTENCE
// ============================================================================

#[test]
fn test_load_registry_none_when_empty() {
    let temp_dir = TempDir::new().unwrap();
    let store = RegistryStore::open(temp_dir.path()).unwrap();

    assert!(store
        .load_registry(ManualClock::default())
        .unwrap()
        .is_none());
}

#[test]
fn test_registry_persists_across_reopens() {
    let temp_dir = TempDir::new().unwrap();
    let clock = ManualClock::default();
    let registry = sample_registry(&clock);
    let bidder = Identity::named("bidder");
    let offerer = Identity::named("offerer");

    {
        let store = RegistryStore::open(temp_dir.path()).unwrap();
        store.save_registry(&registry).unwrap();
        store.flush().unwrap();
    }

    let store = reopen(temp_dir.path());
    let restored = store.load_registry(clock.clone()).unwrap().unwrap();

    assert_eq!(restored.snapshot(), registry.snapshot());
    assert_eq!(restored.balances(), registry.balances());
    assert_eq!(restored.config(), registry.config());
    assert_eq!(restored.owner(), &Identity::named("owner"));
    assert_eq!(restored.balance_of(&offerer), 300);
    assert_eq!(
        restored.bid_status(&bidder, 0).unwrap(),
        BidStatus::Finalized
    );
    assert_eq!(restored.bid_status(&bidder, 1).unwrap(), BidStatus::Open);
    assert_eq!(restored.bidinfo(&bidder, 1).unwrap().tag, "second");
}

/// Test: A restored registry keeps numbering where the saved one stopped
#[test]
fn test_restored_registry_continues_numbering() {
    let temp_dir = TempDir::new().unwrap();
    let clock = ManualClock::default();
    let store = RegistryStore::open(temp_dir.path()).unwrap();
    store.save_registry(&sample_registry(&clock)).unwrap();

    let mut restored = store.load_registry(clock.clone()).unwrap().unwrap();
    let bidder = Identity::named("bidder");
    let offerer = Identity::named("offerer");

    let event = restored
        .register_bid(
            &bidder,
            ExpiryDate::from_datetime(clock.now() + Duration::days(1)),
            ContentAddresser::address_of(b"third"),
            1,
            "third",
        )
        .unwrap();
    assert_eq!(event.position, 2);

    let placed = restored.offer(&offerer, &offerer, &bidder, 2, 5).unwrap();
    assert_eq!(placed.offer_number, 2);
}

#[test]
fn test_save_overwrites_previous_state() {
    let temp_dir = TempDir::new().unwrap();
    let clock = ManualClock::default();
    let store = RegistryStore::open(temp_dir.path()).unwrap();
    let mut registry = sample_registry(&clock);
    store.save_registry(&registry).unwrap();

    registry.pause(&Identity::named("owner")).unwrap();
    store.save_registry(&registry).unwrap();

    let restored = store.load_registry(clock).unwrap().unwrap();
    assert!(restored.is_paused());
}
