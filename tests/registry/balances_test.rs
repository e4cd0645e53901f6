use bidregistry::identity::Identity;
use bidregistry::registry::{BalanceError, BalanceLedger, InMemoryBalances};

#[test]
fn test_unknown_account_is_zero() {
    let balances = InMemoryBalances::new();
    assert_eq!(balances.balance_of(&Identity::named("nobody")), 0);
}

#[test]
fn test_transfer_moves_value() {
    let alice = Identity::named("alice");
    let bob = Identity::named("bob");
    let mut balances = InMemoryBalances::new().with_balance(alice.clone(), 100);

    balances.transfer(&alice, &bob, 40).unwrap();

    assert_eq!(balances.balance_of(&alice), 60);
    assert_eq!(balances.balance_of(&bob), 40);
    assert_eq!(balances.total_supply(), 100);
}

/// Test: A failed transfer changes nothing
#[test]
fn test_insufficient_funds_is_atomic() {
    let alice = Identity::named("alice");
    let bob = Identity::named("bob");
    let mut balances = InMemoryBalances::new()
        .with_balance(alice.clone(), 10)
        .with_balance(bob.clone(), 5);
    let before = balances.clone();

    let result = balances.transfer(&alice, &bob, 11);

    assert_eq!(
        result,
        Err(BalanceError::InsufficientFunds {
            account: alice,
            available: 10,
            required: 11
        })
    );
    assert_eq!(balances, before);
}

/// Test: Credit overflow is rejected before any write
#[test]
fn test_overflow_is_atomic() {
    let alice = Identity::named("alice");
    let bob = Identity::named("bob");
    let mut balances = InMemoryBalances::new()
        .with_balance(alice.clone(), 10)
        .with_balance(bob.clone(), u64::MAX);
    let before = balances.clone();

    assert!(matches!(
        balances.transfer(&alice, &bob, 1),
        Err(BalanceError::Overflow { .. })
    ));
    assert_eq!(balances, before);
}

#[test]
fn test_self_transfer_is_noop() {
    let alice = Identity::named("alice");
    let mut balances = InMemoryBalances::new().with_balance(alice.clone(), 10);

    balances.transfer(&alice, &alice, 10).unwrap();
    assert_eq!(balances.balance_of(&alice), 10);
}

#[test]
fn test_credit() {
    let alice = Identity::named("alice");
    let mut balances = InMemoryBalances::new();

    balances.credit(&alice, 7).unwrap();
    balances.credit(&alice, 3).unwrap();
    assert_eq!(balances.balance_of(&alice), 10);
}
