// Access Control Tests
// Single-owner gate

use bidregistry::access::{AccessControl, AccessError};
use bidregistry::identity::{Identity, Keypair};

/// Test: The deploying identity is the owner
#[test]
fn test_owner_is_deployer() {
    let deployer = Keypair::generate().identity();
    let acl = AccessControl::new(deployer.clone());

    assert_eq!(acl.owner(), &deployer);
    assert!(acl.is_owner(&deployer));
}

/// Test: Non-owners are rejected with Unauthorized
#[test]
fn test_non_owner_unauthorized() {
    let acl = AccessControl::new(Identity::named("owner"));
    let mallory = Identity::named("mallory");

    assert_eq!(
        acl.require_owner(&mallory),
        Err(AccessError::Unauthorized {
            caller: mallory.clone()
        })
    );
}

/// Test: Ownership moves to the new owner
#[test]
fn test_transfer_ownership() {
    let owner = Identity::named("owner");
    let successor = Identity::named("successor");
    let mut acl = AccessControl::new(owner.clone());

    let previous = acl.transfer_ownership(&owner, successor.clone()).unwrap();

    assert_eq!(previous, owner);
    assert_eq!(acl.owner(), &successor);
    assert!(acl.require_owner(&owner).is_err());
    assert!(acl.require_owner(&successor).is_ok());
}

/// Test: Only the owner may transfer ownership
#[test]
fn test_transfer_requires_owner() {
    let owner = Identity::named("owner");
    let mallory = Identity::named("mallory");
    let mut acl = AccessControl::new(owner.clone());

    assert!(acl.transfer_ownership(&mallory, mallory.clone()).is_err());
    assert_eq!(acl.owner(), &owner);
}
