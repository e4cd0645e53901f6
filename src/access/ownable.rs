use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identity::Identity;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("Unauthorized: {caller} is not the owner")]
    Unauthorized { caller: Identity },
}

/// Single-owner authorization capability
///
/// Gates administrative operations only. Registering, offering and
/// finalizing are open to any identity and never consult this.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    owner: Identity,
}

impl AccessControl {
    /// The initializing caller becomes the owner
    pub fn new(owner: Identity) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    pub fn is_owner(&self, caller: &Identity) -> bool {
        &self.owner == caller
    }

    pub fn require_owner(&self, caller: &Identity) -> Result<(), AccessError> {
        if self.is_owner(caller) {
            Ok(())
        } else {
            Err(AccessError::Unauthorized {
                caller: caller.clone(),
            })
        }
    }

    /// Hand ownership to `new_owner`. Returns the previous owner.
    pub fn transfer_ownership(
        &mut self,
        caller: &Identity,
        new_owner: Identity,
    ) -> Result<Identity, AccessError> {
        self.require_owner(caller)?;
        Ok(std::mem::replace(&mut self.owner, new_owner))
    }
}
