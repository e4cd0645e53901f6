// Balance ledger - the value side of settlement
//
// The registry never owns money itself: it asks a BalanceLedger to move the
// value attached to a finalize call from the bidder to the offerer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::identity::Identity;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BalanceError {
    #[error("Insufficient funds for {account}: available {available}, required {required}")]
    InsufficientFunds {
        account: Identity,
        available: u64,
        required: u64,
    },

    #[error("Balance of {account} would overflow")]
    Overflow { account: Identity },
}

/// Account balances with an all-or-nothing transfer
pub trait BalanceLedger {
    fn balance_of(&self, account: &Identity) -> u64;

    fn set_balance(&mut self, account: &Identity, amount: u64);

    /// Add `amount` to an account
    fn credit(&mut self, account: &Identity, amount: u64) -> Result<(), BalanceError> {
        let updated = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or_else(|| BalanceError::Overflow {
                account: account.clone(),
            })?;
        self.set_balance(account, updated);
        Ok(())
    }

    /// Move `amount` from `from` to `to`. Either both balances change or neither.
    fn transfer(
        &mut self,
        from: &Identity,
        to: &Identity,
        amount: u64,
    ) -> Result<(), BalanceError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(BalanceError::InsufficientFunds {
                account: from.clone(),
                available,
                required: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or_else(|| BalanceError::Overflow { account: to.clone() })?;

        self.set_balance(from, available - amount);
        self.set_balance(to, credited);
        Ok(())
    }
}

/// HashMap-backed balances
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryBalances {
    accounts: HashMap<Identity, u64>,
}

impl InMemoryBalances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed balances, e.g. for tests
    pub fn with_balance(mut self, account: Identity, amount: u64) -> Self {
        self.accounts.insert(account, amount);
        self
    }

    /// Sum of all balances (saturating)
    pub fn total_supply(&self) -> u64 {
        self.accounts
            .values()
            .fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&Identity, &u64)> {
        self.accounts.iter()
    }
}

impl BalanceLedger for InMemoryBalances {
    fn balance_of(&self, account: &Identity) -> u64 {
        self.accounts.get(account).copied().unwrap_or(0)
    }

    fn set_balance(&mut self, account: &Identity, amount: u64) {
        if amount == 0 {
            self.accounts.remove(account);
        } else {
            self.accounts.insert(account.clone(), amount);
        }
    }
}
