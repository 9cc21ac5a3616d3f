//! Per-sender economy accounts.
//!
//! Accounts are created lazily on first reference and live for the process
//! lifetime. Debits are checked before they are applied so balances never go
//! below zero.

use std::collections::HashMap;

pub const DEFAULT_STARTING_COINS: u64 = 100;
pub const DEFAULT_STARTING_LEVEL: u32 = 1;
pub const EXP_PER_LEVEL: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Economy state for one sender.
pub struct UserAccount {
    pub id: String,
    pub coins: u64,
    pub exp: u64,
    pub level: u32,
}

impl UserAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            coins: DEFAULT_STARTING_COINS,
            exp: 0,
            level: DEFAULT_STARTING_LEVEL,
        }
    }

    /// Experience required to leave the current level.
    pub fn level_threshold(&self) -> u64 {
        u64::from(self.level).saturating_mul(EXP_PER_LEVEL)
    }

    pub fn can_afford(&self, amount: u64) -> bool {
        self.coins >= amount
    }

    pub fn credit(&mut self, amount: u64) {
        self.coins = self.coins.saturating_add(amount);
    }

    /// Removes `amount` coins. Returns `false` and leaves the balance alone
    /// when the account cannot cover it.
    pub fn debit(&mut self, amount: u64) -> bool {
        match self.coins.checked_sub(amount) {
            Some(remaining) => {
                self.coins = remaining;
                true
            }
            None => false,
        }
    }

    /// Adds experience and applies at most one level-up.
    ///
    /// Crossing the threshold resets `exp` to zero; any excess above the
    /// threshold is discarded, even when it would cover further levels.
    /// Returns `true` when a level was gained.
    pub fn gain_exp(&mut self, amount: u64) -> bool {
        self.exp = self.exp.saturating_add(amount);
        if self.exp < self.level_threshold() {
            return false;
        }
        self.exp = 0;
        self.level = self.level.saturating_add(1);
        true
    }
}

#[derive(Debug, Default)]
/// Mapping of sender identifier to [`UserAccount`].
pub struct LedgerStore {
    accounts: HashMap<String, UserAccount>,
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the sender's account, creating it with defaults when absent.
    pub fn get(&mut self, id: &str) -> &mut UserAccount {
        self.accounts
            .entry(id.to_string())
            .or_insert_with(|| UserAccount::new(id))
    }

    /// Looks up an account without creating it.
    pub fn peek(&self, id: &str) -> Option<&UserAccount> {
        self.accounts.get(id)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
