//! Thread-safe facade over the ledger, code registry, and random source.
//!
//! All state sits behind one mutex and `execute` never yields while holding
//! it, so a sender's balance read and the write that follows it cannot
//! interleave with another command, even on a multi-threaded runtime.

use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::economy_command::{resolve_command, EconomyCommand};
use crate::economy_ledger::{LedgerStore, UserAccount};
use crate::economy_outcome::{execute_command, Outcome};
use crate::economy_random::RandomSource;
use crate::economy_redeem_codes::RedeemCodeRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One inbound command: who sent it and what they typed or tapped.
pub struct CommandEvent {
    pub sender_id: String,
    pub raw_text: String,
}

impl CommandEvent {
    pub fn new(sender_id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            raw_text: raw_text.into(),
        }
    }
}

struct EconomyState {
    ledger: LedgerStore,
    codes: RedeemCodeRegistry,
    random: Box<dyn RandomSource>,
}

pub struct EconomyEngine {
    state: Mutex<EconomyState>,
}

impl EconomyEngine {
    pub fn new(codes: RedeemCodeRegistry, random: impl RandomSource + 'static) -> Self {
        Self {
            state: Mutex::new(EconomyState {
                ledger: LedgerStore::new(),
                codes,
                random: Box::new(random),
            }),
        }
    }

    /// Resolves and runs one command event, returning its reply outcome.
    pub fn execute(&self, event: &CommandEvent) -> Outcome {
        let command = resolve_command(&event.raw_text);
        self.execute_command(&event.sender_id, &command)
    }

    pub fn execute_command(&self, sender_id: &str, command: &EconomyCommand) -> Outcome {
        let mut guard = lock_or_recover(&self.state);
        let EconomyState {
            ledger,
            codes,
            random,
        } = &mut *guard;
        let account = ledger.get(sender_id);
        let outcome = execute_command(command, account, codes, random.as_mut());
        debug!(
            sender_id,
            command = command.label(),
            coins = account.coins,
            exp = account.exp,
            level = account.level,
            "economy command applied"
        );
        outcome
    }

    /// Snapshot of an existing account. Does not create one.
    pub fn account(&self, sender_id: &str) -> Option<UserAccount> {
        lock_or_recover(&self.state)
            .ledger
            .peek(sender_id)
            .cloned()
    }

    pub fn account_count(&self) -> usize {
        lock_or_recover(&self.state).ledger.len()
    }

    /// Generated codes in issue order.
    pub fn redeem_codes(&self) -> Vec<String> {
        lock_or_recover(&self.state)
            .codes
            .codes()
            .iter()
            .map(|entry| entry.code.clone())
            .collect()
    }

    pub fn is_code_redeemed(&self, code: &str) -> bool {
        lock_or_recover(&self.state).codes.is_redeemed(code)
    }
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
