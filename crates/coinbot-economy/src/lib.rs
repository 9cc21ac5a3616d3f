//! Command dispatch and economy state for the coinbot chat bot.
//!
//! Resolves short text commands, applies them to a per-sender ledger, manages
//! single-use redeem codes, and describes the reply to send back. Randomness
//! is injected so every probability-gated command can be driven
//! deterministically.
//!
//! ```rust
//! use coinbot_economy::{
//!     CommandEvent, EconomyEngine, OutcomeKind, RedeemCodeRegistry, ScriptedRandomSource,
//! };
//!
//! let engine = EconomyEngine::new(RedeemCodeRegistry::default(), ScriptedRandomSource::new(vec![0.1]));
//! let outcome = engine.execute(&CommandEvent::new("user-1", "slots 20"));
//! assert_eq!(outcome.kind, OutcomeKind::QuickReplies);
//! assert_eq!(engine.account("user-1").map(|account| account.coins), Some(120));
//! ```

pub mod economy_command;
pub mod economy_engine;
pub mod economy_ledger;
pub mod economy_outcome;
pub mod economy_random;
pub mod economy_redeem_codes;
pub mod economy_reply;

pub use economy_command::*;
pub use economy_engine::*;
pub use economy_ledger::*;
pub use economy_outcome::*;
pub use economy_random::{RandomSource, ScriptedRandomSource, StdRandomSource};
pub use economy_redeem_codes::*;
pub use economy_reply::*;
