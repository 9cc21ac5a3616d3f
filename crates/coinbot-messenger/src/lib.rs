//! Facebook Messenger adapter for the coinbot economy engine.
//!
//! Hosts the webhook endpoints, converts inbound messaging events into
//! [`coinbot_economy::CommandEvent`] values, and delivers rendered replies
//! through the Graph Send API.

pub mod messenger_contract;
pub mod messenger_outbound;
pub mod messenger_signature;
pub mod messenger_webhook;

pub use messenger_contract::*;
pub use messenger_outbound::*;
pub use messenger_signature::{verify_sha256_hmac_signature, MESSENGER_SIGNATURE_HEADER};
pub use messenger_webhook::*;
