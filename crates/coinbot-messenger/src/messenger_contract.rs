//! Messenger webhook payload schema and command-event extraction.
//!
//! Only the fields the bot reads are modelled. Each messaging event yields at
//! most one [`CommandEvent`]: typed text wins over a postback payload, echoes
//! of the page's own messages are skipped, and events without a sender id are
//! dropped.

use anyhow::{Context, Result};
use coinbot_economy::CommandEvent;
use serde::Deserialize;

pub const MESSENGER_PAGE_OBJECT: &str = "page";

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
/// Public struct `MessengerWebhookPayload` received on `POST /api/webhook`.
pub struct MessengerWebhookPayload {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub entry: Vec<MessengerWebhookEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MessengerWebhookEntry {
    #[serde(default)]
    pub messaging: Vec<MessengerMessagingEvent>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MessengerMessagingEvent {
    #[serde(default)]
    pub sender: Option<MessengerParticipant>,
    #[serde(default)]
    pub message: Option<MessengerMessage>,
    #[serde(default)]
    pub postback: Option<MessengerPostback>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MessengerParticipant {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MessengerMessage {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub is_echo: bool,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MessengerPostback {
    #[serde(default)]
    pub payload: Option<String>,
}

impl MessengerWebhookPayload {
    pub fn is_page_subscription(&self) -> bool {
        self.object == MESSENGER_PAGE_OBJECT
    }

    /// Command events in delivery order.
    pub fn command_events(&self) -> Vec<CommandEvent> {
        self.entry
            .iter()
            .flat_map(|entry| entry.messaging.iter())
            .filter_map(MessengerMessagingEvent::command_event)
            .collect()
    }
}

impl MessengerMessagingEvent {
    pub fn command_event(&self) -> Option<CommandEvent> {
        let sender_id = self
            .sender
            .as_ref()
            .map(|sender| sender.id.trim())
            .filter(|id| !id.is_empty())?;
        if self.message.as_ref().is_some_and(|message| message.is_echo) {
            return None;
        }
        let text = self
            .message
            .as_ref()
            .and_then(|message| message.text.as_deref())
            .filter(|text| !text.is_empty())
            .or_else(|| {
                self.postback
                    .as_ref()
                    .and_then(|postback| postback.payload.as_deref())
                    .filter(|payload| !payload.is_empty())
            })?;
        Some(CommandEvent::new(sender_id, text))
    }
}

pub fn parse_messenger_webhook_payload(raw: &str) -> Result<MessengerWebhookPayload> {
    serde_json::from_str(raw).context("failed to parse messenger webhook payload")
}
