//! Outbound delivery through the Messenger Send API.
//!
//! Reply shapes are converted into Send API bodies and either posted to the
//! provider or, in dry-run mode, returned as receipts without network I/O.
//! Failures come back as [`MessengerDeliveryError`] with a stable reason code;
//! callers decide whether to log them. Nothing here retries.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use coinbot_economy::{ReplyMessage, ReplyOption};
use reqwest::{redirect::Policy, StatusCode};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_GRAPH_API_BASE: &str = "https://graph.facebook.com/v12.0";
const DETAIL_LIMIT: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `MessengerOutboundMode` values.
pub enum MessengerOutboundMode {
    DryRun,
    Provider,
}

impl MessengerOutboundMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DryRun => "dry_run",
            Self::Provider => "provider",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessengerOutboundConfig {
    pub mode: MessengerOutboundMode,
    pub graph_api_base: String,
    pub page_access_token: Option<String>,
    pub http_timeout_ms: u64,
}

impl Default for MessengerOutboundConfig {
    fn default() -> Self {
        Self {
            mode: MessengerOutboundMode::Provider,
            graph_api_base: DEFAULT_GRAPH_API_BASE.to_string(),
            page_access_token: None,
            http_timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
/// Record of one accepted Send API call.
pub struct MessengerDeliveryReceipt {
    pub mode: String,
    pub status: String,
    pub recipient_id: String,
    pub endpoint: String,
    pub request_body: Value,
    pub http_status: Option<u16>,
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error(
    "reason_code={reason_code} retryable={retryable} recipient={recipient_id} endpoint={endpoint} detail={detail}"
)]
/// Send API failure. `retryable` classifies the failure; the bot never retries.
pub struct MessengerDeliveryError {
    pub reason_code: String,
    pub detail: String,
    pub retryable: bool,
    pub recipient_id: String,
    pub endpoint: String,
    pub http_status: Option<u16>,
}

/// Outbound send capability consumed by the webhook runtime.
#[async_trait]
pub trait MessengerSender: Send + Sync {
    async fn send_text(
        &self,
        recipient_id: &str,
        text: &str,
    ) -> Result<MessengerDeliveryReceipt, MessengerDeliveryError>;

    async fn send_buttons(
        &self,
        recipient_id: &str,
        text: &str,
        buttons: &[ReplyOption],
    ) -> Result<MessengerDeliveryReceipt, MessengerDeliveryError>;

    async fn send_quick_replies(
        &self,
        recipient_id: &str,
        text: &str,
        replies: &[ReplyOption],
    ) -> Result<MessengerDeliveryReceipt, MessengerDeliveryError>;
}

/// Routes a rendered reply to the matching send call.
pub async fn deliver_reply(
    sender: &dyn MessengerSender,
    recipient_id: &str,
    reply: &ReplyMessage,
) -> Result<MessengerDeliveryReceipt, MessengerDeliveryError> {
    match reply {
        ReplyMessage::Text { text } => sender.send_text(recipient_id, text).await,
        ReplyMessage::Buttons { text, buttons } => {
            sender.send_buttons(recipient_id, text, buttons).await
        }
        ReplyMessage::QuickReplies { text, replies } => {
            sender.send_quick_replies(recipient_id, text, replies).await
        }
    }
}

pub fn build_text_message_body(recipient_id: &str, text: &str) -> Value {
    json!({
        "recipient": { "id": recipient_id },
        "message": { "text": text }
    })
}

pub fn build_button_message_body(recipient_id: &str, text: &str, buttons: &[ReplyOption]) -> Value {
    let buttons = buttons
        .iter()
        .map(|button| {
            json!({
                "type": "postback",
                "title": button.title,
                "payload": button.payload
            })
        })
        .collect::<Vec<_>>();
    json!({
        "recipient": { "id": recipient_id },
        "message": {
            "attachment": {
                "type": "template",
                "payload": {
                    "template_type": "button",
                    "text": text,
                    "buttons": buttons
                }
            }
        }
    })
}

pub fn build_quick_replies_message_body(
    recipient_id: &str,
    text: &str,
    replies: &[ReplyOption],
) -> Value {
    let quick_replies = replies
        .iter()
        .map(|reply| {
            json!({
                "content_type": "text",
                "title": reply.title,
                "payload": reply.payload
            })
        })
        .collect::<Vec<_>>();
    json!({
        "recipient": { "id": recipient_id },
        "message": {
            "text": text,
            "quick_replies": quick_replies
        }
    })
}

#[derive(Debug, Clone)]
/// Send API client implementing [`MessengerSender`].
pub struct MessengerOutboundDispatcher {
    config: MessengerOutboundConfig,
    client: Option<reqwest::Client>,
}

impl MessengerOutboundDispatcher {
    pub fn new(config: MessengerOutboundConfig) -> Result<Self> {
        if config.graph_api_base.trim().is_empty() {
            return Err(anyhow!("messenger graph api base cannot be empty"));
        }
        if config.mode == MessengerOutboundMode::Provider && config.http_timeout_ms == 0 {
            return Err(anyhow!(
                "messenger outbound provider mode requires http timeout > 0"
            ));
        }
        let client = if config.mode == MessengerOutboundMode::Provider {
            Some(
                reqwest::Client::builder()
                    .timeout(Duration::from_millis(config.http_timeout_ms))
                    .redirect(Policy::none())
                    .build()
                    .context("failed to build messenger outbound http client")?,
            )
        } else {
            None
        };
        Ok(Self { config, client })
    }

    pub fn mode(&self) -> MessengerOutboundMode {
        self.config.mode
    }

    /// Send API endpoint without the access token query parameter.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/me/messages",
            self.config.graph_api_base.trim().trim_end_matches('/')
        )
    }

    async fn dispatch(
        &self,
        recipient_id: &str,
        body: Value,
    ) -> Result<MessengerDeliveryReceipt, MessengerDeliveryError> {
        let endpoint = self.endpoint();
        match self.config.mode {
            MessengerOutboundMode::DryRun => {
                info!(
                    recipient_id = %recipient_id,
                    endpoint = %endpoint,
                    body = %body,
                    "messenger dry-run delivery"
                );
                Ok(MessengerDeliveryReceipt {
                    mode: self.config.mode.as_str().to_string(),
                    status: "dry_run".to_string(),
                    recipient_id: recipient_id.to_string(),
                    endpoint,
                    request_body: body,
                    http_status: None,
                    message_id: None,
                })
            }
            MessengerOutboundMode::Provider => self.send_request(recipient_id, endpoint, body).await,
        }
    }

    async fn send_request(
        &self,
        recipient_id: &str,
        endpoint: String,
        body: Value,
    ) -> Result<MessengerDeliveryReceipt, MessengerDeliveryError> {
        let failure = |reason_code: &str, detail: String, retryable: bool, http_status: Option<u16>| {
            MessengerDeliveryError {
                reason_code: reason_code.to_string(),
                detail,
                retryable,
                recipient_id: recipient_id.to_string(),
                endpoint: endpoint.clone(),
                http_status,
            }
        };
        let token = self
            .config
            .page_access_token
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                failure(
                    "delivery_missing_page_access_token",
                    "Messenger outbound requires PAGE_ACCESS_TOKEN".to_string(),
                    false,
                    None,
                )
            })?;
        let client = self.client.as_ref().ok_or_else(|| {
            failure(
                "delivery_provider_client_unavailable",
                "provider mode requested without initialized HTTP client".to_string(),
                false,
                None,
            )
        })?;

        let response = client
            .post(endpoint.as_str())
            .query(&[("access_token", token)])
            .json(&body)
            .send()
            .await
            .map_err(|error| failure("delivery_transport_error", error.to_string(), true, None))?;
        let status = response.status();
        let body_raw = response.text().await.unwrap_or_default();
        if status.is_success() {
            let body_json = serde_json::from_str::<Value>(&body_raw).unwrap_or(Value::Null);
            return Ok(MessengerDeliveryReceipt {
                mode: self.config.mode.as_str().to_string(),
                status: "sent".to_string(),
                recipient_id: recipient_id.to_string(),
                endpoint: endpoint.clone(),
                request_body: body,
                http_status: Some(status.as_u16()),
                message_id: body_json
                    .get("message_id")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            });
        }

        let (reason_code, retryable) = classify_provider_status(status);
        Err(failure(
            reason_code,
            truncate_detail(&body_raw),
            retryable,
            Some(status.as_u16()),
        ))
    }
}

#[async_trait]
impl MessengerSender for MessengerOutboundDispatcher {
    async fn send_text(
        &self,
        recipient_id: &str,
        text: &str,
    ) -> Result<MessengerDeliveryReceipt, MessengerDeliveryError> {
        self.dispatch(recipient_id, build_text_message_body(recipient_id, text))
            .await
    }

    async fn send_buttons(
        &self,
        recipient_id: &str,
        text: &str,
        buttons: &[ReplyOption],
    ) -> Result<MessengerDeliveryReceipt, MessengerDeliveryError> {
        self.dispatch(
            recipient_id,
            build_button_message_body(recipient_id, text, buttons),
        )
        .await
    }

    async fn send_quick_replies(
        &self,
        recipient_id: &str,
        text: &str,
        replies: &[ReplyOption],
    ) -> Result<MessengerDeliveryReceipt, MessengerDeliveryError> {
        self.dispatch(
            recipient_id,
            build_quick_replies_message_body(recipient_id, text, replies),
        )
        .await
    }
}

fn classify_provider_status(status: StatusCode) -> (&'static str, bool) {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return ("delivery_rate_limited", true);
    }
    if status.is_server_error() {
        return ("delivery_provider_unavailable", true);
    }
    if status.is_client_error() {
        return ("delivery_request_rejected", false);
    }
    ("delivery_unknown_http_failure", true)
}

fn truncate_detail(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() <= DETAIL_LIMIT {
        return trimmed.to_string();
    }
    let mut output = trimmed.chars().take(DETAIL_LIMIT).collect::<String>();
    output.push_str("...");
    output
}
