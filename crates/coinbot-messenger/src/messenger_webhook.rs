//! Messenger webhook server.
//!
//! `GET /api/webhook` answers the subscription handshake, `POST /api/webhook`
//! runs each inbound command through the economy engine and acknowledges the
//! batch. Every ledger change is applied before the response is returned;
//! replies go out afterwards on a background task, and send failures are
//! logged without touching the already-applied ledger change.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use coinbot_economy::{render_reply, EconomyEngine, ReplyMessage};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::messenger_contract::parse_messenger_webhook_payload;
use crate::messenger_outbound::{deliver_reply, MessengerSender};
use crate::messenger_signature::{verify_sha256_hmac_signature, MESSENGER_SIGNATURE_HEADER};

pub const MESSENGER_WEBHOOK_PATH: &str = "/api/webhook";
pub const DEFAULT_WEBHOOK_BIND: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct MessengerWebhookConfig {
    pub bind: String,
    pub verify_token: Option<String>,
    pub app_secret: Option<String>,
}

impl Default for MessengerWebhookConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_WEBHOOK_BIND.to_string(),
            verify_token: None,
            app_secret: None,
        }
    }
}

/// Shared state handed to every webhook request.
pub struct MessengerWebhookState {
    pub config: MessengerWebhookConfig,
    pub engine: Arc<EconomyEngine>,
    pub sender: Arc<dyn MessengerSender>,
}

#[derive(Debug, Deserialize)]
struct WebhookVerifyQuery {
    #[serde(rename = "hub.mode")]
    hub_mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    hub_verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    hub_challenge: Option<String>,
}

pub fn build_messenger_webhook_router(state: Arc<MessengerWebhookState>) -> Router {
    Router::new()
        .route(
            MESSENGER_WEBHOOK_PATH,
            get(handle_webhook_verify).post(handle_webhook_events),
        )
        .route("/healthz", get(handle_webhook_health))
        .with_state(state)
}

/// Binds the configured address and serves until `shutdown` resolves.
pub async fn run_messenger_webhook_server<F>(
    state: Arc<MessengerWebhookState>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bind = state.config.bind.clone();
    let listener = TcpListener::bind(bind.as_str())
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve webhook bound address")?;
    info!(
        addr = %local_addr,
        signature_check = state.config.app_secret.is_some(),
        "messenger webhook server listening"
    );
    axum::serve(listener, build_messenger_webhook_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("messenger webhook server exited unexpectedly")
}

async fn handle_webhook_health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status":"ok"})))
}

async fn handle_webhook_verify(
    State(state): State<Arc<MessengerWebhookState>>,
    Query(query): Query<WebhookVerifyQuery>,
) -> Response {
    let expected_verify_token = state
        .config
        .verify_token
        .as_deref()
        .map(str::trim)
        .unwrap_or("");
    let observed_verify_token = query
        .hub_verify_token
        .as_deref()
        .map(str::trim)
        .unwrap_or("");
    let mode = query.hub_mode.unwrap_or_default();

    if mode == "subscribe"
        && !expected_verify_token.is_empty()
        && observed_verify_token == expected_verify_token
    {
        info!("messenger webhook subscription verified");
        return (StatusCode::OK, query.hub_challenge.unwrap_or_default()).into_response();
    }
    warn!(mode = %mode, "messenger webhook verification failed");
    StatusCode::FORBIDDEN.into_response()
}

async fn handle_webhook_events(
    State(state): State<Arc<MessengerWebhookState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if let Some(app_secret) = state.config.app_secret.as_deref() {
        let signature = headers
            .get(MESSENGER_SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");
        if let Err(error) = verify_sha256_hmac_signature(body.as_bytes(), signature, app_secret) {
            warn!(error = %error, "messenger webhook signature rejected");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error":{"code":"invalid_signature","message":"webhook signature verification failed"}})),
            )
                .into_response();
        }
    }

    let payload = match parse_messenger_webhook_payload(&body) {
        Ok(payload) => payload,
        Err(error) => {
            warn!(error = %error, "messenger webhook payload rejected");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error":{"code":"parse_failed","message":"invalid webhook payload"}})),
            )
                .into_response();
        }
    };
    if !payload.is_page_subscription() {
        return StatusCode::NOT_FOUND.into_response();
    }

    let events = payload.command_events();
    let replies = events
        .iter()
        .map(|event| {
            let outcome = state.engine.execute(event);
            (event.sender_id.clone(), render_reply(&outcome))
        })
        .collect::<Vec<_>>();
    info!(events = events.len(), "messenger webhook batch applied");
    if !replies.is_empty() {
        tokio::spawn(deliver_batch_replies(Arc::clone(&state.sender), replies));
    }
    (
        StatusCode::OK,
        Json(json!({"status":"accepted","events":events.len()})),
    )
        .into_response()
}

/// Sends a batch's replies in order. Failures are logged and dropped.
async fn deliver_batch_replies(
    sender: Arc<dyn MessengerSender>,
    replies: Vec<(String, ReplyMessage)>,
) {
    let total = replies.len();
    let mut delivered = 0usize;
    for (recipient_id, reply) in &replies {
        match deliver_reply(sender.as_ref(), recipient_id, reply).await {
            Ok(receipt) => {
                delivered = delivered.saturating_add(1);
                debug!(
                    recipient_id = %recipient_id,
                    reply_kind = reply.kind_label(),
                    status = %receipt.status,
                    "messenger reply delivered"
                );
            }
            Err(error) => {
                warn!(
                    recipient_id = %recipient_id,
                    reply_kind = reply.kind_label(),
                    reason_code = %error.reason_code,
                    retryable = error.retryable,
                    error = %error,
                    "messenger reply delivery failed"
                );
            }
        }
    }
    debug!(total, delivered, "messenger reply batch finished");
}
