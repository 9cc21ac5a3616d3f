use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use coinbot_economy::{EconomyEngine, RedeemCodeRegistry, ScriptedRandomSource};
use coinbot_messenger::{
    build_messenger_webhook_router, MessengerOutboundConfig, MessengerOutboundDispatcher,
    MessengerOutboundMode, MessengerWebhookConfig, MessengerWebhookState,
};
use httpmock::{prelude::*, Mock};
use serde_json::{json, Value};
use tokio::{net::TcpListener, task::JoinHandle};

const REDEEM_CODE: &str = "RDM-7-0A1B2C3D";

struct Harness {
    addr: SocketAddr,
    engine: Arc<EconomyEngine>,
    client: reqwest::Client,
    handle: JoinHandle<()>,
}

impl Harness {
    async fn start(outbound: MessengerOutboundConfig, rolls: Vec<f64>) -> Self {
        let engine = Arc::new(EconomyEngine::new(
            RedeemCodeRegistry::from_codes([REDEEM_CODE]),
            ScriptedRandomSource::new(rolls),
        ));
        let dispatcher = MessengerOutboundDispatcher::new(outbound).expect("dispatcher");
        let state = Arc::new(MessengerWebhookState {
            config: MessengerWebhookConfig {
                bind: "127.0.0.1:0".to_string(),
                verify_token: Some("verify-me".to_string()),
                app_secret: None,
            },
            engine: Arc::clone(&engine),
            sender: Arc::new(dispatcher),
        });
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = build_messenger_webhook_router(state);
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        tokio::time::sleep(Duration::from_millis(25)).await;
        Self {
            addr,
            engine,
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn send_text(&self, sender_id: &str, text: &str) -> Value {
        let body = json!({
            "object": "page",
            "entry": [{"messaging": [
                {"sender": {"id": sender_id}, "recipient": {"id": "page-1"}, "message": {"text": text}}
            ]}]
        });
        let response = self
            .client
            .post(format!("http://{}/api/webhook", self.addr))
            .json(&body)
            .send()
            .await
            .expect("webhook request");
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json::<Value>().await.expect("webhook summary")
    }

    fn balance(&self, sender_id: &str) -> (u64, u64, u32) {
        let account = self.engine.account(sender_id).expect("account");
        (account.coins, account.exp, account.level)
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn wait_for_calls(mock: &Mock<'_>, expected: usize) -> usize {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let calls = mock.calls_async().await;
        if calls >= expected || Instant::now() >= deadline {
            return calls;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn dry_run_config() -> MessengerOutboundConfig {
    MessengerOutboundConfig {
        mode: MessengerOutboundMode::DryRun,
        ..MessengerOutboundConfig::default()
    }
}

#[tokio::test]
async fn integration_new_user_progression_through_webhook() {
    let harness = Harness::start(dry_run_config(), vec![0.1]).await;

    harness.send_text("user-1", "daily").await;
    assert_eq!(harness.balance("user-1"), (120, 750, 1));

    harness.send_text("user-1", "hourly").await;
    assert_eq!(harness.balance("user-1"), (125, 900, 1));

    harness.send_text("user-1", "slots 10").await;
    assert_eq!(harness.balance("user-1"), (135, 950, 1));

    let summary = harness.send_text("user-1", "Dice 10").await;
    assert_eq!(harness.balance("user-1"), (145, 980, 1));
    assert_eq!(summary["status"], "accepted");
    assert_eq!(summary["events"], 1);
}

#[tokio::test]
async fn integration_redeem_code_pays_out_once_across_senders() {
    let harness = Harness::start(dry_run_config(), vec![0.5]).await;

    harness
        .send_text("user-1", &format!("redeemcode {}", REDEEM_CODE.to_lowercase()))
        .await;
    harness
        .send_text("user-1", &format!("redeemcode {REDEEM_CODE}"))
        .await;
    harness
        .send_text("user-2", &format!("redeemcode {REDEEM_CODE}"))
        .await;

    assert_eq!(harness.balance("user-1").0, 100_000_000_100);
    assert_eq!(harness.balance("user-2").0, 100);
    assert!(harness.engine.is_code_redeemed(REDEEM_CODE));
}

#[tokio::test]
async fn integration_provider_mode_delivers_replies_to_send_api() {
    let server = MockServer::start();
    let daily = server.mock(|when, then| {
        when.method(POST)
            .path("/me/messages")
            .query_param("access_token", "page-token")
            .json_body(json!({
                "recipient": {"id": "user-1"},
                "message": {
                    "text": "🎁 Daily reward: +20 coins, +750 EXP",
                    "quick_replies": [
                        {"content_type": "text", "title": "Profile", "payload": "profile"},
                        {"content_type": "text", "title": "Work", "payload": "work"}
                    ]
                }
            }));
        then.status(200)
            .json_body(json!({"recipient_id": "user-1", "message_id": "mid.1"}));
    });
    let profile = server.mock(|when, then| {
        when.method(POST)
            .path("/me/messages")
            .json_body_includes(
                json!({
                    "message": {"text": "USER: user-1\nBALANCE: 120\nLEVEL: 1 (750 exp)"}
                })
                .to_string(),
            );
        then.status(200)
            .json_body(json!({"recipient_id": "user-1", "message_id": "mid.2"}));
    });

    let harness = Harness::start(
        MessengerOutboundConfig {
            mode: MessengerOutboundMode::Provider,
            graph_api_base: server.base_url(),
            page_access_token: Some("page-token".to_string()),
            http_timeout_ms: 2_000,
        },
        vec![0.5],
    )
    .await;

    let first = harness.send_text("user-1", "daily").await;
    assert_eq!(wait_for_calls(&daily, 1).await, 1);
    let second = harness.send_text("user-1", "profile").await;
    assert_eq!(wait_for_calls(&profile, 1).await, 1);

    daily.assert_calls_async(1).await;
    profile.assert_calls_async(1).await;
    assert_eq!(first["events"], 1);
    assert_eq!(second["events"], 1);
}

#[tokio::test]
async fn integration_provider_outage_does_not_roll_back_wager() {
    let server = MockServer::start();
    let outage = server.mock(|when, then| {
        when.method(POST).path("/me/messages");
        then.status(500).body("internal error");
    });

    let harness = Harness::start(
        MessengerOutboundConfig {
            mode: MessengerOutboundMode::Provider,
            graph_api_base: server.base_url(),
            page_access_token: Some("page-token".to_string()),
            http_timeout_ms: 2_000,
        },
        vec![0.9],
    )
    .await;

    let summary = harness.send_text("user-1", "slots 40").await;
    assert_eq!(summary["events"], 1);
    assert_eq!(harness.balance("user-1"), (60, 0, 1));
    assert_eq!(wait_for_calls(&outage, 1).await, 1);
    assert_eq!(harness.balance("user-1"), (60, 0, 1));
}

#[tokio::test]
async fn integration_verify_handshake_round_trip() {
    let harness = Harness::start(dry_run_config(), vec![0.5]).await;
    let response = harness
        .client
        .get(format!(
            "http://{}/api/webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=challenge-42",
            harness.addr
        ))
        .send()
        .await
        .expect("verify request");
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.expect("body"), "challenge-42");
}

#[tokio::test]
async fn integration_slow_send_api_does_not_hold_webhook_ack() {
    let server = MockServer::start();
    let slow = server.mock(|when, then| {
        when.method(POST).path("/me/messages");
        then.status(200)
            .delay(Duration::from_millis(1_500))
            .json_body(json!({"recipient_id": "user-1", "message_id": "mid.slow"}));
    });

    let harness = Harness::start(
        MessengerOutboundConfig {
            mode: MessengerOutboundMode::Provider,
            graph_api_base: server.base_url(),
            page_access_token: Some("page-token".to_string()),
            http_timeout_ms: 5_000,
        },
        vec![0.5],
    )
    .await;

    let body = json!({
        "object": "page",
        "entry": [{"messaging": [
            {"sender": {"id": "user-1"}, "message": {"text": "daily"}},
            {"sender": {"id": "user-1"}, "message": {"text": "daily"}},
            {"sender": {"id": "user-1"}, "message": {"text": "daily"}},
            {"sender": {"id": "user-1"}, "message": {"text": "daily"}}
        ]}]
    });
    let started = Instant::now();
    let response = harness
        .client
        .post(format!("http://{}/api/webhook", harness.addr))
        .json(&body)
        .send()
        .await
        .expect("webhook request");
    let elapsed = started.elapsed();

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(
        elapsed < Duration::from_millis(1_000),
        "acknowledgement took {elapsed:?}"
    );
    assert_eq!(harness.balance("user-1"), (180, 1_500, 2));
    assert!(wait_for_calls(&slow, 1).await >= 1);
}
