use std::sync::Arc;

use anyhow::{bail, Context, Result};
use coinbot_economy::{
    EconomyEngine, RedeemCodeRegistry, StdRandomSource, REDEEM_CODE_COUNT,
};
use coinbot_messenger::{
    run_messenger_webhook_server, MessengerOutboundConfig, MessengerOutboundDispatcher,
    MessengerOutboundMode, MessengerWebhookConfig, MessengerWebhookState,
};
use tracing::{info, warn};

use crate::cli_args::Cli;

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub(crate) fn build_outbound_config(cli: &Cli) -> Result<MessengerOutboundConfig> {
    let mode = MessengerOutboundMode::from(cli.outbound_mode);
    let page_access_token = non_empty(cli.page_access_token.as_deref());
    if mode == MessengerOutboundMode::Provider && page_access_token.is_none() {
        bail!("--page-access-token (PAGE_ACCESS_TOKEN) is required when --outbound-mode=provider");
    }
    let graph_api_base = cli.graph_api_base.trim().trim_end_matches('/').to_string();
    if graph_api_base.is_empty() {
        bail!("--graph-api-base cannot be empty");
    }
    Ok(MessengerOutboundConfig {
        mode,
        graph_api_base,
        page_access_token,
        http_timeout_ms: cli.http_timeout_ms,
    })
}

pub(crate) fn build_webhook_config(cli: &Cli) -> Result<MessengerWebhookConfig> {
    let bind = cli.bind.trim().to_string();
    if bind.is_empty() {
        bail!("--bind cannot be empty");
    }
    Ok(MessengerWebhookConfig {
        bind,
        verify_token: non_empty(cli.verify_token.as_deref()),
        app_secret: non_empty(cli.app_secret.as_deref()),
    })
}

pub(crate) fn build_engine() -> EconomyEngine {
    let codes = RedeemCodeRegistry::generate(REDEEM_CODE_COUNT, &mut rand::thread_rng());
    EconomyEngine::new(codes, StdRandomSource::from_entropy())
}

fn log_redeem_codes(engine: &EconomyEngine) {
    let codes = engine.redeem_codes();
    info!(count = codes.len(), "generated redeem codes");
    for code in codes {
        info!(code = %code, "redeem code");
    }
}

pub(crate) async fn run_cli(cli: Cli) -> Result<()> {
    let outbound_config = build_outbound_config(&cli)?;
    let webhook_config = build_webhook_config(&cli)?;
    if webhook_config.verify_token.is_none() {
        warn!("no verify token configured; webhook subscription handshakes will be rejected");
    }

    let engine = Arc::new(build_engine());
    log_redeem_codes(&engine);

    let mode = outbound_config.mode;
    let dispatcher = MessengerOutboundDispatcher::new(outbound_config)
        .context("failed to build messenger outbound dispatcher")?;
    info!(outbound_mode = mode.as_str(), "messenger outbound ready");

    let state = Arc::new(MessengerWebhookState {
        config: webhook_config,
        engine,
        sender: Arc::new(dispatcher),
    });
    run_messenger_webhook_server(state, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "failed to listen for ctrl-c; shutting down");
        return;
    }
    info!("shutdown signal received");
}
