use clap::{Parser, ValueEnum};
use coinbot_messenger::{MessengerOutboundMode, DEFAULT_GRAPH_API_BASE, DEFAULT_WEBHOOK_BIND};

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
/// Enumerates supported `CliOutboundMode` values.
pub enum CliOutboundMode {
    DryRun,
    Provider,
}

impl From<CliOutboundMode> for MessengerOutboundMode {
    fn from(value: CliOutboundMode) -> Self {
        match value {
            CliOutboundMode::DryRun => MessengerOutboundMode::DryRun,
            CliOutboundMode::Provider => MessengerOutboundMode::Provider,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "coinbot",
    about = "Messenger economy bot: coins, EXP, wagers and redeem codes",
    version
)]
pub struct Cli {
    #[arg(
        long,
        env = "COINBOT_BIND",
        default_value = DEFAULT_WEBHOOK_BIND,
        help = "Address the webhook server listens on"
    )]
    pub bind: String,

    #[arg(
        long = "page-access-token",
        env = "PAGE_ACCESS_TOKEN",
        hide_env_values = true,
        help = "Page access token used for Send API calls. Required in provider mode."
    )]
    pub page_access_token: Option<String>,

    #[arg(
        long = "verify-token",
        env = "VERIFY_TOKEN",
        hide_env_values = true,
        help = "Token expected in the webhook subscription handshake. Verification fails while unset."
    )]
    pub verify_token: Option<String>,

    #[arg(
        long = "app-secret",
        env = "COINBOT_APP_SECRET",
        hide_env_values = true,
        help = "App secret for X-Hub-Signature-256 verification of webhook bodies"
    )]
    pub app_secret: Option<String>,

    #[arg(
        long = "graph-api-base",
        env = "COINBOT_GRAPH_API_BASE",
        default_value = DEFAULT_GRAPH_API_BASE,
        help = "Base URL for the Graph Send API"
    )]
    pub graph_api_base: String,

    #[arg(
        long = "outbound-mode",
        env = "COINBOT_OUTBOUND_MODE",
        value_enum,
        default_value_t = CliOutboundMode::Provider,
        help = "Reply delivery mode: provider sends over HTTP, dry-run only logs the payload"
    )]
    pub outbound_mode: CliOutboundMode,

    #[arg(
        long = "http-timeout-ms",
        env = "COINBOT_HTTP_TIMEOUT_MS",
        default_value_t = 5_000,
        value_parser = parse_positive_u64,
        help = "Timeout in milliseconds for outbound Send API requests"
    )]
    pub http_timeout_ms: u64,
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, CliOutboundMode};

    fn declared_default(id: &str) -> String {
        let command = Cli::command();
        let argument = command
            .get_arguments()
            .find(|argument| argument.get_id() == id)
            .expect("argument exists");
        argument
            .get_default_values()
            .iter()
            .map(|value| value.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(",")
    }

    #[test]
    fn unit_defaults_match_documented_values() {
        assert_eq!(declared_default("bind"), "0.0.0.0:3000");
        assert_eq!(
            declared_default("graph_api_base"),
            "https://graph.facebook.com/v12.0"
        );
        assert_eq!(declared_default("outbound_mode"), "provider");
        assert_eq!(declared_default("http_timeout_ms"), "5000");
        assert_eq!(declared_default("page_access_token"), "");
    }

    #[test]
    fn unit_env_bindings_match_documented_names() {
        let command = Cli::command();
        let env_for = |id: &str| {
            command
                .get_arguments()
                .find(|argument| argument.get_id() == id)
                .and_then(|argument| argument.get_env())
                .map(|name| name.to_string_lossy().into_owned())
        };
        assert_eq!(env_for("bind").as_deref(), Some("COINBOT_BIND"));
        assert_eq!(env_for("page_access_token").as_deref(), Some("PAGE_ACCESS_TOKEN"));
        assert_eq!(env_for("verify_token").as_deref(), Some("VERIFY_TOKEN"));
        assert_eq!(env_for("app_secret").as_deref(), Some("COINBOT_APP_SECRET"));
        assert_eq!(env_for("outbound_mode").as_deref(), Some("COINBOT_OUTBOUND_MODE"));
    }

    #[test]
    fn functional_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "coinbot",
            "--bind",
            "127.0.0.1:8080",
            "--page-access-token",
            "page-token",
            "--verify-token",
            "verify-me",
            "--app-secret",
            "secret",
            "--outbound-mode",
            "dry-run",
            "--http-timeout-ms",
            "750",
        ])
        .expect("parse flags");
        assert_eq!(cli.bind, "127.0.0.1:8080");
        assert_eq!(cli.page_access_token.as_deref(), Some("page-token"));
        assert_eq!(cli.verify_token.as_deref(), Some("verify-me"));
        assert_eq!(cli.app_secret.as_deref(), Some("secret"));
        assert_eq!(cli.outbound_mode, CliOutboundMode::DryRun);
        assert_eq!(cli.http_timeout_ms, 750);
    }

    #[test]
    fn regression_rejects_zero_timeout_and_unknown_mode() {
        assert!(Cli::try_parse_from(["coinbot", "--http-timeout-ms", "0"]).is_err());
        assert!(Cli::try_parse_from(["coinbot", "--outbound-mode", "carrier-pigeon"]).is_err());
    }
}
