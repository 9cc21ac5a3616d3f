//! Text command resolution.
//!
//! Input is trimmed and lowercased, then matched against the command set:
//! `help`, `profile`, `mine`, `daily`, `hourly`, `bankrob` and `work` must
//! match exactly; `slots`, `redeemcode` and `dice` match by prefix and read
//! their argument from the second space-delimited token.

pub const DEFAULT_WAGER: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates supported `EconomyCommand` values.
pub enum EconomyCommand {
    Help,
    Profile,
    Slots { bet: i64 },
    RedeemCode { code: Option<String> },
    Dice { bet: i64 },
    Mine,
    Daily,
    Hourly,
    BankRob,
    Work,
    Unknown,
}

impl EconomyCommand {
    /// Stable label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Help => "help",
            Self::Profile => "profile",
            Self::Slots { .. } => "slots",
            Self::RedeemCode { .. } => "redeemcode",
            Self::Dice { .. } => "dice",
            Self::Mine => "mine",
            Self::Daily => "daily",
            Self::Hourly => "hourly",
            Self::BankRob => "bankrob",
            Self::Work => "work",
            Self::Unknown => "unknown",
        }
    }
}

pub fn normalize_command_text(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Resolves raw message or postback text into an [`EconomyCommand`].
pub fn resolve_command(raw: &str) -> EconomyCommand {
    let text = normalize_command_text(raw);
    match text.as_str() {
        "help" => return EconomyCommand::Help,
        "profile" => return EconomyCommand::Profile,
        "mine" => return EconomyCommand::Mine,
        "daily" => return EconomyCommand::Daily,
        "hourly" => return EconomyCommand::Hourly,
        "bankrob" => return EconomyCommand::BankRob,
        "work" => return EconomyCommand::Work,
        _ => {}
    }

    if text.starts_with("slots") {
        EconomyCommand::Slots {
            bet: parse_wager(argument_token(&text)),
        }
    } else if text.starts_with("redeemcode") {
        EconomyCommand::RedeemCode {
            code: argument_token(&text)
                .filter(|token| !token.is_empty())
                .map(str::to_string),
        }
    } else if text.starts_with("dice") {
        EconomyCommand::Dice {
            bet: parse_wager(argument_token(&text)),
        }
    } else {
        EconomyCommand::Unknown
    }
}

/// Reads a wager argument, falling back to [`DEFAULT_WAGER`] when the token is
/// missing, non-numeric or zero. Sign and magnitude are left for the engine
/// to judge.
pub fn parse_wager(token: Option<&str>) -> i64 {
    match token.and_then(parse_integer_prefix) {
        None | Some(0) => DEFAULT_WAGER,
        Some(value) => value,
    }
}

fn argument_token(text: &str) -> Option<&str> {
    text.split(' ').nth(1)
}

/// Parses an optional sign followed by leading decimal digits, ignoring any
/// trailing characters (`"20abc"` is 20). Out-of-range values saturate.
fn parse_integer_prefix(token: &str) -> Option<i64> {
    let token = token.trim_start();
    let (negative, digits) = match token.as_bytes().first() {
        Some(b'-') => (true, &token[1..]),
        Some(b'+') => (false, &token[1..]),
        _ => (false, token),
    };
    let digit_count = digits.bytes().take_while(u8::is_ascii_digit).count();
    if digit_count == 0 {
        return None;
    }
    let mut value = 0i64;
    for byte in digits.bytes().take(digit_count) {
        let digit = i64::from(byte - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::{parse_integer_prefix, parse_wager, resolve_command, EconomyCommand};

    #[test]
    fn unit_exact_commands_resolve_case_insensitively() {
        assert_eq!(resolve_command("help"), EconomyCommand::Help);
        assert_eq!(resolve_command("  PROFILE "), EconomyCommand::Profile);
        assert_eq!(resolve_command("Mine"), EconomyCommand::Mine);
        assert_eq!(resolve_command("daily"), EconomyCommand::Daily);
        assert_eq!(resolve_command("HOURLY"), EconomyCommand::Hourly);
        assert_eq!(resolve_command("bankrob"), EconomyCommand::BankRob);
        assert_eq!(resolve_command("work"), EconomyCommand::Work);
    }

    #[test]
    fn unit_exact_commands_reject_trailing_arguments() {
        assert_eq!(resolve_command("help me"), EconomyCommand::Unknown);
        assert_eq!(resolve_command("work hard"), EconomyCommand::Unknown);
        assert_eq!(resolve_command(""), EconomyCommand::Unknown);
    }

    #[test]
    fn unit_wager_commands_parse_second_token() {
        assert_eq!(resolve_command("slots 20"), EconomyCommand::Slots { bet: 20 });
        assert_eq!(resolve_command("DICE 35"), EconomyCommand::Dice { bet: 35 });
        assert_eq!(resolve_command("slots 20abc"), EconomyCommand::Slots { bet: 20 });
    }

    #[test]
    fn unit_wager_defaults_when_missing_zero_or_non_numeric() {
        assert_eq!(resolve_command("slots"), EconomyCommand::Slots { bet: 10 });
        assert_eq!(resolve_command("slots 0"), EconomyCommand::Slots { bet: 10 });
        assert_eq!(resolve_command("dice lots"), EconomyCommand::Dice { bet: 10 });
        assert_eq!(resolve_command("slots  20"), EconomyCommand::Slots { bet: 10 });
        assert_eq!(resolve_command("slotsmachine"), EconomyCommand::Slots { bet: 10 });
    }

    #[test]
    fn regression_negative_and_huge_wagers_pass_through_resolver() {
        assert_eq!(resolve_command("slots -5"), EconomyCommand::Slots { bet: -5 });
        assert_eq!(
            resolve_command("dice 99999999999999999999999"),
            EconomyCommand::Dice { bet: i64::MAX }
        );
    }

    #[test]
    fn unit_redeemcode_carries_optional_code() {
        assert_eq!(
            resolve_command("redeemcode RDM-1-ABCDEF01"),
            EconomyCommand::RedeemCode {
                code: Some("rdm-1-abcdef01".to_string())
            }
        );
        assert_eq!(
            resolve_command("redeemcode"),
            EconomyCommand::RedeemCode { code: None }
        );
        assert_eq!(
            resolve_command("redeemcode  spaced"),
            EconomyCommand::RedeemCode { code: None }
        );
    }

    #[test]
    fn unit_parse_integer_prefix_handles_signs() {
        assert_eq!(parse_integer_prefix("+7"), Some(7));
        assert_eq!(parse_integer_prefix("-12x"), Some(-12));
        assert_eq!(parse_integer_prefix("-"), None);
        assert_eq!(parse_integer_prefix("x1"), None);
        assert_eq!(parse_wager(None), 10);
    }

    #[test]
    fn unit_command_labels_are_stable() {
        assert_eq!(EconomyCommand::BankRob.label(), "bankrob");
        assert_eq!(EconomyCommand::Slots { bet: 1 }.label(), "slots");
    }
}
