//! Command execution against a sender's account.
//!
//! Each command checks its preconditions, applies its ledger mutation, and
//! returns an [`Outcome`] describing the reply. Validation failures become
//! plain text outcomes with no mutation; nothing here returns an error.

use crate::economy_command::EconomyCommand;
use crate::economy_ledger::UserAccount;
use crate::economy_random::{scaled_roll, RandomSource};
use crate::economy_redeem_codes::{RedeemCodeError, RedeemCodeRegistry};

pub const SLOTS_WIN_PROBABILITY: f64 = 0.4;
pub const SLOTS_WIN_EXP: u64 = 50;
pub const DICE_WIN_PROBABILITY: f64 = 0.5;
pub const DICE_WIN_EXP: u64 = 30;
pub const REDEEM_REWARD_COINS: u64 = 100_000_000_000;
pub const MINE_DEATH_PROBABILITY: f64 = 0.3;
pub const MINE_MIN_COINS: u64 = 20;
pub const MINE_COIN_SPAN: u64 = 100;
pub const MINE_EXP: u64 = 100;
pub const DAILY_COINS: u64 = 20;
pub const DAILY_EXP: u64 = 750;
pub const HOURLY_COINS: u64 = 5;
pub const HOURLY_EXP: u64 = 150;
pub const BANKROB_SUCCESS_PROBABILITY: f64 = 0.15;
pub const BANKROB_MIN_LOOT: u64 = 500;
pub const BANKROB_LOOT_SPAN: u64 = 1_000;
pub const WORK_MIN_SALARY: u64 = 50;
pub const WORK_SALARY_SPAN: u64 = 200;
pub const WORK_EXP: u64 = 200;

pub const WORK_JOBS: [&str; 10] = [
    "Developer",
    "Farmer",
    "Doctor",
    "Driver",
    "Chef",
    "Artist",
    "Streamer",
    "Engineer",
    "Teacher",
    "Musician",
];

pub const HELP_TEXT: &str = "Bot Commands:";
pub const NOT_ENOUGH_COINS_TEXT: &str = "Not enough coins!";
pub const REDEEM_MISSING_CODE_TEXT: &str = "Please provide a code.";
pub const REDEEM_INVALID_CODE_TEXT: &str = "Invalid code.";
pub const REDEEM_ALREADY_USED_TEXT: &str = "Code already used.";
pub const REDEEM_SUCCESS_TEXT: &str = "✅ Redeemed! You got 100B coins.";
pub const MINE_DEATH_TEXT: &str = "💀 You were slain by a monster!";
pub const DAILY_REWARD_TEXT: &str = "🎁 Daily reward: +20 coins, +750 EXP";
pub const HOURLY_REWARD_TEXT: &str = "⏳ Hourly reward: +5 coins, +150 EXP";
pub const BANKROB_FAILED_TEXT: &str = "🚓 Bankrob failed! You escaped but got nothing.";
pub const UNKNOWN_COMMAND_TEXT: &str = "❓ Unknown command. Type 'help'";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `OutcomeKind` values.
pub enum OutcomeKind {
    Text,
    Buttons,
    QuickReplies,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A tappable choice whose `value` re-enters the command resolver verbatim.
pub struct OutcomeOption {
    pub label: String,
    pub value: String,
}

impl OutcomeOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Reply descriptor produced by one command. The ledger mutation has already
/// been applied when this is returned.
pub struct Outcome {
    pub kind: OutcomeKind,
    pub body: String,
    pub options: Vec<OutcomeOption>,
}

impl Outcome {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Text,
            body: body.into(),
            options: Vec::new(),
        }
    }

    pub fn buttons(body: impl Into<String>, options: Vec<OutcomeOption>) -> Self {
        Self {
            kind: OutcomeKind::Buttons,
            body: body.into(),
            options,
        }
    }

    pub fn quick_replies(body: impl Into<String>, options: Vec<OutcomeOption>) -> Self {
        Self {
            kind: OutcomeKind::QuickReplies,
            body: body.into(),
            options,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WagerGame {
    Slots,
    Dice,
}

impl WagerGame {
    fn command_word(self) -> &'static str {
        match self {
            Self::Slots => "slots",
            Self::Dice => "dice",
        }
    }

    fn win_probability(self) -> f64 {
        match self {
            Self::Slots => SLOTS_WIN_PROBABILITY,
            Self::Dice => DICE_WIN_PROBABILITY,
        }
    }

    fn win_exp(self) -> u64 {
        match self {
            Self::Slots => SLOTS_WIN_EXP,
            Self::Dice => DICE_WIN_EXP,
        }
    }

    fn win_outcome(self, bet: i64, payout: u64) -> Outcome {
        let replay = format!("{} {bet}", self.command_word());
        match self {
            Self::Slots => Outcome::quick_replies(
                format!("🎰 You won {payout} coins!"),
                vec![
                    OutcomeOption::new("Play Again", replay),
                    OutcomeOption::new("Profile", "profile"),
                ],
            ),
            Self::Dice => Outcome::quick_replies(
                format!("🎲 You rolled high! Won {payout} coins."),
                vec![
                    OutcomeOption::new("Play Again", replay),
                    OutcomeOption::new("Profile", "profile"),
                ],
            ),
        }
    }

    fn loss_outcome(self, bet: i64) -> Outcome {
        let replay = format!("{} {bet}", self.command_word());
        match self {
            Self::Slots => Outcome::quick_replies(
                "🎰 You lost!",
                vec![
                    OutcomeOption::new("Try Again", replay),
                    OutcomeOption::new("Work", "work"),
                ],
            ),
            Self::Dice => Outcome::quick_replies(
                "🎲 You lost the dice roll!",
                vec![OutcomeOption::new("Retry", replay)],
            ),
        }
    }
}

/// Executes `command` for `account`, consulting `codes` and `random` as the
/// command requires.
pub fn execute_command(
    command: &EconomyCommand,
    account: &mut UserAccount,
    codes: &mut RedeemCodeRegistry,
    random: &mut dyn RandomSource,
) -> Outcome {
    match command {
        EconomyCommand::Help => help_outcome(),
        EconomyCommand::Profile => profile_outcome(account),
        EconomyCommand::Slots { bet } => play_wager(WagerGame::Slots, *bet, account, random),
        EconomyCommand::Dice { bet } => play_wager(WagerGame::Dice, *bet, account, random),
        EconomyCommand::RedeemCode { code } => redeem_code(code.as_deref(), account, codes),
        EconomyCommand::Mine => mine(account, random),
        EconomyCommand::Daily => {
            account.credit(DAILY_COINS);
            account.gain_exp(DAILY_EXP);
            Outcome::quick_replies(
                DAILY_REWARD_TEXT,
                vec![
                    OutcomeOption::new("Profile", "profile"),
                    OutcomeOption::new("Work", "work"),
                ],
            )
        }
        EconomyCommand::Hourly => {
            account.credit(HOURLY_COINS);
            account.gain_exp(HOURLY_EXP);
            Outcome::quick_replies(
                HOURLY_REWARD_TEXT,
                vec![
                    OutcomeOption::new("Profile", "profile"),
                    OutcomeOption::new("Slots 10", "slots 10"),
                ],
            )
        }
        EconomyCommand::BankRob => bank_rob(account, random),
        EconomyCommand::Work => work(account, random),
        EconomyCommand::Unknown => Outcome::text(UNKNOWN_COMMAND_TEXT),
    }
}

fn help_outcome() -> Outcome {
    Outcome::buttons(
        HELP_TEXT,
        vec![
            OutcomeOption::new("Profile", "profile"),
            OutcomeOption::new("Slots", "slots 10"),
            OutcomeOption::new("Work", "work"),
        ],
    )
}

fn profile_outcome(account: &UserAccount) -> Outcome {
    Outcome::quick_replies(
        format!(
            "USER: {}\nBALANCE: {}\nLEVEL: {} ({} exp)",
            account.id, account.coins, account.level, account.exp
        ),
        vec![
            OutcomeOption::new("Daily", "daily"),
            OutcomeOption::new("Work", "work"),
            OutcomeOption::new("Slots 50", "slots 50"),
        ],
    )
}

fn play_wager(
    game: WagerGame,
    bet: i64,
    account: &mut UserAccount,
    random: &mut dyn RandomSource,
) -> Outcome {
    // A negative stake has no unsigned debit; it is refused like an
    // unaffordable one.
    let Ok(stake) = u64::try_from(bet) else {
        return Outcome::text(NOT_ENOUGH_COINS_TEXT);
    };
    if !account.debit(stake) {
        return Outcome::text(NOT_ENOUGH_COINS_TEXT);
    }
    if random.next_unit() < game.win_probability() {
        let payout = stake.saturating_mul(2);
        account.credit(payout);
        account.gain_exp(game.win_exp());
        return game.win_outcome(bet, payout);
    }
    game.loss_outcome(bet)
}

fn redeem_code(
    code: Option<&str>,
    account: &mut UserAccount,
    codes: &mut RedeemCodeRegistry,
) -> Outcome {
    let Some(code) = code else {
        return Outcome::text(REDEEM_MISSING_CODE_TEXT);
    };
    match codes.redeem(code) {
        Ok(()) => {
            account.credit(REDEEM_REWARD_COINS);
            Outcome::text(REDEEM_SUCCESS_TEXT)
        }
        Err(RedeemCodeError::MissingCode) => Outcome::text(REDEEM_MISSING_CODE_TEXT),
        Err(RedeemCodeError::UnknownCode) => Outcome::text(REDEEM_INVALID_CODE_TEXT),
        Err(RedeemCodeError::AlreadyRedeemed) => Outcome::text(REDEEM_ALREADY_USED_TEXT),
    }
}

fn mine(account: &mut UserAccount, random: &mut dyn RandomSource) -> Outcome {
    if random.next_unit() < MINE_DEATH_PROBABILITY {
        return Outcome::text(MINE_DEATH_TEXT);
    }
    let found = scaled_roll(random.next_unit(), MINE_COIN_SPAN) + MINE_MIN_COINS;
    account.credit(found);
    account.gain_exp(MINE_EXP);
    Outcome::quick_replies(
        format!("⛏️ You mined {found} coins!"),
        vec![
            OutcomeOption::new("Mine Again", "mine"),
            OutcomeOption::new("Profile", "profile"),
        ],
    )
}

fn bank_rob(account: &mut UserAccount, random: &mut dyn RandomSource) -> Outcome {
    if random.next_unit() >= BANKROB_SUCCESS_PROBABILITY {
        return Outcome::text(BANKROB_FAILED_TEXT);
    }
    let loot = scaled_roll(random.next_unit(), BANKROB_LOOT_SPAN) + BANKROB_MIN_LOOT;
    account.credit(loot);
    Outcome::quick_replies(
        format!("💰 Bankrob success! Stole {loot} coins."),
        vec![OutcomeOption::new("Profile", "profile")],
    )
}

fn work(account: &mut UserAccount, random: &mut dyn RandomSource) -> Outcome {
    let job_index = scaled_roll(random.next_unit(), WORK_JOBS.len() as u64) as usize;
    let job = WORK_JOBS[job_index];
    let salary = scaled_roll(random.next_unit(), WORK_SALARY_SPAN) + WORK_MIN_SALARY;
    account.credit(salary);
    account.gain_exp(WORK_EXP);
    Outcome::quick_replies(
        format!("👷 You worked as {job} and earned {salary} coins."),
        vec![
            OutcomeOption::new("Profile", "profile"),
            OutcomeOption::new("Work Again", "work"),
        ],
    )
}
