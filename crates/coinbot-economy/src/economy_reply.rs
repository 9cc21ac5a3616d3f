//! Transport-agnostic reply shapes.

use crate::economy_outcome::{Outcome, OutcomeKind, OutcomeOption};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A labelled choice whose payload is fed back into the command resolver.
pub struct ReplyOption {
    pub title: String,
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates supported `ReplyMessage` values.
pub enum ReplyMessage {
    Text {
        text: String,
    },
    Buttons {
        text: String,
        buttons: Vec<ReplyOption>,
    },
    QuickReplies {
        text: String,
        replies: Vec<ReplyOption>,
    },
}

impl ReplyMessage {
    pub fn text(&self) -> &str {
        match self {
            Self::Text { text } | Self::Buttons { text, .. } | Self::QuickReplies { text, .. } => {
                text
            }
        }
    }

    pub fn options(&self) -> &[ReplyOption] {
        match self {
            Self::Text { .. } => &[],
            Self::Buttons { buttons, .. } => buttons,
            Self::QuickReplies { replies, .. } => replies,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Buttons { .. } => "buttons",
            Self::QuickReplies { .. } => "quick_replies",
        }
    }
}

pub fn render_reply(outcome: &Outcome) -> ReplyMessage {
    let text = outcome.body.clone();
    match outcome.kind {
        OutcomeKind::Text => ReplyMessage::Text { text },
        OutcomeKind::Buttons => ReplyMessage::Buttons {
            text,
            buttons: render_options(&outcome.options),
        },
        OutcomeKind::QuickReplies => ReplyMessage::QuickReplies {
            text,
            replies: render_options(&outcome.options),
        },
    }
}

fn render_options(options: &[OutcomeOption]) -> Vec<ReplyOption> {
    options
        .iter()
        .map(|option| ReplyOption {
            title: option.label.clone(),
            payload: option.value.clone(),
        })
        .collect()
}
