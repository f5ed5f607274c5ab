//! Run summary
//!
//! Messages worth keeping after a run (sanity-check warnings, validation
//! notes, season changes) are collected here and mirrored to `tracing`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Information,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub date: Option<NaiveDate>,
    pub source: String,
    pub text: String,
    pub kind: MessageType,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    messages: Vec<Message>,
}

impl Summary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_message(
        &mut self,
        source: &str,
        date: Option<NaiveDate>,
        text: impl Into<String>,
        kind: MessageType,
    ) {
        let text = text.into();
        let day = date.map(|d| d.to_string()).unwrap_or_default();
        match kind {
            MessageType::Information => info!(source, date = %day, "{}", text),
            MessageType::Warning => warn!(source, date = %day, "{}", text),
            MessageType::Error => error!(source, date = %day, "{}", text),
        }
        self.messages.push(Message {
            date,
            source: source.to_string(),
            text,
            kind,
        });
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(|m| m.kind == MessageType::Warning)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
