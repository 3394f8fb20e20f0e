//! Shared context for command handlers
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Message/event context, gating state, registry and storage access

use chrono::{DateTime, Utc};

use super::registry::CommandRegistry;
use crate::bot::BotState;
use crate::core::storage::SaveStore;
use crate::transport::{Author, ChatEvent, Message};

/// What a command produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Text to send back
    Reply(String),
    /// Nothing to send
    Silent,
}

impl CommandOutput {
    /// Reply text, if there is anything worth sending
    pub fn text(&self) -> Option<&str> {
        match self {
            CommandOutput::Reply(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

impl From<String> for CommandOutput {
    fn from(text: String) -> Self {
        CommandOutput::Reply(text)
    }
}

impl From<&str> for CommandOutput {
    fn from(text: &str) -> Self {
        CommandOutput::Reply(text.to_string())
    }
}

/// Everything a handler can see and touch while it runs
///
/// `message` is `None` for commands typed into the console.
pub struct CommandContext<'a> {
    pub message: Option<&'a Message>,
    pub event: &'a ChatEvent,
    pub state: &'a mut BotState,
    pub registry: &'a CommandRegistry,
    pub storage: &'a SaveStore,
    pub now: DateTime<Utc>,
}

impl CommandContext<'_> {
    pub fn author(&self) -> Author {
        self.event.author()
    }

    pub fn is_console(&self) -> bool {
        self.message.is_none()
    }

    pub fn invoker_is_owner(&self) -> bool {
        self.state.is_owner(self.author())
    }

    pub fn invoker_is_privileged(&self) -> bool {
        self.state.is_privileged(self.author())
    }
}
