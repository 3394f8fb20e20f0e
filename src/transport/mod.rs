//! # Transport
//!
//! Chat-service boundary: inbound events, message lookup, and outbound replies.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Event model, transport trait, relay and in-memory transports

pub mod memory;
pub mod protocol;
pub mod relay;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use memory::{MemoryTransport, SentMessage};
pub use relay::{connect_with_retry, RelayTransport};

/// Chat user identity as assigned by the chat service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chat message identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who caused an event
///
/// `Console` is the local operator. It is trusted: it passes every owner check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Author {
    User(UserId),
    Console,
}

/// A chat message as seen by the bot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub author: UserId,
    #[serde(default)]
    pub author_name: String,
    /// Markdown source of the message, not the rendered HTML
    pub content: String,
}

/// A command typed into the local console
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleCommand {
    /// Full command text, prefix included
    pub content: String,
    /// Post the result to the room instead of printing it locally
    pub post_to_room: bool,
}

/// Inbound event delivered by the transport (or synthesized by the console)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    MessagePosted(Message),
    /// Content may have changed since the event fired, so only the id is carried
    MessageEdited {
        message_id: MessageId,
        user_id: UserId,
    },
    Console(ConsoleCommand),
    /// Any other room event (joins, leaves, stars, ...)
    Other {
        kind: String,
        user_id: UserId,
    },
}

impl ChatEvent {
    pub fn author(&self) -> Author {
        match self {
            ChatEvent::MessagePosted(message) => Author::User(message.author),
            ChatEvent::MessageEdited { user_id, .. } | ChatEvent::Other { user_id, .. } => {
                Author::User(*user_id)
            }
            ChatEvent::Console(_) => Author::Console,
        }
    }

    /// Short kind label, used for logging and activity counts
    pub fn kind(&self) -> &str {
        match self {
            ChatEvent::MessagePosted(_) => "message_posted",
            ChatEvent::MessageEdited { .. } => "message_edited",
            ChatEvent::Console(_) => "console",
            ChatEvent::Other { kind, .. } => kind,
        }
    }

    /// Whether the dispatch pipeline looks for commands in this event
    pub fn carries_command(&self) -> bool {
        matches!(
            self,
            ChatEvent::MessagePosted(_) | ChatEvent::MessageEdited { .. } | ChatEvent::Console(_)
        )
    }
}

/// Outbound half of the chat service
///
/// Inbound events are delivered separately on an `mpsc` channel so the bot can
/// select over them together with console input.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// The bot's own identity, once known
    fn self_id(&self) -> Option<UserId>;

    /// Fetch the current state of a message
    async fn fetch_message(&self, id: MessageId) -> Result<Message>;

    /// Reply to a message; with `reference` the text is prefixed with `:<id> `
    async fn reply(&self, to: MessageId, text: &str, reference: bool) -> Result<()>;

    /// Post a message to the room, unrelated to any other message
    async fn send(&self, text: &str) -> Result<()>;
}
