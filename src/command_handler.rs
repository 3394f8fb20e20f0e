//! # Dispatch Pipeline
//!
//! Takes one inbound event from the gate to the reply: watchers, kind and
//! self filters, content resolution, normalization, prefix detection,
//! validation, custom argument parsing, execution, and reply formatting.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Single-pass pipeline with unified command-name extraction

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::bot::BotState;
use crate::commands::registry::NOT_FOUND;
use crate::commands::{CommandContext, CommandOutput, CommandRegistry, CommandSpec};
use crate::core::normalize::normalize;
use crate::core::response::format_reply;
use crate::core::storage::SaveStore;
use crate::transport::{Author, ChatEvent, ChatTransport, Message};

pub const INVALID_CHARACTERS: &str = "Command contains invalid characters.";
pub const PARSE_FAILED: &str = "Argument parsing failed.";

/// How far an event got
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Stopped before any command was looked up
    Ignored,
    /// A command name was found after the prefix; this is what it produced
    Handled(CommandOutput),
}

/// Lower-cased command name and the argument string after it
///
/// The name ends at the first whitespace character; exactly one separator is
/// consumed. Both the custom-parse check and execution derive the name here,
/// so they always agree on which command is meant.
pub fn split_command(command_text: &str) -> (String, &str) {
    match command_text.char_indices().find(|(_, c)| c.is_whitespace()) {
        Some((i, c)) => (
            command_text[..i].to_lowercase(),
            &command_text[i + c.len_utf8()..],
        ),
        None => (command_text.to_lowercase(), ""),
    }
}

/// Default argument split: single spaces, nothing for an empty string
pub fn split_arguments(arguments: &str) -> Vec<String> {
    if arguments.is_empty() {
        Vec::new()
    } else {
        arguments.split(' ').map(str::to_string).collect()
    }
}

#[derive(Clone)]
pub struct CommandHandler {
    registry: Arc<CommandRegistry>,
    storage: Arc<SaveStore>,
}

impl CommandHandler {
    pub fn new(registry: Arc<CommandRegistry>, storage: Arc<SaveStore>) -> Self {
        Self { registry, storage }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn storage(&self) -> &SaveStore {
        &self.storage
    }

    /// Run the whole pipeline for one event, replies included
    pub async fn handle_event(
        &self,
        event: &ChatEvent,
        state: &mut BotState,
        transport: &dyn ChatTransport,
    ) -> Result<Dispatch> {
        self.handle_event_at(event, state, transport, Utc::now()).await
    }

    /// [`Self::handle_event`] with an explicit clock
    pub async fn handle_event_at(
        &self,
        event: &ChatEvent,
        state: &mut BotState,
        transport: &dyn ChatTransport,
        now: DateTime<Utc>,
    ) -> Result<Dispatch> {
        let request_id = Uuid::new_v4();
        let author = event.author();

        if !state.admits(author, now) {
            debug!("[{request_id}] Gate closed for {:?} ({})", author, event.kind());
            return Ok(Dispatch::Ignored);
        }

        self.registry
            .fire_event_watchers(event, transport, state)
            .await;

        if !event.carries_command() {
            return Ok(Dispatch::Ignored);
        }

        if let Author::User(id) = author {
            if transport.self_id() == Some(id) {
                return Ok(Dispatch::Ignored);
            }
        }

        let fetched;
        let (message, content): (Option<&Message>, &str) = match event {
            ChatEvent::MessagePosted(message) => (Some(message), message.content.as_str()),
            ChatEvent::MessageEdited { message_id, .. } => {
                match transport.fetch_message(*message_id).await {
                    Ok(message) => {
                        fetched = message;
                        (Some(&fetched), fetched.content.as_str())
                    }
                    Err(e) => {
                        // No content: nothing can match the prefix
                        warn!("[{request_id}] Could not re-fetch edited message {message_id}: {e:#}");
                        return Ok(Dispatch::Ignored);
                    }
                }
            }
            ChatEvent::Console(console) => (None, console.content.as_str()),
            ChatEvent::Other { .. } => return Ok(Dispatch::Ignored),
        };

        let Some(output) = self.dispatch_content(content, message, event, state, now) else {
            return Ok(Dispatch::Ignored);
        };
        debug!("[{request_id}] Command produced {:?}", output);

        if let (Some(message), Some(text)) = (message, output.text()) {
            for reply in format_reply(message.id, text) {
                transport
                    .reply(message.id, &reply.text, reply.reference)
                    .await?;
            }
        }

        Ok(Dispatch::Handled(output))
    }

    /// Normalize content and run the command it names
    ///
    /// Returns `None` when the content is not a command at all.
    pub fn dispatch_content(
        &self,
        content: &str,
        message: Option<&Message>,
        event: &ChatEvent,
        state: &mut BotState,
        now: DateTime<Utc>,
    ) -> Option<CommandOutput> {
        let prefix = state.prefix.clone();
        let normalized = normalize(content, &prefix);

        let first_token = normalized.text.split(' ').next().unwrap_or("");
        if prefix.is_empty() || !first_token.starts_with(&prefix) {
            return None;
        }

        let mut command_text = &normalized.text[prefix.len()..];
        let (candidate, _) = split_command(command_text);
        if self
            .registry
            .resolve(&candidate)
            .is_some_and(CommandSpec::has_custom_parser)
        {
            if let Some(raw) = normalized.pre_collapse.trim_start().strip_prefix(&prefix) {
                command_text = raw;
            }
        }

        Some(self.command(command_text, message, event, state, now))
    }

    /// Validate, parse, and execute the command text (prefix already removed)
    pub fn command(
        &self,
        command_text: &str,
        message: Option<&Message>,
        event: &ChatEvent,
        state: &mut BotState,
        now: DateTime<Utc>,
    ) -> CommandOutput {
        let (name, arguments) = split_command(command_text);

        let Some(cmd) = self.registry.resolve(&name) else {
            return NOT_FOUND.into();
        };
        if !cmd.accepts_arguments(arguments) {
            return INVALID_CHARACTERS.into();
        }

        let args = match cmd.parse_arguments(command_text) {
            Some(Some(parsed)) => parsed,
            Some(None) => return PARSE_FAILED.into(),
            None => split_arguments(arguments),
        };

        let mut ctx = CommandContext {
            message,
            event,
            state,
            registry: &self.registry,
            storage: &self.storage,
            now,
        };
        self.registry.execute(&name, &args, &mut ctx)
    }
}
