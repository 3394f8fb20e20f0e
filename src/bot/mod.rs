//! # Bot
//!
//! Owns the gating state and drives the dispatch pipeline: startup hooks,
//! the event/console loop, and shutdown hooks.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Single-owner run loop over transport events and console lines

pub mod state;

pub use state::BotState;

use anyhow::Result;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::command_handler::{CommandHandler, Dispatch};
use crate::commands::HookContext;
use crate::transport::{ChatEvent, ChatTransport, ConsoleCommand};

pub struct Bot {
    state: BotState,
    handler: CommandHandler,
    transport: Arc<dyn ChatTransport>,
    startup_message: Option<String>,
}

/// What a console line turns into
fn parse_console_line(line: &str, prefix: &str) -> Option<ConsoleCommand> {
    let mut chars = line.char_indices();
    if !matches!(chars.next(), Some((_, '$'))) {
        return None;
    }
    let (_, mode) = chars.next()?;
    let (rest_start, _) = chars.next()?;
    Some(ConsoleCommand {
        content: format!("{prefix}{}", &line[rest_start..]),
        post_to_room: mode == '+',
    })
}

impl Bot {
    pub fn new(state: BotState, handler: CommandHandler, transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            state,
            handler,
            transport,
            startup_message: None,
        }
    }

    /// Posted to the room once startup hooks have run
    pub fn with_startup_message(mut self, message: Option<String>) -> Self {
        self.startup_message = message;
        self
    }

    pub fn state(&self) -> &BotState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut BotState {
        &mut self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// Run load hooks and announce the bot
    pub async fn start(&mut self) -> Result<()> {
        let mut ctx = HookContext {
            state: &mut self.state,
            transport: self.transport.as_ref(),
            storage: self.handler.storage(),
        };
        self.handler.registry().fire_on_load(&mut ctx).await;

        if let Some(message) = &self.startup_message {
            self.transport.send(message).await?;
        }
        info!(
            "✅ {} started with {} commands",
            self.state.chatbot_name,
            self.handler.registry().len()
        );
        Ok(())
    }

    pub async fn handle_event(&mut self, event: &ChatEvent) -> Result<Dispatch> {
        self.handler
            .handle_event(event, &mut self.state, self.transport.as_ref())
            .await
    }

    /// Handle one line of operator input
    ///
    /// `$+cmd` runs `cmd` and posts the result to the room, `$-cmd` (any
    /// second character other than `+`) returns it for local printing. Any
    /// other non-blank line is posted to the room as is.
    pub async fn handle_console_line(&mut self, line: &str) -> Result<Option<String>> {
        let Some(command) = parse_console_line(line, &self.state.prefix) else {
            if !line.trim().is_empty() {
                self.transport.send(line).await?;
            }
            return Ok(None);
        };

        let post_to_room = command.post_to_room;
        let dispatch = self.handle_event(&ChatEvent::Console(command)).await?;
        let Dispatch::Handled(output) = dispatch else {
            return Ok(None);
        };
        let Some(text) = output.text() else {
            return Ok(None);
        };

        if post_to_room {
            self.transport.send(text).await?;
            Ok(None)
        } else {
            Ok(Some(text.to_string()))
        }
    }

    /// Process events and console lines until the bot is stopped
    ///
    /// Events are handled one at a time, replies included. Console input goes
    /// first when both are ready. A closed console is fine; a closed event
    /// stream ends the loop.
    pub async fn run(
        &mut self,
        mut events: mpsc::Receiver<ChatEvent>,
        mut console: mpsc::Receiver<String>,
    ) -> Result<()> {
        let mut console_open = true;

        while self.state.running {
            tokio::select! {
                biased;

                line = console.recv(), if console_open => match line {
                    Some(line) => match self.handle_console_line(&line).await {
                        Ok(Some(text)) => println!("{text}"),
                        Ok(None) => {}
                        Err(e) => error!("Console command failed: {e:#}"),
                    },
                    None => console_open = false,
                },
                event = events.recv() => match event {
                    Some(event) => {
                        if let Err(e) = self.handle_event(&event).await {
                            error!("Failed to handle {} event: {e:#}", event.kind());
                        }
                    }
                    None => {
                        warn!("Event stream closed");
                        break;
                    }
                },
            }
        }

        self.shutdown().await;
        Ok(())
    }

    /// Run stop hooks
    pub async fn shutdown(&mut self) {
        self.state.running = false;
        let mut ctx = HookContext {
            state: &mut self.state,
            transport: self.transport.as_ref(),
            storage: self.handler.storage(),
        };
        self.handler.registry().fire_on_stop(&mut ctx).await;
        info!("👋 Bot stopped");
    }
}
