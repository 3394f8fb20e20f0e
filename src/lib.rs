// Core layer - config, normalization, reply formatting, storage
pub mod core;

// Transport layer - chat events and the relay connection
pub mod transport;

// Command layer - specs, modules, registry
pub mod commands;

// Application layer
pub mod bot;
pub mod command_handler;

// Features layer - built-in modules
pub mod features;

// Re-export the pieces a binary needs
pub use crate::bot::{Bot, BotState};
pub use crate::command_handler::{CommandHandler, Dispatch};
pub use crate::commands::{BotModule, CommandRegistry, CommandSpec};
pub use crate::core::{Config, SaveStore};
pub use crate::features::builtin_modules;
pub use crate::transport::{ChatEvent, ChatTransport, MemoryTransport, RelayTransport};
