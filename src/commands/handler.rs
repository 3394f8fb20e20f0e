//! Module trait and lifecycle hook infrastructure
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Modules contribute commands plus optional load/stop/event hooks

use anyhow::Result;
use async_trait::async_trait;

use super::spec::CommandSpec;
use crate::bot::BotState;
use crate::core::storage::SaveStore;
use crate::transport::{ChatEvent, ChatTransport};

/// What load and stop hooks get to work with
pub struct HookContext<'a> {
    pub state: &'a mut BotState,
    pub transport: &'a dyn ChatTransport,
    pub storage: &'a SaveStore,
}

/// A feature unit contributing commands and hooks
///
/// Only `name` and `commands` are required. The hooks default to doing
/// nothing.
///
/// # Example
///
/// ```ignore
/// pub struct PingModule;
///
/// #[async_trait]
/// impl BotModule for PingModule {
///     fn name(&self) -> &'static str {
///         "ping"
///     }
///
///     fn commands(&self) -> Vec<CommandSpec> {
///         vec![CommandSpec::new("ping", |_, _| Ok("pong".into()))]
///     }
/// }
/// ```
#[async_trait]
pub trait BotModule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Called once when the registry loads the module
    fn commands(&self) -> Vec<CommandSpec>;

    /// Storage subdirectory this module saves into
    fn save_subdir(&self) -> Option<&'static str> {
        None
    }

    /// Runs after the bot has joined the room
    async fn on_load(&self, _ctx: &mut HookContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Runs during shutdown
    async fn on_stop(&self, _ctx: &mut HookContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Sees every event that passes the gate, command or not
    async fn on_event(
        &self,
        _event: &ChatEvent,
        _transport: &dyn ChatTransport,
        _state: &mut BotState,
    ) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that the trait is object-safe (can be used with dyn)
    fn _assert_object_safe(_: &dyn BotModule) {}
}
