//! # Command System
//!
//! Prefix command descriptors, module groups, and the registry that resolves them.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Command specs, module trait with lifecycle hooks, first-match registry

pub mod context;
pub mod group;
pub mod handler;
pub mod registry;
pub mod spec;

// Re-export handler infrastructure
pub use context::{CommandContext, CommandOutput};
pub use group::CommandGroup;
pub use handler::{BotModule, HookContext};
pub use registry::CommandRegistry;
pub use spec::{char_set, ArgParser, CommandFn, CommandSpec, DEFAULT_HELP};
