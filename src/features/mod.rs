//! # Features
//!
//! Built-in bot modules. Each one contributes commands and, optionally,
//! lifecycle hooks and an event watcher.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: utility, admin, notes, activity

pub mod activity;
pub mod admin;
pub mod notes;
pub mod utility;

use std::sync::Arc;

use crate::commands::BotModule;

pub use activity::ActivityModule;
pub use admin::AdminModule;
pub use notes::NotesModule;
pub use utility::UtilityModule;

/// The modules every bot loads, in registration order
pub fn builtin_modules() -> Vec<Arc<dyn BotModule>> {
    vec![
        Arc::new(UtilityModule),
        Arc::new(AdminModule),
        Arc::new(NotesModule::new()),
        Arc::new(ActivityModule::new()),
    ]
}
