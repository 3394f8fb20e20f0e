//! # Core Module
//!
//! Configuration, text normalization, reply formatting, and storage shared by
//! the dispatcher and the feature modules.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod config;
pub mod fixed_font;
pub mod normalize;
pub mod response;
pub mod storage;

// Re-export commonly used items
pub use config::Config;
pub use normalize::{normalize, NormalizedContent};
pub use response::{format_reply, render_reply, OutgoingReply, SINGLE_LINE_LIMIT};
pub use storage::SaveStore;
