//! Command descriptors
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Name/alias matching, character classes, custom argument parsing

use anyhow::Result;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::context::{CommandContext, CommandOutput};

/// Help text for commands registered without one
pub const DEFAULT_HELP: &str = "Command exists, but no help entry found.";

/// Executable behavior of a command
pub type CommandFn =
    Arc<dyn Fn(&[String], &mut CommandContext<'_>) -> Result<CommandOutput> + Send + Sync>;

/// Custom argument parser; receives the full command text (name included)
/// before whitespace collapse and returns `None` when parsing fails
pub type ArgParser = Arc<dyn Fn(&str) -> Option<Vec<String>> + Send + Sync>;

/// Collect the characters of a string into a set
pub fn char_set(chars: &str) -> HashSet<char> {
    chars.chars().collect()
}

/// Immutable description of one command
///
/// # Example
///
/// ```ignore
/// let cmd = CommandSpec::new("echo", |args, _ctx| Ok(args.join(" ").into()))
///     .alias("say")
///     .help("Repeats its arguments");
/// ```
#[derive(Clone)]
pub struct CommandSpec {
    name: String,
    aliases: Vec<String>,
    handler: CommandFn,
    privileged: bool,
    allowed_chars: Option<HashSet<char>>,
    disallowed_chars: Option<HashSet<char>>,
    arg_parser: Option<ArgParser>,
    help: String,
}

impl CommandSpec {
    pub fn new<F>(name: &str, handler: F) -> Self
    where
        F: Fn(&[String], &mut CommandContext<'_>) -> Result<CommandOutput> + Send + Sync + 'static,
    {
        Self {
            name: name.to_lowercase(),
            aliases: Vec::new(),
            handler: Arc::new(handler),
            privileged: false,
            allowed_chars: None,
            disallowed_chars: None,
            arg_parser: None,
            help: String::new(),
        }
    }

    pub fn alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_lowercase());
        self
    }

    pub fn help(mut self, help: &str) -> Self {
        self.help = help.to_string();
        self
    }

    /// Only owners may run it from chat
    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    /// Arguments may only contain these characters
    pub fn allowed_chars(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.allowed_chars = Some(chars.into_iter().collect());
        self
    }

    /// Arguments must not contain any of these characters
    pub fn disallowed_chars(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.disallowed_chars = Some(chars.into_iter().collect());
        self
    }

    /// Parse arguments from the raw command text instead of splitting on spaces
    pub fn parse_with<P>(mut self, parser: P) -> Self
    where
        P: Fn(&str) -> Option<Vec<String>> + Send + Sync + 'static,
    {
        self.arg_parser = Some(Arc::new(parser));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_privileged(&self) -> bool {
        self.privileged
    }

    pub fn has_custom_parser(&self) -> bool {
        self.arg_parser.is_some()
    }

    pub fn help_text(&self) -> &str {
        if self.help.is_empty() {
            DEFAULT_HELP
        } else {
            &self.help
        }
    }

    /// Case-insensitive match on the name or any alias
    pub fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.name == name || self.aliases.iter().any(|a| *a == name)
    }

    /// Character-class check over the argument string
    ///
    /// Disallowed characters win over allowed ones.
    pub fn accepts_arguments(&self, arguments: &str) -> bool {
        arguments.chars().all(|c| {
            if let Some(disallowed) = &self.disallowed_chars {
                if disallowed.contains(&c) {
                    return false;
                }
            }
            match &self.allowed_chars {
                Some(allowed) => allowed.contains(&c),
                None => true,
            }
        })
    }

    /// Run the custom parser, if any
    pub fn parse_arguments(&self, command_text: &str) -> Option<Option<Vec<String>>> {
        self.arg_parser.as_ref().map(|parse| parse(command_text))
    }

    pub fn invoke(&self, args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutput> {
        (self.handler)(args, ctx)
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("privileged", &self.privileged)
            .field("custom_parser", &self.arg_parser.is_some())
            .finish_non_exhaustive()
    }
}
