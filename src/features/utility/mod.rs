//! # Utility Feature
//!
//! Everyday commands: liveness, time, uptime, help, and echo variants.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: alive, utc, uptime, about, help, listcommands, echo, rawecho, split

pub mod quote;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;

use crate::command_handler::split_command;
use crate::commands::registry::NOT_FOUND;
use crate::commands::{BotModule, CommandContext, CommandOutput, CommandSpec};

pub use quote::shell_split;

pub struct UtilityModule;

#[async_trait]
impl BotModule for UtilityModule {
    fn name(&self) -> &'static str {
        "utility"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("alive", |_, _| Ok("I'm alive :)".into()))
                .help("Check whether the bot is running"),
            CommandSpec::new("utc", utc).help("Current UTC time"),
            CommandSpec::new("uptime", uptime).help("How long the bot has been running"),
            CommandSpec::new("about", about).help("Who runs this bot"),
            CommandSpec::new("help", help).help("Help for a command: help <command>"),
            CommandSpec::new("listcommands", list_commands)
                .alias("commands")
                .help("List every command"),
            CommandSpec::new("echo", |args, _| Ok(args.join(" ").into()))
                .help("Repeat the arguments"),
            CommandSpec::new("rawecho", |args, _| {
                Ok(args.first().cloned().unwrap_or_default().into())
            })
            .parse_with(|text| Some(vec![split_command(text).1.to_string()]))
            .help("Repeat the arguments with their formatting intact"),
            CommandSpec::new("split", split)
                .parse_with(|text| shell_split(split_command(text).1))
                .help("Show how quoted arguments are split"),
        ]
    }
}

/// "3d 14h 22m 15s"
pub fn format_uptime(total_secs: u64) -> String {
    let days = total_secs / 86400;
    let hours = (total_secs % 86400) / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

fn utc(_args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutput> {
    Ok(ctx.now.format("%Y-%m-%d %H:%M:%S UTC").to_string().into())
}

fn uptime(_args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutput> {
    let elapsed = (ctx.now - ctx.state.started_at).num_seconds().max(0) as u64;
    Ok(format!("Running for {}.", format_uptime(elapsed)).into())
}

fn about(_args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutput> {
    let state = &ctx.state;
    let mut text = format!(
        "I'm {}, a chat bot run by {}.",
        state.chatbot_name, state.owner_name
    );
    if let Some(url) = &state.source_url {
        text.push_str(&format!(" Source: {url}"));
    }
    Ok(text.into())
}

fn help(args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutput> {
    let Some(name) = args.first().filter(|a| !a.is_empty()) else {
        let prefix = &ctx.state.prefix;
        return Ok(format!(
            "Use {prefix}help <command> for help on a command, or {prefix}listcommands to see them all."
        )
        .into());
    };
    Ok(ctx.registry.help(name).unwrap_or(NOT_FOUND).into())
}

fn list_commands(_args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutput> {
    let mut seen = HashSet::new();
    let names: Vec<&str> = ctx
        .registry
        .list_all()
        .into_iter()
        .map(CommandSpec::name)
        .filter(|name| seen.insert(*name))
        .collect();
    Ok(format!("Commands: {}", names.join(", ")).into())
}

fn split(args: &[String], _ctx: &mut CommandContext<'_>) -> Result<CommandOutput> {
    if args.is_empty() {
        return Ok("No arguments.".into());
    }
    let words: Vec<String> = args.iter().map(|a| format!("[{a}]")).collect();
    Ok(format!(
        "{} argument{}: {}",
        args.len(),
        if args.len() == 1 { "" } else { "s" },
        words.join(" ")
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::BotState;
    use crate::command_handler::{CommandHandler, PARSE_FAILED};
    use crate::commands::{CommandRegistry, DEFAULT_HELP};
    use crate::core::storage::SaveStore;
    use crate::transport::{ChatEvent, ConsoleCommand};
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    struct Quiet;

    #[async_trait]
    impl BotModule for Quiet {
        fn name(&self) -> &'static str {
            "quiet"
        }

        fn commands(&self) -> Vec<CommandSpec> {
            vec![CommandSpec::new("hush", |_, _| Ok(CommandOutput::Silent))]
        }
    }

    fn console(handler: &CommandHandler, state: &mut BotState, text: &str) -> CommandOutput {
        let event = ChatEvent::Console(ConsoleCommand {
            content: text.to_string(),
            post_to_room: false,
        });
        handler
            .dispatch_content(text, None, &event, state, Utc::now())
            .expect("text is a command")
    }

    fn handler() -> CommandHandler {
        let registry = CommandRegistry::load(vec![Arc::new(UtilityModule), Arc::new(Quiet)]);
        CommandHandler::new(Arc::new(registry), Arc::new(SaveStore::new("unused")))
    }

    fn reply(text: &str) -> CommandOutput {
        CommandOutput::from(text)
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(15), "15s");
        assert_eq!(format_uptime(125), "2m 5s");
        assert_eq!(format_uptime(3 * 86400 + 14 * 3600 + 22 * 60 + 15), "3d 14h 22m 15s");
    }

    #[test]
    fn test_alive_and_echo() {
        let handler = handler();
        let mut state = BotState::default();
        assert_eq!(console(&handler, &mut state, ">>alive"), reply("I'm alive :)"));
        assert_eq!(console(&handler, &mut state, ">>echo  a   b"), reply("a b"));
    }

    #[test]
    fn test_rawecho_keeps_formatting() {
        let handler = handler();
        let mut state = BotState::default();
        assert_eq!(
            console(&handler, &mut state, ">>rawecho  a   b\n  c"),
            reply(" a   b\n  c")
        );
        assert_eq!(console(&handler, &mut state, ">>rawecho"), reply(""));
    }

    #[test]
    fn test_split_quotes() {
        let handler = handler();
        let mut state = BotState::default();
        assert_eq!(
            console(&handler, &mut state, r#">>split one "two  three" 'four'"#),
            reply("3 arguments: [one] [two  three] [four]")
        );
        assert_eq!(
            console(&handler, &mut state, r#">>split "unclosed"#),
            reply(PARSE_FAILED)
        );
    }

    #[test]
    fn test_help() {
        let handler = handler();
        let mut state = BotState::default();
        assert_eq!(
            console(&handler, &mut state, ">>help echo"),
            reply("Repeat the arguments")
        );
        assert_eq!(console(&handler, &mut state, ">>help hush"), reply(DEFAULT_HELP));
        assert_eq!(console(&handler, &mut state, ">>help nope"), reply(NOT_FOUND));
        assert!(matches!(
            console(&handler, &mut state, ">>help"),
            CommandOutput::Reply(text) if text.starts_with("Use >>help")
        ));
    }

    #[test]
    fn test_listcommands_alias() {
        let handler = handler();
        let mut state = BotState::default();
        let output = console(&handler, &mut state, ">>commands");
        assert_eq!(
            output,
            reply("Commands: alive, utc, uptime, about, help, listcommands, echo, rawecho, split, hush")
        );
    }

    #[test]
    fn test_uptime_and_about() {
        let handler = handler();
        let mut state = BotState {
            chatbot_name: "Robo".to_string(),
            owner_name: "Sam".to_string(),
            source_url: Some("https://example.org/robo".to_string()),
            started_at: Utc::now() - Duration::minutes(2),
            ..BotState::default()
        };
        assert!(matches!(
            console(&handler, &mut state, ">>uptime"),
            CommandOutput::Reply(text) if text.starts_with("Running for 2m")
        ));
        assert_eq!(
            console(&handler, &mut state, ">>about"),
            reply("I'm Robo, a chat bot run by Sam. Source: https://example.org/robo")
        );
    }
}
