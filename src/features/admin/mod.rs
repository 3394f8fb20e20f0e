//! # Admin Feature
//!
//! Owner controls over the gate: enable, disable, suspend, stop.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Gate commands, suspension with duration strings, status report

pub mod duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;
use log::info;

use crate::commands::registry::NO_PRIVILEGE;
use crate::commands::{BotModule, CommandContext, CommandOutput, CommandSpec};

pub use duration::{format_duration, parse_duration, DURATION_CHARS};

/// Longest suspension accepted, in seconds
pub const MAX_SUSPENSION_SECS: i64 = 52 * 7 * 24 * 60 * 60;

pub struct AdminModule;

#[async_trait]
impl BotModule for AdminModule {
    fn name(&self) -> &'static str {
        "admin"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("enable", enable)
                .privileged()
                .help("Let everyone use commands again"),
            CommandSpec::new("disable", disable)
                .privileged()
                .help("Ignore everyone but the owners"),
            CommandSpec::new("suspend", suspend)
                .allowed_chars(DURATION_CHARS.chars())
                .help("Ignore everyone but the owners for a while, e.g. suspend 1h30m"),
            CommandSpec::new("unsuspend", unsuspend)
                .privileged()
                .help("Lift a suspension early"),
            CommandSpec::new("stop", stop)
                .privileged()
                .help("Shut the bot down"),
            CommandSpec::new("status", status).help("Show whether the bot is listening"),
        ]
    }
}

fn enable(_args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutput> {
    ctx.state.enabled = true;
    info!("Bot enabled by {:?}", ctx.author());
    Ok("Bot enabled.".into())
}

fn disable(_args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutput> {
    ctx.state.enabled = false;
    info!("Bot disabled by {:?}", ctx.author());
    Ok("Bot disabled. Only owners can use commands now.".into())
}

/// Owners and privileged users may suspend
fn suspend(args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutput> {
    if !ctx.invoker_is_privileged() {
        return Ok(NO_PRIVILEGE.into());
    }
    let Some(arg) = args.first().filter(|a| !a.is_empty()) else {
        return Ok(format!("Usage: {}suspend <duration>, e.g. 1h30m", ctx.state.prefix).into());
    };
    let Some(seconds) = parse_duration(arg) else {
        return Ok("Invalid duration. Use a number followed by s, m, h, d, or w.".into());
    };
    if seconds > MAX_SUSPENSION_SECS {
        return Ok("Suspensions are limited to 52 weeks.".into());
    }

    let now = ctx.now;
    ctx.state.suspend_for(now, Duration::seconds(seconds));
    info!("Bot suspended for {seconds}s by {:?}", ctx.author());
    Ok(format!("Suspended for {}.", format_duration(seconds)).into())
}

fn unsuspend(_args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutput> {
    ctx.state.unsuspend();
    Ok("Suspension lifted.".into())
}

fn stop(_args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutput> {
    ctx.state.running = false;
    info!("🛑 Stop requested by {:?}", ctx.author());
    Ok("Bot terminated.".into())
}

fn status(_args: &[String], ctx: &mut CommandContext<'_>) -> Result<CommandOutput> {
    let state = &ctx.state;
    let enabled = if state.enabled { "enabled" } else { "disabled" };
    let suspension = if state.is_suspended_at(ctx.now) {
        format!(
            "suspended until {}",
            state.suspended_until.format("%Y-%m-%d %H:%M:%S UTC")
        )
    } else {
        "not suspended".to_string()
    };
    Ok(format!(
        "Bot is {enabled} and {suspension}. Prefix: {}",
        state.prefix
    )
    .into())
}
