use anyhow::{bail, Result};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::Duration;

use roombot::core::config::DEFAULT_CONFIG_PATH;
use roombot::core::storage::MAIN_SUBDIR;
use roombot::transport::relay::LoginRejected;
use roombot::transport::{connect_with_retry, UserId};
use roombot::{builtin_modules, Bot, BotState, CommandHandler, CommandRegistry, Config, RelayTransport, SaveStore};

const MAX_PASSWORD_ATTEMPTS: u32 = 3;
const CONNECT_ATTEMPTS: u32 = 3;
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Log in with the configured password, or prompt for one
///
/// A rejected configured password is fatal; prompted passwords get three tries.
async fn login(
    transport: &RelayTransport,
    site: &str,
    email: &str,
    configured: Option<&str>,
) -> Result<UserId> {
    if let Some(password) = configured {
        return transport.login(site, email, password).await;
    }

    for attempt in 1..=MAX_PASSWORD_ATTEMPTS {
        let password = Password::new().with_prompt("Password").interact()?;
        match transport.login(site, email, &password).await {
            Ok(id) => return Ok(id),
            Err(e) if e.downcast_ref::<LoginRejected>().is_some() => {
                warn!("Incorrect password ({attempt}/{MAX_PASSWORD_ATTEMPTS})");
            }
            Err(e) => return Err(e),
        }
    }
    bail!("Login failed after {MAX_PASSWORD_ATTEMPTS} attempts")
}

/// Forward stdin lines to the bot until stdin closes
fn spawn_console_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read console input: {e}");
                    break;
                }
            }
        }
    });
    rx
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let quiet = std::env::args().skip(1).any(|arg| arg == "-q");
    let config_path =
        std::env::var("ROOMBOT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?;

    let level = if quiet { "error" } else { config.log_level.as_str() };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    info!("Starting roombot...");

    let site = match &config.site {
        Some(site) => site.clone(),
        None => Input::<String>::new().with_prompt("Site").interact_text()?,
    };
    info!("🌐 Site: {site}");
    let identities = config.identities(&site)?;

    let room = match config.room {
        Some(room) => room,
        None => Input::<u64>::new().with_prompt("Room number").interact_text()?,
    };
    info!("🏠 Room number: {room}");
    info!("🔤 Prefix: {}", config.prefix);

    let registry = CommandRegistry::load(builtin_modules());
    let duplicates = registry.detect_duplicates();
    if !duplicates.is_empty() {
        warn!("There are commands with the same name: {duplicates:?}");
    }

    let mut storage = SaveStore::new(&config.data_dir);
    let mut subdirs = vec![MAIN_SUBDIR];
    subdirs.extend(registry.save_subdirs());
    let duplicate_dirs = storage.register_subdirs(subdirs);
    if !duplicate_dirs.is_empty() {
        warn!("There are modules with the same save directory: {duplicate_dirs:?}");
    }
    storage.create_dirs()?;

    let (transport, events) =
        connect_with_retry(&config.relay_socket, CONNECT_ATTEMPTS, CONNECT_RETRY_DELAY).await?;

    let email = match &config.general.email {
        Some(email) => email.clone(),
        None => Input::<String>::new().with_prompt("Email").interact_text()?,
    };
    let bot_id = login(&transport, &site, &email, config.general.password.as_deref()).await?;
    info!("🤖 Logged in as user {bot_id}");

    transport.join_room(room).await?;
    info!("📡 Joined room {room}");

    let state = BotState::from_config(&config, identities);
    let handler = CommandHandler::new(Arc::new(registry), Arc::new(storage));
    let mut bot = Bot::new(state, handler, Arc::new(transport))
        .with_startup_message(config.startup_message.clone());

    bot.start().await?;
    bot.run(events, spawn_console_reader()).await?;

    info!("Goodbye");
    Ok(())
}
