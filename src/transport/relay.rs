//! # Relay Transport
//!
//! Unix socket client for a local chat relay. The relay owns the chat-service
//! session (HTTP, websockets, cookies); the bot only speaks the framed
//! protocol in [`super::protocol`].

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio::io::AsyncWriteExt;
use tokio::net::unix::OwnedReadHalf;
use tokio::net::UnixStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};
use uuid::Uuid;

use super::protocol::{encode_frame, read_frame, RelayCommand, RelayEvent};
use super::{ChatEvent, ChatTransport, Message, MessageId, UserId};
use crate::core::response::render_reply;

/// Connection timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait for the relay to answer a request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

type PendingMap = DashMap<String, oneshot::Sender<RelayEvent>>;

/// The relay answered a login request with a rejection
#[derive(Debug, Clone)]
pub struct LoginRejected(pub String);

impl fmt::Display for LoginRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "login rejected: {}", self.0)
    }
}

impl std::error::Error for LoginRejected {}

pub struct RelayTransport {
    command_tx: mpsc::Sender<RelayCommand>,
    pending: Arc<PendingMap>,
    self_id: OnceLock<UserId>,
}

impl RelayTransport {
    /// Connect to the relay socket
    ///
    /// Returns the transport plus the channel room events are delivered on.
    pub async fn connect(socket_path: &str) -> Result<(Self, mpsc::Receiver<ChatEvent>)> {
        info!("Connecting to chat relay at {}", socket_path);

        let stream = timeout(CONNECT_TIMEOUT, UnixStream::connect(socket_path))
            .await
            .map_err(|_| anyhow!("Connection timeout"))?
            .map_err(|e| anyhow!("Failed to connect: {}", e))?;

        info!("Connected to chat relay");

        let (event_tx, event_rx) = mpsc::channel(256);
        let (command_tx, mut command_rx) = mpsc::channel::<RelayCommand>(64);
        let pending: Arc<PendingMap> = Arc::new(DashMap::new());

        let (reader, mut writer) = stream.into_split();

        tokio::spawn(async move {
            while let Some(cmd) = command_rx.recv().await {
                match encode_frame(&cmd) {
                    Ok(data) => {
                        if let Err(e) = writer.write_all(&data).await {
                            error!("Failed to write relay command: {}", e);
                            break;
                        }
                        if let Err(e) = writer.flush().await {
                            error!("Failed to flush relay command: {}", e);
                            break;
                        }
                    }
                    Err(e) => error!("Failed to encode relay command: {}", e),
                }
            }
        });

        tokio::spawn(Self::read_loop(reader, event_tx, pending.clone()));

        Ok((
            RelayTransport {
                command_tx,
                pending,
                self_id: OnceLock::new(),
            },
            event_rx,
        ))
    }

    /// Route inbound frames: answers to pending requests, room events to the bot
    async fn read_loop(
        mut reader: OwnedReadHalf,
        event_tx: mpsc::Sender<ChatEvent>,
        pending: Arc<PendingMap>,
    ) {
        loop {
            let event: RelayEvent = match read_frame(&mut reader).await {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(e) => {
                    error!("Relay read error: {}", e);
                    break;
                }
            };

            match &event {
                RelayEvent::LoginResult { request_id, .. }
                | RelayEvent::FetchedMessage { request_id, .. } => {
                    let request_id = request_id.clone();
                    if let Some((_, waiter)) = pending.remove(&request_id) {
                        let _ = waiter.send(event);
                    } else {
                        warn!("Relay answer for unknown request {}", request_id);
                    }
                    continue;
                }
                RelayEvent::Joined { room } => {
                    info!("Joined room {}", room);
                    continue;
                }
                RelayEvent::Heartbeat { timestamp } => {
                    debug!("Received heartbeat: {}", timestamp);
                    continue;
                }
                _ => {}
            }

            if let Some(chat_event) = event.into_chat_event() {
                if event_tx.send(chat_event).await.is_err() {
                    debug!("Event receiver closed");
                    break;
                }
            }
        }

        info!("Chat relay connection closed");
    }

    async fn command(&self, cmd: RelayCommand) -> Result<()> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|e| anyhow!("Failed to send relay command: {}", e))
    }

    /// Send a command and wait for the answer carrying `request_id`
    async fn request(&self, request_id: String, cmd: RelayCommand) -> Result<RelayEvent> {
        let (tx, rx) = oneshot::channel();
        self.pending.insert(request_id.clone(), tx);

        if let Err(e) = self.command(cmd).await {
            self.pending.remove(&request_id);
            return Err(e);
        }

        match timeout(REQUEST_TIMEOUT, rx).await {
            Ok(Ok(answer)) => Ok(answer),
            Ok(Err(_)) => Err(anyhow!("Relay closed before answering {}", request_id)),
            Err(_) => {
                self.pending.remove(&request_id);
                Err(anyhow!("Relay request {} timed out", request_id))
            }
        }
    }

    /// Log in to the chat service; a rejection surfaces as [`LoginRejected`]
    pub async fn login(&self, site: &str, email: &str, password: &str) -> Result<UserId> {
        let request_id = Uuid::new_v4().to_string();
        let answer = self
            .request(
                request_id.clone(),
                RelayCommand::Login {
                    request_id,
                    site: site.to_string(),
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;

        match answer {
            RelayEvent::LoginResult {
                success: true,
                user_id: Some(id),
                ..
            } => {
                let id = UserId(id);
                let _ = self.self_id.set(id);
                Ok(id)
            }
            RelayEvent::LoginResult { error, .. } => Err(LoginRejected(
                error.unwrap_or_else(|| "unknown reason".to_string()),
            )
            .into()),
            other => Err(anyhow!("Unexpected login answer: {:?}", other)),
        }
    }

    pub async fn join_room(&self, room: u64) -> Result<()> {
        self.command(RelayCommand::JoinRoom { room }).await
    }
}

#[async_trait]
impl ChatTransport for RelayTransport {
    fn self_id(&self) -> Option<UserId> {
        self.self_id.get().copied()
    }

    async fn fetch_message(&self, id: MessageId) -> Result<Message> {
        let request_id = Uuid::new_v4().to_string();
        let answer = self
            .request(
                request_id.clone(),
                RelayCommand::FetchMessage {
                    request_id,
                    message_id: id.0,
                },
            )
            .await?;

        match answer {
            RelayEvent::FetchedMessage {
                message: Some(message),
                ..
            } => Ok(message),
            RelayEvent::FetchedMessage { message: None, .. } => {
                Err(anyhow!("Relay could not load message {}", id))
            }
            other => Err(anyhow!("Unexpected fetch answer: {:?}", other)),
        }
    }

    async fn reply(&self, to: MessageId, text: &str, reference: bool) -> Result<()> {
        self.send(&render_reply(to, text, reference)).await
    }

    async fn send(&self, text: &str) -> Result<()> {
        self.command(RelayCommand::SendMessage {
            content: text.to_string(),
        })
        .await
    }
}

/// Try to connect with retries
pub async fn connect_with_retry(
    socket_path: &str,
    max_attempts: u32,
    delay: Duration,
) -> Result<(RelayTransport, mpsc::Receiver<ChatEvent>)> {
    let mut attempt = 1;
    loop {
        match RelayTransport::connect(socket_path).await {
            Ok(connected) => return Ok(connected),
            Err(e) if attempt < max_attempts => {
                warn!(
                    "Connection attempt {} failed: {}. Retrying in {:?}...",
                    attempt, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(anyhow!(
                    "Failed to connect after {} attempts: {}",
                    max_attempts,
                    e
                ));
            }
        }
    }
}
