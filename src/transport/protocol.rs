//! # Relay Protocol
//!
//! Frames exchanged between the bot and a local chat relay over a Unix socket.
//!
//! Uses length-prefixed JSON framing:
//! - 4 bytes: frame length (big-endian u32)
//! - N bytes: JSON payload

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::{ChatEvent, Message, MessageId, UserId};

/// Frames larger than this are treated as a protocol error
pub const MAX_FRAME_LEN: usize = 10 * 1024 * 1024;

// ============================================================================
// Relay -> Bot Events
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelayEvent {
    /// Answer to `Login`
    LoginResult {
        request_id: String,
        success: bool,
        user_id: Option<u64>,
        error: Option<String>,
    },
    /// Answer to `JoinRoom`
    Joined { room: u64 },
    MessagePosted {
        message_id: u64,
        user_id: u64,
        #[serde(default)]
        user_name: String,
        content: String,
    },
    MessageEdited { message_id: u64, user_id: u64 },
    /// Any other room event
    Other { kind: String, user_id: u64 },
    /// Answer to `FetchMessage`; `message` is absent when it could not be loaded
    FetchedMessage {
        request_id: String,
        message: Option<Message>,
    },
    Heartbeat { timestamp: i64 },
}

impl RelayEvent {
    /// Room events become `ChatEvent`s; replies and heartbeats don't
    pub fn into_chat_event(self) -> Option<ChatEvent> {
        match self {
            RelayEvent::MessagePosted {
                message_id,
                user_id,
                user_name,
                content,
            } => Some(ChatEvent::MessagePosted(Message {
                id: MessageId(message_id),
                author: UserId(user_id),
                author_name: user_name,
                content,
            })),
            RelayEvent::MessageEdited {
                message_id,
                user_id,
            } => Some(ChatEvent::MessageEdited {
                message_id: MessageId(message_id),
                user_id: UserId(user_id),
            }),
            RelayEvent::Other { kind, user_id } => Some(ChatEvent::Other {
                kind,
                user_id: UserId(user_id),
            }),
            RelayEvent::LoginResult { .. }
            | RelayEvent::Joined { .. }
            | RelayEvent::FetchedMessage { .. }
            | RelayEvent::Heartbeat { .. } => None,
        }
    }
}

// ============================================================================
// Bot -> Relay Commands
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelayCommand {
    Login {
        request_id: String,
        site: String,
        email: String,
        password: String,
    },
    JoinRoom { room: u64 },
    SendMessage { content: String },
    FetchMessage { request_id: String, message_id: u64 },
}

// ============================================================================
// Framing
// ============================================================================

/// Encode a frame with length prefix
pub fn encode_frame<T: Serialize>(msg: &T) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(msg)?;
    if json.len() > MAX_FRAME_LEN {
        return Err(anyhow!("Frame too large: {} bytes", json.len()));
    }
    let len = json.len() as u32;
    let mut buf = Vec::with_capacity(4 + json.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(&json);
    Ok(buf)
}

/// Read one length-prefixed frame
///
/// Returns `Ok(None)` on a clean end of stream before a new frame starts.
pub async fn read_frame<T, R>(reader: &mut R) -> Result<Option<T>>
where
    T: for<'de> Deserialize<'de>,
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf) as usize;

    if len > MAX_FRAME_LEN {
        return Err(anyhow!("Frame too large: {} bytes", len));
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;

    Ok(Some(serde_json::from_slice(&buf)?))
}
