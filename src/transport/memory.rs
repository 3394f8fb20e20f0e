//! In-memory transport
//!
//! Holds room messages in a map and records everything the bot posts. Used by
//! tests and for running the pipeline without a relay.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Mutex;

use super::{ChatTransport, Message, MessageId, UserId};
use crate::core::response::render_reply;

/// One message posted by the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Message replied to, `None` for plain sends
    pub reply_to: Option<MessageId>,
    /// Text as it would appear in the room
    pub text: String,
}

#[derive(Default)]
pub struct MemoryTransport {
    self_id: Option<UserId>,
    messages: DashMap<MessageId, Message>,
    sent: Mutex<Vec<SentMessage>>,
}

impl MemoryTransport {
    pub fn new(self_id: UserId) -> Self {
        Self {
            self_id: Some(self_id),
            ..Self::default()
        }
    }

    /// Store (or overwrite) a message so `fetch_message` can find it
    pub fn put_message(&self, message: Message) {
        self.messages.insert(message.id, message);
    }

    /// Everything sent so far, oldest first
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Just the rendered texts of everything sent so far
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|s| s.text).collect()
    }

    fn record(&self, reply_to: Option<MessageId>, text: String) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow!("sent log poisoned"))?
            .push(SentMessage { reply_to, text });
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for MemoryTransport {
    fn self_id(&self) -> Option<UserId> {
        self.self_id
    }

    async fn fetch_message(&self, id: MessageId) -> Result<Message> {
        self.messages
            .get(&id)
            .map(|m| m.clone())
            .ok_or_else(|| anyhow!("message {id} not found"))
    }

    async fn reply(&self, to: MessageId, text: &str, reference: bool) -> Result<()> {
        self.record(Some(to), render_reply(to, text, reference))
    }

    async fn send(&self, text: &str) -> Result<()> {
        self.record(None, text.to_string())
    }
}
