//! # Activity Feature
//!
//! Watches every event that passes the gate and keeps simple counts.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.0.0: Per-kind event counts, per-user post counts, `activity` report

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use log::trace;
use std::sync::Arc;

use crate::bot::BotState;
use crate::commands::{BotModule, CommandSpec};
use crate::transport::{ChatEvent, ChatTransport, UserId};

/// How many posters the report names
const TOP_POSTERS: usize = 3;

#[derive(Default)]
pub struct ActivityModule {
    events_by_kind: Arc<DashMap<String, u64>>,
    posts_by_user: Arc<DashMap<UserId, u64>>,
}

impl ActivityModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events_of_kind(&self, kind: &str) -> u64 {
        self.events_by_kind.get(kind).map(|n| *n).unwrap_or(0)
    }

    pub fn posts_by(&self, user: UserId) -> u64 {
        self.posts_by_user.get(&user).map(|n| *n).unwrap_or(0)
    }
}

fn report(
    events_by_kind: &DashMap<String, u64>,
    posts_by_user: &DashMap<UserId, u64>,
) -> String {
    if events_by_kind.is_empty() {
        return "No activity seen yet.".to_string();
    }

    let mut kinds: Vec<(String, u64)> = events_by_kind
        .iter()
        .map(|entry| (entry.key().clone(), *entry.value()))
        .collect();
    kinds.sort();
    let kinds: Vec<String> = kinds
        .into_iter()
        .map(|(kind, count)| format!("{kind} {count}"))
        .collect();
    let mut text = format!("Events seen: {}.", kinds.join(", "));

    let mut posters: Vec<(UserId, u64)> = posts_by_user
        .iter()
        .map(|entry| (*entry.key(), *entry.value()))
        .collect();
    posters.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    if !posters.is_empty() {
        let top: Vec<String> = posters
            .iter()
            .take(TOP_POSTERS)
            .map(|(user, count)| format!("{user} ({count})"))
            .collect();
        text.push_str(&format!(" Most active: {}.", top.join(", ")));
    }
    text
}

#[async_trait]
impl BotModule for ActivityModule {
    fn name(&self) -> &'static str {
        "activity"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        let events_by_kind = self.events_by_kind.clone();
        let posts_by_user = self.posts_by_user.clone();
        vec![CommandSpec::new("activity", move |_, _| {
            Ok(report(&events_by_kind, &posts_by_user).into())
        })
        .help("Event counts since startup")]
    }

    async fn on_event(
        &self,
        event: &ChatEvent,
        _transport: &dyn ChatTransport,
        _state: &mut BotState,
    ) -> Result<()> {
        trace!("Counting {} event", event.kind());
        *self
            .events_by_kind
            .entry(event.kind().to_string())
            .or_insert(0) += 1;
        if let ChatEvent::MessagePosted(message) = event {
            *self.posts_by_user.entry(message.author).or_insert(0) += 1;
        }
        Ok(())
    }
}
