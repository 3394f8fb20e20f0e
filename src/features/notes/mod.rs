//! # Notes Feature
//!
//! Short named notes that survive restarts. Loaded from the `notes` save
//! directory on startup and written back on shutdown.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 1.0.0: remember, recall, forget, notes

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::commands::{BotModule, CommandSpec, HookContext};
use crate::transport::{Author, UserId};

pub const NOTES_SUBDIR: &str = "notes";
const NOTES_KEY: &str = "notes";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
    /// `None` when written from the console
    pub author: Option<UserId>,
    pub saved_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct NotesModule {
    notes: Arc<DashMap<String, Note>>,
}

impl NotesModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    fn snapshot(&self) -> BTreeMap<String, Note> {
        self.notes
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

#[async_trait]
impl BotModule for NotesModule {
    fn name(&self) -> &'static str {
        "notes"
    }

    fn save_subdir(&self) -> Option<&'static str> {
        Some(NOTES_SUBDIR)
    }

    fn commands(&self) -> Vec<CommandSpec> {
        let notes = self.notes.clone();
        let remember = CommandSpec::new("remember", move |args, ctx| {
            let [key, words @ ..] = args else {
                return Ok(format!("Usage: {}remember <name> <text>", ctx.state.prefix).into());
            };
            if key.is_empty() || words.is_empty() {
                return Ok(format!("Usage: {}remember <name> <text>", ctx.state.prefix).into());
            }
            let key = key.to_lowercase();
            let author = match ctx.author() {
                Author::User(id) => Some(id),
                Author::Console => None,
            };
            notes.insert(
                key.clone(),
                Note {
                    text: words.join(" "),
                    author,
                    saved_at: ctx.now,
                },
            );
            Ok(format!("Remembered '{key}'.").into())
        })
        .help("Save a note: remember <name> <text>");

        let notes = self.notes.clone();
        let recall = CommandSpec::new("recall", move |args, _| {
            let Some(key) = args.first() else {
                return Ok("Which note?".into());
            };
            let key = key.to_lowercase();
            Ok(match notes.get(&key) {
                Some(note) => note.text.clone().into(),
                None => format!("No note named '{key}'.").into(),
            })
        })
        .help("Show a note: recall <name>");

        let notes = self.notes.clone();
        let forget = CommandSpec::new("forget", move |args, _| {
            let Some(key) = args.first() else {
                return Ok("Which note?".into());
            };
            let key = key.to_lowercase();
            Ok(match notes.remove(&key) {
                Some(_) => format!("Forgot '{key}'.").into(),
                None => format!("No note named '{key}'.").into(),
            })
        })
        .privileged()
        .help("Delete a note: forget <name>");

        let notes = self.notes.clone();
        let list = CommandSpec::new("notes", move |_, _| {
            if notes.is_empty() {
                return Ok("No notes saved.".into());
            }
            let mut keys: Vec<String> = notes.iter().map(|entry| entry.key().clone()).collect();
            keys.sort();
            Ok(format!("Notes: {}", keys.join(", ")).into())
        })
        .help("List saved notes");

        vec![remember, recall, forget, list]
    }

    async fn on_load(&self, ctx: &mut HookContext<'_>) -> Result<()> {
        let saved: Option<BTreeMap<String, Note>> = ctx.storage.load(NOTES_SUBDIR, NOTES_KEY)?;
        if let Some(saved) = saved {
            info!("📝 Loaded {} notes", saved.len());
            for (key, note) in saved {
                self.notes.insert(key, note);
            }
        }
        Ok(())
    }

    async fn on_stop(&self, ctx: &mut HookContext<'_>) -> Result<()> {
        ctx.storage
            .save(NOTES_SUBDIR, NOTES_KEY, &self.snapshot())?;
        info!("📝 Saved {} notes", self.notes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::BotState;
    use crate::commands::registry::NO_PRIVILEGE;
    use crate::commands::{CommandContext, CommandOutput, CommandRegistry};
    use crate::core::storage::SaveStore;
    use crate::transport::{ChatEvent, MemoryTransport, Message, MessageId};
    use std::collections::HashSet;
    use tempfile::TempDir;

    const OWNER: UserId = UserId(1);
    const USER: UserId = UserId(2);

    fn run(
        registry: &CommandRegistry,
        author: UserId,
        name: &str,
        args: &[&str],
    ) -> CommandOutput {
        let mut state = BotState {
            owner_ids: HashSet::from([OWNER]),
            ..BotState::default()
        };
        let storage = SaveStore::new("unused");
        let message = Message {
            id: MessageId(1),
            author,
            author_name: String::new(),
            content: String::new(),
        };
        let event = ChatEvent::MessagePosted(message.clone());
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let mut ctx = CommandContext {
            message: Some(&message),
            event: &event,
            state: &mut state,
            registry,
            storage: &storage,
            now: Utc::now(),
        };
        registry.execute(name, &args, &mut ctx)
    }

    fn reply(text: &str) -> CommandOutput {
        CommandOutput::from(text)
    }

    #[test]
    fn test_remember_and_recall() {
        let registry = CommandRegistry::load(vec![Arc::new(NotesModule::new())]);
        assert_eq!(
            run(&registry, USER, "remember", &["Rules", "be", "nice"]),
            reply("Remembered 'rules'.")
        );
        assert_eq!(run(&registry, USER, "recall", &["RULES"]), reply("be nice"));
        assert_eq!(
            run(&registry, USER, "recall", &["other"]),
            reply("No note named 'other'.")
        );
        assert_eq!(run(&registry, USER, "notes", &[]), reply("Notes: rules"));
    }

    #[test]
    fn test_remember_usage() {
        let registry = CommandRegistry::load(vec![Arc::new(NotesModule::new())]);
        assert_eq!(
            run(&registry, USER, "remember", &["lonely"]),
            reply("Usage: >>remember <name> <text>")
        );
        assert_eq!(run(&registry, USER, "notes", &[]), reply("No notes saved."));
    }

    #[test]
    fn test_forget_is_privileged() {
        let registry = CommandRegistry::load(vec![Arc::new(NotesModule::new())]);
        run(&registry, USER, "remember", &["x", "y"]);
        assert_eq!(run(&registry, USER, "forget", &["x"]), reply(NO_PRIVILEGE));
        assert_eq!(run(&registry, OWNER, "forget", &["x"]), reply("Forgot 'x'."));
        assert_eq!(run(&registry, OWNER, "forget", &["x"]), reply("No note named 'x'."));
    }

    #[tokio::test]
    async fn test_notes_survive_restart() {
        let dir = TempDir::new().unwrap();
        let mut storage = SaveStore::new(dir.path());
        storage.register_subdirs([NOTES_SUBDIR]);
        storage.create_dirs().unwrap();
        let transport = MemoryTransport::new(UserId(1000));
        let mut state = BotState::default();

        let first = Arc::new(NotesModule::new());
        let registry = CommandRegistry::load(vec![first.clone()]);
        run(&registry, USER, "remember", &["plan", "ship", "it"]);
        registry
            .fire_on_stop(&mut HookContext {
                state: &mut state,
                transport: &transport,
                storage: &storage,
            })
            .await;

        let second = Arc::new(NotesModule::new());
        let registry = CommandRegistry::load(vec![second.clone()]);
        registry
            .fire_on_load(&mut HookContext {
                state: &mut state,
                transport: &transport,
                storage: &storage,
            })
            .await;
        assert_eq!(second.len(), 1);
        assert_eq!(run(&registry, USER, "recall", &["plan"]), reply("ship it"));
    }

    #[tokio::test]
    async fn test_load_without_saved_notes() {
        let dir = TempDir::new().unwrap();
        let storage = SaveStore::new(dir.path());
        let transport = MemoryTransport::new(UserId(1000));
        let mut state = BotState::default();
        let module = NotesModule::new();

        module
            .on_load(&mut HookContext {
                state: &mut state,
                transport: &transport,
                storage: &storage,
            })
            .await
            .unwrap();
        assert!(module.is_empty());
    }
}
