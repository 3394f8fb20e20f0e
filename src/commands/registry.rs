//! Command registry
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Ordered module groups, first-match lookup, duplicate report, hook fan-out

use log::{debug, error};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use super::context::{CommandContext, CommandOutput};
use super::group::CommandGroup;
use super::handler::{BotModule, HookContext};
use super::spec::CommandSpec;
use crate::bot::BotState;
use crate::transport::{ChatEvent, ChatTransport};

pub const NOT_FOUND: &str = "Command not found.";
pub const NO_PRIVILEGE: &str = "You don't have the privilege to execute this command.";
pub const HANDLER_FAILED: &str = "An error occurred while executing the command.";

/// Every loaded module, its commands, and its hooks
///
/// Lookup scans groups in registration order and stops at the first hit, so
/// when two modules claim the same name the earlier one wins. Duplicates are
/// reported by [`CommandRegistry::detect_duplicates`], never rejected.
///
/// # Example
///
/// ```ignore
/// let registry = CommandRegistry::load(features::builtin_modules());
/// for name in registry.detect_duplicates() {
///     warn!("duplicate command: {name}");
/// }
/// ```
#[derive(Clone, Default)]
pub struct CommandRegistry {
    groups: Vec<CommandGroup>,
    modules: Vec<Arc<dyn BotModule>>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register modules in order
    pub fn load(modules: Vec<Arc<dyn BotModule>>) -> Self {
        let mut registry = Self::new();
        for module in modules {
            registry.register(module);
        }
        registry
    }

    /// Register one module: its commands become a group, its hooks join the hook lists
    pub fn register(&mut self, module: Arc<dyn BotModule>) {
        let group = CommandGroup::new(module.name(), module.commands());
        debug!(
            "Registered module '{}' with {} commands",
            group.module(),
            group.commands().len()
        );
        self.groups.push(group);
        self.modules.push(module);
    }

    pub fn groups(&self) -> &[CommandGroup] {
        &self.groups
    }

    /// Number of registered commands, duplicates included
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.commands().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First command, across all groups, whose name or alias matches
    pub fn resolve(&self, name: &str) -> Option<&CommandSpec> {
        self.groups.iter().find_map(|group| group.find(name))
    }

    /// All commands in registration order
    pub fn list_all(&self) -> Vec<&CommandSpec> {
        self.groups.iter().flat_map(|g| g.commands()).collect()
    }

    /// Names (or aliases) claimed by more than one command
    pub fn detect_duplicates(&self) -> BTreeSet<String> {
        let mut claims: HashMap<&str, usize> = HashMap::new();
        for cmd in self.list_all() {
            let mut keys: Vec<&str> = std::iter::once(cmd.name())
                .chain(cmd.aliases().iter().map(String::as_str))
                .collect();
            keys.sort_unstable();
            keys.dedup();
            for key in keys {
                *claims.entry(key).or_default() += 1;
            }
        }
        claims
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Help text of the command `name` resolves to
    pub fn help(&self, name: &str) -> Option<&str> {
        self.resolve(name).map(CommandSpec::help_text)
    }

    /// Storage subdirectories claimed by modules, in registration order
    pub fn save_subdirs(&self) -> Vec<&'static str> {
        self.modules.iter().filter_map(|m| m.save_subdir()).collect()
    }

    /// Resolve and run a command under the privilege rule
    ///
    /// Privileged commands invoked from chat need an owner; console invocations
    /// (no message) always pass.
    pub fn execute(&self, name: &str, args: &[String], ctx: &mut CommandContext<'_>) -> CommandOutput {
        let Some(cmd) = self.resolve(name) else {
            return NOT_FOUND.into();
        };

        if cmd.is_privileged() && ctx.message.is_some() && !ctx.invoker_is_owner() {
            debug!("Denied privileged command '{}' to {:?}", cmd.name(), ctx.author());
            return NO_PRIVILEGE.into();
        }

        match cmd.invoke(args, ctx) {
            Ok(output) => output,
            Err(e) => {
                error!("Command '{}' failed: {e:#}", cmd.name());
                HANDLER_FAILED.into()
            }
        }
    }

    /// Run every module's load hook; a failing hook does not stop the others
    pub async fn fire_on_load(&self, ctx: &mut HookContext<'_>) {
        for module in &self.modules {
            if let Err(e) = module.on_load(ctx).await {
                error!("Load hook of module '{}' failed: {e:#}", module.name());
            }
        }
    }

    /// Run every module's stop hook; a failing hook does not stop the others
    pub async fn fire_on_stop(&self, ctx: &mut HookContext<'_>) {
        for module in &self.modules {
            if let Err(e) = module.on_stop(ctx).await {
                error!("Stop hook of module '{}' failed: {e:#}", module.name());
            }
        }
    }

    /// Show an event to every module's watcher
    pub async fn fire_event_watchers(
        &self,
        event: &ChatEvent,
        transport: &dyn ChatTransport,
        state: &mut BotState,
    ) {
        for module in &self.modules {
            if let Err(e) = module.on_event(event, transport, state).await {
                error!("Event watcher of module '{}' failed: {e:#}", module.name());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::SaveStore;
    use crate::transport::{Author, MemoryTransport, Message, MessageId, UserId};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const OWNER: UserId = UserId(1);
    const USER: UserId = UserId(2);

    // Mock module for testing
    struct MockModule {
        name: &'static str,
        commands: fn() -> Vec<CommandSpec>,
        fail_hooks: bool,
        loads: Arc<AtomicUsize>,
        events: Arc<AtomicUsize>,
    }

    impl MockModule {
        fn new(name: &'static str, commands: fn() -> Vec<CommandSpec>) -> Self {
            Self {
                name,
                commands,
                fail_hooks: false,
                loads: Arc::new(AtomicUsize::new(0)),
                events: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl BotModule for MockModule {
        fn name(&self) -> &'static str {
            self.name
        }

        fn commands(&self) -> Vec<CommandSpec> {
            (self.commands)()
        }

        fn save_subdir(&self) -> Option<&'static str> {
            Some(self.name)
        }

        async fn on_load(&self, _ctx: &mut HookContext<'_>) -> Result<()> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_hooks {
                return Err(anyhow!("load failed"));
            }
            Ok(())
        }

        async fn on_event(
            &self,
            _event: &ChatEvent,
            _transport: &dyn ChatTransport,
            _state: &mut BotState,
        ) -> Result<()> {
            self.events.fetch_add(1, Ordering::SeqCst);
            if self.fail_hooks {
                return Err(anyhow!("watcher failed"));
            }
            Ok(())
        }
    }

    fn ping_commands() -> Vec<CommandSpec> {
        vec![CommandSpec::new("ping", |_, _| Ok("pong from a".into())).alias("p")]
    }

    fn other_ping_commands() -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("ping", |_, _| Ok("pong from b".into())),
            CommandSpec::new("shutdown", |_, _| Ok("stopping".into())).privileged(),
            CommandSpec::new("fail", |_, _| Err(anyhow!("boom"))),
        ]
    }

    fn registry() -> CommandRegistry {
        CommandRegistry::load(vec![
            Arc::new(MockModule::new("a", ping_commands)),
            Arc::new(MockModule::new("b", other_ping_commands)),
        ])
    }

    fn state() -> BotState {
        BotState {
            owner_ids: HashSet::from([OWNER]),
            ..BotState::default()
        }
    }

    fn message_from(author: UserId) -> Message {
        Message {
            id: MessageId(10),
            author,
            author_name: String::new(),
            content: String::new(),
        }
    }

    fn run(
        registry: &CommandRegistry,
        name: &str,
        message: Option<&Message>,
        event: &ChatEvent,
    ) -> CommandOutput {
        let mut state = state();
        let storage = SaveStore::new("unused");
        let mut ctx = CommandContext {
            message,
            event,
            state: &mut state,
            registry,
            storage: &storage,
            now: Utc::now(),
        };
        registry.execute(name, &[], &mut ctx)
    }

    #[test]
    fn test_registry_new_is_empty() {
        let registry = CommandRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(registry.resolve("ping").is_none());
    }

    #[test]
    fn test_first_registered_wins() {
        let registry = registry();
        assert_eq!(registry.len(), 4);
        let message = message_from(USER);
        let event = ChatEvent::MessagePosted(message.clone());
        assert_eq!(
            run(&registry, "PING", Some(&message), &event),
            CommandOutput::from("pong from a")
        );
        assert_eq!(
            run(&registry, "p", Some(&message), &event),
            CommandOutput::from("pong from a")
        );
    }

    #[test]
    fn test_duplicates_detected_not_fatal() {
        let registry = registry();
        assert_eq!(registry.detect_duplicates(), BTreeSet::from(["ping".to_string()]));
        let names: Vec<&str> = registry.list_all().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["ping", "ping", "shutdown", "fail"]);
    }

    #[test]
    fn test_alias_colliding_with_name_is_duplicate() {
        let registry = CommandRegistry::load(vec![
            Arc::new(MockModule::new("a", ping_commands)),
            Arc::new(MockModule::new("c", || {
                vec![CommandSpec::new("p", |_, _| Ok(CommandOutput::Silent))]
            })),
        ]);
        assert_eq!(registry.detect_duplicates(), BTreeSet::from(["p".to_string()]));
    }

    #[test]
    fn test_not_found_is_a_reply() {
        let registry = registry();
        let message = message_from(USER);
        let event = ChatEvent::MessagePosted(message.clone());
        assert_eq!(
            run(&registry, "nope", Some(&message), &event),
            CommandOutput::from(NOT_FOUND)
        );
    }

    #[test]
    fn test_privileged_denied_to_non_owner_in_chat() {
        let registry = registry();
        let message = message_from(USER);
        let event = ChatEvent::MessagePosted(message.clone());
        assert_eq!(
            run(&registry, "shutdown", Some(&message), &event),
            CommandOutput::from(NO_PRIVILEGE)
        );

        let owner_message = message_from(OWNER);
        let owner_event = ChatEvent::MessagePosted(owner_message.clone());
        assert_eq!(
            run(&registry, "shutdown", Some(&owner_message), &owner_event),
            CommandOutput::from("stopping")
        );
    }

    #[test]
    fn test_privileged_allowed_from_console() {
        let registry = registry();
        // The console origin has no message; even a non-owner event passes
        let event = ChatEvent::Other {
            kind: "synthetic".to_string(),
            user_id: USER,
        };
        assert_eq!(event.author(), Author::User(USER));
        assert_eq!(
            run(&registry, "shutdown", None, &event),
            CommandOutput::from("stopping")
        );
    }

    #[test]
    fn test_handler_error_becomes_reply() {
        let registry = registry();
        let message = message_from(USER);
        let event = ChatEvent::MessagePosted(message.clone());
        assert_eq!(
            run(&registry, "fail", Some(&message), &event),
            CommandOutput::from(HANDLER_FAILED)
        );
    }

    #[test]
    fn test_help_lookup() {
        let registry = CommandRegistry::load(vec![Arc::new(MockModule::new("h", || {
            vec![CommandSpec::new("alive", |_, _| Ok(CommandOutput::Silent)).help("Checks")]
        }))]);
        assert_eq!(registry.help("ALIVE"), Some("Checks"));
        assert_eq!(registry.help("dead"), None);
        assert_eq!(registry.save_subdirs(), vec!["h"]);
    }

    #[tokio::test]
    async fn test_failing_hooks_are_isolated() {
        let mut failing = MockModule::new("a", ping_commands);
        failing.fail_hooks = true;
        let failing_loads = failing.loads.clone();
        let failing_events = failing.events.clone();
        let healthy = MockModule::new("b", other_ping_commands);
        let healthy_loads = healthy.loads.clone();
        let healthy_events = healthy.events.clone();

        let registry = CommandRegistry::load(vec![Arc::new(failing), Arc::new(healthy)]);
        let transport = MemoryTransport::new(UserId(99));
        let storage = SaveStore::new("unused");
        let mut state = state();

        registry
            .fire_on_load(&mut HookContext {
                state: &mut state,
                transport: &transport,
                storage: &storage,
            })
            .await;
        assert_eq!(failing_loads.load(Ordering::SeqCst), 1);
        assert_eq!(healthy_loads.load(Ordering::SeqCst), 1);

        let event = ChatEvent::Other {
            kind: "user_joined".to_string(),
            user_id: USER,
        };
        registry
            .fire_event_watchers(&event, &transport, &mut state)
            .await;
        assert_eq!(failing_events.load(Ordering::SeqCst), 1);
        assert_eq!(healthy_events.load(Ordering::SeqCst), 1);
    }
}
