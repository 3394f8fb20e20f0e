//! Commands contributed by one module

use super::spec::CommandSpec;

/// Ordered, immutable set of commands from one module
#[derive(Debug, Clone)]
pub struct CommandGroup {
    module: String,
    commands: Vec<CommandSpec>,
}

impl CommandGroup {
    pub fn new(module: &str, commands: Vec<CommandSpec>) -> Self {
        Self {
            module: module.to_string(),
            commands,
        }
    }

    /// Name of the contributing module
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    /// First command in this group whose name or alias matches
    pub fn find(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.iter().find(|cmd| cmd.matches(name))
    }
}
