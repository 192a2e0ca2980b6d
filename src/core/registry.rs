//! Registry of the bot's text (prefix) and structured (slash) commands.
//!
//! The registry is the bot's view of which commands are currently live. It is
//! seeded from the catalog of commands the handler modules ship with; the
//! operator console can remove commands from it, and reloading a module puts
//! that module's commands back. Structured commands only become visible to
//! Discord after the remaining set is published.

use std::collections::BTreeMap;

/// Which kind of command an entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Free-text command invoked with the prefix
    Text,
    /// Slash (application) command
    Structured,
}

/// A command as registered by a handler module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Command name
    pub name: String,
    /// Kind of command
    pub kind: CommandKind,
    /// Help text shown by `commandslist`
    pub help: Option<String>,
    /// Handler module that owns the command
    pub module: String,
    /// Whether a structured command is published globally (vs. a dev guild)
    pub is_global: bool,
}

/// A live text command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextCommand {
    /// Help text
    pub help: Option<String>,
    /// Owning module
    pub module: String,
}

/// A live structured command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredCommand {
    /// Whether it is published globally
    pub is_global: bool,
    /// Owning module
    pub module: String,
}

/// What a removal found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Removal {
    /// A text command was removed
    pub text: bool,
    /// A structured command was removed (a publish is now needed)
    pub structured: bool,
}

impl Removal {
    /// True when neither set had the name.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        !self.text && !self.structured
    }
}

/// The live command set.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    catalog: Vec<CatalogEntry>,
    text: BTreeMap<String, TextCommand>,
    structured: BTreeMap<String, StructuredCommand>,
}

impl CommandRegistry {
    /// Builds a registry where every catalog entry is live.
    #[must_use]
    pub fn from_catalog(catalog: Vec<CatalogEntry>) -> Self {
        let mut registry = Self {
            catalog,
            ..Self::default()
        };
        for module in registry.modules() {
            registry.restore_module(&module);
        }
        registry
    }

    /// Removes `name` from both sets.
    pub fn remove(&mut self, name: &str) -> Removal {
        Removal {
            text: self.text.remove(name).is_some(),
            structured: self.structured.remove(name).is_some(),
        }
    }

    /// Removes only the text command called `name`.
    pub fn disable_text(&mut self, name: &str) -> bool {
        self.text.remove(name).is_some()
    }

    /// Re-registers every catalog command owned by `module`.
    /// Returns how many commands were brought back.
    pub fn restore_module(&mut self, module: &str) -> usize {
        let mut restored = 0;
        for entry in self.catalog.iter().filter(|e| e.module == module) {
            let was_absent = match entry.kind {
                CommandKind::Text => self
                    .text
                    .insert(
                        entry.name.clone(),
                        TextCommand {
                            help: entry.help.clone(),
                            module: entry.module.clone(),
                        },
                    )
                    .is_none(),
                CommandKind::Structured => self
                    .structured
                    .insert(
                        entry.name.clone(),
                        StructuredCommand {
                            is_global: entry.is_global,
                            module: entry.module.clone(),
                        },
                    )
                    .is_none(),
            };
            if was_absent {
                restored += 1;
            }
        }
        restored
    }

    /// Whether the text command `name` is live.
    #[must_use]
    pub fn is_text_enabled(&self, name: &str) -> bool {
        self.text.contains_key(name)
    }

    /// Whether the structured command `name` is live.
    #[must_use]
    pub fn is_structured_enabled(&self, name: &str) -> bool {
        self.structured.contains_key(name)
    }

    /// Live text commands, sorted by name.
    pub fn text_commands(&self) -> impl Iterator<Item = (&str, &TextCommand)> {
        self.text.iter().map(|(name, cmd)| (name.as_str(), cmd))
    }

    /// Live structured commands, sorted by name.
    pub fn structured_commands(&self) -> impl Iterator<Item = (&str, &StructuredCommand)> {
        self.structured.iter().map(|(name, cmd)| (name.as_str(), cmd))
    }

    /// Names of the structured commands that should be published.
    #[must_use]
    pub fn structured_names(&self) -> Vec<String> {
        self.structured.keys().cloned().collect()
    }

    /// Modules that own at least one catalog command.
    #[must_use]
    pub fn modules(&self) -> Vec<String> {
        let mut modules: Vec<String> = self.catalog.iter().map(|e| e.module.clone()).collect();
        modules.sort();
        modules.dedup();
        modules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, kind: CommandKind, module: &str) -> CatalogEntry {
        CatalogEntry {
            name: name.to_string(),
            kind,
            help: Some(format!("help for {name}")),
            module: module.to_string(),
            is_global: true,
        }
    }

    fn registry() -> CommandRegistry {
        CommandRegistry::from_catalog(vec![
            entry("hug", CommandKind::Text, "action"),
            entry("embed", CommandKind::Text, "embed"),
            entry("embedx", CommandKind::Structured, "embed"),
            entry("gif", CommandKind::Text, "gif"),
            entry("gif", CommandKind::Structured, "gif"),
        ])
    }

    #[test]
    fn test_from_catalog_registers_everything() {
        let registry = registry();
        assert!(registry.is_text_enabled("hug"));
        assert!(registry.is_structured_enabled("embedx"));
        assert_eq!(registry.structured_names(), vec!["embedx", "gif"]);
        assert_eq!(registry.modules(), vec!["action", "embed", "gif"]);
    }

    #[test]
    fn test_remove_structured_only() {
        let mut registry = registry();
        let removal = registry.remove("embedx");
        assert_eq!(removal, Removal { text: false, structured: true });
        assert!(!registry.is_structured_enabled("embedx"));
        assert!(registry.is_text_enabled("embed"));
        assert_eq!(registry.structured_names(), vec!["gif"]);
    }

    #[test]
    fn test_remove_both_kinds() {
        let mut registry = registry();
        let removal = registry.remove("gif");
        assert!(removal.text && removal.structured);
    }

    #[test]
    fn test_remove_missing_is_empty() {
        let mut registry = registry();
        assert!(registry.remove("nope").is_empty());
        assert!(registry.remove("hug").text);
        assert!(registry.remove("hug").is_empty());
    }

    #[test]
    fn test_restore_module_brings_commands_back() {
        let mut registry = registry();
        registry.remove("embed");
        registry.remove("embedx");
        registry.remove("hug");

        assert_eq!(registry.restore_module("embed"), 2);
        assert!(registry.is_text_enabled("embed"));
        assert!(registry.is_structured_enabled("embedx"));
        assert!(!registry.is_text_enabled("hug"));
        assert_eq!(registry.restore_module("embed"), 0);
    }

    #[test]
    fn test_listings_are_sorted() {
        let registry = registry();
        let names: Vec<&str> = registry.text_commands().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["embed", "gif", "hug"]);
    }
}
