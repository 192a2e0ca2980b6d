//! Discord command implementations organized by handler module.
//!
//! Every command carries its module name as its poise `category`; the
//! command registry is derived from this list with [`catalog`].

#![allow(clippy::too_long_first_doc_paragraph)]

/// Action commands (`hug`, `pat`, ...)
pub mod action;
/// Response buttons
pub mod button;
/// Embed creation and editing
pub mod embed;
/// Tenor GIF search
pub mod gif;
/// Paginated help
pub mod help;
/// Message counting sessions
pub mod message;
/// Utility and owner commands
pub mod util;

use crate::bot::BotData;
use crate::core::registry::{CatalogEntry, CommandKind};
use crate::errors::Error;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Every command the bot registers with poise.
#[must_use]
pub fn all() -> Vec<poise::Command<BotData, Error>> {
    let mut commands = action::all();
    commands.extend([
        button::button(),
        embed::embed(),
        embed::embedx(),
        embed::icon(),
        embed::embed_slash(),
        gif::gif(),
        help::help(),
        message::msgs_count(),
        message::msgs(),
    ]);
    commands.extend(util::all());
    commands
}

/// One registry entry per command kind a poise command supports.
///
/// `global` says whether application commands are published globally rather
/// than to a development guild.
#[must_use]
pub fn catalog(commands: &[poise::Command<BotData, Error>], global: bool) -> Vec<CatalogEntry> {
    let mut entries = Vec::new();
    for command in commands {
        let module = command
            .category
            .clone()
            .unwrap_or_else(|| "util".to_string());
        if command.prefix_action.is_some() {
            entries.push(CatalogEntry {
                name: command.name.clone(),
                kind: CommandKind::Text,
                help: command.description.clone(),
                module: module.clone(),
                is_global: true,
            });
        }
        if command.slash_action.is_some() {
            entries.push(CatalogEntry {
                name: command.name.clone(),
                kind: CommandKind::Structured,
                help: command.description.clone(),
                module,
                is_global: global,
            });
        }
    }
    entries
}

/// ◀ ▶ paging buttons, with an optional 🔗 button between them.
pub(crate) fn nav_row(prev_id: &str, link_id: Option<&str>, next_id: &str) -> serenity::CreateActionRow {
    let mut buttons = vec![
        serenity::CreateButton::new(prev_id)
            .label("◀")
            .style(serenity::ButtonStyle::Secondary),
    ];
    if let Some(link_id) = link_id {
        buttons.push(
            serenity::CreateButton::new(link_id)
                .label("🔗")
                .style(serenity::ButtonStyle::Primary),
        );
    }
    buttons.push(
        serenity::CreateButton::new(next_id)
            .label("▶")
            .style(serenity::ButtonStyle::Secondary),
    );
    serenity::CreateActionRow::Buttons(buttons)
}

/// Deletes a sent message after `delay` without holding up the command.
pub(crate) fn delete_after(http: Arc<serenity::Http>, message: serenity::Message, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(e) = message.delete(&http).await {
            warn!("Failed to delete message {}: {e}", message.id);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::CommandRegistry;

    #[test]
    fn test_catalog_kinds_follow_command_kinds() {
        let entries = catalog(&all(), true);
        let kinds = |name: &str| -> Vec<CommandKind> {
            entries
                .iter()
                .filter(|e| e.name == name)
                .map(|e| e.kind)
                .collect()
        };

        assert_eq!(kinds("hug"), vec![CommandKind::Text]);
        assert_eq!(kinds("embedx"), vec![CommandKind::Structured]);
        assert_eq!(kinds("button"), vec![CommandKind::Structured]);
        assert_eq!(kinds("gif"), vec![CommandKind::Text, CommandKind::Structured]);
        assert_eq!(kinds("embed"), vec![CommandKind::Text]);
        assert_eq!(kinds("ping"), vec![CommandKind::Text]);
    }

    #[test]
    fn test_catalog_modules_are_categories() {
        let entries = catalog(&all(), true);
        let module = |name: &str| {
            entries
                .iter()
                .find(|e| e.name == name)
                .map(|e| e.module.clone())
        };

        assert_eq!(module("pat").as_deref(), Some("action"));
        assert_eq!(module("msgs").as_deref(), Some("message"));
        assert_eq!(module("help").as_deref(), Some("help"));
        assert_eq!(module("refresh").as_deref(), Some("util"));
    }

    #[test]
    fn test_dev_guild_commands_are_not_global() {
        let entries = catalog(&all(), false);
        assert!(
            entries
                .iter()
                .filter(|e| e.kind == CommandKind::Structured)
                .all(|e| !e.is_global)
        );
    }

    #[test]
    fn test_every_module_has_commands() {
        let registry = CommandRegistry::from_catalog(catalog(&all(), true));
        let modules = registry.modules();
        for name in ["action", "button", "embed", "gif", "help", "message", "util"] {
            assert!(modules.iter().any(|m| m == name), "no commands in {name}");
        }
    }

    #[test]
    fn test_command_names_are_unique() {
        let commands = all();
        let mut names: Vec<&str> = commands.iter().map(|c| c.name.as_str()).collect();
        let total = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
