//! Per-module settings and module reloading.
//!
//! Each handler module may keep tunables in `<cogs_dir>/<name>.toml`.
//! Reloading a module re-reads that file; a missing file means the built-in
//! defaults, a file that fails to parse leaves the previous settings in place
//! and reports the failure for that module only.

use crate::core::help::HelpCategory;
use crate::errors::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, error, info};

/// Names of every handler module, in load order.
pub const MODULE_NAMES: [&str; 8] = [
    "action", "booster", "button", "embed", "gif", "help", "message", "util",
];

/// A module that can be reloaded from disk by name.
pub trait ReloadableModule: Send + Sync {
    /// Module name as used by `update` and `reload`.
    fn name(&self) -> &str;

    /// Re-reads the module from disk.
    fn reload(&self) -> Result<()>;
}

/// Settings of one module, swapped atomically on reload.
#[derive(Debug)]
pub struct ModuleSettings<T> {
    name: &'static str,
    path: PathBuf,
    current: RwLock<Arc<T>>,
}

impl<T> ModuleSettings<T>
where
    T: DeserializeOwned + Default + Send + Sync,
{
    /// Creates the module with default settings; call [`ReloadableModule::reload`] to read the file.
    #[must_use]
    pub fn new(name: &'static str, dir: &Path) -> Self {
        Self {
            name,
            path: dir.join(format!("{name}.toml")),
            current: RwLock::new(Arc::new(T::default())),
        }
    }

    /// The settings currently in effect.
    #[must_use]
    pub fn get(&self) -> Arc<T> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn read_file(&self) -> Result<T> {
        if !self.path.exists() {
            debug!("{} not found, using defaults for module {}", self.path.display(), self.name);
            return Ok(T::default());
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|e| Error::ModuleReload {
            module: self.name.to_string(),
            message: e.to_string(),
        })?;
        toml::from_str(&contents).map_err(|e| Error::ModuleReload {
            module: self.name.to_string(),
            message: e.to_string(),
        })
    }
}

impl<T> ReloadableModule for ModuleSettings<T>
where
    T: DeserializeOwned + Default + Send + Sync,
{
    fn name(&self) -> &str {
        self.name
    }

    fn reload(&self) -> Result<()> {
        let settings = self.read_file()?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(settings);
        Ok(())
    }
}

/// A module with no settings file; reloading it always succeeds.
#[derive(Debug, Clone, Copy)]
pub struct StaticModule {
    name: &'static str,
}

impl ReloadableModule for StaticModule {
    fn name(&self) -> &str {
        self.name
    }

    fn reload(&self) -> Result<()> {
        Ok(())
    }
}

/// Settings of the `action` module.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ActionSettings {
    /// Tenor search query per action
    pub queries: BTreeMap<String, String>,
    /// Curated GIFs used when Tenor returns nothing
    pub fallbacks: BTreeMap<String, Vec<String>>,
    /// How many Tenor results to pick from
    pub search_limit: u32,
}

impl ActionSettings {
    /// Search query for an action; unknown actions search for "<action> anime".
    #[must_use]
    pub fn query_for(&self, action: &str) -> String {
        self.queries
            .get(action)
            .cloned()
            .unwrap_or_else(|| format!("{action} anime"))
    }

    /// Curated fallbacks for an action (possibly empty).
    #[must_use]
    pub fn fallbacks_for(&self, action: &str) -> &[String] {
        self.fallbacks.get(action).map_or(&[], Vec::as_slice)
    }
}

impl Default for ActionSettings {
    fn default() -> Self {
        let queries = [
            ("cuddle", "anime cuddle cozy cute"),
            ("hug", "anime hug warm cute"),
            ("kiss", "anime kiss romantic adorable"),
            ("lick", "anime lick playful"),
            ("nom", "anime eating nom food anime"),
            ("pat", "anime pat head gentle"),
            ("poke", "anime poke"),
            ("slap", "anime slap comical"),
            ("stare", "anime stare awkward"),
            ("highfive", "anime high five celebration"),
            ("bite", "anime bite playful"),
            ("greet", "anime wave greeting"),
            ("punch", "anime punch action"),
            ("handholding", "anime holding hands couple"),
            ("tickle", "anime tickle laugh"),
            ("kill", "anime dramatic fight (non-graphic)"),
            ("hold", "anime hold embrace"),
            ("pats", "anime pats gentle"),
            ("wave", "anime wave hello"),
            ("boop", "anime boop nose cute"),
            ("snuggle", "anime snuggle cozy"),
            ("bully", "anime bully playful teasing"),
        ]
        .into_iter()
        .map(|(a, q)| (a.to_string(), q.to_string()))
        .collect();

        let fallbacks = [
            (
                "cuddle",
                [
                    "https://c.tenor.com/0Yv0f8y3F8UAAAAC/anime-cuddle.gif",
                    "https://c.tenor.com/_k0x6q5m3mIAAAAC/anime-cuddles.gif",
                ],
            ),
            (
                "hug",
                [
                    "https://c.tenor.com/Ph0k0J7-3XAAAAAC/hug-anime.gif",
                    "https://c.tenor.com/2roX3uxz_4sAAAAC/anime-hug.gif",
                ],
            ),
            (
                "kiss",
                [
                    "https://c.tenor.com/W9fX5vJ8e-IAAAAC/anime-kiss.gif",
                    "https://c.tenor.com/4sQv4wr5gZsAAAAC/anime-kissing.gif",
                ],
            ),
            (
                "pat",
                [
                    "https://c.tenor.com/HrF3Q9gq4OcAAAAC/pat-anime.gif",
                    "https://c.tenor.com/Y9w0Cq0AY2kAAAAC/pat-head.gif",
                ],
            ),
            (
                "slap",
                [
                    "https://c.tenor.com/9w2sUyqjF2gAAAAC/anime-slap.gif",
                    "https://c.tenor.com/J7eGDvGeP9IAAAAC/tenor.gif",
                ],
            ),
        ]
        .into_iter()
        .map(|(a, urls)| (a.to_string(), urls.iter().map(|u| (*u).to_string()).collect()))
        .collect();

        Self {
            queries,
            fallbacks,
            search_limit: 25,
        }
    }
}

/// Settings of the `gif` module.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GifSettings {
    /// Number of results requested from Tenor
    pub result_limit: u32,
}

impl Default for GifSettings {
    fn default() -> Self {
        Self { result_limit: 10 }
    }
}

/// Settings of the `help` module.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HelpSettings {
    /// Categories in display order
    pub categories: Vec<HelpCategory>,
}

impl Default for HelpSettings {
    fn default() -> Self {
        let category = |name: &str, commands: &[(&str, &str)]| HelpCategory {
            name: name.to_string(),
            commands: commands
                .iter()
                .map(|(c, d)| ((*c).to_string(), (*d).to_string()))
                .collect(),
        };
        Self {
            categories: vec![
                category(
                    "ActionCommands",
                    &[
                        ("bite", "Bite a user"),
                        ("boop", "Boop a user"),
                        ("bully", "Playfully bully a user"),
                        ("cuddle", "Cuddle with a user"),
                        ("greet", "Greet a user"),
                        ("handholding", "Hold hands with a user"),
                        ("highfive", "High five a user"),
                        ("hold", "Hold a user"),
                        ("hug", "Hug a user"),
                        ("kill", "Pretend to kill a user"),
                        ("kiss", "Kiss a user"),
                        ("lick", "Lick a user"),
                        ("nom", "Nom a user"),
                        ("pat", "Pat a user"),
                        ("pats", "Give multiple pats"),
                        ("poke", "Poke a user"),
                        ("punch", "Punch a user"),
                        ("slap", "Slap a user"),
                        ("snuggle", "Snuggle with a user"),
                        ("stare", "Stare at a user"),
                        ("tickle", "Tickle a user"),
                        ("wave", "Wave at a user"),
                    ],
                ),
                category("EmbedCommands", &[("embed", "Base command for embed editing.")]),
                category("Giffy", &[("gif", "Search GIFs from Tenor")]),
                category("No Category", &[("help", "Shows this message")]),
            ],
        }
    }
}

/// One selectable booster colour.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ColorRole {
    /// Label shown in the select menu
    pub name: String,
    /// Role granted when picked
    pub role_id: u64,
}

/// Settings of the `booster` module. Without a channel the menu is not posted.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BoosterSettings {
    /// Guild the perks menu belongs to
    pub guild_id: Option<u64>,
    /// Channel the perks menu is posted in
    pub channel_id: Option<u64>,
    /// Mutually exclusive colour roles
    pub color_roles: Vec<ColorRole>,
}

impl BoosterSettings {
    /// Whether `role_id` is one of the booster colour roles.
    #[must_use]
    pub fn is_color_role(&self, role_id: u64) -> bool {
        self.color_roles.iter().any(|r| r.role_id == role_id)
    }
}

/// Every handler module of the bot.
#[derive(Debug)]
pub struct Modules {
    /// `action` settings
    pub action: ModuleSettings<ActionSettings>,
    /// `booster` settings
    pub booster: ModuleSettings<BoosterSettings>,
    /// `gif` settings
    pub gif: ModuleSettings<GifSettings>,
    /// `help` settings
    pub help: ModuleSettings<HelpSettings>,
    plain: Vec<StaticModule>,
}

impl Modules {
    /// Builds every module and reads its settings from `dir`.
    ///
    /// A settings file that fails to parse is logged and the module keeps its defaults.
    #[must_use]
    pub fn load(dir: &Path) -> Self {
        let modules = Self {
            action: ModuleSettings::new("action", dir),
            booster: ModuleSettings::new("booster", dir),
            gif: ModuleSettings::new("gif", dir),
            help: ModuleSettings::new("help", dir),
            plain: ["button", "embed", "message", "util"]
                .into_iter()
                .map(|name| StaticModule { name })
                .collect(),
        };
        for (name, result) in modules.reload_all() {
            if let Err(e) = result {
                error!("Failed to load module {name}: {e}");
            }
        }
        info!("Loaded {} modules", modules.all().len());
        modules
    }

    /// Every module, sorted by name.
    #[must_use]
    pub fn all(&self) -> Vec<&dyn ReloadableModule> {
        let mut all: Vec<&dyn ReloadableModule> =
            vec![&self.action, &self.booster, &self.gif, &self.help];
        all.extend(self.plain.iter().map(|m| m as &dyn ReloadableModule));
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    /// Looks a module up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn ReloadableModule> {
        self.all().into_iter().find(|m| m.name() == name)
    }

    /// Reloads every module; one result per module, in name order.
    #[must_use]
    pub fn reload_all(&self) -> Vec<(String, Result<()>)> {
        self.all()
            .into_iter()
            .map(|m| (m.name().to_string(), m.reload()))
            .collect()
    }
}
