/// Application configuration from `config.toml` and environment variables
pub mod app;

/// Per-module settings files and module reloading
pub mod modules;

pub use app::{AntiRaidConfig, AppConfig, load_app_configuration, load_config};
pub use modules::{Modules, ReloadableModule};
