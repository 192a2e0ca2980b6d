//! Unified error type for the bot.

use thiserror::Error;

/// Every fallible operation in the crate returns this error.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or environment problem.
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable reason
        message: String,
    },

    /// A handler module failed to reload its settings.
    #[error("Module `{module}` failed to reload: {message}")]
    ModuleReload {
        /// Module name (e.g. `help`)
        module: String,
        /// Human-readable reason
        message: String,
    },

    /// Something looked up by id was not there.
    #[error("{what} not found")]
    NotFound {
        /// What was being looked up
        what: String,
    },

    /// Invalid user input to a command.
    #[error("{0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    #[allow(missing_docs)]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    #[allow(missing_docs)]
    EnvVar(#[from] std::env::VarError),

    #[error("JSON error: {0}")]
    #[allow(missing_docs)]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    #[allow(missing_docs)]
    Http(#[from] reqwest::Error),

    #[error("Formatting error: {0}")]
    #[allow(missing_docs)]
    Fmt(#[from] std::fmt::Error),

    /// Serenity / poise failure, boxed because the serenity error is large.
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
