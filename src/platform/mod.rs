//! Seams between the operator console and the outside world.
//!
//! The console never talks to Discord or the OS directly: everything it needs
//! goes through [`Platform`] and [`ProcessControl`], which the bot implements
//! with serenity and the standard library, and the tests implement with
//! recording fakes.

/// serenity-backed implementation
pub mod serenity;

use crate::errors::Result;
use async_trait::async_trait;

/// A message located by id in one of the bot's channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoundMessage {
    /// Channel the message lives in
    pub channel_id: u64,
    /// Message id
    pub message_id: u64,
    /// Author of the message
    pub author_id: u64,
}

/// Chat platform operations the console can request.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Posts `text` in a channel.
    async fn send_to_channel(&self, channel_id: u64, text: &str) -> Result<()>;

    /// Searches every accessible text channel for a message.
    async fn find_message(&self, message_id: u64) -> Result<Option<FoundMessage>>;

    /// Posts `text` as a threaded reply to `message`.
    async fn reply_to(&self, message: &FoundMessage, text: &str) -> Result<()>;

    /// Direct-messages a user.
    async fn direct_message(&self, user_id: u64, text: &str) -> Result<()>;

    /// Publishes the given structured commands, replacing whatever was published before.
    async fn publish_commands(&self, names: &[String]) -> Result<()>;

    /// Closes the gateway connection.
    async fn disconnect(&self) -> Result<()>;
}

/// Process-level operations.
pub trait ProcessControl: Send + Sync {
    /// Ends the process.
    fn terminate(&self);

    /// Replaces the process image with a fresh copy of the same executable and arguments.
    ///
    /// Only returns on failure.
    fn replace_image(&self) -> std::io::Error;
}

/// [`ProcessControl`] for the real process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcess;

impl ProcessControl for SystemProcess {
    #[allow(clippy::exit)]
    fn terminate(&self) {
        std::process::exit(0);
    }

    #[cfg(unix)]
    fn replace_image(&self) -> std::io::Error {
        use std::os::unix::process::CommandExt;

        let exe = match std::env::current_exe() {
            Ok(exe) => exe,
            Err(e) => return e,
        };
        std::process::Command::new(exe)
            .args(std::env::args_os().skip(1))
            .exec()
    }

    #[cfg(not(unix))]
    #[allow(clippy::exit)]
    fn replace_image(&self) -> std::io::Error {
        let exe = match std::env::current_exe() {
            Ok(exe) => exe,
            Err(e) => return e,
        };
        match std::process::Command::new(exe)
            .args(std::env::args_os().skip(1))
            .spawn()
        {
            Ok(_) => std::process::exit(0),
            Err(e) => e,
        }
    }
}
