//! Process-wide state shared by the console worker and the event loop.

use crate::config::Modules;
use crate::core::mentions::MentionLog;
use crate::core::registry::CommandRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::oneshot;
use tracing::{error, info};

/// Cancels a scheduled shutdown when sent to (or dropped).
pub type ShutdownHandle = oneshot::Sender<()>;

/// Where operator-facing console output goes.
pub trait ConsoleOutput: Send + Sync {
    /// Prints one message.
    fn print(&self, message: &str);

    /// Changes the name printed in front of every message.
    fn set_prefix(&self, _prefix: &str) {}
}

/// Prints to stdout as `<name>> message`.
#[derive(Debug)]
pub struct StdoutConsole {
    prefix: RwLock<String>,
}

impl StdoutConsole {
    /// Creates a console printing `prefix` until the bot knows its own name.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: RwLock::new(prefix.into()),
        }
    }
}

impl ConsoleOutput for StdoutConsole {
    #[allow(clippy::print_stdout)]
    fn print(&self, message: &str) {
        let prefix = self.prefix.read().unwrap_or_else(PoisonError::into_inner);
        println!("{prefix}> {message}");
    }

    fn set_prefix(&self, prefix: &str) {
        *self.prefix.write().unwrap_or_else(PoisonError::into_inner) = prefix.to_string();
    }
}

/// Outcome of reloading every module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReloadReport {
    /// Modules that reloaded
    pub reloaded: Vec<String>,
    /// Modules that failed, with the reason
    pub failed: Vec<(String, String)>,
}

/// Everything the console and the bot's handlers share.
pub struct ProcessContext {
    listened_channel: Mutex<Option<u64>>,
    antiraid: AtomicBool,
    scheduled_shutdown: Mutex<Option<ShutdownHandle>>,
    /// Recent messages that mentioned the bot
    pub mentions: MentionLog,
    registry: Mutex<CommandRegistry>,
    /// Reloadable handler modules
    pub modules: Arc<Modules>,
    /// Console output
    pub console: Arc<dyn ConsoleOutput>,
}

impl std::fmt::Debug for ProcessContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessContext")
            .field("listened_channel", &self.listened())
            .field("antiraid", &self.antiraid_enabled())
            .field("mentions", &self.mentions.len())
            .finish_non_exhaustive()
    }
}

impl ProcessContext {
    /// Builds the context. `antiraid` is the initial state of the anti-raid flag.
    #[must_use]
    pub fn new(
        registry: CommandRegistry,
        modules: Arc<Modules>,
        console: Arc<dyn ConsoleOutput>,
        antiraid: bool,
    ) -> Self {
        Self {
            listened_channel: Mutex::new(None),
            antiraid: AtomicBool::new(antiraid),
            scheduled_shutdown: Mutex::new(None),
            mentions: MentionLog::default(),
            registry: Mutex::new(registry),
            modules,
            console,
        }
    }

    /// Prints through the console.
    pub fn print(&self, message: &str) {
        self.console.print(message);
    }

    /// Sets the listened channel.
    pub fn set_listened(&self, channel_id: u64) {
        *self.listened_channel.lock().unwrap_or_else(PoisonError::into_inner) = Some(channel_id);
    }

    /// Clears the listened channel, returning the previous one.
    pub fn clear_listened(&self) -> Option<u64> {
        self.listened_channel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// The listened channel, if any.
    #[must_use]
    pub fn listened(&self) -> Option<u64> {
        *self.listened_channel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sets the anti-raid flag.
    pub fn set_antiraid(&self, enabled: bool) {
        self.antiraid.store(enabled, Ordering::Relaxed);
    }

    /// Whether anti-raid checks are on.
    #[must_use]
    pub fn antiraid_enabled(&self) -> bool {
        self.antiraid.load(Ordering::Relaxed)
    }

    /// Installs the handle of a newly scheduled shutdown.
    ///
    /// A shutdown that is still pending is cancelled first; returns whether that happened.
    pub fn install_shutdown(&self, handle: ShutdownHandle) -> bool {
        let previous = self
            .scheduled_shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        matches!(previous.map(|tx| tx.send(())), Some(Ok(())))
    }

    /// Cancels the pending shutdown. Returns `false` when nothing was pending.
    pub fn cancel_shutdown(&self) -> bool {
        let pending = self
            .scheduled_shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        matches!(pending.map(|tx| tx.send(())), Some(Ok(())))
    }

    /// Forgets the pending shutdown handle once its timer has fired. Returns whether one was held.
    pub fn clear_shutdown(&self) -> bool {
        self.scheduled_shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    /// Locks the command registry.
    pub fn registry(&self) -> MutexGuard<'_, CommandRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reloads every module, re-registering the commands of each one that succeeds.
    ///
    /// Every outcome is also printed to the console.
    pub fn reload_modules(&self) -> ReloadReport {
        let mut report = ReloadReport::default();
        for (name, result) in self.modules.reload_all() {
            match result {
                Ok(()) => {
                    let restored = self.registry().restore_module(&name);
                    info!(module = %name, restored, "Reloaded module");
                    self.print(&format!("Reloaded module {name}"));
                    report.reloaded.push(name);
                }
                Err(e) => {
                    error!(module = %name, "Failed to reload module: {e}");
                    self.print(&format!("Failed to reload module {name}: {e}"));
                    report.failed.push((name, e.to_string()));
                }
            }
        }
        report
    }

    /// Reloads a single module by name. `None` when no such module exists.
    pub fn reload_module(&self, name: &str) -> Option<crate::errors::Result<()>> {
        let result = self.modules.get(name)?.reload();
        if result.is_ok() {
            let restored = self.registry().restore_module(name);
            info!(module = %name, restored, "Reloaded module");
        }
        Some(result)
    }
}
