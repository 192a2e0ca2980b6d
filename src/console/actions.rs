//! Console actions executed on the bot's event loop.
//!
//! The worker thread only enqueues [`Action`]s; [`run_dispatcher`] receives
//! them in order and runs each as its own task, so a slow action never holds
//! up the next one. Failures are reported on the console and never propagate.

use super::state::ProcessContext;
use crate::platform::{Platform, ProcessControl};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument, warn};

/// Work the console hands to the event loop.
#[derive(Debug)]
pub enum Action {
    /// Post text in a channel
    SendToChannel {
        /// Target channel
        channel_id: u64,
        /// Text to post
        text: String,
    },
    /// Threaded reply to a message found by id
    Reply {
        /// Message to reply to
        message_id: u64,
        /// Reply text
        text: String,
    },
    /// DM the author of a message found by id
    ReplyAuthor {
        /// Message whose author is messaged
        message_id: u64,
        /// DM text
        text: String,
    },
    /// DM a user by id
    DirectMessage {
        /// Recipient
        user_id: u64,
        /// DM text
        text: String,
    },
    /// Remove a command and publish the remaining structured commands
    Delete {
        /// Command name
        name: String,
    },
    /// Delete, reload every module, publish again
    Update {
        /// Command name
        name: String,
    },
    /// Disconnect and replace the process image
    Restart,
    /// Disconnect and exit, optionally after a cancellable delay
    Shutdown {
        /// Seconds to wait first
        delay: u64,
        /// Fires when the operator cancels
        cancel: Option<oneshot::Receiver<()>>,
    },
}

/// Sending half of the console queue.
pub type ActionSender = mpsc::UnboundedSender<Action>;

/// Receiving half of the console queue.
pub type ActionReceiver = mpsc::UnboundedReceiver<Action>;

/// Creates the console queue.
#[must_use]
pub fn action_queue() -> (ActionSender, ActionReceiver) {
    mpsc::unbounded_channel()
}

/// Runs actions against the platform.
#[derive(Clone)]
pub struct Executor {
    ctx: Arc<ProcessContext>,
    platform: Arc<dyn Platform>,
    process: Arc<dyn ProcessControl>,
}

impl Executor {
    /// Bundles what actions need.
    #[must_use]
    pub fn new(
        ctx: Arc<ProcessContext>,
        platform: Arc<dyn Platform>,
        process: Arc<dyn ProcessControl>,
    ) -> Self {
        Self {
            ctx,
            platform,
            process,
        }
    }

    fn print(&self, message: &str) {
        self.ctx.print(message);
    }

    /// Runs one action to completion.
    pub async fn execute(&self, action: Action) {
        match action {
            Action::SendToChannel { channel_id, text } => self.send(channel_id, &text).await,
            Action::Reply { message_id, text } => self.reply(message_id, &text).await,
            Action::ReplyAuthor { message_id, text } => self.reply_author(message_id, &text).await,
            Action::DirectMessage { user_id, text } => {
                match self.platform.direct_message(user_id, &text).await {
                    Ok(()) => self.print(&format!("Sent DM to user {user_id}")),
                    Err(e) => {
                        warn!(user_id, "DM failed: {e}");
                        self.print(&format!("Failed to send DM: {e}"));
                    }
                }
            }
            Action::Delete { name } => {
                let synced = format!("Synchronized application command deletions for: {name}");
                if !self.remove_command(&name, &synced).await {
                    self.print(&format!(
                        "No command named '{name}' was found as a prefix or application command."
                    ));
                }
            }
            Action::Update { name } => self.update(&name).await,
            Action::Restart => self.restart().await,
            Action::Shutdown { delay, cancel } => self.shutdown(delay, cancel).await,
        }
    }

    async fn send(&self, channel_id: u64, text: &str) {
        match self.platform.send_to_channel(channel_id, text).await {
            Ok(()) => self.print(&format!("Sent message to {channel_id}")),
            Err(e) => {
                warn!(channel_id, "Console send failed: {e}");
                self.print(&format!("Failed to send: {e}"));
            }
        }
    }

    async fn reply(&self, message_id: u64, text: &str) {
        let found = match self.platform.find_message(message_id).await {
            Ok(Some(found)) => found,
            Ok(None) => {
                self.print("Message not found in accessible channels.");
                return;
            }
            Err(e) => {
                self.print(&format!("Failed to look up message {message_id}: {e}"));
                return;
            }
        };
        match self.platform.reply_to(&found, text).await {
            Ok(()) => self.print(&format!("Replied to message {message_id}")),
            Err(e) => self.print(&format!("Failed to reply: {e}")),
        }
    }

    async fn reply_author(&self, message_id: u64, text: &str) {
        let found = match self.platform.find_message(message_id).await {
            Ok(Some(found)) => found,
            Ok(None) => {
                self.print("Message ID not found in accessible channels.");
                return;
            }
            Err(e) => {
                self.print(&format!("Failed to look up message {message_id}: {e}"));
                return;
            }
        };
        match self.platform.direct_message(found.author_id, text).await {
            Ok(()) => self.print(&format!("Sent message to user {}", found.author_id)),
            Err(e) => self.print(&format!("Failed to send DM: {e}")),
        }
    }

    /// Removes `name` from the registry, publishing when a structured command went away.
    /// Returns whether anything was removed.
    async fn remove_command(&self, name: &str, synced_message: &str) -> bool {
        let removal = self.ctx.registry().remove(name);
        if removal.text {
            self.print(&format!("Removed prefix command: {name}"));
        }
        if removal.structured {
            self.print(&format!("Queued removal of application command: {name}"));
            let names = self.ctx.registry().structured_names();
            match self.platform.publish_commands(&names).await {
                Ok(()) => self.print(synced_message),
                Err(e) => {
                    error!("Publishing after removing {name} failed: {e}");
                    self.print(&format!(
                        "Failed to sync application commands after deletion: {e}"
                    ));
                }
            }
        }
        info!(name, ?removal, "Console removed command");
        !removal.is_empty()
    }

    async fn update(&self, name: &str) {
        let synced = format!("Synchronized deletions of {name} to Discord");
        self.remove_command(name, &synced).await;

        self.print("Reloading all cogs to pick up any new/changed command implementations...");
        self.ctx.reload_modules();

        let names = self.ctx.registry().structured_names();
        match self.platform.publish_commands(&names).await {
            Ok(()) => self.print(&format!(
                "Synchronized application commands (update completed for: {name})"
            )),
            Err(e) => {
                error!("Publishing after update of {name} failed: {e}");
                self.print(&format!(
                    "Failed to sync application commands after reload: {e}"
                ));
            }
        }
    }

    async fn restart(&self) {
        if let Err(e) = self.platform.disconnect().await {
            self.print(&format!("Error during bot.close(): {e}"));
        }
        let e = self.process.replace_image();
        error!("Restart failed, process left running: {e}");
        self.print(&format!("Failed to exec new process: {e}"));
    }

    async fn shutdown(&self, delay: u64, cancel: Option<oneshot::Receiver<()>>) {
        if delay > 0 {
            self.print(&format!(
                "Shutdown scheduled in {delay} seconds. Use 'shutdown cancel' to abort."
            ));
            let timer = tokio::time::sleep(Duration::from_secs(delay));
            match cancel {
                Some(cancel) => {
                    tokio::select! {
                        () = timer => {}
                        _ = cancel => {
                            info!("Scheduled shutdown cancelled");
                            self.print("Shutdown task was cancelled.");
                            return;
                        }
                    }
                }
                None => timer.await,
            }
            if self.ctx.clear_shutdown() {
                debug!("Cleared fired shutdown handle");
            }
        }

        self.print("Shutting down now...");
        info!("Shutting down on console request");
        if let Err(e) = self.platform.disconnect().await {
            self.print(&format!("Error while closing bot: {e}"));
        }
        self.process.terminate();
    }
}

/// Receives console actions until the queue closes, running each in its own task.
#[instrument(skip_all)]
pub async fn run_dispatcher(
    mut rx: ActionReceiver,
    ctx: Arc<ProcessContext>,
    platform: Arc<dyn Platform>,
    process: Arc<dyn ProcessControl>,
) {
    let executor = Executor::new(ctx, platform, process);
    while let Some(action) = rx.recv().await {
        debug!(?action, "Dispatching console action");
        let executor = executor.clone();
        tokio::spawn(async move { executor.execute(action).await });
    }
    debug!("Console action queue closed");
}
