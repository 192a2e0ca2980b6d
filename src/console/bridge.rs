//! The console read loop.
//!
//! Runs on its own OS thread because reading stdin blocks. Commands that only
//! touch [`ProcessContext`] run right here; anything that needs Discord is
//! turned into an [`Action`] and queued for the event loop.

use super::actions::{Action, ActionSender};
use super::parse::{ConsoleCommand, UNKNOWN_COMMAND, parse_line};
use super::state::ProcessContext;
use std::io::BufRead;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::oneshot;
use tracing::{debug, error, info};

const NO_CHANNEL: &str = "No channel is currently being listened to.";

/// Reads commands from `input` until end of input.
pub fn run_worker<R: BufRead>(input: R, ctx: &ProcessContext, queue: &ActionSender) {
    info!("Console command bridge started");
    for line in input.lines() {
        match line {
            Ok(line) => handle_line(ctx, queue, &line),
            Err(e) => {
                error!("Failed to read console input: {e}");
                break;
            }
        }
    }
    info!("Console input closed, command bridge stopped");
}

/// Starts the console thread on stdin.
pub fn spawn_worker(ctx: Arc<ProcessContext>, queue: ActionSender) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("console".to_string())
        .spawn(move || run_worker(std::io::stdin().lock(), &ctx, &queue))
}

fn enqueue(ctx: &ProcessContext, queue: &ActionSender, action: Action) {
    if queue.send(action).is_err() {
        ctx.print("Cannot run command: bot is not running.");
    }
}

/// Handles one console line.
pub fn handle_line(ctx: &ProcessContext, queue: &ActionSender, line: &str) {
    let Some(command) = parse_line(line) else {
        return;
    };
    debug!(?command, "Console command");

    match command {
        ConsoleCommand::Refresh => {
            ctx.print("Refreshing all cogs...");
            ctx.reload_modules();
        }
        ConsoleCommand::ListenStart(channel_id) => {
            ctx.set_listened(channel_id);
            ctx.print(&format!("Listening to channel {channel_id}"));
        }
        ConsoleCommand::ListenStop => match ctx.clear_listened() {
            Some(channel_id) => ctx.print(&format!("Stopped listening to channel {channel_id}")),
            None => ctx.print(NO_CHANNEL),
        },
        ConsoleCommand::ListenList => match ctx.listened() {
            Some(channel_id) => ctx.print(&format!("Currently listening to channel: {channel_id}")),
            None => ctx.print(NO_CHANNEL),
        },
        ConsoleCommand::Send(text) => match ctx.listened() {
            Some(channel_id) => enqueue(ctx, queue, Action::SendToChannel { channel_id, text }),
            None => ctx.print(
                "No channel is currently being listened to. Use 'listen start <channelid>' first.",
            ),
        },
        ConsoleCommand::Reply { message_id, text } => {
            enqueue(ctx, queue, Action::Reply { message_id, text });
        }
        ConsoleCommand::ReplyAuthor { message_id, text } => {
            enqueue(ctx, queue, Action::ReplyAuthor { message_id, text });
        }
        ConsoleCommand::DirectMessage { user_id, text } => {
            enqueue(ctx, queue, Action::DirectMessage { user_id, text });
        }
        ConsoleCommand::AntiRaid(enabled) => {
            ctx.set_antiraid(enabled);
            info!(enabled, "Anti-raid toggled from console");
            ctx.print(if enabled {
                "Anti-raid ENABLED via terminal."
            } else {
                "Anti-raid DISABLED via terminal."
            });
        }
        ConsoleCommand::MentionsList => print_mentions(ctx),
        ConsoleCommand::CommandsList => print_commands(ctx),
        ConsoleCommand::Delete(name) => enqueue(ctx, queue, Action::Delete { name }),
        ConsoleCommand::Update(name) => enqueue(ctx, queue, Action::Update { name }),
        ConsoleCommand::Restart => {
            ctx.print("Restarting bot...");
            enqueue(ctx, queue, Action::Restart);
        }
        ConsoleCommand::ShutdownNow => enqueue(
            ctx,
            queue,
            Action::Shutdown {
                delay: 0,
                cancel: None,
            },
        ),
        ConsoleCommand::ShutdownAfter(delay) => {
            let (tx, rx) = oneshot::channel();
            if ctx.install_shutdown(tx) {
                ctx.print("Replacing the previously scheduled shutdown.");
            }
            enqueue(
                ctx,
                queue,
                Action::Shutdown {
                    delay,
                    cancel: Some(rx),
                },
            );
        }
        ConsoleCommand::ShutdownCancel => {
            if ctx.cancel_shutdown() {
                ctx.print("Scheduled shutdown cancelled.");
            } else {
                ctx.print("No scheduled shutdown to cancel.");
            }
        }
        ConsoleCommand::Usage(usage) => ctx.print(usage),
        ConsoleCommand::Unknown => ctx.print(UNKNOWN_COMMAND),
    }
}

fn print_mentions(ctx: &ProcessContext) {
    let mentions = ctx.mentions.snapshot();
    if mentions.is_empty() {
        ctx.print("No mentions recorded.");
        return;
    }
    for entry in mentions {
        ctx.print(&format!(
            "{}: {} \"{}\" {}",
            entry.channel_id, entry.message_id, entry.content, entry.user_id
        ));
    }
}

fn print_commands(ctx: &ProcessContext) {
    let lines: Vec<String> = {
        let registry = ctx.registry();
        let mut lines = vec!["Prefix commands:".to_string()];
        lines.extend(registry.text_commands().map(|(name, cmd)| {
            format!(" - {name}: {}", cmd.help.as_deref().unwrap_or("no help"))
        }));
        lines.push("Application (slash) commands:".to_string());
        lines.extend(
            registry
                .structured_commands()
                .map(|(name, cmd)| format!(" - {name} (global: {})", cmd.is_global)),
        );
        lines
    };
    for line in lines {
        ctx.print(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::actions::{Executor, action_queue, run_dispatcher};
    use crate::core::mentions::MentionEntry;
    use crate::platform::{Platform, ProcessControl};
    use crate::test_utils::{RecordingPlatform, RecordingProcess, test_context};
    use std::time::Duration;

    #[test]
    fn test_listen_start_list_stop() {
        let (ctx, console) = test_context();
        let (tx, _rx) = action_queue();

        handle_line(&ctx, &tx, "listen start 123");
        handle_line(&ctx, &tx, "listen list");
        handle_line(&ctx, &tx, "listen stop");
        handle_line(&ctx, &tx, "listen list");

        assert_eq!(
            console.lines(),
            vec![
                "Listening to channel 123".to_string(),
                "Currently listening to channel: 123".to_string(),
                "Stopped listening to channel 123".to_string(),
                NO_CHANNEL.to_string(),
            ]
        );
    }

    #[test]
    fn test_zero_ids_change_nothing() {
        let (ctx, console) = test_context();
        let (tx, mut rx) = action_queue();

        handle_line(&ctx, &tx, "listen start 0");
        handle_line(&ctx, &tx, "reply 0 hi");
        handle_line(&ctx, &tx, "reply dms 0 hi");

        assert_eq!(ctx.listened(), None);
        assert!(rx.try_recv().is_err());
        assert_eq!(console.lines().len(), 3);
        assert!(console.contains("Invalid channel id."));
    }

    #[test]
    fn test_send_requires_listened_channel() {
        let (ctx, console) = test_context();
        let (tx, mut rx) = action_queue();

        handle_line(&ctx, &tx, "send hello");
        assert!(console.contains("Use 'listen start <channelid>' first."));
        assert!(rx.try_recv().is_err());

        handle_line(&ctx, &tx, "listen start 9");
        handle_line(&ctx, &tx, "send Hello World");
        assert!(matches!(
            rx.try_recv(),
            Ok(Action::SendToChannel { channel_id: 9, text }) if text == "Hello World"
        ));
    }

    #[test]
    fn test_shutdown_cancel_without_schedule() {
        let (ctx, console) = test_context();
        let (tx, mut rx) = action_queue();

        handle_line(&ctx, &tx, "shutdown cancel");

        assert_eq!(console.lines(), vec!["No scheduled shutdown to cancel.".to_string()]);
        assert!(rx.try_recv().is_err());
        assert!(!ctx.cancel_shutdown());
    }

    #[test]
    fn test_invalid_shutdown_schedules_nothing() {
        let (ctx, console) = test_context();
        let (tx, mut rx) = action_queue();

        handle_line(&ctx, &tx, "shutdown tomorrow");

        assert!(console.contains("Invalid time format for shutdown"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_antiraid_toggle() {
        let (ctx, console) = test_context();
        let (tx, _rx) = action_queue();

        handle_line(&ctx, &tx, "antiraid off");
        assert!(!ctx.antiraid_enabled());
        handle_line(&ctx, &tx, "ANTIRAID ON");
        assert!(ctx.antiraid_enabled());
        assert_eq!(
            console.lines(),
            vec![
                "Anti-raid DISABLED via terminal.".to_string(),
                "Anti-raid ENABLED via terminal.".to_string(),
            ]
        );
    }

    #[test]
    fn test_mentions_list() {
        let (ctx, console) = test_context();
        let (tx, _rx) = action_queue();

        handle_line(&ctx, &tx, "mentions list");
        ctx.mentions.push(MentionEntry {
            channel_id: 1,
            message_id: 2,
            content: "hey <@99>".to_string(),
            user_id: 3,
        });
        handle_line(&ctx, &tx, "mentions list");

        assert_eq!(
            console.lines(),
            vec![
                "No mentions recorded.".to_string(),
                "1: 2 \"hey <@99>\" 3".to_string(),
            ]
        );
    }

    #[test]
    fn test_commandslist_is_sorted() {
        let (ctx, console) = test_context();
        let (tx, _rx) = action_queue();

        handle_line(&ctx, &tx, "commandslist");

        let lines = console.lines();
        assert_eq!(lines[0], "Prefix commands:");
        let slash_header = lines
            .iter()
            .position(|l| l == "Application (slash) commands:")
            .unwrap_or(usize::MAX);
        assert!(slash_header < lines.len());
        let prefix: Vec<&String> = lines[1..slash_header].iter().collect();
        let mut sorted = prefix.clone();
        sorted.sort();
        assert_eq!(prefix, sorted);
        assert!(lines.contains(&" - embedx (global: true)".to_string()));
    }

    #[test]
    fn test_unknown_command() {
        let (ctx, console) = test_context();
        let (tx, _rx) = action_queue();
        handle_line(&ctx, &tx, "dance");
        handle_line(&ctx, &tx, "");
        assert_eq!(console.lines(), vec![UNKNOWN_COMMAND.to_string()]);
    }

    #[test]
    fn test_worker_stops_at_end_of_input() {
        let (ctx, console) = test_context();
        let (tx, mut rx) = action_queue();

        run_worker("listen start 5\n\ndelete hug\n".as_bytes(), &ctx, &tx);

        assert!(console.contains("Listening to channel 5"));
        assert!(matches!(rx.try_recv(), Ok(Action::Delete { name }) if name == "hug"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_queue_closed_is_reported() {
        let (ctx, console) = test_context();
        let (tx, rx) = action_queue();
        drop(rx);
        handle_line(&ctx, &tx, "restart");
        assert!(console.contains("Cannot run command: bot is not running."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_then_cancel_never_fires() {
        let (ctx, console) = test_context();
        let platform = Arc::new(RecordingPlatform::default());
        let process = Arc::new(RecordingProcess::default());
        let (tx, rx) = action_queue();

        handle_line(&ctx, &tx, "shutdown 10s");
        handle_line(&ctx, &tx, "shutdown cancel");
        drop(tx);

        run_dispatcher(
            rx,
            Arc::clone(&ctx),
            Arc::clone(&platform) as Arc<dyn Platform>,
            Arc::clone(&process) as Arc<dyn ProcessControl>,
        )
        .await;
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(process.terminations(), 0);
        assert_eq!(platform.disconnects(), 0);
        assert!(console.contains("Scheduled shutdown cancelled."));
        assert!(console.contains("Shutdown task was cancelled."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_replaces_pending_shutdown() {
        let (ctx, console) = test_context();
        let platform = Arc::new(RecordingPlatform::default());
        let process = Arc::new(RecordingProcess::default());
        let executor = Executor::new(
            Arc::clone(&ctx),
            Arc::clone(&platform) as Arc<dyn Platform>,
            Arc::clone(&process) as Arc<dyn ProcessControl>,
        );
        let (tx, mut rx) = action_queue();

        handle_line(&ctx, &tx, "shutdown 5s");
        handle_line(&ctx, &tx, "shutdown 1h");
        assert!(console.contains("Replacing the previously scheduled shutdown."));

        let mut tasks = Vec::new();
        while let Ok(action) = rx.try_recv() {
            let executor = executor.clone();
            tasks.push(tokio::spawn(async move { executor.execute(action).await }));
        }
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(process.terminations(), 0);

        handle_line(&ctx, &tx, "shutdown cancel");
        for task in tasks {
            assert!(task.await.is_ok());
        }
        assert_eq!(process.terminations(), 0);
    }
}
