//! Operator command grammar.
//!
//! Verbs and sub-verbs are matched case-insensitively; free text keeps the
//! operator's casing.

use crate::core::duration::parse_duration;

/// Printed for unrecognized verbs.
pub const UNKNOWN_COMMAND: &str = "Unknown command. Available: refresh, restart, shutdown, listen, send, delete, update, commandslist, antiraid on/off, mentions list";

const REPLY_USAGE: &str = "Usage:\n  reply <messageID> <message>\n  reply user <messageID> <message>\n  reply dms <userID> <message>";
const SHUTDOWN_USAGE: &str = "Usage: shutdown <time>|now|cancel  (e.g. shutdown 30s or shutdown 5m)";
const SHUTDOWN_INVALID: &str = "Invalid time format for shutdown. Use e.g. 30s, 5m, 1h, now, or cancel";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Reload every handler module
    Refresh,
    /// Start listening to a channel
    ListenStart(u64),
    /// Stop listening
    ListenStop,
    /// Show the listened channel
    ListenList,
    /// Send text to the listened channel
    Send(String),
    /// Threaded reply to a message found by id
    Reply {
        /// Message to reply to
        message_id: u64,
        /// Reply text
        text: String,
    },
    /// Direct-message the author of a message found by id
    ReplyAuthor {
        /// Message whose author is messaged
        message_id: u64,
        /// DM text
        text: String,
    },
    /// Direct-message a user by id
    DirectMessage {
        /// Recipient
        user_id: u64,
        /// DM text
        text: String,
    },
    /// Toggle the anti-raid flag
    AntiRaid(bool),
    /// Print the recent-mentions log
    MentionsList,
    /// Print the registered commands
    CommandsList,
    /// Remove a command
    Delete(String),
    /// Remove a command, reload modules and republish
    Update(String),
    /// Disconnect and re-exec the process
    Restart,
    /// Disconnect and exit immediately
    ShutdownNow,
    /// Disconnect and exit after a delay in seconds
    ShutdownAfter(u64),
    /// Cancel the pending shutdown
    ShutdownCancel,
    /// Known verb with bad arguments; the message explains the form
    Usage(&'static str),
    /// Unrecognized verb
    Unknown,
}

/// Splits off the first whitespace-delimited word.
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(idx) => (&input[..idx], input[idx..].trim_start()),
        None => (input, ""),
    }
}

/// Parses a Discord snowflake. Zero is never a valid id.
fn parse_id(input: &str) -> Option<u64> {
    input.parse().ok().filter(|id| *id != 0)
}

/// Parses `<id> <text>`; both parts are required.
fn id_and_text(input: &str) -> Option<(u64, String)> {
    let (id, text) = split_word(input);
    let id = parse_id(id)?;
    let text = text.trim();
    (!text.is_empty()).then(|| (id, text.to_string()))
}

/// Parses one console line. Blank lines yield `None`.
#[must_use]
pub fn parse_line(raw: &str) -> Option<ConsoleCommand> {
    let line = raw.trim();
    if line.is_empty() {
        return None;
    }

    let (verb, rest) = split_word(line);
    let command = match verb.to_lowercase().as_str() {
        "refresh" if rest.is_empty() => ConsoleCommand::Refresh,
        "listen" => parse_listen(rest),
        "send" => match rest.trim() {
            "" => ConsoleCommand::Usage("Usage: send <message>"),
            text => ConsoleCommand::Send(text.to_string()),
        },
        "reply" => parse_reply(rest),
        "antiraid" => match rest.to_lowercase().as_str() {
            "on" => ConsoleCommand::AntiRaid(true),
            "off" => ConsoleCommand::AntiRaid(false),
            _ => ConsoleCommand::Usage("Usage: antiraid on|off"),
        },
        "mentions" if rest.eq_ignore_ascii_case("list") => ConsoleCommand::MentionsList,
        "commandslist" if rest.is_empty() => ConsoleCommand::CommandsList,
        "delete" => match rest.trim() {
            "" => ConsoleCommand::Usage("Usage: delete <command_name>"),
            name => ConsoleCommand::Delete(name.to_string()),
        },
        "update" => match rest.trim() {
            "" => ConsoleCommand::Usage("Usage: update <command_name>"),
            name => ConsoleCommand::Update(name.to_string()),
        },
        "restart" if rest.is_empty() => ConsoleCommand::Restart,
        "shutdown" => parse_shutdown(rest),
        _ => ConsoleCommand::Unknown,
    };
    Some(command)
}

fn parse_listen(rest: &str) -> ConsoleCommand {
    let parts: Vec<&str> = rest.split_whitespace().collect();
    let Some(action) = parts.first() else {
        return ConsoleCommand::Usage("Usage: listen <start|stop|list> [channelid]");
    };
    match action.to_lowercase().as_str() {
        "start" => match parts.as_slice() {
            [_, id] => parse_id(id).map_or(
                ConsoleCommand::Usage("Invalid channel id. Usage: listen start <channelid>"),
                ConsoleCommand::ListenStart,
            ),
            _ => ConsoleCommand::Usage("Usage: listen start <channelid>"),
        },
        "stop" => ConsoleCommand::ListenStop,
        "list" => ConsoleCommand::ListenList,
        _ => ConsoleCommand::Usage("Unknown listen command. Use start, stop, or list."),
    }
}

fn parse_reply(rest: &str) -> ConsoleCommand {
    let (sub, remainder) = split_word(rest);
    if sub.is_empty() || remainder.is_empty() {
        return ConsoleCommand::Usage(REPLY_USAGE);
    }
    match sub.to_lowercase().as_str() {
        "user" => id_and_text(remainder).map_or(
            ConsoleCommand::Usage("Usage: reply user <messageID> <message>"),
            |(message_id, text)| ConsoleCommand::ReplyAuthor { message_id, text },
        ),
        "dms" => id_and_text(remainder).map_or(
            ConsoleCommand::Usage("Usage: reply dms <userID> <message>"),
            |(user_id, text)| ConsoleCommand::DirectMessage { user_id, text },
        ),
        _ => id_and_text(rest).map_or(
            ConsoleCommand::Usage("Usage: reply <messageID> <message>"),
            |(message_id, text)| ConsoleCommand::Reply { message_id, text },
        ),
    }
}

fn parse_shutdown(rest: &str) -> ConsoleCommand {
    let (sub, _) = split_word(rest);
    if sub.is_empty() {
        return ConsoleCommand::Usage(SHUTDOWN_USAGE);
    }
    let sub = sub.to_lowercase();
    if sub == "cancel" {
        return ConsoleCommand::ShutdownCancel;
    }
    match parse_duration(&sub) {
        Some(0) => ConsoleCommand::ShutdownNow,
        Some(seconds) => ConsoleCommand::ShutdownAfter(seconds),
        None => ConsoleCommand::Usage(SHUTDOWN_INVALID),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ConsoleCommand {
        parse_line(line).unwrap_or(ConsoleCommand::Unknown)
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("   \t"), None);
    }

    #[test]
    fn test_verbs_are_case_insensitive() {
        assert_eq!(parse("REFRESH"), ConsoleCommand::Refresh);
        assert_eq!(parse("Listen Start 123"), ConsoleCommand::ListenStart(123));
        assert_eq!(parse("  mentions LIST "), ConsoleCommand::MentionsList);
        assert_eq!(parse("AntiRaid OFF"), ConsoleCommand::AntiRaid(false));
        assert_eq!(parse("CommandsList"), ConsoleCommand::CommandsList);
    }

    #[test]
    fn test_listen_forms() {
        assert_eq!(parse("listen stop"), ConsoleCommand::ListenStop);
        assert_eq!(parse("listen list"), ConsoleCommand::ListenList);
        assert!(matches!(parse("listen start"), ConsoleCommand::Usage(_)));
        assert!(matches!(parse("listen start abc"), ConsoleCommand::Usage(_)));
        assert!(matches!(parse("listen start 1 2"), ConsoleCommand::Usage(_)));
        assert!(matches!(parse("listen"), ConsoleCommand::Usage(_)));
        assert!(matches!(parse("listen maybe"), ConsoleCommand::Usage(_)));
    }

    #[test]
    fn test_send_keeps_text_casing() {
        assert_eq!(
            parse("SEND Hello There  World"),
            ConsoleCommand::Send("Hello There  World".to_string())
        );
        assert!(matches!(parse("send"), ConsoleCommand::Usage(_)));
        assert!(matches!(parse("send    "), ConsoleCommand::Usage(_)));
    }

    #[test]
    fn test_reply_forms() {
        assert_eq!(
            parse("reply 55 Thanks!"),
            ConsoleCommand::Reply {
                message_id: 55,
                text: "Thanks!".to_string()
            }
        );
        assert_eq!(
            parse("reply user 55 Hi there"),
            ConsoleCommand::ReplyAuthor {
                message_id: 55,
                text: "Hi there".to_string()
            }
        );
        assert_eq!(
            parse("reply DMs 7 Psst"),
            ConsoleCommand::DirectMessage {
                user_id: 7,
                text: "Psst".to_string()
            }
        );
        assert_eq!(parse("reply 55"), ConsoleCommand::Usage(REPLY_USAGE));
        assert!(matches!(parse("reply user 55"), ConsoleCommand::Usage(_)));
        assert!(matches!(parse("reply dms bob hi"), ConsoleCommand::Usage(_)));
        assert!(matches!(parse("reply abc hello"), ConsoleCommand::Usage(_)));
    }

    #[test]
    fn test_zero_ids_are_rejected() {
        assert!(matches!(parse("listen start 0"), ConsoleCommand::Usage(_)));
        assert!(matches!(parse("reply 0 hi"), ConsoleCommand::Usage(_)));
        assert!(matches!(parse("reply user 0 hi"), ConsoleCommand::Usage(_)));
        assert!(matches!(parse("reply dms 0 hi"), ConsoleCommand::Usage(_)));
        assert!(matches!(parse("reply dms 000 hi"), ConsoleCommand::Usage(_)));
        assert_eq!(parse("listen start 10"), ConsoleCommand::ListenStart(10));
    }

    #[test]
    fn test_delete_and_update() {
        assert_eq!(parse("delete hug"), ConsoleCommand::Delete("hug".to_string()));
        assert_eq!(parse("update embedx"), ConsoleCommand::Update("embedx".to_string()));
        assert!(matches!(parse("delete"), ConsoleCommand::Usage(_)));
        assert!(matches!(parse("update  "), ConsoleCommand::Usage(_)));
    }

    #[test]
    fn test_shutdown_forms() {
        assert_eq!(parse("shutdown now"), ConsoleCommand::ShutdownNow);
        assert_eq!(parse("shutdown 30s"), ConsoleCommand::ShutdownAfter(30));
        assert_eq!(parse("shutdown 5M"), ConsoleCommand::ShutdownAfter(300));
        assert_eq!(parse("shutdown 15"), ConsoleCommand::ShutdownAfter(15));
        assert_eq!(parse("shutdown Cancel"), ConsoleCommand::ShutdownCancel);
        assert_eq!(parse("shutdown"), ConsoleCommand::Usage(SHUTDOWN_USAGE));
        assert_eq!(parse("shutdown soon"), ConsoleCommand::Usage(SHUTDOWN_INVALID));
        assert_eq!(parse("shutdown -5s"), ConsoleCommand::Usage(SHUTDOWN_INVALID));
    }

    #[test]
    fn test_unknown_verbs() {
        assert_eq!(parse("dance"), ConsoleCommand::Unknown);
        assert_eq!(parse("refresh now"), ConsoleCommand::Unknown);
        assert_eq!(parse("restartx"), ConsoleCommand::Unknown);
        assert_eq!(parse("mentions"), ConsoleCommand::Unknown);
    }
}
