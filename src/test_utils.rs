//! Shared test utilities.
//!
//! Recording fakes for the platform and process seams, a console that
//! captures its output, and ready-made contexts with sensible defaults.

use crate::config::Modules;
use crate::console::state::{ConsoleOutput, ProcessContext};
use crate::core::registry::{CatalogEntry, CommandKind, CommandRegistry};
use crate::core::template::{GuildFacet, MemberFacet, MemberSummary, TemplateContext, UserFacet};
use crate::errors::{Error, Result};
use crate::platform::{FoundMessage, Platform, ProcessControl};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Console that keeps every printed message.
#[derive(Debug, Default)]
pub struct CapturedConsole {
    lines: Mutex<Vec<String>>,
}

impl CapturedConsole {
    /// Everything printed so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Whether any printed message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl ConsoleOutput for CapturedConsole {
    fn print(&self, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

/// Platform fake that records what was asked of it.
#[derive(Debug, Default)]
pub struct RecordingPlatform {
    message: Option<FoundMessage>,
    fail_publish: bool,
    reject_dms: bool,
    sent: Mutex<Vec<(u64, String)>>,
    replies: Mutex<Vec<(u64, String)>>,
    dms: Mutex<Vec<(u64, String)>>,
    published: Mutex<Vec<Vec<String>>>,
    disconnects: AtomicUsize,
}

impl RecordingPlatform {
    /// A platform where `message` can be found by id.
    pub fn with_message(message: FoundMessage) -> Self {
        Self {
            message: Some(message),
            ..Self::default()
        }
    }

    /// A platform whose command publishing always fails.
    pub fn failing_publish() -> Self {
        Self {
            fail_publish: true,
            ..Self::default()
        }
    }

    /// A platform where every user has DMs closed.
    pub fn rejecting_dms() -> Self {
        Self {
            reject_dms: true,
            ..Self::default()
        }
    }

    /// Channel messages sent.
    pub fn sent(&self) -> Vec<(u64, String)> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replies posted, keyed by message id.
    pub fn replies(&self) -> Vec<(u64, String)> {
        self.replies.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// DMs sent.
    pub fn dms(&self) -> Vec<(u64, String)> {
        self.dms.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Every successfully published command set, in order.
    pub fn published(&self) -> Vec<Vec<String>> {
        self.published.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// How many times the bot was disconnected.
    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Platform for RecordingPlatform {
    async fn send_to_channel(&self, channel_id: u64, text: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((channel_id, text.to_string()));
        Ok(())
    }

    async fn find_message(&self, message_id: u64) -> Result<Option<FoundMessage>> {
        Ok(self.message.filter(|m| m.message_id == message_id))
    }

    async fn reply_to(&self, message: &FoundMessage, text: &str) -> Result<()> {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((message.message_id, text.to_string()));
        Ok(())
    }

    async fn direct_message(&self, user_id: u64, text: &str) -> Result<()> {
        if self.reject_dms {
            return Err(Error::InvalidInput(
                "Cannot send messages to this user".to_string(),
            ));
        }
        self.dms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((user_id, text.to_string()));
        Ok(())
    }

    async fn publish_commands(&self, names: &[String]) -> Result<()> {
        if self.fail_publish {
            return Err(Error::InvalidInput("publish rejected".to_string()));
        }
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(names.to_vec());
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Process fake: never exits, and "fails" to re-exec.
#[derive(Debug, Default)]
pub struct RecordingProcess {
    terminations: AtomicUsize,
    restarts: AtomicUsize,
}

impl RecordingProcess {
    /// How many times termination was requested.
    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }

    /// How many times a re-exec was attempted.
    pub fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

impl ProcessControl for RecordingProcess {
    fn terminate(&self) {
        self.terminations.fetch_add(1, Ordering::SeqCst);
    }

    fn replace_image(&self) -> std::io::Error {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        std::io::Error::new(std::io::ErrorKind::Unsupported, "exec disabled in tests")
    }
}

fn catalog_entry(name: &str, kind: CommandKind, module: &str) -> CatalogEntry {
    CatalogEntry {
        name: name.to_string(),
        kind,
        help: (name != "ping").then(|| format!("{name} command")),
        module: module.to_string(),
        is_global: true,
    }
}

/// A small registry: `hug`, `embed`, `embedx`, `gif` (both kinds), `ping` (both kinds).
pub fn sample_registry() -> CommandRegistry {
    CommandRegistry::from_catalog(vec![
        catalog_entry("hug", CommandKind::Text, "action"),
        catalog_entry("embed", CommandKind::Text, "embed"),
        catalog_entry("embedx", CommandKind::Structured, "embed"),
        catalog_entry("gif", CommandKind::Text, "gif"),
        catalog_entry("gif", CommandKind::Structured, "gif"),
        catalog_entry("ping", CommandKind::Text, "util"),
        catalog_entry("ping", CommandKind::Structured, "util"),
    ])
}

/// A process context with [`sample_registry`], default modules and a captured console.
pub fn test_context() -> (Arc<ProcessContext>, Arc<CapturedConsole>) {
    let console = Arc::new(CapturedConsole::default());
    let modules = Arc::new(Modules::load(
        &std::env::temp_dir().join("lunar-bot-tests-no-cogs"),
    ));
    let ctx = ProcessContext::new(
        sample_registry(),
        modules,
        Arc::clone(&console) as Arc<dyn ConsoleOutput>,
        true,
    );
    (Arc::new(ctx), console)
}

/// Template context for user 42 ("tester", nick "Nick") in a three-member
/// guild with one bot (id 99), owner 1 and roles 111 and 222.
pub fn sample_template_context() -> TemplateContext {
    TemplateContext {
        user: UserFacet {
            id: 42,
            name: "tester".to_string(),
            tag: "tester".to_string(),
            avatar_url: Some("https://cdn.example/avatar.png".to_string()),
            discriminator: None,
            created_at: Utc.with_ymd_and_hms(2020, 5, 6, 7, 8, 9).single(),
        },
        member: MemberFacet {
            nick: Some("Nick".to_string()),
            joined_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single(),
            boost_since: None,
            display_color: "#ff0000".to_string(),
        },
        guild: GuildFacet {
            id: 7,
            name: "Test Guild".to_string(),
            member_count: 3,
            members: vec![
                MemberSummary {
                    id: 42,
                    tag: "tester".to_string(),
                    bot: false,
                },
                MemberSummary {
                    id: 43,
                    tag: "friend".to_string(),
                    bot: false,
                },
                MemberSummary {
                    id: 99,
                    tag: "robot".to_string(),
                    bot: true,
                },
            ],
            owner_id: 1,
            icon_url: None,
            channel_count: 4,
            role_ids: vec![111, 222],
            created_at: Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).single(),
        },
    }
}
