//! Message counting: all-time per-guild counters and per-channel sessions.
//!
//! All-time counts live in the JSON store as `{guild_id: {user_id: count}}`.
//! Sessions are in-memory only; a stopped session keeps its counts so the
//! leaderboard can still be shown, and starting a new one resets them.

use crate::core::store::JsonStore;
use crate::errors::Result;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// How many users the leaderboard shows.
pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Default)]
struct Session {
    active: bool,
    counts: HashMap<u64, u64>,
}

/// Why a leaderboard could not be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardError {
    /// No session was ever started in the channel
    NoSession,
    /// A session exists but nothing was counted
    NoMessages,
}

/// Message counter backed by a [`JsonStore`].
#[derive(Debug)]
pub struct MessageCounter {
    store: JsonStore,
    sessions: Mutex<HashMap<u64, Session>>,
}

impl MessageCounter {
    /// Wraps the store holding all-time counts.
    #[must_use]
    pub fn new(store: JsonStore) -> Self {
        Self {
            store,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Counts one message from `user_id` in `guild_id` / `channel_id`.
    /// Returns the user's new all-time count in that guild.
    pub fn record(&self, guild_id: u64, channel_id: u64, user_id: u64) -> Result<u64> {
        let user_key = user_id.to_string();
        let guild_counts = self.store.update(&guild_id.to_string(), |value| {
            if !value.is_object() {
                *value = json!({});
            }
            if let Value::Object(map) = value {
                let next = map.get(&user_key).and_then(Value::as_u64).unwrap_or(0) + 1;
                map.insert(user_key.clone(), json!(next));
            }
        })?;

        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = sessions.get_mut(&channel_id).filter(|s| s.active) {
            *session.counts.entry(user_id).or_insert(0) += 1;
        }

        Ok(guild_counts
            .get(&user_key)
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }

    /// All-time count for a user in a guild.
    #[must_use]
    pub fn total(&self, guild_id: u64, user_id: u64) -> u64 {
        self.store
            .get(&guild_id.to_string())
            .and_then(|v| v.get(user_id.to_string()).and_then(Value::as_u64))
            .unwrap_or(0)
    }

    /// Starts (or restarts) a counting session in a channel.
    pub fn start_session(&self, channel_id: u64) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(
            channel_id,
            Session {
                active: true,
                counts: HashMap::new(),
            },
        );
    }

    /// Stops counting in a channel; counts are kept for the leaderboard.
    pub fn stop_session(&self, channel_id: u64) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = sessions.get_mut(&channel_id) {
            session.active = false;
        }
    }

    /// Whether a session is currently counting in the channel.
    #[must_use]
    pub fn is_active(&self, channel_id: u64) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&channel_id)
            .is_some_and(|s| s.active)
    }

    /// Top users of the channel's session, highest count first (ties by user id).
    pub fn leaderboard(
        &self,
        channel_id: u64,
    ) -> std::result::Result<Vec<(u64, u64)>, LeaderboardError> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        let session = sessions
            .get(&channel_id)
            .ok_or(LeaderboardError::NoSession)?;
        if session.counts.is_empty() {
            return Err(LeaderboardError::NoMessages);
        }

        let mut ranked: Vec<(u64, u64)> = session.counts.iter().map(|(u, c)| (*u, *c)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(LEADERBOARD_SIZE);
        Ok(ranked)
    }
}
