//! [`Platform`] on top of a running serenity client.

use super::{FoundMessage, Platform};
use crate::bot::BotData;
use crate::errors::{Error, Result};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds the full list of poise commands; publishing filters it by name.
pub type CommandFactory = fn() -> Vec<poise::Command<BotData, Error>>;

/// serenity-backed platform handle shared with the console dispatcher.
pub struct SerenityPlatform {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
    shard_manager: Arc<serenity::ShardManager>,
    commands: CommandFactory,
    dev_guild: Option<serenity::GuildId>,
}

impl SerenityPlatform {
    /// Wraps the client's handles. With `dev_guild` set, commands are published to that guild only.
    #[must_use]
    pub fn new(
        http: Arc<serenity::Http>,
        cache: Arc<serenity::Cache>,
        shard_manager: Arc<serenity::ShardManager>,
        commands: CommandFactory,
        dev_guild: Option<u64>,
    ) -> Self {
        Self {
            http,
            cache,
            shard_manager,
            commands,
            dev_guild: dev_guild.map(serenity::GuildId::new),
        }
    }
}

/// Publishes the application commands among `commands` whose name is in `names`,
/// replacing whatever was published before. Returns how many were published.
pub async fn publish(
    http: &serenity::Http,
    dev_guild: Option<serenity::GuildId>,
    commands: &[poise::Command<BotData, Error>],
    names: &[String],
) -> Result<usize> {
    let payload: Vec<_> = commands
        .iter()
        .filter(|c| names.contains(&c.name))
        .filter_map(poise::Command::create_as_slash_command)
        .collect();
    let count = payload.len();

    match dev_guild {
        Some(guild_id) => {
            guild_id.set_commands(http, payload).await?;
            info!("Published {count} application commands to guild {guild_id}");
        }
        None => {
            serenity::Command::set_global_commands(http, payload).await?;
            info!("Published {count} application commands globally");
        }
    }
    Ok(count)
}

#[async_trait]
impl Platform for SerenityPlatform {
    async fn send_to_channel(&self, channel_id: u64, text: &str) -> Result<()> {
        serenity::ChannelId::new(channel_id)
            .say(&self.http, text)
            .await?;
        Ok(())
    }

    async fn find_message(&self, message_id: u64) -> Result<Option<FoundMessage>> {
        let message_id = serenity::MessageId::new(message_id);
        for guild_id in self.cache.guilds() {
            let channels = match guild_id.channels(&self.http).await {
                Ok(channels) => channels,
                Err(e) => {
                    debug!("Skipping guild {guild_id}: {e}");
                    continue;
                }
            };
            for (channel_id, channel) in channels {
                if channel.kind != serenity::ChannelType::Text {
                    continue;
                }
                if let Ok(message) = channel_id.message(&self.http, message_id).await {
                    return Ok(Some(FoundMessage {
                        channel_id: channel_id.get(),
                        message_id: message.id.get(),
                        author_id: message.author.id.get(),
                    }));
                }
            }
        }
        Ok(None)
    }

    async fn reply_to(&self, message: &FoundMessage, text: &str) -> Result<()> {
        let channel_id = serenity::ChannelId::new(message.channel_id);
        let builder = serenity::CreateMessage::new()
            .content(text)
            .reference_message((channel_id, serenity::MessageId::new(message.message_id)));
        channel_id.send_message(&self.http, builder).await?;
        Ok(())
    }

    async fn direct_message(&self, user_id: u64, text: &str) -> Result<()> {
        serenity::UserId::new(user_id)
            .direct_message(
                (&self.cache, self.http.as_ref()),
                serenity::CreateMessage::new().content(text),
            )
            .await?;
        Ok(())
    }

    async fn publish_commands(&self, names: &[String]) -> Result<()> {
        publish(&self.http, self.dev_guild, &(self.commands)(), names).await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.shard_manager.shutdown_all().await;
        Ok(())
    }
}
