//! Message counting sessions - `/msgs_count start|stop` and the `/msgs` leaderboard.

mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        core::counter::LeaderboardError,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    const LEADERBOARD_THUMBNAIL: &str =
        "https://cdn.discordapp.com/attachments/972365813468246036/1418687899297255556/chat_1.png";

    async fn ephemeral(ctx: poise::Context<'_, BotData, Error>, text: &str) -> Result<()> {
        ctx.send(
            poise::CreateReply::default()
                .content(text)
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Start or stop a message counting session
    #[poise::command(
        slash_command,
        guild_only,
        category = "message",
        subcommands("start", "stop"),
        subcommand_required
    )]
    pub async fn msgs_count(_ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        Ok(())
    }

    /// Start counting messages in this channel
    #[poise::command(
        slash_command,
        guild_only,
        category = "message",
        required_permissions = "MANAGE_MESSAGES"
    )]
    pub async fn start(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.data().counter.start_session(ctx.channel_id().get());
        ctx.say("Message counting session started in this channel!")
            .await?;
        Ok(())
    }

    /// Stop counting messages in this channel
    #[poise::command(
        slash_command,
        guild_only,
        category = "message",
        required_permissions = "MANAGE_MESSAGES"
    )]
    pub async fn stop(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.data().counter.stop_session(ctx.channel_id().get());
        ctx.say("Message counting session stopped in this channel!")
            .await?;
        Ok(())
    }

    /// Show the leaderboard for the current session in this channel
    #[poise::command(slash_command, guild_only, category = "message")]
    pub async fn msgs(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let top = match ctx.data().counter.leaderboard(ctx.channel_id().get()) {
            Ok(top) => top,
            Err(LeaderboardError::NoSession) => {
                return ephemeral(ctx, "No active or recent session in this channel.").await;
            }
            Err(LeaderboardError::NoMessages) => {
                return ephemeral(ctx, "No messages have been counted in this session.").await;
            }
        };

        let fields: Vec<(String, String, bool)> = top
            .iter()
            .enumerate()
            .map(|(i, (user_id, count))| {
                let user_id = serenity::UserId::new(*user_id);
                let name = ctx
                    .guild()
                    .and_then(|guild| {
                        let member = guild.members.get(&user_id)?;
                        Some(member.display_name().to_string())
                    })
                    .unwrap_or_else(|| format!("<@{user_id}>"));
                (format!("{} {name}", i + 1), format!("{count} messages"), false)
            })
            .collect();

        let embed = serenity::CreateEmbed::default()
            .title("Session Message Leaderboard")
            .color(0x002E_CC71)
            .thumbnail(LEADERBOARD_THUMBNAIL)
            .fields(fields);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

pub use inner::*;
