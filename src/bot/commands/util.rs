//! Utility and owner commands. All of them are prefix commands.

use crate::console::ReloadReport;

/// Green used for successful refreshes and server info.
pub const GREEN: u32 = 0x0000_FF00;
/// Red used when a refresh had failures.
pub const RED: u32 = 0x00FF_0000;

/// Embed description and colour summarizing a refresh.
#[must_use]
pub fn refresh_summary(report: &ReloadReport) -> (String, u32) {
    let reloaded = report.reloaded.join(", ");
    if report.failed.is_empty() {
        return (format!("Reloaded all cogs: {reloaded}"), GREEN);
    }
    let failed = report
        .failed
        .iter()
        .map(|(module, reason)| format!("{module} ({reason})"))
        .collect::<Vec<_>>()
        .join(", ");
    (format!("Reloaded: {reloaded}\nFailed: {failed}"), RED)
}

/// Every utility command.
#[must_use]
pub fn all() -> Vec<poise::Command<crate::bot::BotData, crate::errors::Error>> {
    vec![
        inner::ping(),
        inner::stats(),
        inner::link(),
        inner::disable(),
        inner::shards(),
        inner::color(),
        inner::prefix(),
        inner::log(),
        inner::purge(),
        inner::clear(),
        inner::say(),
        inner::echo(),
        inner::userinfo(),
        inner::serverinfo(),
        inner::refresh(),
        inner::reload(),
    ]
}

mod inner {
    #![allow(missing_docs)]

    use super::{GREEN, refresh_summary};
    use crate::{
        bot::{BotData, commands::delete_after, render},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::time::Duration;
    use tracing::info;

    type Ctx<'a> = poise::Context<'a, BotData, Error>;

    const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    fn format_timestamp(timestamp: Option<serenity::Timestamp>) -> String {
        timestamp
            .and_then(render::to_utc)
            .map_or_else(|| "Unknown".to_string(), |t| t.format(DATE_FORMAT).to_string())
    }

    /// The given member, or the invoking member.
    async fn member_or_author(
        ctx: Ctx<'_>,
        member: Option<serenity::Member>,
    ) -> Result<serenity::Member> {
        if let Some(member) = member {
            return Ok(member);
        }
        ctx.author_member()
            .await
            .map(std::borrow::Cow::into_owned)
            .ok_or_else(|| Error::NotFound {
                what: "Member".to_string(),
            })
    }

    /// `(name, colour)` of the member's top role.
    fn top_role_of(ctx: Ctx<'_>, member: &serenity::Member) -> Option<(String, u32)> {
        let guild = ctx.guild()?;
        render::top_role(&guild, member).map(|role| (role.name.clone(), role.colour.0))
    }

    /// Show the gateway latency
    #[poise::command(prefix_command, category = "util")]
    pub async fn ping(ctx: Ctx<'_>) -> Result<()> {
        let latency = ctx.ping().await;
        ctx.say(format!("Pong! {}ms", latency.as_millis())).await?;
        Ok(())
    }

    /// Show how long the bot has been running
    #[poise::command(prefix_command, category = "util")]
    pub async fn stats(ctx: Ctx<'_>) -> Result<()> {
        let uptime = ctx.data().started_at.elapsed().as_secs();
        ctx.say(format!("Bot Uptime: {uptime} seconds")).await?;
        Ok(())
    }

    /// Show the bot invite link
    #[poise::command(prefix_command, category = "util")]
    pub async fn link(ctx: Ctx<'_>) -> Result<()> {
        ctx.say(format!("Bot invite link: {}", ctx.data().config.invite_link))
            .await?;
        Ok(())
    }

    /// Disable a text command until its module is reloaded
    #[poise::command(prefix_command, category = "util")]
    pub async fn disable(ctx: Ctx<'_>, command_name: String) -> Result<()> {
        let disabled = ctx.data().process.registry().disable_text(&command_name);
        let reply = if disabled {
            info!(command = %command_name, "Disabled text command");
            format!("Command `{command_name}` has been disabled.")
        } else {
            format!("No command named `{command_name}` found.")
        };
        ctx.say(reply).await?;
        Ok(())
    }

    /// Show the shard count
    #[poise::command(prefix_command, category = "util")]
    pub async fn shards(ctx: Ctx<'_>) -> Result<()> {
        let count = ctx.cache().shard_count();
        ctx.say(format!("Shards: {count}")).await?;
        Ok(())
    }

    /// Show a member's top role colour
    #[poise::command(prefix_command, guild_only, category = "util")]
    pub async fn color(ctx: Ctx<'_>, member: Option<serenity::Member>) -> Result<()> {
        let member = member_or_author(ctx, member).await?;
        let color = top_role_of(ctx, &member).map_or(0, |(_, color)| color);
        ctx.say(format!(
            "{}'s top role color: #{color:06x}",
            member.display_name()
        ))
        .await?;
        Ok(())
    }

    /// Show the command prefix
    #[poise::command(prefix_command, category = "util")]
    pub async fn prefix(ctx: Ctx<'_>) -> Result<()> {
        ctx.say(format!("Current prefix: {}", ctx.data().config.prefix))
            .await?;
        Ok(())
    }

    /// Print a message to the operator console
    #[poise::command(prefix_command, owners_only, category = "util")]
    pub async fn log(ctx: Ctx<'_>, #[rest] message: String) -> Result<()> {
        ctx.data().process.print(&message);
        ctx.say("Message logged to console.").await?;
        Ok(())
    }

    async fn purge_messages(ctx: Ctx<'_>, amount: i64) -> Result<()> {
        let Some(wanted) = u64::try_from(amount).ok().filter(|n| *n > 0) else {
            ctx.say("Please specify a number greater than 0.").await?;
            return Ok(());
        };

        // The invoking message goes too.
        let mut remaining = wanted + 1;
        let mut deleted = 0_u64;
        let channel = ctx.channel_id();
        while remaining > 0 {
            let batch = u8::try_from(remaining.min(100)).unwrap_or(100);
            let ids: Vec<serenity::MessageId> = channel
                .messages(ctx.http(), serenity::GetMessages::new().limit(batch))
                .await?
                .iter()
                .map(|m| m.id)
                .collect();
            match ids.as_slice() {
                [] => break,
                [only] => channel.delete_message(ctx.http(), *only).await?,
                many => channel.delete_messages(ctx.http(), many).await?,
            }
            let count = ids.len() as u64;
            deleted += count;
            remaining = remaining.saturating_sub(count);
            if count < u64::from(batch) {
                break;
            }
        }

        info!(channel = %channel, deleted, "Purged messages");
        let handle = ctx
            .say(format!("Deleted {} messages.", deleted.saturating_sub(1)))
            .await?;
        delete_after(
            ctx.serenity_context().http.clone(),
            handle.into_message().await?,
            Duration::from_secs(5),
        );
        Ok(())
    }

    /// Delete the last N messages in this channel
    #[poise::command(
        prefix_command,
        guild_only,
        category = "util",
        required_permissions = "MANAGE_MESSAGES"
    )]
    pub async fn purge(ctx: Ctx<'_>, amount: i64) -> Result<()> {
        purge_messages(ctx, amount).await
    }

    /// Delete the last N messages in this channel
    #[poise::command(
        prefix_command,
        guild_only,
        category = "util",
        required_permissions = "MANAGE_MESSAGES"
    )]
    pub async fn clear(ctx: Ctx<'_>, amount: i64) -> Result<()> {
        purge_messages(ctx, amount).await
    }

    /// Repeat a message
    #[poise::command(prefix_command, category = "util")]
    pub async fn say(ctx: Ctx<'_>, #[rest] message: String) -> Result<()> {
        ctx.say(message).await?;
        Ok(())
    }

    /// Repeat a message
    #[poise::command(prefix_command, category = "util")]
    pub async fn echo(ctx: Ctx<'_>, #[rest] message: String) -> Result<()> {
        ctx.say(message).await?;
        Ok(())
    }

    /// Show information about a member
    #[poise::command(prefix_command, guild_only, category = "util")]
    pub async fn userinfo(ctx: Ctx<'_>, member: Option<serenity::Member>) -> Result<()> {
        let member = member_or_author(ctx, member).await?;
        let (role_name, role_color) =
            top_role_of(ctx, &member).unwrap_or_else(|| ("@everyone".to_string(), 0));

        let embed = serenity::CreateEmbed::default()
            .title(format!("User Info - {}", member.user.tag()))
            .color(role_color)
            .field("ID", member.user.id.to_string(), true)
            .field("Display Name", member.display_name(), true)
            .field("Top Role", role_name, true)
            .field(
                "Account Created",
                format_timestamp(Some(member.user.id.created_at())),
                true,
            )
            .field("Joined Server", format_timestamp(member.joined_at), true);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Show information about this server
    #[poise::command(prefix_command, guild_only, category = "util")]
    pub async fn serverinfo(ctx: Ctx<'_>) -> Result<()> {
        let embed = ctx
            .guild()
            .map(|guild| {
                let owner = guild.members.get(&guild.owner_id).map_or_else(
                    || format!("<@{}>", guild.owner_id),
                    |owner| owner.user.tag(),
                );
                serenity::CreateEmbed::default()
                    .title(format!("Server Info - {}", guild.name))
                    .color(GREEN)
                    .field("Server ID", guild.id.to_string(), true)
                    .field("Owner", owner, true)
                    .field("Members", guild.member_count.to_string(), true)
                    .field(
                        "Created At",
                        format_timestamp(Some(guild.id.created_at())),
                        true,
                    )
                    .field("Channels", guild.channels.len().to_string(), true)
            })
            .ok_or_else(|| Error::NotFound {
                what: "Guild".to_string(),
            })?;
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Reload every module's settings and bring back disabled commands
    #[poise::command(prefix_command, owners_only, category = "util")]
    pub async fn refresh(ctx: Ctx<'_>) -> Result<()> {
        let handle = ctx
            .send(
                poise::CreateReply::default().embed(
                    serenity::CreateEmbed::default()
                        .title("Refreshing all cogs...")
                        .description("Starting refresh...")
                        .color(GREEN),
                ),
            )
            .await?;

        let report = ctx.data().process.reload_modules();
        info!(
            reloaded = report.reloaded.len(),
            failed = report.failed.len(),
            "Refresh complete"
        );
        let (description, color) = refresh_summary(&report);
        handle
            .edit(
                ctx,
                poise::CreateReply::default().embed(
                    serenity::CreateEmbed::default()
                        .title("Refresh complete")
                        .description(description)
                        .color(color),
                ),
            )
            .await?;
        delete_after(
            ctx.serenity_context().http.clone(),
            handle.into_message().await?,
            Duration::from_secs(20),
        );
        Ok(())
    }

    /// Reload a single module
    #[poise::command(prefix_command, owners_only, hide_in_help, category = "util")]
    pub async fn reload(ctx: Ctx<'_>, module: String) -> Result<()> {
        let reply = match ctx.data().process.reload_module(&module) {
            None => format!("No module named `{module}`."),
            Some(Ok(())) => format!("Reloaded module `{module}`."),
            Some(Err(e)) => format!("Failed to reload module `{module}`: {e}"),
        };
        ctx.say(reply).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_summary_all_reloaded() {
        let report = ReloadReport {
            reloaded: vec!["action".to_string(), "gif".to_string()],
            failed: Vec::new(),
        };
        assert_eq!(
            refresh_summary(&report),
            ("Reloaded all cogs: action, gif".to_string(), GREEN)
        );
    }

    #[test]
    fn test_refresh_summary_lists_failures() {
        let report = ReloadReport {
            reloaded: vec!["action".to_string()],
            failed: vec![("help".to_string(), "bad toml".to_string())],
        };
        let (description, color) = refresh_summary(&report);
        assert_eq!(description, "Reloaded: action\nFailed: help (bad toml)");
        assert_eq!(color, RED);
    }

    #[test]
    fn test_owner_commands() {
        let commands = all();
        let find = |name: &str| commands.iter().find(|c| c.name == name);
        assert!(find("refresh").is_some_and(|c| c.owners_only));
        assert!(find("reload").is_some_and(|c| c.owners_only && c.hide_in_help));
        assert!(find("log").is_some_and(|c| c.owners_only));
        assert!(commands.iter().all(|c| c.slash_action.is_none()));
    }
}
