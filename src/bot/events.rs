//! Gateway events that are not commands.

use crate::{
    bot::{ALTS_LOG_FILE, BotData, handlers},
    core::mentions::MentionEntry,
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;
use serde_json::json;
use tracing::{debug, error, info, warn};

/// Whether an account created at `created_at` is younger than `min_age_days` at `now`.
#[must_use]
pub fn is_new_account(created_at: DateTime<Utc>, now: DateTime<Utc>, min_age_days: i64) -> bool {
    now.signed_duration_since(created_at) < chrono::Duration::days(min_age_days)
}

/// Routes gateway events to the bot's listeners.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(
                "Bot is running as {} (ID: {})",
                data_about_bot.user.name, data_about_bot.user.id
            );
            info!("Connected to {} guild(s).", data_about_bot.guilds.len());
            if let Err(e) = handlers::booster::post_menu(ctx, data).await {
                error!("Failed to post booster perks menu: {e}");
            }
        }
        serenity::FullEvent::Resume { .. } => info!("Bot resumed session."),
        serenity::FullEvent::Message { new_message } => on_message(ctx, new_message, data),
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            on_member_join(new_member, data)?;
        }
        serenity::FullEvent::InteractionCreate { interaction } => {
            handlers::handle_interaction(ctx, interaction, data).await?;
        }
        _ => {}
    }
    Ok(())
}

/// Mentions, message counting and the console's listened channel.
fn on_message(ctx: &serenity::Context, message: &serenity::Message, data: &BotData) {
    if message.author.bot {
        return;
    }

    let bot_id = ctx.cache.current_user().id;
    if message.mentions_user_id(bot_id) {
        data.process.mentions.push(MentionEntry {
            channel_id: message.channel_id.get(),
            message_id: message.id.get(),
            content: message.content.clone(),
            user_id: message.author.id.get(),
        });
        debug!("Recorded mention {} from {}", message.id, message.author.id);
    }

    if data.process.listened() == Some(message.channel_id.get()) {
        data.process.print(&format!(
            "[{}] {}: {}",
            message.channel_id,
            message.author.tag(),
            message.content
        ));
    }

    if let Some(guild_id) = message.guild_id {
        if let Err(e) = data.counter.record(
            guild_id.get(),
            message.channel_id.get(),
            message.author.id.get(),
        ) {
            error!("Failed to save message counts: {e}");
        }
    }
}

/// Flags accounts younger than the configured minimum while anti-raid is on.
fn on_member_join(member: &serenity::Member, data: &BotData) -> Result<()> {
    if !data.process.antiraid_enabled() {
        return Ok(());
    }
    let Some(created_at) = crate::bot::render::to_utc(member.user.id.created_at()) else {
        return Ok(());
    };
    let min_age_days = data.config.antiraid.min_account_age_days;
    if !is_new_account(created_at, Utc::now(), min_age_days) {
        return Ok(());
    }

    warn!(
        "Possible alt account joined {}: {} ({}) created {created_at}",
        member.guild_id,
        member.user.tag(),
        member.user.id
    );
    data.alts_log.put(
        &member.user.id.to_string(),
        json!({
            "tag": member.user.tag(),
            "guild_id": member.guild_id.get(),
            "created_at": created_at.to_rfc3339(),
            "joined_at": Utc::now().to_rfc3339(),
        }),
    )?;
    info!("Logged {} to {ALTS_LOG_FILE}", member.user.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_is_new_account() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).single().unwrap();
        let week_old = Utc.with_ymd_and_hms(2025, 6, 3, 12, 0, 0).single().unwrap();
        let year_old = Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).single().unwrap();

        assert!(is_new_account(week_old, now, 30));
        assert!(!is_new_account(year_old, now, 30));
        assert!(!is_new_account(week_old, now, 7));
        assert!(!is_new_account(week_old, now, 0));
    }
}
