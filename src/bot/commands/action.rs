//! Action commands - `hug`, `pat` and friends.
//!
//! All 22 commands are copies of one poise command with a different name; the
//! invoked name is the action. The reply carries a "Respond back!" button the
//! author can press for 50 seconds.

/// Every action with the help text shown for it.
pub const ACTIONS: [(&str, &str); 22] = [
    ("cuddle", "Cuddle with a user"),
    ("hug", "Hug a user"),
    ("kiss", "Kiss a user"),
    ("lick", "Lick a user"),
    ("nom", "Nom a user"),
    ("pat", "Pat a user"),
    ("poke", "Poke a user"),
    ("slap", "Slap a user"),
    ("stare", "Stare at a user"),
    ("highfive", "High five a user"),
    ("bite", "Bite a user"),
    ("greet", "Greet a user"),
    ("punch", "Punch a user"),
    ("handholding", "Hold hands with a user"),
    ("tickle", "Tickle a user"),
    ("kill", "Pretend to kill a user"),
    ("hold", "Hold a user"),
    ("pats", "Give multiple pats"),
    ("wave", "Wave at a user"),
    ("boop", "Boop a user"),
    ("snuggle", "Snuggle with a user"),
    ("bully", "Playfully bully a user"),
];

/// Upper-cases the first letter (`hug` → `Hug`).
#[must_use]
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// One poise command per action.
#[must_use]
pub fn all() -> Vec<poise::Command<crate::bot::BotData, crate::errors::Error>> {
    ACTIONS
        .iter()
        .map(|(name, help)| {
            let mut command = inner::action();
            command.name = (*name).to_string();
            command.qualified_name = (*name).to_string();
            command.identifying_name = format!("action_{name}");
            command.description = Some((*help).to_string());
            command
        })
        .collect()
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::capitalize;
    use crate::{
        bot::{BotData, commands::delete_after, render},
        core::gif::pick_or_fallback,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::time::Duration;
    use tracing::debug;

    const RESPOND_TIMEOUT: Duration = Duration::from_secs(50);

    /// Searches Tenor for the action, falling back to curated GIFs.
    pub async fn fetch_action_gif(data: &BotData, action: &str) -> String {
        let settings = data.process.modules.action.get();
        let urls = data
            .tenor
            .search(&settings.query_for(action), settings.search_limit)
            .await;
        if urls.is_empty() {
            pick_or_fallback(settings.fallbacks_for(action))
        } else {
            pick_or_fallback(&urls)
        }
    }

    /// Performs an action on the mentioned user, or on the author of the replied-to message.
    #[poise::command(prefix_command, guild_only, category = "action")]
    pub async fn action(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Who to target"] member: Option<serenity::Member>,
    ) -> Result<()> {
        let action = ctx.command().name.clone();
        let target = match (member, ctx) {
            (Some(member), _) => Some(member.user),
            (None, poise::Context::Prefix(prefix)) => prefix
                .msg
                .referenced_message
                .as_ref()
                .map(|replied| replied.author.clone()),
            (None, poise::Context::Application(_)) => None,
        };

        let Some(target) = target else {
            let handle = ctx.reply("Please mention a user").await?;
            let message = handle.into_message().await?;
            delete_after(
                ctx.serenity_context().http.clone(),
                message,
                Duration::from_secs(3),
            );
            return Ok(());
        };
        if target.id == ctx.author().id {
            ctx.reply(format!("You cannot {action} yourself.")).await?;
            return Ok(());
        }
        if target.id == ctx.framework().bot_id {
            ctx.reply("Thank you.").await?;
            return Ok(());
        }

        let total = ctx.data().record_action(&action, ctx.author().id.get());
        let cache = ctx.cache();
        let author_name = render::display_name(cache, ctx.guild_id(), ctx.author());
        let target_name = render::display_name(cache, ctx.guild_id(), &target);
        let color = ctx
            .guild()
            .and_then(|guild| {
                let member = guild.members.get(&ctx.author().id)?;
                render::top_role(&guild, member).map(|role| role.colour.0)
            })
            .filter(|color| *color != 0)
            .unwrap_or(render::NO_ROLE_COLOR);

        let gif = fetch_action_gif(ctx.data(), &action).await;
        let embed = serenity::CreateEmbed::default()
            .description(format!("{author_name} {action}s {target_name}."))
            .color(color)
            .image(gif)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "{}s given by you: {total}",
                capitalize(&action)
            )));

        let button_id = format!("{}respond", ctx.id());
        let button = serenity::CreateButton::new(&button_id)
            .label("Respond back!")
            .style(serenity::ButtonStyle::Primary);
        ctx.send(
            poise::CreateReply::default()
                .embed(embed)
                .components(vec![serenity::CreateActionRow::Buttons(vec![button])])
                .reply(true),
        )
        .await?;

        loop {
            let id = button_id.clone();
            let Some(press) = serenity::ComponentInteractionCollector::new(ctx)
                .filter(move |press| press.data.custom_id == id)
                .timeout(RESPOND_TIMEOUT)
                .await
            else {
                break;
            };

            if press.user.id != ctx.author().id {
                press
                    .create_response(
                        ctx.serenity_context(),
                        serenity::CreateInteractionResponse::Message(
                            serenity::CreateInteractionResponseMessage::new()
                                .content("You are not the author of this command.")
                                .ephemeral(true),
                        ),
                    )
                    .await?;
                continue;
            }

            press
                .create_response(
                    ctx.serenity_context(),
                    serenity::CreateInteractionResponse::Acknowledge,
                )
                .await?;
            let gif = fetch_action_gif(ctx.data(), &action).await;
            let embed = serenity::CreateEmbed::default()
                .title(format!("{author_name} {action}s {target_name}"))
                .color(rand::random::<u32>() & 0x00FF_FFFF)
                .image(gif);
            press
                .create_followup(
                    ctx.serenity_context(),
                    serenity::CreateInteractionResponseFollowup::new().embed(embed),
                )
                .await?;
        }
        debug!("Respond button for {action} expired");
        Ok(())
    }
}

pub use inner::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("hug"), "Hug");
        assert_eq!(capitalize("highfive"), "Highfive");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_every_action_becomes_a_named_command() {
        let commands = all();
        assert_eq!(commands.len(), ACTIONS.len());
        let hug = commands.iter().find(|c| c.name == "hug");
        assert!(hug.is_some_and(|c| c.qualified_name == "hug"
            && c.description.as_deref() == Some("Hug a user")
            && c.category.as_deref() == Some("action")));
    }

    #[test]
    fn test_action_settings_know_every_action() {
        let settings = crate::config::modules::ActionSettings::default();
        for (name, _) in ACTIONS {
            assert_ne!(settings.query_for(name), format!("{name} anime"));
        }
    }
}
