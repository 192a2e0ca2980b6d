//! Response buttons - `/button create` and `/button add`.
//!
//! Each button's response template is stored under its custom id so presses
//! are answered after a restart; see [`crate::bot::handlers::buttons`].

/// Buttons per action row.
pub const BUTTONS_PER_ROW: usize = 5;

/// Appends `item` to the last row, starting a new row once it holds `per_row` items.
#[must_use]
pub fn append_to_rows<T>(mut rows: Vec<Vec<T>>, item: T, per_row: usize) -> Vec<Vec<T>> {
    match rows.last_mut() {
        Some(last) if last.len() < per_row => last.push(item),
        _ => rows.push(vec![item]),
    }
    rows
}

mod inner {
    #![allow(missing_docs)]

    use super::{BUTTONS_PER_ROW, append_to_rows};
    use crate::{
        bot::{
            BotData,
            handlers::buttons::{ButtonDefinition, custom_id_for},
            render,
        },
        core::{
            embed::parse_hex_color,
            template,
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use tracing::{error, info};

    type Ctx<'a> = poise::Context<'a, BotData, Error>;

    async fn reply_ephemeral(ctx: Ctx<'_>, text: &str) -> Result<()> {
        ctx.send(
            poise::CreateReply::default()
                .content(text)
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Builds the button and persists its definition.
    fn register_button(
        ctx: Ctx<'_>,
        emoji: &str,
        label: Option<String>,
        definition: &ButtonDefinition,
    ) -> Result<serenity::CreateButton> {
        let custom_id = custom_id_for(ctx.id());
        ctx.data().buttons.put(&custom_id, definition)?;
        info!(custom_id = %custom_id, "Registered response button");

        let emoji = emoji
            .parse::<serenity::ReactionType>()
            .unwrap_or_else(|_| serenity::ReactionType::Unicode(emoji.to_string()));
        let mut button = serenity::CreateButton::new(custom_id)
            .style(serenity::ButtonStyle::Primary)
            .emoji(emoji);
        if let Some(label) = label.filter(|l| !l.is_empty()) {
            button = button.label(label);
        }
        Ok(button)
    }

    /// Create or modify a button
    #[poise::command(
        slash_command,
        guild_only,
        category = "button",
        subcommands("button_create", "button_add"),
        subcommand_required
    )]
    pub async fn button(_ctx: Ctx<'_>) -> Result<()> {
        Ok(())
    }

    /// Create a new message with a button
    #[poise::command(slash_command, guild_only, rename = "create")]
    pub async fn button_create(
        ctx: Ctx<'_>,
        #[description = "Emoji for the button"] emoji: String,
        #[description = "Response message (supports {embed}, {addrole:}, {removerole:})"]
        response: String,
        #[description = "Hex color for embed"] color: Option<String>,
        #[description = "Only visible to user?"] ephemeral: Option<bool>,
        #[description = "Label text on the button"] label: Option<String>,
    ) -> Result<()> {
        let ephemeral = ephemeral.unwrap_or(false);
        let mut reply = poise::CreateReply::default().ephemeral(ephemeral);

        if response.contains("{embed}") {
            let mut embed = serenity::CreateEmbed::default()
                .description(response.replace("{embed}", "").trim());
            if let Some(color) = color.filter(|c| !c.is_empty()) {
                let Ok(color) = parse_hex_color(&color) else {
                    return reply_ephemeral(ctx, "Invalid hex color.").await;
                };
                embed = embed.color(color);
            }
            reply = reply.embed(embed);
        } else {
            let rendered = template::render(&response, &render::author_context(ctx).await);
            reply = reply.content(rendered.plain_text);
        }

        let definition = ButtonDefinition {
            response,
            ephemeral,
        };
        let button = register_button(ctx, &emoji, label, &definition)?;
        ctx.send(reply.components(vec![serenity::CreateActionRow::Buttons(vec![button])]))
            .await?;
        Ok(())
    }

    /// Add a button to an existing message
    #[poise::command(slash_command, guild_only, rename = "add")]
    pub async fn button_add(
        ctx: Ctx<'_>,
        #[description = "Channel ID containing the message"] channel_id: String,
        #[description = "Message ID to modify"] message_id: String,
        #[description = "Emoji for the button"] emoji: String,
        #[description = "Response message (supports {embed}, {addrole:}, {removerole:})"]
        response: String,
        #[description = "Only visible to user?"] ephemeral: Option<bool>,
        #[description = "Label text on the button"] label: Option<String>,
    ) -> Result<()> {
        let channel = channel_id
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|id| *id != 0)
            .map(serenity::ChannelId::new)
            .filter(|id| ctx.guild().is_some_and(|guild| guild.channels.contains_key(id)));
        let Some(channel) = channel else {
            return reply_ephemeral(ctx, "Invalid channel ID.").await;
        };

        let message_id = message_id.trim().parse::<u64>().ok().filter(|id| *id != 0);
        let message = match message_id {
            Some(id) => channel
                .message(ctx.http(), serenity::MessageId::new(id))
                .await
                .ok(),
            None => None,
        };
        let Some(mut message) = message else {
            return reply_ephemeral(ctx, "Message not found.").await;
        };

        let definition = ButtonDefinition {
            response,
            ephemeral: ephemeral.unwrap_or(false),
        };
        let button = register_button(ctx, &emoji, label, &definition)?;

        let existing: Vec<Vec<serenity::CreateButton>> = message
            .components
            .iter()
            .map(|row| {
                row.components
                    .iter()
                    .filter_map(|component| match component {
                        serenity::ActionRowComponent::Button(button) => {
                            Some(serenity::CreateButton::from(button.clone()))
                        }
                        _ => None,
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|row| !row.is_empty())
            .collect();
        let rows = append_to_rows(existing, button, BUTTONS_PER_ROW)
            .into_iter()
            .map(serenity::CreateActionRow::Buttons)
            .collect();

        match message
            .edit(ctx.http(), serenity::EditMessage::new().components(rows))
            .await
        {
            Ok(()) => reply_ephemeral(ctx, "Button added to the message.").await,
            Err(e) => {
                error!("Failed to add button to message {}: {e}", message.id);
                reply_ephemeral(ctx, "Failed to add button to the message.").await
            }
        }
    }
}

pub use inner::*;
