//! Embed creation and editing.
//!
//! Edits fetch the message from the invoking channel, read its first embed,
//! apply an [`EmbedPatch`](crate::core::embed::EmbedPatch) and write it back.
//! Text fields go through placeholder substitution; URLs are used verbatim.

mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, render},
        core::{
            embed::{DEFAULT_EMBED_COLOR, EmbedPatch, parse_hex_color, parse_message_id},
            template,
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use tracing::{error, info};

    type Ctx<'a> = poise::Context<'a, BotData, Error>;

    enum Edited {
        Updated,
        NoEmbed,
    }

    /// Which embed part `/icon` changes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
    pub enum IconTarget {
        #[name = "author"]
        Author,
        #[name = "footer"]
        Footer,
    }

    async fn substitute(ctx: Ctx<'_>, text: &str) -> String {
        template::substitute(text, &render::author_context(ctx).await)
    }

    async fn respond(ctx: Ctx<'_>, text: impl Into<String>, ephemeral: bool) -> Result<()> {
        ctx.send(
            poise::CreateReply::default()
                .content(text)
                .ephemeral(ephemeral),
        )
        .await?;
        Ok(())
    }

    /// Applies `patch` to the first embed of a message in the invoking channel.
    ///
    /// Timestamp and fields of the existing embed are carried over.
    async fn patch_embed(ctx: Ctx<'_>, message_id: u64, patch: &EmbedPatch) -> Result<Edited> {
        let mut message = ctx
            .channel_id()
            .message(ctx.http(), serenity::MessageId::new(message_id))
            .await?;
        let embed = {
            let Some(existing) = message.embeds.first() else {
                return Ok(Edited::NoEmbed);
            };
            let mut spec = render::embed_spec_from(existing);
            spec.apply(patch);
            let mut embed = render::create_embed(&spec).fields(
                existing
                    .fields
                    .iter()
                    .map(|f| (f.name.clone(), f.value.clone(), f.inline)),
            );
            let timestamp = if patch.timestamp {
                Some(serenity::Timestamp::now())
            } else {
                existing.timestamp
            };
            if let Some(timestamp) = timestamp {
                embed = embed.timestamp(timestamp);
            }
            embed
        };
        message
            .edit(ctx.http(), serenity::EditMessage::new().embed(embed))
            .await?;
        info!(message_id, "Edited embed");
        Ok(Edited::Updated)
    }

    /// Parses the id, edits the embed and reports the outcome.
    async fn edit_and_report(
        ctx: Ctx<'_>,
        message_id: &str,
        patch: EmbedPatch,
        success: &str,
        ephemeral: bool,
    ) -> Result<()> {
        let message_id = match parse_message_id(message_id) {
            Ok(id) => id,
            Err(e) => return respond(ctx, e.to_string(), ephemeral).await,
        };
        match patch_embed(ctx, message_id, &patch).await {
            Ok(Edited::Updated) => respond(ctx, success, ephemeral).await,
            Ok(Edited::NoEmbed) => {
                respond(ctx, "That message does not contain an embed.", ephemeral).await
            }
            Err(e) => {
                error!("Error in `{}`: {e}", ctx.command().qualified_name);
                respond(ctx, format!("Error: {e}"), ephemeral).await
            }
        }
    }

    /// Sends a new embed with `title` to the invoking channel and returns its id.
    async fn send_titled(ctx: Ctx<'_>, title: &str) -> Result<serenity::MessageId> {
        let embed = serenity::CreateEmbed::default()
            .title(substitute(ctx, title).await)
            .color(DEFAULT_EMBED_COLOR);
        let message = ctx
            .channel_id()
            .send_message(ctx.http(), serenity::CreateMessage::new().embed(embed))
            .await?;
        Ok(message.id)
    }

    fn http_status(error: &serenity::Error) -> Option<u16> {
        match error {
            serenity::Error::Http(serenity::HttpError::UnsuccessfulRequest(response)) => {
                Some(response.status_code.as_u16())
            }
            _ => None,
        }
    }

    /// Base command for embed editing.
    #[poise::command(
        prefix_command,
        guild_only,
        category = "embed",
        required_permissions = "ADMINISTRATOR",
        subcommands(
            "embed_create",
            "footer",
            "title",
            "description",
            "author",
            "thumbnail",
            "image",
            "color",
            "delete"
        )
    )]
    pub async fn embed(ctx: Ctx<'_>) -> Result<()> {
        ctx.say(format!(
            "Usage: `{}embed <create|footer|title|description|author|thumbnail|image> ...`",
            ctx.data().config.prefix
        ))
        .await?;
        Ok(())
    }

    /// Create a new embed with a title and send it.
    #[poise::command(
        prefix_command,
        guild_only,
        rename = "create",
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn embed_create(ctx: Ctx<'_>, #[rest] title: String) -> Result<()> {
        let id = send_titled(ctx, &title).await?;
        ctx.say(format!(
            "Embed created! Message ID: `{id}`\nUse `{}embed <subcommand> <...> {id}` to edit.",
            ctx.data().config.prefix
        ))
        .await?;
        Ok(())
    }

    /// Edit the footer of an embed.
    #[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
    pub async fn footer(
        ctx: Ctx<'_>,
        text: String,
        message_id: String,
        icon: Option<String>,
        timestamp: Option<String>,
    ) -> Result<()> {
        let patch = EmbedPatch {
            footer: Some(substitute(ctx, &text).await),
            footer_icon: icon,
            timestamp: timestamp.is_some_and(|t| t.eq_ignore_ascii_case("true")),
            ..EmbedPatch::default()
        };
        edit_and_report(ctx, &message_id, patch, "Embed footer updated.", false).await
    }

    /// Edit the title of an embed.
    #[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
    pub async fn title(ctx: Ctx<'_>, text: String, message_id: String) -> Result<()> {
        let patch = EmbedPatch {
            title: Some(substitute(ctx, &text).await),
            ..EmbedPatch::default()
        };
        edit_and_report(ctx, &message_id, patch, "Embed title updated.", false).await
    }

    /// Edit the description of an embed.
    #[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
    pub async fn description(ctx: Ctx<'_>, text: String, message_id: String) -> Result<()> {
        let patch = EmbedPatch {
            description: Some(substitute(ctx, &text).await),
            ..EmbedPatch::default()
        };
        edit_and_report(ctx, &message_id, patch, "Embed description updated.", false).await
    }

    /// Edit the author of an embed.
    #[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
    pub async fn author(ctx: Ctx<'_>, text: String, message_id: String) -> Result<()> {
        let patch = EmbedPatch {
            author: Some(substitute(ctx, &text).await),
            ..EmbedPatch::default()
        };
        edit_and_report(ctx, &message_id, patch, "Embed author updated.", false).await
    }

    /// Edit the thumbnail of an embed.
    #[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
    pub async fn thumbnail(ctx: Ctx<'_>, url: String, message_id: String) -> Result<()> {
        let patch = EmbedPatch {
            thumbnail: Some(url),
            ..EmbedPatch::default()
        };
        edit_and_report(ctx, &message_id, patch, "Embed thumbnail updated.", false).await
    }

    /// Edit the image of an embed.
    #[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
    pub async fn image(ctx: Ctx<'_>, url: String, message_id: String) -> Result<()> {
        let patch = EmbedPatch {
            image: Some(url),
            ..EmbedPatch::default()
        };
        edit_and_report(ctx, &message_id, patch, "Embed image updated.", false).await
    }

    /// Change the colour of an embed.
    #[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
    pub async fn color(ctx: Ctx<'_>, hex: String, message_id: String) -> Result<()> {
        let color = match parse_hex_color(&hex) {
            Ok(color) => color,
            Err(e) => return respond(ctx, format!("Error: {e}"), false).await,
        };
        let patch = EmbedPatch {
            color: Some(color),
            ..EmbedPatch::default()
        };
        edit_and_report(ctx, &message_id, patch, "Embed color updated.", false).await
    }

    /// Delete an embed message from this channel.
    #[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
    pub async fn delete(ctx: Ctx<'_>, message_id: u64) -> Result<()> {
        if message_id == 0 {
            return respond(ctx, "Message ID must be an integer.", false).await;
        }
        let id = serenity::MessageId::new(message_id);
        let result = match ctx.channel_id().message(ctx.http(), id).await {
            Ok(message) => message.delete(ctx.http()).await,
            Err(e) => Err(e),
        };
        let reply = match result {
            Ok(()) => format!("embed `{message_id}` deleted"),
            Err(e) => match http_status(&e) {
                Some(404) => format!("Message not found, make sure {message_id} is correct"),
                Some(403) => "I do not have permissions to delete that message".to_string(),
                _ => format!("Error: {e}"),
            },
        };
        respond(ctx, reply, false).await
    }

    /// Edit an embed with multiple fields at once
    #[poise::command(
        slash_command,
        guild_only,
        category = "embed",
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn embedx(
        ctx: Ctx<'_>,
        #[description = "Message ID to edit"] message_id: String,
        #[description = "Embed title"] title: Option<String>,
        #[description = "Embed description"] description: Option<String>,
        #[description = "Embed footer"] footer: Option<String>,
        #[description = "Embed author"] author: Option<String>,
        #[description = "Thumbnail URL"] thumbnail: Option<String>,
        #[description = "Image URL"] image: Option<String>,
        #[description = "Hex color (e.g. #7289da)"] color: Option<String>,
    ) -> Result<()> {
        let given = |value: Option<String>| value.filter(|v| !v.is_empty());
        let color = match given(color).map(|c| parse_hex_color(&c)).transpose() {
            Ok(color) => color,
            Err(e) => return respond(ctx, e.to_string(), true).await,
        };
        let context = render::author_context(ctx).await;
        let fill = |value: Option<String>| {
            given(value).map(|text| template::substitute(&text, &context))
        };
        let patch = EmbedPatch {
            title: fill(title),
            description: fill(description),
            footer: fill(footer),
            author: fill(author),
            thumbnail: given(thumbnail),
            image: given(image),
            color,
            ..EmbedPatch::default()
        };
        edit_and_report(ctx, &message_id, patch, "Embed updated.", true).await
    }

    /// Change embed icons
    #[poise::command(
        slash_command,
        guild_only,
        category = "embed",
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn icon(
        ctx: Ctx<'_>,
        #[description = "Message ID of the embed"] message_id: String,
        #[description = "Choose which attribute will be affected"] attribute: IconTarget,
        #[description = "Icon link"] icon: String,
    ) -> Result<()> {
        let patch = match attribute {
            IconTarget::Author => EmbedPatch {
                author_icon: Some(icon),
                ..EmbedPatch::default()
            },
            IconTarget::Footer => EmbedPatch {
                footer_icon: Some(icon),
                ..EmbedPatch::default()
            },
        };
        edit_and_report(ctx, &message_id, patch, "Embed icon updated.", true).await
    }

    /// Embed group
    #[poise::command(
        slash_command,
        guild_only,
        category = "embed",
        required_permissions = "ADMINISTRATOR",
        subcommands("embed_slash_create"),
        subcommand_required
    )]
    pub async fn embed_slash(_ctx: Ctx<'_>) -> Result<()> {
        Ok(())
    }

    /// Create a new embed with a title
    #[poise::command(
        slash_command,
        guild_only,
        rename = "create",
        required_permissions = "ADMINISTRATOR"
    )]
    pub async fn embed_slash_create(
        ctx: Ctx<'_>,
        #[description = "Embed title"] title: String,
    ) -> Result<()> {
        let id = send_titled(ctx, &title).await?;
        ctx.say(format!(
            "Embed created! Message ID: `{id}`\nUse `/embed_slash <subcommand> ... {id}` to edit."
        ))
        .await?;
        Ok(())
    }
}

pub use inner::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_group_subcommands() {
        let group = embed();
        let mut names: Vec<&str> = group.subcommands.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(
            names,
            [
                "author",
                "color",
                "create",
                "delete",
                "description",
                "footer",
                "image",
                "thumbnail",
                "title"
            ]
        );
        assert!(group.subcommands.iter().all(|c| c.prefix_action.is_some()));
    }

    #[test]
    fn test_embed_slash_create_is_renamed() {
        let group = embed_slash();
        assert_eq!(group.subcommands.len(), 1);
        assert_eq!(group.subcommands[0].name, "create");
        assert!(group.slash_action.is_some());
    }

    #[test]
    fn test_editing_requires_administrator() {
        for command in [embedx(), icon()] {
            assert!(
                command
                    .required_permissions
                    .contains(poise::serenity_prelude::Permissions::ADMINISTRATOR)
            );
        }
    }
}
