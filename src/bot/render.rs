//! Conversions between serenity models and the core types.

use crate::bot::BotData;
use crate::core::embed::EmbedSpec;
use crate::core::template::{GuildFacet, MemberFacet, MemberSummary, TemplateContext, UserFacet};
use crate::errors::Error;
use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;

/// Colour used when a member has no coloured role.
pub const NO_ROLE_COLOR: u32 = 0x00AA_BBCC;

/// Converts a Discord timestamp, dropping sub-second precision.
#[must_use]
pub fn to_utc(timestamp: serenity::Timestamp) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.unix_timestamp(), 0)
}

/// Colour of the highest-positioned coloured role among `(position, colour)` pairs.
fn highest_colored(roles: impl Iterator<Item = (u16, u32)>) -> Option<u32> {
    roles
        .filter(|(_, colour)| *colour != 0)
        .max_by_key(|(position, _)| *position)
        .map(|(_, colour)| colour)
}

/// The member's highest role, if they have any.
#[must_use]
pub fn top_role<'a>(
    guild: &'a serenity::Guild,
    member: &serenity::Member,
) -> Option<&'a serenity::Role> {
    member
        .roles
        .iter()
        .filter_map(|id| guild.roles.get(id))
        .max_by_key(|role| role.position)
}

/// The member's display colour (0 when no role is coloured).
#[must_use]
pub fn member_color(guild: &serenity::Guild, member: &serenity::Member) -> u32 {
    highest_colored(
        member
            .roles
            .iter()
            .filter_map(|id| guild.roles.get(id))
            .map(|role| (role.position, role.colour.0)),
    )
    .unwrap_or(0)
}

/// The user's server nickname when cached, otherwise their global display name.
#[must_use]
pub fn display_name(
    cache: &serenity::Cache,
    guild_id: Option<serenity::GuildId>,
    user: &serenity::User,
) -> String {
    guild_id
        .and_then(|guild_id| {
            let guild = cache.guild(guild_id)?;
            guild.members.get(&user.id)?.nick.clone()
        })
        .unwrap_or_else(|| user.display_name().to_string())
}

/// Template facts about the user alone.
#[must_use]
pub fn user_facet(user: &serenity::User) -> UserFacet {
    UserFacet {
        id: user.id.get(),
        name: user.name.clone(),
        tag: user.tag(),
        avatar_url: user.avatar_url(),
        discriminator: user.discriminator.map(|d| format!("{:04}", d.get())),
        created_at: to_utc(user.id.created_at()),
    }
}

/// Member facts; the display colour needs the guild's roles.
fn member_facet(guild: Option<&serenity::Guild>, member: &serenity::Member) -> MemberFacet {
    MemberFacet {
        nick: member.nick.clone(),
        joined_at: member.joined_at.and_then(to_utc),
        boost_since: member.premium_since.and_then(to_utc),
        display_color: format!("#{:06x}", guild.map_or(0, |g| member_color(g, member))),
    }
}

fn guild_facet(guild: &serenity::Guild) -> GuildFacet {
    GuildFacet {
        id: guild.id.get(),
        name: guild.name.clone(),
        member_count: guild.member_count,
        members: guild
            .members
            .values()
            .map(|m| MemberSummary {
                id: m.user.id.get(),
                tag: m.user.tag(),
                bot: m.user.bot,
            })
            .collect(),
        owner_id: guild.owner_id.get(),
        icon_url: guild.icon_url(),
        channel_count: guild.channels.len(),
        role_ids: guild.roles.keys().map(|id| id.get()).collect(),
        created_at: to_utc(guild.id.created_at()),
    }
}

/// Builds the template context for `user`.
///
/// The user facet always comes from `user`. Member details come from `member`,
/// falling back to the cache, and guild details from the cached guild. Parts
/// that are unavailable are left empty.
#[must_use]
pub fn template_context(
    cache: &serenity::Cache,
    guild_id: Option<serenity::GuildId>,
    user: &serenity::User,
    member: Option<&serenity::Member>,
) -> TemplateContext {
    let (guild, member) = match guild_id {
        Some(guild_id) => cache
            .guild(guild_id)
            .map(|guild| {
                let member = member
                    .or_else(|| guild.members.get(&user.id))
                    .map(|m| member_facet(Some(&*guild), m));
                (guild_facet(&guild), member)
            })
            .unwrap_or_else(|| {
                let guild = GuildFacet {
                    id: guild_id.get(),
                    ..GuildFacet::default()
                };
                (guild, member.map(|m| member_facet(None, m)))
            }),
        None => (GuildFacet::default(), member.map(|m| member_facet(None, m))),
    };

    TemplateContext {
        user: user_facet(user),
        member: member.unwrap_or_default(),
        guild,
    }
}

/// Template context for the invoking user, fetching their member when it is not cached.
pub async fn author_context(ctx: poise::Context<'_, BotData, Error>) -> TemplateContext {
    let member = ctx.author_member().await;
    template_context(ctx.cache(), ctx.guild_id(), ctx.author(), member.as_deref())
}

/// Reads an embed received from Discord.
#[must_use]
pub fn embed_spec_from(embed: &serenity::Embed) -> EmbedSpec {
    EmbedSpec {
        description: embed.description.clone().unwrap_or_default(),
        title: embed.title.clone(),
        footer: embed.footer.as_ref().map(|f| f.text.clone()),
        footer_icon: embed.footer.as_ref().and_then(|f| f.icon_url.clone()),
        author: embed.author.as_ref().map(|a| a.name.clone()),
        author_icon: embed.author.as_ref().and_then(|a| a.icon_url.clone()),
        thumbnail: embed.thumbnail.as_ref().map(|t| t.url.clone()),
        image: embed.image.as_ref().map(|i| i.url.clone()),
        color: embed.colour.map(|c| c.0),
    }
}

/// Builds an embed to send.
#[must_use]
pub fn create_embed(spec: &EmbedSpec) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new();
    if !spec.description.is_empty() {
        embed = embed.description(&spec.description);
    }
    if let Some(title) = &spec.title {
        embed = embed.title(title);
    }
    if spec.footer.is_some() || spec.footer_icon.is_some() {
        let mut footer = serenity::CreateEmbedFooter::new(spec.footer.as_deref().unwrap_or(""));
        if let Some(icon) = &spec.footer_icon {
            footer = footer.icon_url(icon);
        }
        embed = embed.footer(footer);
    }
    if spec.author.is_some() || spec.author_icon.is_some() {
        let mut author = serenity::CreateEmbedAuthor::new(spec.author.as_deref().unwrap_or(""));
        if let Some(icon) = &spec.author_icon {
            author = author.icon_url(icon);
        }
        embed = embed.author(author);
    }
    if let Some(url) = &spec.thumbnail {
        embed = embed.thumbnail(url);
    }
    if let Some(url) = &spec.image {
        embed = embed.image(url);
    }
    if let Some(color) = spec.color {
        embed = embed.color(color);
    }
    embed
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::template;
    use serde_json::json;

    #[test]
    fn test_highest_colored_role_wins() {
        let roles = [(1, 0x00FF_0000), (5, 0), (3, 0x0000_FF00)];
        assert_eq!(highest_colored(roles.into_iter()), Some(0x0000_FF00));
        assert_eq!(highest_colored([(2, 0)].into_iter()), None);
    }

    fn luna() -> serenity::User {
        serde_json::from_value(json!({
            "id": "42",
            "username": "luna",
            "global_name": null,
            "avatar": null
        }))
        .unwrap()
    }

    #[test]
    fn test_context_without_cached_guild_keeps_user() {
        let cache = serenity::Cache::new();
        let ctx = template_context(&cache, Some(serenity::GuildId::new(5)), &luna(), None);

        assert_eq!(ctx.user.id, 42);
        assert_eq!(ctx.user.tag, "luna");
        assert_eq!(ctx.guild.id, 5);
        assert_eq!(ctx.member, MemberFacet::default());

        let rendered = template::render("Hi {user} in {server_id}", &ctx);
        assert_eq!(rendered.plain_text, "Hi <@42> in 5");
    }

    #[test]
    fn test_roles_resolve_without_member_details() {
        let ctx = TemplateContext {
            user: user_facet(&luna()),
            guild: GuildFacet {
                id: 5,
                role_ids: vec![111, 222],
                ..GuildFacet::default()
            },
            ..TemplateContext::default()
        };

        let rendered = template::render("{addrole:111} {removerole:<@&222>} Welcome {user}", &ctx);
        assert_eq!(rendered.plain_text, "Welcome <@42>");
        assert_eq!(rendered.roles_to_add, vec![111]);
        assert_eq!(rendered.roles_to_remove, vec![222]);
    }

    #[test]
    fn test_embed_spec_from_received_embed() {
        let embed: serenity::Embed = serde_json::from_value(json!({
            "title": "Rules",
            "description": "Be nice",
            "color": 0x7289da,
            "footer": { "text": "mods", "icon_url": "https://cdn.example/f.png" },
            "image": { "url": "https://cdn.example/i.png" }
        }))
        .unwrap();

        let spec = embed_spec_from(&embed);
        assert_eq!(spec.title.as_deref(), Some("Rules"));
        assert_eq!(spec.description, "Be nice");
        assert_eq!(spec.color, Some(0x7289da));
        assert_eq!(spec.footer.as_deref(), Some("mods"));
        assert_eq!(spec.footer_icon.as_deref(), Some("https://cdn.example/f.png"));
        assert_eq!(spec.image.as_deref(), Some("https://cdn.example/i.png"));
        assert_eq!(spec.author, None);
        assert_eq!(spec.thumbnail, None);
    }

    #[test]
    fn test_create_embed_sets_only_present_fields() {
        let spec = EmbedSpec {
            title: Some("Hello".to_string()),
            footer_icon: Some("https://cdn.example/f.png".to_string()),
            ..EmbedSpec::with_description("body")
        };
        let value = serde_json::to_value(create_embed(&spec)).unwrap();

        assert_eq!(value["title"], "Hello");
        assert_eq!(value["description"], "body");
        assert_eq!(value["footer"]["text"], "");
        assert_eq!(value["footer"]["icon_url"], "https://cdn.example/f.png");
        assert!(value.get("author").is_none_or(serde_json::Value::is_null));
        assert!(value.get("image").is_none_or(serde_json::Value::is_null));
    }
}
