//! Tenor GIF search with ◀ 🔗 ▶ paging.

/// Shown when Tenor returns nothing or no API key is configured.
pub const SEARCH_FALLBACK_GIFS: [&str; 3] = [
    "https://media.tenor.com/Ph0k0J7-3XAAAAAC/hug-anime.gif",
    "https://media.tenor.com/2roX3uxz_4sAAAAC/anime-hug.gif",
    "https://media.tenor.com/NEvZhkGQlq8AAAAC/hug.gif",
];

/// Search results, or the curated fallbacks when there are none.
#[must_use]
pub fn results_or_fallback(urls: Vec<String>) -> Vec<String> {
    if urls.is_empty() {
        SEARCH_FALLBACK_GIFS.iter().map(|u| (*u).to_string()).collect()
    } else {
        urls
    }
}

mod inner {
    #![allow(missing_docs)]

    use super::results_or_fallback;
    use crate::{
        bot::{
            BotData,
            commands::{delete_after, nav_row},
            render,
        },
        core::help::wrap_page,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::time::Duration;

    const PAGE_TIMEOUT: Duration = Duration::from_secs(60);
    const PAGE_COLOR: u32 = 0x002E_CC71;
    const BLUE: u32 = 0x0034_98DB;
    const BLURPLE: u32 = 0x0058_65F2;

    fn page(urls: &[String], index: usize, color: u32, footer: bool) -> serenity::CreateEmbed {
        let mut embed = serenity::CreateEmbed::default()
            .title(format!("GIF Result {}/{}", index + 1, urls.len()))
            .color(color);
        if let Some(url) = urls.get(index) {
            embed = embed.image(url);
        }
        if footer {
            embed = embed.footer(serenity::CreateEmbedFooter::new("Powered by Tenor"));
        }
        embed
    }

    /// Search GIFs from Tenor
    #[poise::command(prefix_command, slash_command, category = "gif")]
    pub async fn gif(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Search GIF"]
        #[rest]
        query: Option<String>,
    ) -> Result<()> {
        let Some(query) = query.filter(|q| !q.trim().is_empty()) else {
            let handle = ctx.reply("Please provide something to search").await?;
            let message = handle.into_message().await?;
            delete_after(
                ctx.serenity_context().http.clone(),
                message,
                Duration::from_secs(3),
            );
            return Ok(());
        };

        let limit = ctx.data().process.modules.gif.get().result_limit;
        let urls = results_or_fallback(ctx.data().tenor.search(&query, limit).await);

        let color = match ctx {
            poise::Context::Prefix(_) => ctx
                .guild()
                .and_then(|guild| {
                    let member = guild.members.get(&ctx.author().id)?;
                    render::top_role(&guild, member).map(|role| role.colour.0)
                })
                .filter(|color| *color != 0)
                .unwrap_or(BLUE),
            poise::Context::Application(_) => BLURPLE,
        };

        let ctx_id = ctx.id();
        let prev_id = format!("{ctx_id}prev");
        let link_id = format!("{ctx_id}link");
        let next_id = format!("{ctx_id}next");
        ctx.send(
            poise::CreateReply::default()
                .embed(page(&urls, 0, color, false))
                .components(vec![nav_row(&prev_id, Some(&link_id), &next_id)])
                .reply(true),
        )
        .await?;

        let mut index = 0;
        loop {
            let prefix = ctx_id.to_string();
            let Some(press) = serenity::ComponentInteractionCollector::new(ctx)
                .filter(move |press| press.data.custom_id.starts_with(&prefix))
                .timeout(PAGE_TIMEOUT)
                .await
            else {
                break;
            };

            let response = if press.data.custom_id == link_id {
                let content = urls.get(index).map_or_else(
                    || "No URL available for this result.".to_string(),
                    |url| format!("GIF URL: {url}"),
                );
                serenity::CreateInteractionResponse::Message(
                    serenity::CreateInteractionResponseMessage::new()
                        .content(content)
                        .ephemeral(true),
                )
            } else {
                let delta = if press.data.custom_id == prev_id { -1 } else { 1 };
                index = wrap_page(index, delta, urls.len());
                serenity::CreateInteractionResponse::UpdateMessage(
                    serenity::CreateInteractionResponseMessage::new()
                        .embed(page(&urls, index, PAGE_COLOR, true)),
                )
            };
            press
                .create_response(ctx.serenity_context(), response)
                .await?;
        }
        Ok(())
    }
}

pub use inner::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_search_uses_fallbacks() {
        let urls = results_or_fallback(Vec::new());
        assert_eq!(urls.len(), SEARCH_FALLBACK_GIFS.len());
        assert!(urls[0].ends_with("hug-anime.gif"));
    }

    #[test]
    fn test_results_are_kept() {
        let found = vec!["https://media.tenor.com/a.gif".to_string()];
        assert_eq!(results_or_fallback(found.clone()), found);
    }
}
