mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::nav_row},
        core::help::{generate_pages, wrap_page},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::time::Duration;

    const PAGE_TIMEOUT: Duration = Duration::from_secs(120);

    fn page(pages: &[String], index: usize) -> serenity::CreateEmbed {
        serenity::CreateEmbed::default()
            .title(format!("Help Page {}/{}", index + 1, pages.len()))
            .description(pages.get(index).map_or("", String::as_str))
            .color(0x002E_CC71)
    }

    /// Shows this message
    #[poise::command(prefix_command, category = "help")]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let pages = generate_pages(&ctx.data().process.modules.help.get().categories);
        if pages.is_empty() {
            ctx.say("No help available.").await?;
            return Ok(());
        }

        let ctx_id = ctx.id();
        let prev_id = format!("{ctx_id}prev");
        let next_id = format!("{ctx_id}next");
        ctx.send(
            poise::CreateReply::default()
                .embed(page(&pages, 0))
                .components(vec![nav_row(&prev_id, None, &next_id)]),
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

            let delta = if press.data.custom_id == prev_id { -1 } else { 1 };
            index = wrap_page(index, delta, pages.len());
            press
                .create_response(
                    ctx.serenity_context(),
                    serenity::CreateInteractionResponse::UpdateMessage(
                        serenity::CreateInteractionResponseMessage::new()
                            .embed(page(&pages, index)),
                    ),
                )
                .await?;
        }
        Ok(())
    }
}

pub use inner::*;
