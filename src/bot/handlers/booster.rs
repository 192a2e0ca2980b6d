//! Booster perks: the persistent menu, exclusive colour roles and custom roles.
//!
//! The menu is re-posted on every ready. Custom roles are remembered per user
//! in the `custom_roles` store so a second visit edits the same role.

use crate::{
    bot::BotData,
    core::embed::parse_role_color,
    errors::Result,
};
use poise::serenity_prelude as serenity;
use tracing::{debug, error, info, warn};

/// Custom id of the perks select menu.
pub const MENU_ID: &str = "booster:menu";
/// Custom id of the colour select.
pub const COLOR_ID: &str = "booster:color";
/// Custom id of the "Edit Your Custom Role" button.
pub const EDIT_ID: &str = "booster:edit";
/// Custom id of the custom-role modal.
pub const MODAL_ID: &str = "booster:role";
const NAME_INPUT: &str = "booster:role:name";
const COLOR_INPUT: &str = "booster:role:color";

/// Title identifying the menu message.
pub const PERKS_TITLE: &str = "Booster Perks";
const PURPLE: u32 = 0x009B_59B6;
/// How many recent messages are searched for an old menu.
const HISTORY_LIMIT: u8 = 20;

const CUSTOM_ROLE_NOTE: &str = "ℹ️ **Note:** If you want a custom icon or gradient for your role, \
     please make a ticket and ask staff to add it for you.";

/// The stored custom role, if the member still has it.
#[must_use]
pub fn held_custom_role(
    stored: Option<u64>,
    member_roles: &[serenity::RoleId],
) -> Option<serenity::RoleId> {
    stored
        .filter(|id| *id != 0)
        .map(serenity::RoleId::new)
        .filter(|role| member_roles.contains(role))
}

/// Colour roles the member holds other than `selected`.
#[must_use]
pub fn roles_to_clear(
    member_roles: &[serenity::RoleId],
    selected: serenity::RoleId,
    is_color_role: impl Fn(u64) -> bool,
) -> Vec<serenity::RoleId> {
    member_roles
        .iter()
        .copied()
        .filter(|role| *role != selected && is_color_role(role.get()))
        .collect()
}

fn selected_value(interaction: &serenity::ComponentInteraction) -> Option<&str> {
    match &interaction.data.kind {
        serenity::ComponentInteractionDataKind::StringSelect { values } => {
            values.first().map(String::as_str)
        }
        _ => None,
    }
}

fn stored_role(data: &BotData, user_id: serenity::UserId) -> Option<u64> {
    data.custom_roles.get_as::<u64>(&user_id.to_string())
}

fn member_roles(interaction_member: Option<&serenity::Member>) -> &[serenity::RoleId] {
    interaction_member.map_or(&[], |member| member.roles.as_slice())
}

async fn reply_ephemeral(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    text: impl Into<String>,
) -> Result<()> {
    interaction
        .create_response(
            ctx,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(text)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

/// Deletes the bot's previous perks menu and posts a fresh one.
///
/// Does nothing when no channel is configured.
pub async fn post_menu(ctx: &serenity::Context, data: &BotData) -> Result<()> {
    let settings = data.process.modules.booster.get();
    let Some(channel_id) = settings.channel_id.filter(|id| *id != 0) else {
        debug!("No booster channel configured, skipping perks menu");
        return Ok(());
    };
    let missing_guild = settings
        .guild_id
        .filter(|id| *id != 0)
        .filter(|id| ctx.cache.guild(serenity::GuildId::new(*id)).is_none());
    if let Some(guild_id) = missing_guild {
        warn!("Guild with ID {guild_id} not found");
        return Ok(());
    }

    let channel = serenity::ChannelId::new(channel_id);
    let bot_id = ctx.cache.current_user().id;
    let history = channel
        .messages(&ctx.http, serenity::GetMessages::new().limit(HISTORY_LIMIT))
        .await?;
    for message in history.iter().filter(|m| {
        m.author.id == bot_id
            && m.embeds
                .first()
                .and_then(|e| e.title.as_deref())
                .is_some_and(|title| title == PERKS_TITLE)
    }) {
        match message.delete(&ctx.http).await {
            Ok(()) => info!("Deleted previous booster perks embed in {channel}"),
            Err(e) => error!("Failed to delete previous booster perks embed: {e}"),
        }
    }

    let embed = serenity::CreateEmbed::default()
        .title(PERKS_TITLE)
        .description("Choose one of the options below to customize your perks!")
        .color(PURPLE);
    let menu = serenity::CreateSelectMenu::new(
        MENU_ID,
        serenity::CreateSelectMenuKind::String {
            options: vec![
                serenity::CreateSelectMenuOption::new("Booster Color", "booster")
                    .description("Choose a custom booster color"),
                serenity::CreateSelectMenuOption::new("Custom Role", "custom")
                    .description("Create or view your custom role"),
            ],
        },
    )
    .placeholder("Select an option...");
    channel
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new()
                .embed(embed)
                .components(vec![serenity::CreateActionRow::SelectMenu(menu)]),
        )
        .await?;
    info!("Sent booster role menu in {channel}");
    Ok(())
}

/// Answers a choice in the perks menu.
pub async fn handle_menu(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    match selected_value(interaction) {
        Some("booster") => {
            let settings = data.process.modules.booster.get();
            if settings.color_roles.is_empty() {
                return reply_ephemeral(ctx, interaction, "No booster colors are configured.").await;
            }
            let options = settings
                .color_roles
                .iter()
                .map(|role| {
                    serenity::CreateSelectMenuOption::new(&role.name, role.role_id.to_string())
                        .description("Assign booster color role")
                })
                .collect();
            let select =
                serenity::CreateSelectMenu::new(COLOR_ID, serenity::CreateSelectMenuKind::String {
                    options,
                })
                .placeholder("Choose your booster color...");
            interaction
                .create_response(
                    ctx,
                    serenity::CreateInteractionResponse::Message(
                        serenity::CreateInteractionResponseMessage::new()
                            .content("Choose your booster color:")
                            .components(vec![serenity::CreateActionRow::SelectMenu(select)])
                            .ephemeral(true),
                    ),
                )
                .await?;
        }
        Some("custom") => {
            let held = held_custom_role(
                stored_role(data, interaction.user.id),
                member_roles(interaction.member.as_ref()),
            );
            if let Some(role) = held {
                let edit = serenity::CreateButton::new(EDIT_ID)
                    .label("Edit Your Custom Role")
                    .style(serenity::ButtonStyle::Primary);
                interaction
                    .create_response(
                        ctx,
                        serenity::CreateInteractionResponse::Message(
                            serenity::CreateInteractionResponseMessage::new()
                                .content(format!("You already have a custom role: <@&{role}>"))
                                .components(vec![serenity::CreateActionRow::Buttons(vec![edit])])
                                .ephemeral(true),
                        ),
                    )
                    .await?;
            } else {
                show_modal(ctx, interaction).await?;
            }
        }
        other => debug!("Unknown booster menu value {other:?}"),
    }
    Ok(())
}

/// Sets the chosen booster colour, clearing the other colour roles first.
pub async fn handle_color(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    let settings = data.process.modules.booster.get();
    let (Some(guild_id), Some(member)) = (interaction.guild_id, interaction.member.as_ref()) else {
        return Ok(());
    };
    let Some(selected) = selected_value(interaction)
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|id| *id != 0 && settings.is_color_role(*id))
        .map(serenity::RoleId::new)
    else {
        return reply_ephemeral(ctx, interaction, "❌ Selected role not found or already assigned.")
            .await;
    };

    for role in roles_to_clear(&member.roles, selected, |id| settings.is_color_role(id)) {
        if let Err(e) = ctx
            .http
            .remove_member_role(guild_id, member.user.id, role, Some("Changing booster color"))
            .await
        {
            error!("Error removing old booster color roles: {e}");
        }
    }

    let role_name = ctx
        .cache
        .guild(guild_id)
        .and_then(|guild| guild.roles.get(&selected).map(|role| role.name.clone()));
    let Some(role_name) = role_name.filter(|_| !member.roles.contains(&selected)) else {
        return reply_ephemeral(ctx, interaction, "❌ Selected role not found or already assigned.")
            .await;
    };
    match ctx
        .http
        .add_member_role(guild_id, member.user.id, selected, Some("Booster color"))
        .await
    {
        Ok(()) => {
            info!(
                "Set booster color for {} ({}) to {role_name} in guild {guild_id}",
                member.user.tag(),
                member.user.id
            );
            reply_ephemeral(
                ctx,
                interaction,
                format!("✅ Your booster color role has been set to {role_name}"),
            )
            .await
        }
        Err(e) => {
            error!("Error assigning booster role: {e}");
            reply_ephemeral(ctx, interaction, "Failed to assign the booster color role.").await
        }
    }
}

/// Opens the custom-role modal.
pub async fn show_modal(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
) -> Result<()> {
    let modal = serenity::CreateModal::new(MODAL_ID, "Create / Update Custom Role").components(vec![
        serenity::CreateActionRow::InputText(
            serenity::CreateInputText::new(
                serenity::InputTextStyle::Short,
                "Role Name (you may include emoji)",
                NAME_INPUT,
            )
            .max_length(30)
            .required(true),
        ),
        serenity::CreateActionRow::InputText(
            serenity::CreateInputText::new(
                serenity::InputTextStyle::Short,
                "Role Color (hex only, e.g. #FF5733)",
                COLOR_INPUT,
            )
            .max_length(7)
            .required(true),
        ),
    ]);
    interaction
        .create_response(ctx, serenity::CreateInteractionResponse::Modal(modal))
        .await?;
    Ok(())
}

fn input_value(rows: &[serenity::ActionRow], custom_id: &str) -> Option<String> {
    rows.iter()
        .flat_map(|row| &row.components)
        .find_map(|component| match component {
            serenity::ActionRowComponent::InputText(input) if input.custom_id == custom_id => {
                input.value.clone()
            }
            _ => None,
        })
}

/// Creates or edits the submitter's custom role.
pub async fn handle_modal(
    ctx: &serenity::Context,
    modal: &serenity::ModalInteraction,
    data: &BotData,
) -> Result<()> {
    let reply = |text: String| {
        serenity::CreateInteractionResponse::Message(
            serenity::CreateInteractionResponseMessage::new()
                .content(text)
                .ephemeral(true),
        )
    };
    let Some(guild_id) = modal.guild_id else {
        return Ok(());
    };
    let name = input_value(&modal.data.components, NAME_INPUT).unwrap_or_default();
    let color = match parse_role_color(
        &input_value(&modal.data.components, COLOR_INPUT).unwrap_or_default(),
    ) {
        Ok(color) => color,
        Err(e) => {
            modal.create_response(ctx, reply(e.to_string())).await?;
            return Ok(());
        }
    };

    let user = &modal.user;
    let reason = format!("Custom role for {}", user.tag());
    let builder = serenity::EditRole::new()
        .name(name)
        .colour(color)
        .audit_log_reason(&reason);
    let held = held_custom_role(
        stored_role(data, user.id),
        member_roles(modal.member.as_ref()),
    );

    let outcome = match held {
        Some(role) => guild_id
            .edit_role(&ctx.http, role, builder)
            .await
            .map(|role| (role.id, "updated")),
        None => match guild_id.create_role(&ctx.http, builder).await {
            Ok(role) => ctx
                .http
                .add_member_role(guild_id, user.id, role.id, Some(&reason))
                .await
                .map(|()| (role.id, "created")),
            Err(e) => Err(e),
        },
    };

    match outcome {
        Ok((role, verb)) => {
            data.custom_roles.put(&user.id.to_string(), role.get())?;
            info!("{verb} custom role for {} ({}) in guild {guild_id}", user.tag(), user.id);
            modal
                .create_response(
                    ctx,
                    reply(format!(
                        "Your custom role has been {verb}: <@&{role}>\n{CUSTOM_ROLE_NOTE}"
                    )),
                )
                .await?;
        }
        Err(e) => {
            error!("Error saving custom role for {}: {e}", user.id);
            modal
                .create_response(ctx, reply("Failed to save your custom role.".to_string()))
                .await?;
        }
    }
    Ok(())
}
