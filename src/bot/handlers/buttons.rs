//! Presses of response buttons created with `/button`.

use crate::{
    bot::{BotData, render},
    core::template::{self, Rendered},
    errors::Result,
};
use poise::serenity_prelude as serenity;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Custom id prefix of every response button.
pub const BUTTON_PREFIX: &str = "button:";

/// What a response button does when pressed. Stored under the button's custom id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonDefinition {
    /// Response template
    pub response: String,
    /// Only the presser sees the response
    #[serde(default)]
    pub ephemeral: bool,
}

/// Custom id for a button created by the invocation `id`.
#[must_use]
pub fn custom_id_for(id: u64) -> String {
    format!("{BUTTON_PREFIX}{id}")
}

/// The reply for a rendered response; `None` when there is nothing to send.
fn response_message(
    rendered: &Rendered,
    ephemeral: bool,
) -> Option<serenity::CreateInteractionResponseMessage> {
    let message = serenity::CreateInteractionResponseMessage::new().ephemeral(ephemeral);
    match &rendered.embed {
        Some(spec) => Some(message.embed(render::create_embed(spec))),
        None if rendered.plain_text.is_empty() => None,
        None => Some(message.content(&rendered.plain_text)),
    }
}

/// Renders the button's template for the presser, replies and applies role directives.
pub async fn handle_press(
    ctx: &serenity::Context,
    press: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    let Some(definition) = data
        .buttons
        .get_as::<ButtonDefinition>(&press.data.custom_id)
    else {
        warn!(custom_id = %press.data.custom_id, "Press on unknown response button");
        press
            .create_response(
                ctx,
                serenity::CreateInteractionResponse::Message(
                    serenity::CreateInteractionResponseMessage::new()
                        .content("This button is no longer active.")
                        .ephemeral(true),
                ),
            )
            .await?;
        return Ok(());
    };

    let template_ctx = render::template_context(
        &ctx.cache,
        press.guild_id,
        &press.user,
        press.member.as_ref(),
    );
    let rendered = template::render(&definition.response, &template_ctx);

    let response = response_message(&rendered, definition.ephemeral).map_or(
        serenity::CreateInteractionResponse::Acknowledge,
        serenity::CreateInteractionResponse::Message,
    );
    press.create_response(ctx, response).await?;

    let Some(guild_id) = press.guild_id else {
        return Ok(());
    };
    for role_id in &rendered.roles_to_add {
        let role = serenity::RoleId::new(*role_id);
        match ctx
            .http
            .add_member_role(guild_id, press.user.id, role, Some("Response button"))
            .await
        {
            Ok(()) => info!(user = %press.user.id, role = %role, "Granted role from button"),
            Err(e) => warn!("Failed to grant role {role} to {}: {e}", press.user.id),
        }
    }
    for role_id in &rendered.roles_to_remove {
        let role = serenity::RoleId::new(*role_id);
        match ctx
            .http
            .remove_member_role(guild_id, press.user.id, role, Some("Response button"))
            .await
        {
            Ok(()) => info!(user = %press.user.id, role = %role, "Revoked role from button"),
            Err(e) => warn!("Failed to revoke role {role} from {}: {e}", press.user.id),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::embed::EmbedSpec;
    use crate::core::store::JsonStore;

    #[test]
    fn test_definitions_survive_reopening_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buttons.json");
        let id = custom_id_for(42);
        let definition = ButtonDefinition {
            response: "{embed} Welcome {user}! {addrole:<@&7>}".to_string(),
            ephemeral: true,
        };

        JsonStore::open(&path).unwrap().put(&id, &definition).unwrap();
        let reopened = JsonStore::open(&path).unwrap();

        assert_eq!(id, "button:42");
        assert_eq!(reopened.get_as::<ButtonDefinition>(&id), Some(definition));
    }

    #[test]
    fn test_missing_ephemeral_defaults_to_public() {
        let definition: ButtonDefinition =
            serde_json::from_str(r#"{"response": "hi"}"#).unwrap();
        assert!(!definition.ephemeral);
    }

    #[test]
    fn test_empty_render_sends_nothing() {
        assert!(response_message(&Rendered::default(), false).is_none());

        let text = Rendered {
            plain_text: "hello".to_string(),
            ..Rendered::default()
        };
        assert!(response_message(&text, false).is_some());

        let embed = Rendered {
            embed: Some(EmbedSpec::with_description("")),
            ..Rendered::default()
        };
        assert!(response_message(&embed, true).is_some());
    }
}
