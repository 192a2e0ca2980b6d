//! Discord interaction handlers
//!
//! Component and modal interactions that outlive a single command invocation
//! land here: persisted response buttons and the booster perks menu. Paging
//! buttons of running commands are consumed by their collectors instead.

/// Booster perks menu, colour select and custom-role modal
pub mod booster;
/// Persisted response buttons
pub mod buttons;

use crate::{bot::BotData, errors::Result};
use poise::serenity_prelude as serenity;
use tracing::debug;

/// Which handler a component custom id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentRoute {
    /// A `/button` response button
    ResponseButton,
    /// The booster perks select menu
    BoosterMenu,
    /// The booster colour select
    BoosterColor,
    /// "Edit Your Custom Role"
    BoosterEdit,
    /// Owned by a command's collector, or unknown
    Unhandled,
}

/// Routes a component interaction by its custom id.
#[must_use]
pub fn route_component(custom_id: &str) -> ComponentRoute {
    if custom_id.starts_with(buttons::BUTTON_PREFIX) {
        return ComponentRoute::ResponseButton;
    }
    match custom_id {
        booster::MENU_ID => ComponentRoute::BoosterMenu,
        booster::COLOR_ID => ComponentRoute::BoosterColor,
        booster::EDIT_ID => ComponentRoute::BoosterEdit,
        _ => ComponentRoute::Unhandled,
    }
}

/// Dispatches an interaction to its handler. Command interactions are left to poise.
pub async fn handle_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::Interaction,
    data: &BotData,
) -> Result<()> {
    match interaction {
        serenity::Interaction::Component(component) => {
            match route_component(&component.data.custom_id) {
                ComponentRoute::ResponseButton => {
                    buttons::handle_press(ctx, component, data).await
                }
                ComponentRoute::BoosterMenu => booster::handle_menu(ctx, component, data).await,
                ComponentRoute::BoosterColor => booster::handle_color(ctx, component, data).await,
                ComponentRoute::BoosterEdit => booster::show_modal(ctx, component).await,
                ComponentRoute::Unhandled => {
                    debug!(custom_id = %component.data.custom_id, "Component left to collectors");
                    Ok(())
                }
            }
        }
        serenity::Interaction::Modal(modal) if modal.data.custom_id == booster::MODAL_ID => {
            booster::handle_modal(ctx, modal, data).await
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_component() {
        assert_eq!(route_component("button:12345"), ComponentRoute::ResponseButton);
        assert_eq!(route_component("booster:menu"), ComponentRoute::BoosterMenu);
        assert_eq!(route_component("booster:color"), ComponentRoute::BoosterColor);
        assert_eq!(route_component("booster:edit"), ComponentRoute::BoosterEdit);
    }

    #[test]
    fn test_collector_ids_are_not_routed() {
        assert_eq!(route_component("987654321prev"), ComponentRoute::Unhandled);
        assert_eq!(route_component("987654321respond"), ComponentRoute::Unhandled);
        assert_eq!(route_component("booster:role"), ComponentRoute::Unhandled);
    }
}
