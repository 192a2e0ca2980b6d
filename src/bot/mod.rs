//! Bot layer - poise framework wiring, shared data and event routing.
//!
//! [`run_bot`] builds the command registry from the poise command list,
//! starts the console bridge next to the serenity client and blocks until the
//! client stops.

/// Commands, one module per handler module (`action`, `embed`, ...)
pub mod commands;
/// Gateway event handler
pub mod events;
/// Component and modal interaction handlers
pub mod handlers;
/// Conversions between serenity models and the framework-agnostic core types
pub mod render;

use crate::config::{AppConfig, Modules};
use crate::console::{self, ConsoleOutput, ProcessContext, StdoutConsole};
use crate::core::counter::MessageCounter;
use crate::core::gif::TenorClient;
use crate::core::registry::CommandRegistry;
use crate::core::store::JsonStore;
use crate::errors::{Error, Result};
use crate::platform::serenity::{SerenityPlatform, publish};
use crate::platform::{Platform, SystemProcess};
use poise::serenity_prelude as serenity;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, error, info, instrument};

/// File holding the user → custom role mapping.
pub const CUSTOM_ROLES_FILE: &str = "custom_roles.json";
/// File holding persisted response buttons.
pub const BUTTONS_FILE: &str = "buttons.json";
/// File holding all-time message counts.
pub const MESSAGE_COUNTS_FILE: &str = "message_counts.json";
/// File holding accounts flagged by the anti-raid check.
pub const ALTS_LOG_FILE: &str = "alts_log.json";

/// Poise context used by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

/// Shared data available to all commands and event handlers.
#[derive(Debug)]
pub struct BotData {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// State shared with the operator console
    pub process: Arc<ProcessContext>,
    /// Tenor search client
    pub tenor: TenorClient,
    /// Message counts and counting sessions
    pub counter: MessageCounter,
    /// Response button definitions, keyed by custom id
    pub buttons: JsonStore,
    /// Custom booster role per user
    pub custom_roles: JsonStore,
    /// Accounts flagged on join
    pub alts_log: JsonStore,
    action_stats: Mutex<HashMap<(String, u64), u64>>,
    /// When the bot started
    pub started_at: Instant,
}

impl BotData {
    /// Opens every data file under the configured data directory.
    pub fn new(config: Arc<AppConfig>, process: Arc<ProcessContext>) -> Result<Self> {
        Ok(Self {
            tenor: TenorClient::new(config.tenor_api_key.clone()),
            counter: MessageCounter::new(JsonStore::open(config.data_file(MESSAGE_COUNTS_FILE))?),
            buttons: JsonStore::open(config.data_file(BUTTONS_FILE))?,
            custom_roles: JsonStore::open(config.data_file(CUSTOM_ROLES_FILE))?,
            alts_log: JsonStore::open(config.data_file(ALTS_LOG_FILE))?,
            action_stats: Mutex::new(HashMap::new()),
            started_at: Instant::now(),
            config,
            process,
        })
    }

    /// Counts one use of `action` by `user_id` and returns the user's total for it.
    ///
    /// Counts live in memory only and reset on restart.
    pub fn record_action(&self, action: &str, user_id: u64) -> u64 {
        let mut stats = self
            .action_stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let total = stats.entry((action.to_string(), user_id)).or_insert(0);
        *total += 1;
        *total
    }
}

/// Refuses commands that were removed from the registry at runtime.
///
/// Prefix invocations consult the text set, interactions the structured set;
/// subcommands follow their root command.
async fn command_enabled(ctx: Context<'_>) -> Result<bool> {
    let root = ctx
        .command()
        .qualified_name
        .split_whitespace()
        .next()
        .unwrap_or_default();
    let registry = ctx.data().process.registry();
    Ok(match ctx {
        poise::Context::Prefix(_) => registry.is_text_enabled(root),
        poise::Context::Application(_) => registry.is_structured_enabled(root),
    })
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(format!("Error: {error}")).await {
                error!("Failed to send error message: {e}");
            }
        }
        poise::FrameworkError::CommandCheckFailed {
            error: None, ctx, ..
        } => {
            debug!("Ignoring disabled command `{}`", ctx.command().qualified_name);
        }
        poise::FrameworkError::MissingUserPermissions {
            missing_permissions: Some(missing),
            ctx,
            ..
        } => {
            let reply = poise::CreateReply::default()
                .content(format!("You need {missing} permission to use this command."))
                .ephemeral(true);
            if let Err(e) = ctx.send(reply).await {
                error!("Failed to send permission error: {e}");
            }
        }
        poise::FrameworkError::NotAnOwner { ctx, .. } => {
            if let Err(e) = ctx.say("You are not authorized to use this command.").await {
                error!("Failed to send owner error: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Runs the bot and the operator console until the client stops.
#[instrument(skip_all)]
pub async fn run_bot(token: String, config: AppConfig) -> Result<()> {
    let config = Arc::new(config);
    let modules = Arc::new(Modules::load(&config.cogs_dir));
    let registry = CommandRegistry::from_catalog(commands::catalog(
        &commands::all(),
        config.dev_guild_id.is_none(),
    ));
    let console_output: Arc<dyn ConsoleOutput> =
        Arc::new(StdoutConsole::new(config.bot_name.clone()));
    let process = Arc::new(ProcessContext::new(
        registry,
        modules,
        console_output,
        config.antiraid.enabled,
    ));
    let data = BotData::new(Arc::clone(&config), Arc::clone(&process))?;

    let dev_guild = config.dev_guild_id.map(serenity::GuildId::new);
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.prefix.clone()),
                mention_as_prefix: false,
                ..Default::default()
            },
            owners: config
                .owners
                .iter()
                .copied()
                .map(serenity::UserId::new)
                .collect(),
            command_check: Some(|ctx| Box::pin(command_enabled(ctx))),
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(events::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                data.process.console.set_prefix(&ready.user.name);
                let names = data.process.registry().structured_names();
                publish(&ctx.http, dev_guild, &framework.options().commands, &names).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e:?}"))?;

    let platform: Arc<dyn Platform> = Arc::new(SerenityPlatform::new(
        Arc::clone(&client.http),
        Arc::clone(&client.cache),
        Arc::clone(&client.shard_manager),
        commands::all,
        config.dev_guild_id,
    ));
    let (queue, actions) = console::action_queue();
    tokio::spawn(console::run_dispatcher(
        actions,
        Arc::clone(&process),
        platform,
        Arc::new(SystemProcess),
    ));
    console::spawn_worker(Arc::clone(&process), queue)?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e:?}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::test_context;

    fn data_in(dir: &std::path::Path) -> BotData {
        let config = AppConfig {
            data_dir: dir.to_path_buf(),
            ..AppConfig::default()
        };
        let (process, _console) = test_context();
        BotData::new(Arc::new(config), process).unwrap()
    }

    #[test]
    fn test_action_stats_are_per_action_and_user() {
        let dir = tempfile::tempdir().unwrap();
        let data = data_in(dir.path());

        assert_eq!(data.record_action("hug", 1), 1);
        assert_eq!(data.record_action("hug", 1), 2);
        assert_eq!(data.record_action("hug", 2), 1);
        assert_eq!(data.record_action("pat", 1), 1);
    }

    #[test]
    fn test_data_files_live_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data = data_in(dir.path());

        assert_eq!(data.buttons.path(), dir.path().join(BUTTONS_FILE));
        assert_eq!(data.custom_roles.path(), dir.path().join(CUSTOM_ROLES_FILE));
        assert_eq!(data.alts_log.path(), dir.path().join(ALTS_LOG_FILE));
    }
}
