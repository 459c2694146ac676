//! Shared application state and per-invocation context.

use crate::definition::CommandDefinition;
use crate::permissions::PermissionGate;
use crate::platform::{ChatPlatform, Origin, PlatformUser};
use crate::reactions::{ReactionContext, ReactionScheduler};
use crate::settings::SettingsCache;
use crate::store::Store;
use crate::tree::{CommandNode, CommandRegistry, NodeId};
use once_cell::sync::OnceCell;
use statpixel_common::{GuildId, Result, UserId};
use statpixel_config::{Config, GuildSettings};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// State shared by every event handler and command.
pub struct Data {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Command tree.
    pub registry: CommandRegistry,
    /// Guild settings cache.
    pub settings: SettingsCache,
    /// Permission gate.
    pub permissions: PermissionGate,
    /// Persistent store.
    pub store: Arc<dyn Store>,
    /// Chat platform.
    pub platform: Arc<dyn ChatPlatform>,
    /// Reaction scheduler.
    pub reactions: ReactionScheduler,
    bot_id: OnceCell<UserId>,
}

impl Data {
    /// Build the command tree from `definitions`, restore the persisted
    /// disabled list and wire up the shared services.
    pub async fn new(
        config: Config,
        store: Arc<dyn Store>,
        platform: Arc<dyn ChatPlatform>,
        definitions: Vec<CommandDefinition>,
    ) -> Result<Arc<Self>> {
        let (registry, router) = CommandRegistry::build(definitions);

        let disabled = store.disabled_commands().await?;
        registry.apply_disabled(&disabled);
        info!(disabled = disabled.len(), "Restored disabled commands");

        let settings = SettingsCache::new(
            Arc::clone(&store),
            config.commands.default_settings.clone(),
            Duration::from_secs(config.commands.settings_ttl_seconds),
        );
        let permissions = PermissionGate::new(&config, Arc::clone(&store));
        let reactions = ReactionScheduler::new(
            ReactionContext {
                platform: Arc::clone(&platform),
                store: Arc::clone(&store),
            },
            router,
            Duration::from_secs(config.reactions.sweep_interval_seconds),
        );

        Ok(Arc::new(Self {
            config: Arc::new(config),
            registry,
            settings,
            permissions,
            store,
            platform,
            reactions,
            bot_id: OnceCell::new(),
        }))
    }

    /// Record the bot's own user id once the gateway reports it.
    pub fn set_bot_id(&self, id: UserId) {
        if self.bot_id.set(id).is_err() {
            tracing::debug!("Bot id already set");
        }
    }

    /// The bot's own user id, once known.
    #[must_use]
    pub fn bot_id(&self) -> Option<UserId> {
        self.bot_id.get().copied()
    }
}

/// The guild an invocation happened in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildContext {
    /// Guild id.
    pub id: GuildId,
    /// Owner of the guild.
    pub owner_id: UserId,
    /// Guild name, when known.
    pub name: Option<String>,
}

/// Everything a coercer or command body knows about the running invocation.
pub struct Invocation {
    /// Shared state.
    pub data: Arc<Data>,
    /// Where the invocation came from.
    pub origin: Origin,
    /// Invoking user.
    pub author: PlatformUser,
    /// Guild, if not in a direct message.
    pub guild: Option<GuildContext>,
    /// Effective settings.
    pub settings: GuildSettings,
    /// The resolved command.
    pub node: NodeId,
}

impl Invocation {
    /// The resolved command.
    #[must_use]
    pub fn command(&self) -> &CommandNode {
        self.data.registry.node(self.node)
    }

    /// Prefix in effect.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.settings.prefix
    }

    /// Guild id, if any.
    #[must_use]
    pub fn guild_id(&self) -> Option<GuildId> {
        self.guild.as_ref().map(|g| g.id)
    }
}
