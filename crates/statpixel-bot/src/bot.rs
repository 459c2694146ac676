//! Gateway client and event handler.
//!
//! [`StatPixelBot`] owns the lifecycle; [`Handler`] translates gateway
//! events into engine calls.

use crate::convert::{create_command, emoji_ref, flatten_options, platform_user};
use crate::error::BotResult;
use crate::platform::SerenityPlatform;
use async_trait::async_trait;
use serenity::all::{
    ChannelId as DiscordChannel, Client, Command, Context, EventHandler, GatewayIntents,
    GuildChannel, GuildId as DiscordGuild, Http, Interaction, Member, Message,
    MessageId as DiscordMessage, Reaction, Ready, User,
};
use statpixel_commands::dispatch::{InteractionEvent, MessageEvent};
use statpixel_commands::reactions::ReactionInput;
use statpixel_commands::schema::slash_commands;
use statpixel_commands::{builtin, Data, Dispatcher, GuildContext, Store};
use statpixel_common::{ChannelId, GuildId, InteractionId, MessageId, UserId};
use statpixel_config::Config;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Gateway intents the handler relies on.
#[must_use]
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::DIRECT_MESSAGE_REACTIONS
        | GatewayIntents::GUILD_MEMBERS
}

/// Main bot structure.
pub struct StatPixelBot {
    config: Config,
    store: Arc<dyn Store>,
}

impl StatPixelBot {
    /// Creates a new bot instance over an opened store.
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        Self { config, store }
    }

    /// Connects to the gateway and runs until shut down by Ctrl-C.
    pub async fn start(self) -> BotResult<()> {
        let token = self.config.discord.token.clone();
        let platform = Arc::new(SerenityPlatform::new(Arc::new(Http::new(&token))));
        let data = Data::new(self.config, self.store, platform, builtin::definitions()).await?;
        info!(commands = data.registry.iter().count(), "Command tree built");

        let shutdown = CancellationToken::new();
        let handler = Handler::new(Dispatcher::new(data), shutdown.clone());

        let mut client = Client::builder(&token, intents())
            .event_handler(handler)
            .await?;

        let shard_manager = client.shard_manager.clone();
        let signal = shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        error!(error = %e, "Failed to listen for shutdown signal");
                        return;
                    }
                    info!("Shutdown requested");
                }
                () = signal.cancelled() => return,
            }
            signal.cancel();
            shard_manager.shutdown_all().await;
        });

        let result = client.start_autosharded().await;
        shutdown.cancel();
        result?;

        info!("Gateway connection closed");
        Ok(())
    }
}

/// Serenity event handler feeding the command engine.
pub struct Handler {
    dispatcher: Dispatcher,
    shutdown: CancellationToken,
    sweeping: AtomicBool,
}

impl Handler {
    /// Create a handler; `shutdown` stops the reaction sweep.
    #[must_use]
    pub const fn new(dispatcher: Dispatcher, shutdown: CancellationToken) -> Self {
        Self {
            dispatcher,
            shutdown,
            sweeping: AtomicBool::new(false),
        }
    }

    fn data(&self) -> &Arc<Data> {
        self.dispatcher.data()
    }

    /// Start the sweep loop once, on the primary shard only.
    fn start_sweep(&self, shard: u32) {
        if shard != self.data().config.discord.primary_shard {
            return;
        }
        if self.sweeping.swap(true, Ordering::SeqCst) {
            return;
        }
        let scheduler = self.data().reactions.clone();
        tokio::spawn(scheduler.run(self.shutdown.child_token()));
        info!(shard, "Reaction sweep started");
    }

    async fn guild_context(&self, ctx: &Context, id: DiscordGuild) -> Option<GuildContext> {
        let cached = ctx
            .cache
            .guild(id)
            .map(|guild| (guild.owner_id, guild.name.clone()));

        let (owner, name) = match cached {
            Some(found) => found,
            None => match id.to_partial_guild(&ctx.http).await {
                Ok(guild) => (guild.owner_id, guild.name),
                Err(e) => {
                    warn!(guild = %id, error = %e, "Could not look up guild");
                    return None;
                }
            },
        };

        Some(GuildContext {
            id: GuildId(id.get()),
            owner_id: UserId(owner.get()),
            name: Some(name),
        })
    }

    fn reaction_input(&self, reaction: &Reaction) -> Option<ReactionInput> {
        let user = UserId(reaction.user_id?.get());
        let user_is_bot = self.data().bot_id() == Some(user)
            || reaction.member.as_ref().is_some_and(|m| m.user.bot);

        Some(ReactionInput {
            channel: ChannelId(reaction.channel_id.get()),
            message: MessageId(reaction.message_id.get()),
            user,
            user_is_bot,
            in_dm: reaction.guild_id.is_none(),
            emoji: emoji_ref(&reaction.emoji),
        })
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, shard = ctx.shard_id.0, "Connected to Discord");
        self.data().set_bot_id(UserId(ready.user.id.get()));

        if ctx.shard_id.0 == self.data().config.discord.primary_shard {
            let commands: Vec<_> =
                slash_commands(&self.data().registry, &self.data().config.commands)
                    .iter()
                    .map(create_command)
                    .collect();
            let count = commands.len();
            match Command::set_global_commands(&ctx.http, commands).await {
                Ok(_) => info!(count, "Registered slash commands"),
                Err(e) => error!(error = %e, "Failed to register slash commands"),
            }
        }

        self.start_sweep(ctx.shard_id.0);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let guild = match msg.guild_id {
            Some(id) => match self.guild_context(&ctx, id).await {
                Some(guild) => Some(guild),
                None => return,
            },
            None => None,
        };

        let event = MessageEvent {
            channel: ChannelId(msg.channel_id.get()),
            message: MessageId(msg.id.get()),
            author: platform_user(&msg.author),
            guild,
            content: msg.content,
        };

        match self.dispatcher.handle_message(event).await {
            Ok(outcome) => debug!(?outcome, "Message handled"),
            Err(e) => error!(error = %e, "Failed to handle message"),
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };

        let guild = match command.guild_id {
            Some(id) => match self.guild_context(&ctx, id).await {
                Some(guild) => Some(guild),
                None => return,
            },
            None => None,
        };

        let mut path = vec![command.data.name.clone()];
        let mut options = HashMap::new();
        flatten_options(&command.data.options, &mut path, &mut options);

        let event = InteractionEvent {
            channel: ChannelId(command.channel_id.get()),
            id: InteractionId(command.id.get()),
            token: command.token.clone(),
            author: platform_user(&command.user),
            guild,
            path,
            options,
        };

        match self.dispatcher.handle_interaction(event).await {
            Ok(outcome) => debug!(?outcome, "Interaction handled"),
            Err(e) => error!(error = %e, "Failed to handle interaction"),
        }
    }

    async fn reaction_add(&self, _ctx: Context, reaction: Reaction) {
        let Some(input) = self.reaction_input(&reaction) else {
            return;
        };
        if let Err(e) = self.data().reactions.on_reaction_add(input).await {
            error!(error = %e, "Failed to handle reaction");
        }
    }

    async fn reaction_remove(&self, _ctx: Context, reaction: Reaction) {
        let Some(input) = self.reaction_input(&reaction) else {
            return;
        };
        if let Err(e) = self.data().reactions.on_reaction_remove(input).await {
            error!(error = %e, "Failed to handle reaction removal");
        }
    }

    async fn message_delete(
        &self,
        _ctx: Context,
        channel_id: DiscordChannel,
        deleted_message_id: DiscordMessage,
        _guild_id: Option<DiscordGuild>,
    ) {
        let result = self
            .data()
            .reactions
            .on_message_deleted(
                ChannelId(channel_id.get()),
                MessageId(deleted_message_id.get()),
            )
            .await;
        if let Err(e) = result {
            error!(error = %e, "Failed to drop handlers of deleted message");
        }
    }

    async fn channel_delete(
        &self,
        _ctx: Context,
        channel: GuildChannel,
        _messages: Option<Vec<Message>>,
    ) {
        let result = self
            .data()
            .reactions
            .on_channel_deleted(ChannelId(channel.id.get()))
            .await;
        if let Err(e) = result {
            error!(error = %e, "Failed to drop handlers of deleted channel");
        }
    }

    async fn guild_member_removal(
        &self,
        _ctx: Context,
        guild_id: DiscordGuild,
        user: User,
        _member: Option<Member>,
    ) {
        let result = self
            .dispatcher
            .handle_member_removed(GuildId(guild_id.get()), UserId(user.id.get()))
            .await;
        if let Err(e) = result {
            error!(error = %e, "Failed to clean up departed member");
        }
    }
}
