//! Turning inbound messages and slash interactions into command runs.
//!
//! Both entry points converge on the same gate and execution path:
//! resolve, check permissions, coerce arguments, run the body, reply.

use crate::argument::{ArgValue, Args};
use crate::context::{Data, GuildContext, Invocation};
use crate::error::CommandError;
use crate::permissions::GateDecision;
use crate::pipeline::{ArgumentPipeline, StepOutcome};
use crate::platform::{Origin, PlatformUser};
use crate::reply::{Embed, Reply};
use crate::tokenizer::{strip_bot_mention, tokenize};
use crate::tree::NodeId;
use futures::FutureExt;
use statpixel_common::{ChannelId, GuildId, InteractionId, MessageId, Result, UserId};
use statpixel_config::{DisplayMode, GuildSettings};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Reply shown when a command fails internally.
pub const GENERIC_FAILURE: &str = "An error occurred while running the command.";
/// Reply closing a deferred interaction that names no usable command.
pub const UNKNOWN_COMMAND: &str = "That command is not available.";

/// A chat message as delivered by the gateway.
#[derive(Debug, Clone)]
pub struct MessageEvent {
    /// Channel of the message.
    pub channel: ChannelId,
    /// The message itself.
    pub message: MessageId,
    /// Author.
    pub author: PlatformUser,
    /// Guild, unless sent in a direct message.
    pub guild: Option<GuildContext>,
    /// Raw content.
    pub content: String,
}

/// A slash command interaction.
#[derive(Debug, Clone)]
pub struct InteractionEvent {
    /// Channel the command was used in.
    pub channel: ChannelId,
    /// Interaction id.
    pub id: InteractionId,
    /// Interaction token.
    pub token: String,
    /// Invoking user.
    pub author: PlatformUser,
    /// Guild, unless used in a direct message.
    pub guild: Option<GuildContext>,
    /// Command name followed by sub-command group and sub-command names.
    pub path: Vec<String>,
    /// Option values by name.
    pub options: HashMap<String, String>,
}

/// How an inbound event was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not addressed to the bot.
    Ignored,
    /// No enabled command matched.
    NotFound,
    /// The user is banned; the notice was sent.
    Banned,
    /// An admin-only command used by someone else.
    DeniedSilently,
    /// Refused with an explanation.
    Denied,
    /// An argument was rejected; carries the rendered error.
    Rejected(String),
    /// The command ran.
    Completed,
    /// The command failed with a message for the user.
    UserError(String),
    /// The command failed internally.
    InternalError,
}

/// Routes inbound events through the engine.
#[derive(Clone)]
pub struct Dispatcher {
    data: Arc<Data>,
}

impl Dispatcher {
    /// Create a dispatcher over shared state.
    #[must_use]
    pub const fn new(data: Arc<Data>) -> Self {
        Self { data }
    }

    /// Shared state.
    #[must_use]
    pub const fn data(&self) -> &Arc<Data> {
        &self.data
    }

    /// Handle a chat message.
    pub async fn handle_message(&self, event: MessageEvent) -> Result<DispatchOutcome> {
        if event.author.bot {
            return Ok(DispatchOutcome::Ignored);
        }

        let settings = self
            .data
            .settings
            .get(event.guild.as_ref().map(|g| g.id))
            .await?;

        let mention = self
            .data
            .bot_id()
            .and_then(|bot| strip_bot_mention(&event.content, bot));

        let mut tokens = match mention {
            Some(rest) => {
                let mut tokens = tokenize(rest);
                if tokens.is_empty() {
                    tokens.push(self.data.config.commands.help_command.clone());
                }
                tokens
            }
            None => {
                let Some(rest) = event.content.strip_prefix(settings.prefix.as_str()) else {
                    return Ok(DispatchOutcome::Ignored);
                };
                if rest.is_empty() {
                    return Ok(DispatchOutcome::Ignored);
                }
                tokenize(rest)
            }
        };

        self.apply_shortcut(&mut tokens, &settings);

        let resolution = self.data.registry.resolve(&tokens, false);
        let Some(node) = resolution.node else {
            debug!(tokens = ?tokens, "No command matched");
            return Ok(DispatchOutcome::NotFound);
        };

        let origin = Origin::Message {
            channel: event.channel,
            message: event.message,
        };
        let ctx = Invocation {
            data: Arc::clone(&self.data),
            origin,
            author: event.author,
            guild: event.guild,
            settings,
            node,
        };

        if let Some(outcome) = self.gate(&ctx).await? {
            return Ok(outcome);
        }

        if let Err(e) = self.data.platform.acknowledge(&ctx.origin).await {
            debug!(error = %e, "Could not send typing indicator");
        }

        let mut positional: Vec<Option<ArgValue>> = tokens
            .into_iter()
            .skip(resolution.consumed)
            .map(|token| Some(ArgValue::Text(token)))
            .collect();

        if let Err(message) =
            ArgumentPipeline::run(ctx.command().arguments(), &mut positional, &ctx).await
        {
            self.reply(&ctx, Reply::embed(Embed::description(message.clone())))
                .await?;
            return Ok(DispatchOutcome::Rejected(message));
        }

        self.execute(&ctx, positional).await
    }

    /// Handle a slash command interaction.
    pub async fn handle_interaction(&self, event: InteractionEvent) -> Result<DispatchOutcome> {
        let origin = Origin::Interaction {
            channel: event.channel,
            id: event.id,
            token: event.token,
        };
        self.data.platform.acknowledge(&origin).await?;

        let settings = self
            .data
            .settings
            .get(event.guild.as_ref().map(|g| g.id))
            .await?;

        let mut path = event.path;
        self.apply_shortcut(&mut path, &settings);

        let resolution = self.data.registry.resolve(&path, false);
        let node = match resolution.node {
            Some(node) if resolution.consumed == path.len() => node,
            _ => {
                debug!(path = ?path, "Interaction names no enabled command");
                let reply = Reply::embed(Embed::description(UNKNOWN_COMMAND))
                    .with_default_colour(settings.colour_value());
                self.data.platform.respond(&origin, reply).await?;
                return Ok(DispatchOutcome::NotFound);
            }
        };

        let ctx = Invocation {
            data: Arc::clone(&self.data),
            origin,
            author: event.author,
            guild: event.guild,
            settings,
            node,
        };

        if let Some(outcome) = self.gate(&ctx).await? {
            // The deferral must be answered; answer as if the command did not exist.
            if outcome == DispatchOutcome::DeniedSilently {
                self.reply(&ctx, Reply::embed(Embed::description(UNKNOWN_COMMAND)))
                    .await?;
            }
            return Ok(outcome);
        }

        let mut positional: Vec<Option<ArgValue>> = Vec::new();
        for (index, spec) in ctx.command().arguments().iter().enumerate() {
            if let Some(value) = event.options.get(spec.name()) {
                positional.extend(
                    value
                        .split_whitespace()
                        .map(|part| Some(ArgValue::Text(part.to_string()))),
                );
            }

            if let StepOutcome::Rejected(message) =
                ArgumentPipeline::check(spec, index, &mut positional, &ctx).await
            {
                self.reply(&ctx, Reply::embed(Embed::description(message.clone())))
                    .await?;
                return Ok(DispatchOutcome::Rejected(message));
            }
        }

        self.execute(&ctx, positional).await
    }

    /// Forget the usage of a member who left `guild`.
    pub async fn handle_member_removed(&self, guild: GuildId, user: UserId) -> Result<usize> {
        let removed = self
            .data
            .permissions
            .usage()
            .forget_member(user, guild.get())
            .await?;
        debug!(%guild, %user, removed, "Dropped usage of departed member");
        Ok(removed)
    }

    /// Prepend a display root when the first token names one of its modes.
    fn apply_shortcut(&self, tokens: &mut Vec<String>, settings: &GuildSettings) {
        let Some(first) = tokens.first() else {
            return;
        };
        let registry = &self.data.registry;
        let commands = &self.data.config.commands;

        let in_root = |root: &str| {
            registry
                .root(root)
                .is_some_and(|id| registry.child(id, first).is_some())
        };

        let root = if settings.display_mode == DisplayMode::Image && in_root(&commands.image_root) {
            &commands.image_root
        } else if in_root(&commands.text_root) {
            &commands.text_root
        } else {
            return;
        };
        tokens.insert(0, root.clone());
    }

    /// Run the permission gate; `Some` means the invocation stops here.
    async fn gate(&self, ctx: &Invocation) -> Result<Option<DispatchOutcome>> {
        let bot = self.data.bot_id().unwrap_or(UserId(0));
        let decision = self
            .data
            .permissions
            .check(ctx.author.id, ctx.guild.as_ref(), ctx.command(), bot)
            .await?;

        let outcome = match decision {
            GateDecision::Allow => return Ok(None),
            GateDecision::Banned(notice) => {
                self.reply(ctx, notice).await?;
                DispatchOutcome::Banned
            }
            GateDecision::Deny(None) => DispatchOutcome::DeniedSilently,
            GateDecision::Deny(Some(reply)) => {
                self.reply(ctx, reply).await?;
                DispatchOutcome::Denied
            }
        };
        Ok(Some(outcome))
    }

    async fn reply(&self, ctx: &Invocation, reply: Reply) -> Result<()> {
        let reply = reply.with_default_colour(ctx.settings.colour_value());
        self.data.platform.respond(&ctx.origin, reply).await
    }

    async fn execute(
        &self,
        ctx: &Invocation,
        positional: Vec<Option<ArgValue>>,
    ) -> Result<DispatchOutcome> {
        let command = ctx.command();

        if let Err(e) = ArgumentPipeline::verify(command.arguments(), &positional) {
            error!(command = command.path(), error = %e, "Coerced arguments do not match their declared kinds");
            self.reply(ctx, Reply::embed(Embed::description(GENERIC_FAILURE)))
                .await?;
            return Ok(DispatchOutcome::InternalError);
        }

        let Some(body) = command.body() else {
            self.reply(ctx, self.usage_reply(ctx.node)).await?;
            return Ok(DispatchOutcome::Completed);
        };

        info!(command = command.path(), user = %ctx.author.id, "Running command");
        let result = AssertUnwindSafe(body.run(ctx, Args::new(positional)))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(output)) => {
                if let Some(reply) = output.into_reply() {
                    self.reply(ctx, reply).await?;
                }
                Ok(DispatchOutcome::Completed)
            }
            Ok(Err(CommandError::User(message))) => {
                self.reply(ctx, Reply::embed(Embed::description(message.clone())))
                    .await?;
                Ok(DispatchOutcome::UserError(message))
            }
            Ok(Err(CommandError::Internal(e))) => {
                error!(command = command.path(), error = ?e, "Command failed");
                self.reply(ctx, Reply::embed(Embed::description(GENERIC_FAILURE)))
                    .await?;
                Ok(DispatchOutcome::InternalError)
            }
            Err(_) => {
                error!(command = command.path(), "Command panicked");
                self.reply(ctx, Reply::embed(Embed::description(GENERIC_FAILURE)))
                    .await?;
                Ok(DispatchOutcome::InternalError)
            }
        }
    }

    /// The reply of a group node without a body: its sub-commands.
    fn usage_reply(&self, node: NodeId) -> Reply {
        let registry = &self.data.registry;
        let children = registry.node(node).children();
        let names: Vec<String> = children
            .iter()
            .map(|id| format!("`{}`", registry.node(*id).name()))
            .collect();
        let value = if names.is_empty() {
            "None".to_string()
        } else {
            names.join(", ")
        };

        Reply::embed(
            Embed::new()
                .with_title("Error")
                .with_field("Subcommands", value, children.len() < 7),
        )
    }
}
