//! Declarative command definitions consumed when the tree is built.

use crate::argument::{Args, ArgumentSpec};
use crate::context::Invocation;
use crate::error::CommandResult;
use crate::reactions::ReactionListener;
use crate::tree::PermissionTier;
use async_trait::async_trait;
use std::sync::Arc;

/// The executable part of a command.
#[async_trait]
pub trait CommandBody: Send + Sync {
    /// Run the command with coerced positional arguments.
    async fn run(&self, ctx: &Invocation, args: Args) -> CommandResult;
}

/// Adapts a synchronous closure into a [`CommandBody`].
pub struct FnBody<F>(pub F);

#[async_trait]
impl<F> CommandBody for FnBody<F>
where
    F: Fn(&Invocation, Args) -> CommandResult + Send + Sync,
{
    async fn run(&self, ctx: &Invocation, args: Args) -> CommandResult {
        (self.0)(ctx, args)
    }
}

/// A command and its sub-commands, as supplied by a command source.
pub struct CommandDefinition {
    pub(crate) aliases: Vec<String>,
    pub(crate) description: String,
    pub(crate) tier: PermissionTier,
    pub(crate) arguments: Vec<ArgumentSpec>,
    pub(crate) body: Option<Arc<dyn CommandBody>>,
    pub(crate) listeners: Vec<(String, Arc<dyn ReactionListener>)>,
    pub(crate) children: Vec<CommandDefinition>,
}

impl CommandDefinition {
    /// Start a definition; `id` is also the canonical name.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            aliases: vec![id.into().to_lowercase()],
            description: String::new(),
            tier: PermissionTier::None,
            arguments: Vec::new(),
            body: None,
            listeners: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an alternate name.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into().to_lowercase());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the permission tier.
    #[must_use]
    pub const fn tier(mut self, tier: PermissionTier) -> Self {
        self.tier = tier;
        self
    }

    /// Append an argument.
    #[must_use]
    pub fn argument(mut self, spec: ArgumentSpec) -> Self {
        self.arguments.push(spec);
        self
    }

    /// Set the body.
    #[must_use]
    pub fn body(mut self, body: impl CommandBody + 'static) -> Self {
        self.body = Some(Arc::new(body));
        self
    }

    /// Set the body from a synchronous closure.
    #[must_use]
    pub fn run_with<F>(self, f: F) -> Self
    where
        F: Fn(&Invocation, Args) -> CommandResult + Send + Sync + 'static,
    {
        self.body(FnBody(f))
    }

    /// Subscribe `listener` to reaction events named `event`.
    #[must_use]
    pub fn listen(mut self, event: impl Into<String>, listener: impl ReactionListener + 'static) -> Self {
        self.listeners.push((event.into(), Arc::new(listener)));
        self
    }

    /// Append a sub-command.
    #[must_use]
    pub fn child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Canonical name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.aliases[0]
    }
}
