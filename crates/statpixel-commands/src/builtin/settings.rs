//! Guild owner commands that change guild settings.

use crate::argument::{ArgKind, ArgValue, Args, ArgumentSpec, RawInput};
use crate::context::{GuildContext, Invocation};
use crate::definition::{CommandBody, CommandDefinition};
use crate::error::{CommandError, CommandResult};
use crate::tree::PermissionTier;
use anyhow::anyhow;
use async_trait::async_trait;
use statpixel_common::escape_markdown;
use statpixel_config::{DisplayMode, MAX_PREFIX_LENGTH};
use tracing::info;

fn guild(ctx: &Invocation) -> Result<&GuildContext, CommandError> {
    ctx.guild
        .as_ref()
        .ok_or_else(|| anyhow!("owner command ran outside a guild").into())
}

/// Definition of `prefix`.
#[must_use]
pub fn prefix() -> CommandDefinition {
    CommandDefinition::new("prefix")
        .description("Changes the prefix for StatPixel")
        .tier(PermissionTier::Owner)
        .argument(
            ArgumentSpec::from_fn(
                "prefix",
                "The new prefix",
                |input: RawInput| {
                    input
                        .as_text()
                        .filter(|p| p.chars().count() <= MAX_PREFIX_LENGTH)
                        .map(|p| ArgValue::Text(p.to_lowercase()))
                },
                format!("You must provide a prefix of no more than {MAX_PREFIX_LENGTH} characters."),
            )
            .overwrite(ArgKind::Text)
            .optional(),
        )
        .body(Prefix)
}

/// Definition of `display`.
#[must_use]
pub fn display() -> CommandDefinition {
    ["displays", "toggledisplay", "toggledisplays", "toggletext", "embed", "toggleembed"]
        .into_iter()
        .fold(CommandDefinition::new("display"), |def, alias| def.alias(alias))
        .description("Toggles between image and text statistics")
        .tier(PermissionTier::Owner)
        .body(ToggleDisplay)
}

struct Prefix;

#[async_trait]
impl CommandBody for Prefix {
    async fn run(&self, ctx: &Invocation, args: Args) -> CommandResult {
        let guild = guild(ctx)?;
        let prefix = match args.text(0)? {
            Some(prefix) => prefix.to_string(),
            None => ctx.data.settings.defaults().prefix.clone(),
        };

        let updated = prefix.clone();
        ctx.data
            .settings
            .update(guild.id, move |s| s.prefix = updated)
            .await?;
        info!(guild = %guild.id, %prefix, "Prefix changed");

        let name = guild.name.as_deref().unwrap_or("this server");
        Ok(format!(
            "The prefix for **{}** has been changed to ``{prefix}``.",
            escape_markdown(name)
        )
        .into())
    }
}

struct ToggleDisplay;

#[async_trait]
impl CommandBody for ToggleDisplay {
    async fn run(&self, ctx: &Invocation, _args: Args) -> CommandResult {
        let guild = guild(ctx)?;
        let settings = ctx
            .data
            .settings
            .update(guild.id, |s| s.display_mode = s.display_mode.toggled())
            .await?;
        info!(guild = %guild.id, mode = ?settings.display_mode, "Display mode toggled");

        let state = match settings.display_mode {
            DisplayMode::Text => "enabled",
            DisplayMode::Image => "disabled",
        };
        Ok(format!("Text statistics have been **{state}**.").into())
    }
}
