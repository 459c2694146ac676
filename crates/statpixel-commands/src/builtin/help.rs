//! The help command.

use crate::argument::Args;
use crate::context::Invocation;
use crate::definition::CommandDefinition;
use crate::error::CommandResult;
use crate::reply::Embed;
use crate::tree::PermissionTier;
use statpixel_config::DisplayMode;

/// Definition of `help`.
#[must_use]
pub fn definition() -> CommandDefinition {
    CommandDefinition::new("help")
        .description("Useful commands and general overview of StatPixel")
        .run_with(run)
}

fn run(ctx: &Invocation, _args: Args) -> CommandResult {
    let registry = &ctx.data.registry;
    let commands: Vec<String> = registry
        .roots()
        .iter()
        .map(|id| registry.node(*id))
        .filter(|node| node.is_enabled() && node.tier() == PermissionTier::None)
        .map(|node| format!("`{}`", node.name()))
        .collect();

    let prefix = ctx.prefix();
    let mention = ctx
        .data
        .bot_id()
        .map_or_else(String::new, |id| format!(" or <@{id}>"));
    let display = match ctx.settings.display_mode {
        DisplayMode::Image => "images",
        DisplayMode::Text => "text",
    };

    let embed = Embed::new()
        .with_title("StatPixel Help 🗞️")
        .with_description(format!(
            "*Use `{prefix}` before any command, for example `{prefix}help`.*"
        ))
        .with_field("Commands 🤖", commands.join(", "), false)
        .with_field(
            "Server Settings ⚙️",
            format!(
                "Prefix: `{prefix}`{mention}\nEmbed colour: `{}`\nStatistics shown as: {display}",
                ctx.settings.colour
            ),
            false,
        );

    Ok(embed.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestHarness;

    #[tokio::test]
    async fn test_help_lists_public_commands() {
        let harness = TestHarness::new(crate::builtin::definitions()).await;
        let ctx = harness.invocation();

        let output = run(&ctx, Args::default()).unwrap();
        let reply = output.into_reply().unwrap();
        let text = reply.visible_text();

        assert!(text.contains("`help`"));
        assert!(text.contains("`bugreport`"));
        assert!(!text.contains("`ban`"));
        assert!(text.contains("Prefix: `-` or <@111111111111111111>"));
    }
}
