//! Enabling and disabling commands at runtime.

use crate::argument::{ArgKind, Args, ArgumentSpec};
use crate::coercers;
use crate::context::Invocation;
use crate::definition::{CommandBody, CommandDefinition};
use crate::error::{CommandError, CommandResult};
use crate::reply::Embed;
use crate::tree::PermissionTier;
use async_trait::async_trait;
use tracing::info;

/// Definition of `enable`.
#[must_use]
pub fn enable() -> CommandDefinition {
    definition("enable", true)
}

/// Definition of `disable`.
#[must_use]
pub fn disable() -> CommandDefinition {
    definition("disable", false)
}

fn definition(name: &str, enable: bool) -> CommandDefinition {
    let (verb, description) = if enable {
        ("enable", "Enables a command.")
    } else {
        ("disable", "Disables a command.")
    };

    CommandDefinition::new(name)
        .description(description)
        .tier(PermissionTier::Admin)
        .argument(
            ArgumentSpec::new(
                "command",
                format!("The command to {verb}"),
                coercers::present(),
                format!("You must provide a command name to {verb}."),
            )
            .remaining()
            .array()
            .overwrite(ArgKind::List),
        )
        .body(Toggle { enable })
}

struct Toggle {
    enable: bool,
}

#[async_trait]
impl CommandBody for Toggle {
    async fn run(&self, ctx: &Invocation, args: Args) -> CommandResult {
        let path = args.list(0)?.unwrap_or_default();
        let name = path.join(" ");
        let registry = &ctx.data.registry;

        let resolution = registry.resolve(path, true);
        let id = match resolution.node {
            Some(id) if resolution.consumed == path.len() => id,
            _ => return Err(CommandError::user("You did not provide a valid command.")),
        };
        let node = registry.node(id);

        let state = if self.enable { "enabled" } else { "disabled" };
        if node.is_enabled() == self.enable {
            return Err(CommandError::user(format!("`{name}` is already {state}.")));
        }

        registry.set_node_enabled(id, self.enable);
        ctx.data
            .store
            .set_command_disabled(node.path(), !self.enable)
            .await?;
        info!(command = node.path(), by = %ctx.author.id, state, "Command toggled");

        Ok(Embed::description(format!("`{name}` has been **{state}**.")).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::ArgValue;
    use crate::definition::CommandDefinition;
    use crate::reply::CommandOutput;
    use crate::store::CommandStateStore;
    use crate::test_utils::TestHarness;

    fn list(items: &[&str]) -> Args {
        Args::new(vec![Some(ArgValue::List(
            items.iter().map(ToString::to_string).collect(),
        ))])
    }

    fn tree() -> Vec<CommandDefinition> {
        vec![CommandDefinition::new("text").child(
            CommandDefinition::new("bedwars")
                .alias("bw")
                .run_with(|_, _| Ok(CommandOutput::None)),
        )]
    }

    #[tokio::test]
    async fn test_disable_then_enable() {
        let harness = TestHarness::new(tree()).await;
        let ctx = harness.invocation();
        let disable = Toggle { enable: false };
        let enable = Toggle { enable: true };

        disable.run(&ctx, list(&["text", "bw"])).await.unwrap();
        assert!(harness.data.registry.resolve(&["text", "bedwars"], false).node.is_none());
        assert_eq!(
            harness.store.disabled_commands().await.unwrap(),
            vec!["text.bedwars".to_string()]
        );

        let err = disable.run(&ctx, list(&["text", "bw"])).await.unwrap_err();
        assert_eq!(err.to_string(), "`text bw` is already disabled.");

        enable.run(&ctx, list(&["text", "bedwars"])).await.unwrap();
        assert!(harness.data.registry.resolve(&["text", "bedwars"], false).node.is_some());
        assert!(harness.store.disabled_commands().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let harness = TestHarness::new(tree()).await;
        let ctx = harness.invocation();

        for path in [&["nothing"][..], &["text", "bedwars", "solo"][..], &[][..]] {
            let err = Toggle { enable: false }.run(&ctx, list(path)).await.unwrap_err();
            assert_eq!(err.to_string(), "You did not provide a valid command.");
        }
    }
}
