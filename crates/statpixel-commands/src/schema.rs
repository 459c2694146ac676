//! Slash command schema derived from the command tree.
//!
//! The image root is left out, and the children of the text root are lifted
//! into top-level commands so game modes are reachable as `/bedwars` rather
//! than `/text bedwars`. Group nodes become sub-command groups, leaves become
//! sub-commands, and every argument becomes a string option.

use crate::tree::{CommandRegistry, NodeId};
use serde::{Deserialize, Serialize};
use statpixel_config::CommandsConfig;

/// Longest description Discord accepts.
pub const MAX_DESCRIPTION: usize = 100;

const NO_DESCRIPTION: &str = "No description";

/// Kind of a slash option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlashOptionKind {
    /// A group of sub-commands.
    SubCommandGroup,
    /// A sub-command.
    SubCommand,
    /// A free text value.
    String,
}

/// One option of a slash command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashOption {
    /// Option kind.
    pub kind: SlashOptionKind,
    /// Option name.
    pub name: String,
    /// Option description.
    pub description: String,
    /// Whether a value must be supplied; only meaningful for strings.
    pub required: bool,
    /// Nested options of groups and sub-commands.
    pub options: Vec<SlashOption>,
}

/// A top-level slash command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashCommand {
    /// Command name.
    pub name: String,
    /// Command description.
    pub description: String,
    /// Sub-commands, groups and arguments.
    pub options: Vec<SlashOption>,
}

fn describe(text: &str) -> String {
    if text.is_empty() {
        return NO_DESCRIPTION.to_string();
    }
    text.chars().take(MAX_DESCRIPTION).collect()
}

fn options_of(registry: &CommandRegistry, id: NodeId) -> Vec<SlashOption> {
    let node = registry.node(id);

    let children = node.children().iter().map(|child| {
        let inner = registry.node(*child);
        SlashOption {
            kind: if inner.children().is_empty() {
                SlashOptionKind::SubCommand
            } else {
                SlashOptionKind::SubCommandGroup
            },
            name: inner.name().to_string(),
            description: describe(inner.description()),
            required: false,
            options: options_of(registry, *child),
        }
    });

    let arguments = node.arguments().iter().map(|spec| SlashOption {
        kind: SlashOptionKind::String,
        name: spec.name().to_string(),
        description: describe(spec.description()),
        required: !spec.is_schema_optional(),
        options: Vec::new(),
    });

    children.chain(arguments).collect()
}

fn command_of(registry: &CommandRegistry, id: NodeId) -> SlashCommand {
    let node = registry.node(id);
    SlashCommand {
        name: node.name().to_string(),
        description: describe(node.description()),
        options: options_of(registry, id),
    }
}

/// Build the global slash command list.
#[must_use]
pub fn slash_commands(registry: &CommandRegistry, config: &CommandsConfig) -> Vec<SlashCommand> {
    let mut commands = Vec::new();

    for &root in registry.roots() {
        let node = registry.node(root);
        if node.name() == config.image_root {
            continue;
        }
        if node.name() == config.text_root {
            commands.extend(node.children().iter().map(|child| command_of(registry, *child)));
            continue;
        }
        commands.push(command_of(registry, root));
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::ArgumentSpec;
    use crate::coercers;
    use crate::definition::CommandDefinition;
    use statpixel_config::Config;

    fn registry() -> CommandRegistry {
        let long = "x".repeat(150);
        let (registry, _) = CommandRegistry::build(vec![
            CommandDefinition::new("text")
                .child(
                    CommandDefinition::new("guild")
                        .description("Guild statistics")
                        .child(
                            CommandDefinition::new("member").argument(ArgumentSpec::new(
                                "player",
                                "A player",
                                coercers::present(),
                                "",
                            )),
                        ),
                )
                .child(CommandDefinition::new("bedwars").description(long)),
            CommandDefinition::new("image").child(CommandDefinition::new("bedwars")),
            CommandDefinition::new("prefix").argument(
                ArgumentSpec::new("prefix", "The new prefix", coercers::present(), "").optional(),
            ),
        ]);
        registry
    }

    #[test]
    fn test_roots_are_flattened_and_skipped() {
        let config = Config::default();
        let commands = slash_commands(&registry(), &config.commands);
        let names: Vec<_> = commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["guild", "bedwars", "prefix"]);
    }

    #[test]
    fn test_option_shapes() {
        let config = Config::default();
        let commands = slash_commands(&registry(), &config.commands);

        let guild = &commands[0];
        assert_eq!(guild.options[0].kind, SlashOptionKind::SubCommand);
        assert_eq!(guild.options[0].name, "member");
        assert_eq!(guild.options[0].description, NO_DESCRIPTION);

        let player = &guild.options[0].options[0];
        assert_eq!(player.kind, SlashOptionKind::String);
        assert!(player.required);

        assert_eq!(commands[1].description.chars().count(), MAX_DESCRIPTION);
        assert!(!commands[2].options[0].required);
    }
}
