//! The command tree.
//!
//! Nodes live in an arena and refer to their parent and children by
//! [`NodeId`]. The shape is fixed once built; only the per-node enabled
//! flag changes at runtime.

use crate::argument::ArgumentSpec;
use crate::definition::{CommandBody, CommandDefinition};
use crate::reactions::EventRouter;
use statpixel_common::{Result, StatError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Index of a node in the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Privilege required to run a command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PermissionTier {
    /// Anyone.
    #[default]
    None,
    /// Configured bot administrators only; others are silently ignored.
    Admin,
    /// The guild owner or an administrator, inside a guild.
    Owner,
}

/// A node of the command tree.
pub struct CommandNode {
    aliases: Vec<String>,
    path: String,
    description: String,
    tier: PermissionTier,
    arguments: Vec<ArgumentSpec>,
    body: Option<Arc<dyn CommandBody>>,
    enabled: AtomicBool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl CommandNode {
    /// Canonical name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.aliases[0]
    }

    /// All names, canonical first.
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Dotted path of canonical names from the root, used as the metrics key.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Permission tier.
    #[must_use]
    pub const fn tier(&self) -> PermissionTier {
        self.tier
    }

    /// Ordered argument descriptors.
    #[must_use]
    pub fn arguments(&self) -> &[ArgumentSpec] {
        &self.arguments
    }

    /// Body, if the node is executable.
    #[must_use]
    pub fn body(&self) -> Option<&Arc<dyn CommandBody>> {
        self.body.as_ref()
    }

    /// Whether the node can currently be resolved.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Parent node.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in definition order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Whether `name` is one of this node's aliases.
    #[must_use]
    pub fn answers_to(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.aliases.iter().any(|alias| *alias == name)
    }
}

/// Outcome of resolving tokens against the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// The deepest matched node, if any.
    pub node: Option<NodeId>,
    /// Number of leading tokens consumed by the alias chain.
    pub consumed: usize,
}

/// Owns every command node.
#[derive(Default)]
pub struct CommandRegistry {
    nodes: Vec<CommandNode>,
    roots: Vec<NodeId>,
}

impl CommandRegistry {
    /// Build the tree, collecting reaction listeners into an [`EventRouter`].
    #[must_use]
    pub fn build(definitions: Vec<CommandDefinition>) -> (Self, EventRouter) {
        let mut registry = Self::default();
        let mut router = EventRouter::default();

        for definition in definitions {
            let id = registry.insert(definition, None, &mut router);
            registry.roots.push(id);
        }

        debug!(
            commands = registry.nodes.len(),
            roots = registry.roots.len(),
            "Command tree built"
        );
        (registry, router)
    }

    fn insert(
        &mut self,
        definition: CommandDefinition,
        parent: Option<NodeId>,
        router: &mut EventRouter,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let path = match parent {
            Some(parent) => format!("{}.{}", self.nodes[parent.0].path, definition.aliases[0]),
            None => definition.aliases[0].clone(),
        };

        for (event, listener) in definition.listeners {
            router.register(event, listener);
        }

        self.nodes.push(CommandNode {
            aliases: definition.aliases,
            path,
            description: definition.description,
            tier: definition.tier,
            arguments: definition.arguments,
            body: definition.body,
            enabled: AtomicBool::new(true),
            parent,
            children: Vec::new(),
        });

        for child in definition.children {
            let child_id = self.insert(child, Some(id), router);
            self.nodes[id.0].children.push(child_id);
        }

        id
    }

    /// Node by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this registry.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &CommandNode {
        &self.nodes[id.0]
    }

    /// Top-level nodes.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Every node with its id, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &CommandNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    /// Top-level node answering to `name`, regardless of its enabled flag.
    #[must_use]
    pub fn root(&self, name: &str) -> Option<NodeId> {
        self.roots
            .iter()
            .copied()
            .find(|id| self.node(*id).answers_to(name))
    }

    /// Child of `parent` answering to `name`, regardless of its enabled flag.
    #[must_use]
    pub fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|id| self.node(*id).answers_to(name))
    }

    /// Resolve leading tokens to a command.
    ///
    /// Matches the first token against top-level aliases, then descends into
    /// children while the next token names one. Matching is exact and
    /// case-insensitive. A disabled node anywhere on the matched chain makes
    /// the whole resolution fail unless `allow_disabled` is set.
    #[must_use]
    pub fn resolve<S: AsRef<str>>(&self, tokens: &[S], allow_disabled: bool) -> Resolution {
        let miss = Resolution {
            node: None,
            consumed: 0,
        };

        let Some(first) = tokens.first() else {
            return miss;
        };
        let Some(mut current) = self.root(first.as_ref()) else {
            return miss;
        };
        if !allow_disabled && !self.node(current).is_enabled() {
            return miss;
        }

        let mut consumed = 1;
        while let Some(token) = tokens.get(consumed) {
            let Some(next) = self.child(current, token.as_ref()) else {
                break;
            };
            if !allow_disabled && !self.node(next).is_enabled() {
                return miss;
            }
            current = next;
            consumed += 1;
        }

        Resolution {
            node: Some(current),
            consumed,
        }
    }

    /// Walk `path` segment by segment by alias.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Result<NodeId> {
        let not_found = || {
            StatError::not_found(
                path.iter()
                    .map(AsRef::as_ref)
                    .collect::<Vec<_>>()
                    .join("."),
            )
        };

        let (first, rest) = path.split_first().ok_or_else(not_found)?;
        let mut current = self.root(first.as_ref()).ok_or_else(not_found)?;
        for segment in rest {
            current = self.child(current, segment.as_ref()).ok_or_else(not_found)?;
        }
        Ok(current)
    }

    /// Toggle the node at `path`.
    pub fn set_enabled<S: AsRef<str>>(&self, path: &[S], value: bool) -> Result<NodeId> {
        let id = self.find(path)?;
        self.set_node_enabled(id, value);
        Ok(id)
    }

    /// Toggle a node by id.
    pub fn set_node_enabled(&self, id: NodeId, value: bool) {
        self.node(id).enabled.store(value, Ordering::Release);
    }

    /// Disable every dotted path in `paths`; unknown paths are skipped.
    pub fn apply_disabled(&self, paths: &[String]) {
        for path in paths {
            let segments: Vec<&str> = path.split('.').collect();
            if let Err(e) = self.set_enabled(&segments, false) {
                warn!(path = %path, error = %e, "Ignoring unknown disabled command");
            }
        }
    }

    /// Dotted paths of every disabled node.
    #[must_use]
    pub fn disabled_paths(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|node| !node.is_enabled())
            .map(|node| node.path.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::CommandOutput;

    fn leaf(name: &str) -> CommandDefinition {
        CommandDefinition::new(name).run_with(|_, _| Ok(CommandOutput::None))
    }

    fn registry() -> CommandRegistry {
        let (registry, _) = CommandRegistry::build(vec![
            CommandDefinition::new("text")
                .child(leaf("bedwars").alias("bw").child(leaf("solo")))
                .child(leaf("skywars")),
            leaf("help").alias("h"),
        ]);
        registry
    }

    #[test]
    fn test_paths_use_canonical_names() {
        let registry = registry();
        let id = registry.find(&["TEXT", "bw", "solo"]).unwrap();
        assert_eq!(registry.node(id).path(), "text.bedwars.solo");
        assert_eq!(registry.node(id).name(), "solo");
    }

    #[test]
    fn test_resolve_descends_and_stops_at_first_miss() {
        let registry = registry();

        let res = registry.resolve(&["text", "BW", "steve"], false);
        assert_eq!(res.consumed, 2);
        assert_eq!(registry.node(res.node.unwrap()).path(), "text.bedwars");

        let res = registry.resolve(&["h", "bedwars"], false);
        assert_eq!(res.consumed, 1);
        assert_eq!(registry.node(res.node.unwrap()).path(), "help");

        let res = registry.resolve(&["unknown"], false);
        assert_eq!(res, Resolution { node: None, consumed: 0 });

        let empty: [&str; 0] = [];
        assert!(registry.resolve(&empty, false).node.is_none());
    }

    #[test]
    fn test_disabled_nodes_are_unreachable() {
        let registry = registry();
        registry.set_enabled(&["text", "bedwars"], false).unwrap();

        assert!(registry.resolve(&["text", "bedwars", "solo"], false).node.is_none());
        assert_eq!(
            registry.node(registry.resolve(&["text", "skywars"], false).node.unwrap()).path(),
            "text.skywars"
        );

        let res = registry.resolve(&["text", "bedwars"], true);
        let node = registry.node(res.node.unwrap());
        assert_eq!(node.path(), "text.bedwars");
        assert!(!node.is_enabled());

        assert_eq!(registry.disabled_paths(), vec!["text.bedwars".to_string()]);
    }

    #[test]
    fn test_set_enabled_unknown_path() {
        let registry = registry();
        let err = registry.set_enabled(&["text", "pit"], false).unwrap_err();
        assert_eq!(err.to_string(), "Not found: text.pit");
    }

    #[test]
    fn test_apply_disabled_skips_unknown() {
        let registry = registry();
        registry.apply_disabled(&["help".to_string(), "gone.command".to_string()]);
        assert_eq!(registry.disabled_paths(), vec!["help".to_string()]);
    }
}
