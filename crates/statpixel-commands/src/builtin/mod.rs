//! Commands shipped with the engine.
//!
//! Game statistics commands are supplied by the host; these cover help,
//! moderation, runtime command toggling, guild settings, usage metrics and
//! bug reports.

pub mod bugreport;
pub mod help;
pub mod metrics;
pub mod moderation;
pub mod settings;
pub mod toggle;

use crate::definition::CommandDefinition;

/// Every built-in command, in registration order.
#[must_use]
pub fn definitions() -> Vec<CommandDefinition> {
    vec![
        help::definition(),
        moderation::ban(),
        moderation::unban(),
        toggle::enable(),
        toggle::disable(),
        settings::prefix(),
        settings::display(),
        metrics::definition(),
        bugreport::definition(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::CommandRegistry;

    #[test]
    fn test_builtins_register_cleanly() {
        let (registry, router) = CommandRegistry::build(definitions());
        for name in ["help", "ban", "unban", "enable", "disable", "prefix", "display", "metric", "br"] {
            assert!(registry.root(name).is_some(), "missing {name}");
        }
        assert_eq!(router.listeners(bugreport::RESPONSE_EVENT), 1);
    }
}
