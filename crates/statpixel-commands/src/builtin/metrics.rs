//! The global usage leaderboard.

use crate::argument::Args;
use crate::context::Invocation;
use crate::definition::{CommandBody, CommandDefinition};
use crate::error::CommandResult;
use crate::reply::Embed;
use async_trait::async_trait;

/// Discord caps embeds at 25 fields.
pub const MAX_ENTRIES: usize = 25;

/// Definition of `metrics`.
#[must_use]
pub fn definition() -> CommandDefinition {
    CommandDefinition::new("metrics")
        .alias("metric")
        .description("Metrics on command usage")
        .body(Metrics)
}

struct Metrics;

#[async_trait]
impl CommandBody for Metrics {
    async fn run(&self, ctx: &Invocation, _args: Args) -> CommandResult {
        let board = ctx.data.permissions.usage().leaderboard().await?;

        let mut embed = Embed::new().with_title("Global Leaderboard ➢ Usage");
        for (rank, entry) in board.iter().take(MAX_ENTRIES).enumerate() {
            embed = embed.with_field(
                format!("{}. {}", rank + 1, entry.path),
                format!("{} uses", entry.uses),
                true,
            );
        }
        if board.is_empty() {
            embed = embed.with_description("No commands have been used yet.");
        } else if board.len() > MAX_ENTRIES {
            embed = embed.with_footer(format!(
                "Showing {MAX_ENTRIES} of {} commands",
                board.len()
            ));
        }

        Ok(embed.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MetricsStore;
    use crate::test_utils::TestHarness;

    #[tokio::test]
    async fn test_leaderboard_is_ranked() {
        let harness = TestHarness::new(Vec::new()).await;
        for _ in 0..3 {
            harness.store.increment_usage("text.bedwars").await.unwrap();
        }
        harness.store.increment_usage("help").await.unwrap();

        let output = Metrics.run(&harness.invocation(), Args::default()).await.unwrap();
        let embed = output.into_reply().unwrap().embed.unwrap();

        assert_eq!(embed.fields[0].name, "1. text.bedwars");
        assert_eq!(embed.fields[0].value, "3 uses");
        assert_eq!(embed.fields[1].name, "2. help");
        assert!(embed.footer.is_none());
    }

    #[tokio::test]
    async fn test_leaderboard_is_capped() {
        let harness = TestHarness::new(Vec::new()).await;
        for i in 0..30 {
            harness.store.increment_usage(&format!("cmd{i}")).await.unwrap();
        }

        let output = Metrics.run(&harness.invocation(), Args::default()).await.unwrap();
        let embed = output.into_reply().unwrap().embed.unwrap();
        assert_eq!(embed.fields.len(), MAX_ENTRIES);
        assert_eq!(embed.footer.as_deref(), Some("Showing 25 of 30 commands"));
    }
}
