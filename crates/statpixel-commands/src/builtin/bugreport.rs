//! Bug reports forwarded to a staff channel.
//!
//! Each report gets a sequential number and is posted with ✅ and ❌
//! reactions. The first staff reaction deletes the report and tells the
//! reporter how it was resolved.

use crate::argument::{ArgKind, Args, ArgumentSpec};
use crate::coercers;
use crate::context::Invocation;
use crate::definition::{CommandBody, CommandDefinition};
use crate::error::{CommandError, CommandResult};
use crate::reactions::{ReactionContext, ReactionEvent, ReactionEventKind, ReactionHandler, ReactionListener};
use crate::reply::{Embed, Reply};
use anyhow::Context as _;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statpixel_common::{escape_markdown, UserId};
use tracing::{debug, info};

/// Reaction event emitted when staff resolve a report.
pub const RESPONSE_EVENT: &str = "bug_report_response";

/// Counter holding the last report number.
pub const COUNTER: &str = "bug_report";

/// Longest accepted report.
pub const MAX_REPORT_LENGTH: usize = 1000;

const COMPLETED: &str = "✅";
const INVALID: &str = "❌";

#[derive(Debug, Serialize, Deserialize)]
struct ReportPayload {
    reporter: UserId,
    number: u64,
}

/// Definition of `bugreport`.
#[must_use]
pub fn definition() -> CommandDefinition {
    CommandDefinition::new("bugreport")
        .alias("br")
        .alias("bug")
        .description("Reports a bug to StatPixel")
        .argument(
            ArgumentSpec::new(
                "report",
                "A description of the bug",
                coercers::max_length(MAX_REPORT_LENGTH),
                "Your bug report must be within **1,000 characters**.",
            )
            .remaining()
            .overwrite(ArgKind::Text),
        )
        .body(BugReport)
        .listen(RESPONSE_EVENT, ReportResolved)
}

struct BugReport;

#[async_trait]
impl CommandBody for BugReport {
    async fn run(&self, ctx: &Invocation, args: Args) -> CommandResult {
        let Some(channel) = ctx.data.config.discord.bug_report_channel else {
            return Err(CommandError::user(
                "Bug reports are not being accepted right now.",
            ));
        };
        let report = args.text(0)?.unwrap_or_default();
        if report.trim().is_empty() {
            return Err(CommandError::user("You must describe the bug you found."));
        }

        let number = ctx.data.store.next_counter(COUNTER).await?;

        let server = ctx.guild.as_ref().map_or_else(
            || "**Direct Message** (no members)".to_string(),
            |g| format!("**{}**", escape_markdown(g.name.as_deref().unwrap_or("Unknown"))),
        );
        let embed = Embed::new()
            .with_author(format!("Bug report from {}", ctx.author.name))
            .with_description(report)
            .with_field("Server", server, true)
            .with_field("Channel", format!("<#{}>", ctx.origin.channel()), true)
            .with_footer(format!("Report #{number}"));

        let message = ctx.data.platform.send(channel, Reply::embed(embed)).await?;
        let payload = serde_json::to_value(ReportPayload {
            reporter: ctx.author.id,
            number,
        })
        .context("encoding bug report payload")?;

        ctx.data
            .reactions
            .register(
                ReactionHandler::new(channel, message, RESPONSE_EVENT)
                    .with_emojis([COMPLETED, INVALID])
                    .with_payload(payload)
                    .keep_reactions(),
            )
            .await?;
        for emoji in [COMPLETED, INVALID] {
            ctx.data.platform.react(channel, message, emoji).await?;
        }
        info!(number, reporter = %ctx.author.id, "Bug report submitted");

        Ok(Embed::description(format!(
            "Your bug report has been submitted. You will receive a **direct message** \
             from me once it has been resolved.\n\nBug Report ID: **#{number}**"
        ))
        .into())
    }
}

/// Resolves a report when staff react to it.
struct ReportResolved;

#[async_trait]
impl ReactionListener for ReportResolved {
    async fn handle(&self, ctx: &ReactionContext, event: ReactionEvent) -> anyhow::Result<()> {
        if event.kind != ReactionEventKind::Added {
            debug!(kind = ?event.kind, "Ignoring bug report event");
            return Ok(());
        }

        let payload: ReportPayload = serde_json::from_value(event.handler.payload.clone())
            .context("decoding bug report payload")?;
        let verdict = match event.emoji.as_ref().and_then(|e| e.name.as_deref()) {
            Some(COMPLETED) => "completed",
            _ => "invalid",
        };

        ctx.platform
            .delete_message(event.handler.channel, event.handler.message)
            .await?;

        let resolver = match event.user {
            Some(id) => ctx
                .platform
                .fetch_user(id)
                .await?
                .map_or_else(|| format!("<@{id}>"), |u| u.name),
            None => "staff".to_string(),
        };

        let embed = Embed::new()
            .with_author(format!("Resolved by {resolver}"))
            .with_description(format!(
                "Your bug report (**#{}**) has been marked as `{verdict}`.",
                payload.number
            ));
        ctx.platform
            .send_dm(payload.reporter, Reply::embed(embed))
            .await?;

        info!(number = payload.number, verdict, "Bug report resolved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{DispatchOutcome, Dispatcher};
    use crate::platform::EmojiRef;
    use crate::reactions::ReactionInput;
    use crate::test_utils::{PlatformCall, TestHarness};
    use statpixel_common::test_utils::discord_fixtures::*;

    #[tokio::test]
    async fn test_report_round_trip() {
        let harness = TestHarness::new(vec![definition()]).await;
        let dispatcher = Dispatcher::new(harness.data.clone());

        let outcome = dispatcher
            .handle_message(harness.guild_message(test_user_id(), "-br the bedwars card is blank"))
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Completed);

        let sent = harness.platform.sent();
        assert_eq!(sent.len(), 1);
        let (channel, report) = &sent[0];
        assert_eq!(
            report.embed.as_ref().unwrap().description.as_deref(),
            Some("the bedwars card is blank")
        );
        assert!(harness.platform.replies()[0].visible_text().contains("**#1**"));
        assert_eq!(harness.store.reaction_count(), 1);

        let message = harness
            .platform
            .calls()
            .into_iter()
            .find_map(|call| match call {
                PlatformCall::React(message, _) => Some(message),
                _ => None,
            })
            .unwrap();

        let fired = harness
            .data
            .reactions
            .on_reaction_add(ReactionInput {
                channel: *channel,
                message,
                user: test_admin_id(),
                user_is_bot: false,
                in_dm: false,
                emoji: EmojiRef::unicode(COMPLETED),
            })
            .await
            .unwrap();
        assert!(fired);
        assert_eq!(harness.store.reaction_count(), 0);

        let dms = harness.platform.direct_messages();
        assert_eq!(dms.len(), 1);
        assert_eq!(dms[0].0, test_user_id());
        assert!(dms[0].1.visible_text().contains("marked as `completed`"));
        assert!(harness
            .platform
            .calls()
            .contains(&PlatformCall::DeleteMessage(*channel, message)));
    }

    #[tokio::test]
    async fn test_report_numbers_increase() {
        let harness = TestHarness::new(vec![definition()]).await;
        let dispatcher = Dispatcher::new(harness.data.clone());

        for _ in 0..2 {
            dispatcher
                .handle_message(harness.guild_message(test_user_id(), "-bug broken"))
                .await
                .unwrap();
        }
        assert!(harness.platform.replies()[1].visible_text().contains("**#2**"));
    }

    #[tokio::test]
    async fn test_long_report_is_rejected() {
        let harness = TestHarness::new(vec![definition()]).await;
        let dispatcher = Dispatcher::new(harness.data.clone());
        let content = format!("-bugreport {}", "a".repeat(MAX_REPORT_LENGTH + 1));

        let outcome = dispatcher
            .handle_message(harness.guild_message(test_user_id(), &content))
            .await
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::Rejected(_)));
        assert!(harness.platform.sent().is_empty());
    }
}
