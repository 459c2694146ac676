//! Banning users from the bot.

use crate::argument::{ArgKind, Args, ArgumentSpec};
use crate::coercers;
use crate::context::Invocation;
use crate::definition::{CommandBody, CommandDefinition};
use crate::error::{CommandError, CommandResult};
use crate::platform::PlatformUser;
use crate::reply::Embed;
use crate::store::BanExpiry;
use crate::tree::PermissionTier;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use statpixel_common::{escape_markdown, relative_timestamp};
use tracing::info;

const INVALID_USER: &str = "You did not provide a valid user id.";

fn user_argument(name: &str) -> ArgumentSpec {
    ArgumentSpec::new(
        name,
        "The snowflake identifier of a user",
        coercers::user(),
        INVALID_USER,
    )
    .overwrite(ArgKind::User)
}

fn target(args: &Args) -> Result<PlatformUser, CommandError> {
    args.user(0)?
        .cloned()
        .ok_or_else(|| anyhow!("user slot empty after coercion").into())
}

/// Definition of `ban`.
#[must_use]
pub fn ban() -> CommandDefinition {
    CommandDefinition::new("ban")
        .description("Bans a user from using StatPixel")
        .tier(PermissionTier::Admin)
        .argument(user_argument("id"))
        .argument(
            ArgumentSpec::new(
                "duration",
                "The duration of the ban",
                coercers::time_span(),
                "You did not provide a valid time.",
            )
            .overwrite(ArgKind::Duration)
            .optional(),
        )
        .argument(
            ArgumentSpec::new("reason", "The reason for the ban", coercers::present(), "")
                .remaining()
                .optional(),
        )
        .body(Ban)
}

/// Definition of `unban`.
#[must_use]
pub fn unban() -> CommandDefinition {
    CommandDefinition::new("unban")
        .description("Unbans a user from using StatPixel")
        .tier(PermissionTier::Admin)
        .argument(user_argument("user"))
        .body(Unban)
}

struct Ban;

#[async_trait]
impl CommandBody for Ban {
    async fn run(&self, ctx: &Invocation, args: Args) -> CommandResult {
        let user = target(&args)?;
        if ctx.data.permissions.is_admin(user.id) {
            return Err(CommandError::user(format!(
                "You are not allowed to ban **{}**.",
                escape_markdown(&user.name)
            )));
        }

        let expiry = match args.duration(1)? {
            Some(ms) => {
                let ms = i64::try_from(ms).map_err(anyhow::Error::from)?;
                BanExpiry::Until(Utc::now() + chrono::Duration::milliseconds(ms))
            }
            None => BanExpiry::Permanent,
        };
        let reason = args.joined_from(2);

        ctx.data
            .store
            .set_ban(user.id, Some(expiry), reason.clone())
            .await?;
        info!(user = %user.id, by = %ctx.author.id, ?expiry, "User banned");

        let length = match expiry {
            BanExpiry::Until(at) => format!("banned until {}", relative_timestamp(at)),
            BanExpiry::Permanent => "permanently banned".to_string(),
        };
        let reason = reason.map_or_else(String::new, |r| format!(" for `{r}`"));

        Ok(Embed::new()
            .with_author(user.name.clone())
            .with_description(format!(
                "**{}** has been {length}{reason}.",
                escape_markdown(&user.name)
            ))
            .into())
    }
}

struct Unban;

#[async_trait]
impl CommandBody for Unban {
    async fn run(&self, ctx: &Invocation, args: Args) -> CommandResult {
        let user = target(&args)?;
        ctx.data.store.set_ban(user.id, None, None).await?;
        info!(user = %user.id, by = %ctx.author.id, "User unbanned");

        Ok(Embed::new()
            .with_author(user.name.clone())
            .with_description(format!(
                "**{}** has been unbanned.",
                escape_markdown(&user.name)
            ))
            .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::ArgValue;
    use crate::store::ModerationStore;
    use crate::test_utils::TestHarness;
    use statpixel_common::test_utils::discord_fixtures::*;

    fn args(values: Vec<Option<ArgValue>>) -> Args {
        Args::new(values)
    }

    #[tokio::test]
    async fn test_ban_with_duration_and_reason() {
        let harness = TestHarness::new(Vec::new()).await;
        let ctx = harness.invocation();
        let target = PlatformUser::new(test_user_id(), "spammer");

        let output = Ban
            .run(
                &ctx,
                args(vec![
                    Some(ArgValue::User(target)),
                    Some(ArgValue::Duration(3_600_000)),
                    Some(ArgValue::Text("spamming".into())),
                ]),
            )
            .await
            .unwrap();
        let text = output.into_reply().unwrap().visible_text();
        assert!(text.contains("**spammer** has been banned until <t:"));
        assert!(text.ends_with("for `spamming`."));

        let record = harness.store.moderation(test_user_id()).await.unwrap().unwrap();
        assert!(matches!(record.banned_until, Some(BanExpiry::Until(_))));
        assert_eq!(record.reason.as_deref(), Some("spamming"));
    }

    #[tokio::test]
    async fn test_permanent_ban_and_unban() {
        let harness = TestHarness::new(Vec::new()).await;
        let ctx = harness.invocation();
        let target = PlatformUser::new(test_user_id(), "spammer");

        Ban.run(&ctx, args(vec![Some(ArgValue::User(target.clone()))]))
            .await
            .unwrap();
        let record = harness.store.moderation(test_user_id()).await.unwrap().unwrap();
        assert_eq!(record.banned_until, Some(BanExpiry::Permanent));

        Unban
            .run(&ctx, args(vec![Some(ArgValue::User(target))]))
            .await
            .unwrap();
        let record = harness.store.moderation(test_user_id()).await.unwrap().unwrap();
        assert!(record.active_ban(Utc::now()).is_none());
    }

    #[tokio::test]
    async fn test_admins_cannot_be_banned() {
        let harness = TestHarness::new(Vec::new()).await;
        let ctx = harness.invocation();
        let admin = PlatformUser::new(test_admin_id(), "staff");

        let err = Ban
            .run(&ctx, args(vec![Some(ArgValue::User(admin))]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You are not allowed to ban **staff**.");
        assert!(harness.store.moderation(test_admin_id()).await.unwrap().is_none());
    }
}
