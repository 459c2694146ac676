//! Permission gate run before every command.

use crate::context::GuildContext;
use crate::metrics::UsageRecorder;
use crate::reply::{Embed, Reply};
use crate::store::{BanExpiry, Store};
use crate::tree::{CommandNode, PermissionTier};
use chrono::Utc;
use statpixel_common::{relative_timestamp, Result, UserId};
use statpixel_config::Config;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Reply for owner-tier commands used outside a guild.
pub const GUILD_ONLY: &str = "This command can only be run in a server.";
/// Reply for owner-tier commands used by someone other than the owner.
pub const OWNER_ONLY: &str = "Only the owner of this server can run this command.";

/// Result of a permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Run the command.
    Allow,
    /// The user is banned; send the notice.
    Banned(Reply),
    /// Refuse, with a reply unless silent.
    Deny(Option<Reply>),
}

/// Checks bans and permission tiers, and records usage for allowed commands.
pub struct PermissionGate {
    admins: HashSet<UserId>,
    store: Arc<dyn Store>,
    usage: UsageRecorder,
}

fn ban_notice(ban: BanExpiry) -> Reply {
    let until = match ban {
        BanExpiry::Until(at) => relative_timestamp(at),
        BanExpiry::Permanent => "**Never**".to_string(),
    };

    Reply::text(format!(
        "**Uh oh!**\n\n\
         It looks like you've been banned from using StatPixel. You can appeal your \
         punishment by contacting a member of staff in our Support Discord.\n\
         Please note, the reasoning behind your ban has been logged.\n\n\
         Unbanned: {until}"
    ))
}

impl PermissionGate {
    /// Create a gate from the configured administrators.
    #[must_use]
    pub fn new(config: &Config, store: Arc<dyn Store>) -> Self {
        Self {
            admins: config.discord.admin_ids.iter().copied().collect(),
            usage: UsageRecorder::new(Arc::clone(&store)),
            store,
        }
    }

    /// Whether `user` is a configured administrator.
    #[must_use]
    pub fn is_admin(&self, user: UserId) -> bool {
        self.admins.contains(&user)
    }

    /// Usage recorder.
    #[must_use]
    pub const fn usage(&self) -> &UsageRecorder {
        &self.usage
    }

    /// Check whether `user` may run `command`.
    ///
    /// On [`GateDecision::Allow`] the usage counters are incremented in the
    /// background; `bot_id` scopes per-user usage outside guilds.
    pub async fn check(
        &self,
        user: UserId,
        guild: Option<&GuildContext>,
        command: &CommandNode,
        bot_id: UserId,
    ) -> Result<GateDecision> {
        if let Some(record) = self.store.moderation(user).await? {
            if let Some(ban) = record.active_ban(Utc::now()) {
                debug!(%user, command = command.path(), "Banned user denied");
                return Ok(GateDecision::Banned(ban_notice(ban)));
            }
        }

        let privileged = self.is_admin(user);

        match command.tier() {
            PermissionTier::Admin if !privileged => {
                debug!(%user, command = command.path(), "Admin command denied silently");
                return Ok(GateDecision::Deny(None));
            }
            PermissionTier::Owner => {
                let Some(guild) = guild else {
                    return Ok(GateDecision::Deny(Some(Reply::embed(Embed::description(
                        GUILD_ONLY,
                    )))));
                };
                if !privileged && guild.owner_id != user {
                    debug!(%user, command = command.path(), "Owner command denied");
                    return Ok(GateDecision::Deny(Some(Reply::embed(Embed::description(
                        OWNER_ONLY,
                    )))));
                }
            }
            _ => {}
        }

        let scope = guild.map_or(bot_id.get(), |g| g.id.get());
        self.usage.record(command.path(), user, scope);
        Ok(GateDecision::Allow)
    }
}
