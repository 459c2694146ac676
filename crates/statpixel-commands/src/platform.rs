//! The chat platform seen from the engine.
//!
//! Everything the engine sends goes through [`ChatPlatform`]; the binary
//! crate implements it on top of the Discord REST client.

use crate::reply::Reply;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use statpixel_common::{ChannelId, InteractionId, MessageId, Result, UserId};

/// Where an invocation came from, and therefore where replies go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// A text message in a channel.
    Message {
        /// Channel the message was sent in.
        channel: ChannelId,
        /// The invoking message, referenced by replies.
        message: MessageId,
    },
    /// A slash command interaction.
    Interaction {
        /// Channel the interaction was used in.
        channel: ChannelId,
        /// Interaction id.
        id: InteractionId,
        /// Interaction token used for responses and follow-ups.
        token: String,
    },
}

impl Origin {
    /// Channel replies are delivered to.
    #[must_use]
    pub const fn channel(&self) -> ChannelId {
        match self {
            Self::Message { channel, .. } | Self::Interaction { channel, .. } => *channel,
        }
    }
}

/// A reaction emoji: unicode emoji carry only a name, custom emoji an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmojiRef {
    /// Unicode character(s) or custom emoji name.
    pub name: Option<String>,
    /// Custom emoji id.
    pub id: Option<u64>,
}

impl EmojiRef {
    /// A unicode emoji.
    pub fn unicode(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            id: None,
        }
    }

    /// Whether the emoji is named by `filter`, either by name or by id.
    #[must_use]
    pub fn matches(&self, filter: &[String]) -> bool {
        filter.iter().any(|entry| {
            self.name.as_deref() == Some(entry.as_str())
                || self.id.is_some_and(|id| id.to_string() == *entry)
        })
    }
}

/// A user as far as the engine cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformUser {
    /// User id.
    pub id: UserId,
    /// Display tag.
    pub name: String,
    /// Whether the account is a bot.
    pub bot: bool,
}

impl PlatformUser {
    /// A human user.
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            bot: false,
        }
    }
}

/// Outbound operations on the chat platform.
#[async_trait]
pub trait ChatPlatform: Send + Sync + 'static {
    /// Signal that work has started: typing for messages, a deferred
    /// response for interactions.
    async fn acknowledge(&self, origin: &Origin) -> Result<()>;

    /// Reply to an invocation.
    async fn respond(&self, origin: &Origin, reply: Reply) -> Result<()>;

    /// Send a message to a channel.
    async fn send(&self, channel: ChannelId, reply: Reply) -> Result<MessageId>;

    /// Send a direct message.
    async fn send_dm(&self, user: UserId, reply: Reply) -> Result<()>;

    /// Add the bot's own reaction to a message.
    async fn react(&self, channel: ChannelId, message: MessageId, emoji: &str) -> Result<()>;

    /// Remove a user's reaction from a message.
    async fn remove_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        user: UserId,
        emoji: &EmojiRef,
    ) -> Result<()>;

    /// Delete a message.
    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()>;

    /// Look up a user; `None` if no such user exists.
    async fn fetch_user(&self, user: UserId) -> Result<Option<PlatformUser>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emoji_matches_name_or_id() {
        let filter = vec!["✅".to_string(), "123".to_string()];
        assert!(EmojiRef::unicode("✅").matches(&filter));
        assert!(EmojiRef {
            name: Some("custom".into()),
            id: Some(123)
        }
        .matches(&filter));
        assert!(!EmojiRef::unicode("❌").matches(&filter));
    }
}
