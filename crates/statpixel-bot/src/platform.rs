//! The engine's chat platform implemented over the Discord REST client.

use crate::convert::{create_message, edit_response, platform_user, reaction_type};
use async_trait::async_trait;
use serenity::all::{
    ChannelId as DiscordChannel, CreateInteractionResponse, CreateInteractionResponseMessage,
    Http, HttpError, InteractionId as DiscordInteraction, MessageId as DiscordMessage,
    UserId as DiscordUser,
};
use statpixel_commands::{ChatPlatform, EmojiRef, Origin, PlatformUser, Reply};
use statpixel_common::{ChannelId, MessageId, Result, StatError, UserId};
use std::sync::Arc;
use tracing::debug;

fn platform_error(action: &str) -> impl FnOnce(serenity::Error) -> StatError + '_ {
    move |e| StatError::platform_with_source(format!("failed to {action}"), e)
}

fn is_not_found(error: &serenity::Error) -> bool {
    matches!(
        error,
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 404
    )
}

/// [`ChatPlatform`] backed by serenity's HTTP client.
#[derive(Clone)]
pub struct SerenityPlatform {
    http: Arc<Http>,
}

impl SerenityPlatform {
    /// Wrap a REST client.
    #[must_use]
    pub const fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn http(&self) -> &Http {
        &self.http
    }
}

#[async_trait]
impl ChatPlatform for SerenityPlatform {
    async fn acknowledge(&self, origin: &Origin) -> Result<()> {
        match origin {
            Origin::Message { channel, .. } => self
                .http()
                .broadcast_typing(DiscordChannel::new(channel.get()))
                .await
                .map_err(platform_error("send typing indicator")),
            Origin::Interaction { id, token, .. } => {
                let response =
                    CreateInteractionResponse::Defer(CreateInteractionResponseMessage::new());
                self.http()
                    .create_interaction_response(
                        DiscordInteraction::new(id.get()),
                        token,
                        &response,
                        Vec::new(),
                    )
                    .await
                    .map_err(platform_error("defer interaction"))
            }
        }
    }

    async fn respond(&self, origin: &Origin, reply: Reply) -> Result<()> {
        match origin {
            Origin::Message { channel, message } => {
                let channel = DiscordChannel::new(channel.get());
                let builder = create_message(&reply)
                    .reference_message((channel, DiscordMessage::new(message.get())));
                channel
                    .send_message(self.http(), builder)
                    .await
                    .map_err(platform_error("reply to message"))?;
            }
            Origin::Interaction { token, .. } => {
                self.http()
                    .edit_original_interaction_response(token, &edit_response(&reply), Vec::new())
                    .await
                    .map_err(platform_error("respond to interaction"))?;
            }
        }
        Ok(())
    }

    async fn send(&self, channel: ChannelId, reply: Reply) -> Result<MessageId> {
        let message = DiscordChannel::new(channel.get())
            .send_message(self.http(), create_message(&reply))
            .await
            .map_err(platform_error("send message"))?;
        Ok(MessageId(message.id.get()))
    }

    async fn send_dm(&self, user: UserId, reply: Reply) -> Result<()> {
        DiscordUser::new(user.get())
            .direct_message(self.http(), create_message(&reply))
            .await
            .map_err(platform_error("send direct message"))?;
        Ok(())
    }

    async fn react(&self, channel: ChannelId, message: MessageId, emoji: &str) -> Result<()> {
        self.http()
            .create_reaction(
                DiscordChannel::new(channel.get()),
                DiscordMessage::new(message.get()),
                &reaction_type(&EmojiRef::unicode(emoji)),
            )
            .await
            .map_err(platform_error("add reaction"))
    }

    async fn remove_reaction(
        &self,
        channel: ChannelId,
        message: MessageId,
        user: UserId,
        emoji: &EmojiRef,
    ) -> Result<()> {
        self.http()
            .delete_reaction(
                DiscordChannel::new(channel.get()),
                DiscordMessage::new(message.get()),
                DiscordUser::new(user.get()),
                &reaction_type(emoji),
            )
            .await
            .map_err(platform_error("remove reaction"))
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()> {
        self.http()
            .delete_message(
                DiscordChannel::new(channel.get()),
                DiscordMessage::new(message.get()),
                None,
            )
            .await
            .map_err(platform_error("delete message"))
    }

    async fn fetch_user(&self, user: UserId) -> Result<Option<PlatformUser>> {
        match self.http().get_user(DiscordUser::new(user.get())).await {
            Ok(found) => Ok(Some(platform_user(&found))),
            Err(e) if is_not_found(&e) => {
                debug!(%user, "User does not exist");
                Ok(None)
            }
            Err(e) => Err(platform_error("fetch user")(e)),
        }
    }
}
