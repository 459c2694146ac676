//! Conversions between engine types and serenity models and builders.

use serenity::all::{
    CommandDataOption, CommandDataOptionValue, CommandOptionType, CreateCommand,
    CreateCommandOption, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, CreateMessage,
    EditInteractionResponse, EmojiId, ReactionType, User,
};
use statpixel_commands::schema::{SlashCommand, SlashOption, SlashOptionKind};
use statpixel_commands::{Embed, EmojiRef, PlatformUser, Reply};
use statpixel_common::UserId;
use std::collections::HashMap;

/// Build a serenity embed.
#[must_use]
pub fn create_embed(embed: &Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::new();
    if let Some(author) = &embed.author {
        builder = builder.author(CreateEmbedAuthor::new(author));
    }
    if let Some(title) = &embed.title {
        builder = builder.title(title);
    }
    if let Some(description) = &embed.description {
        builder = builder.description(description);
    }
    if let Some(colour) = embed.colour {
        builder = builder.colour(colour);
    }
    for field in &embed.fields {
        builder = builder.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &embed.footer {
        builder = builder.footer(CreateEmbedFooter::new(footer));
    }
    builder
}

/// Build a channel message.
#[must_use]
pub fn create_message(reply: &Reply) -> CreateMessage {
    let mut builder = CreateMessage::new();
    if let Some(content) = &reply.content {
        builder = builder.content(content);
    }
    if let Some(embed) = &reply.embed {
        builder = builder.embed(create_embed(embed));
    }
    builder
}

/// Build the edit that fills a deferred interaction response.
#[must_use]
pub fn edit_response(reply: &Reply) -> EditInteractionResponse {
    let mut builder = EditInteractionResponse::new();
    if let Some(content) = &reply.content {
        builder = builder.content(content);
    }
    if let Some(embed) = &reply.embed {
        builder = builder.embed(create_embed(embed));
    }
    builder
}

/// Engine view of a gateway emoji.
#[must_use]
pub fn emoji_ref(reaction: &ReactionType) -> EmojiRef {
    match reaction {
        ReactionType::Unicode(name) => EmojiRef::unicode(name.clone()),
        ReactionType::Custom { id, name, .. } => EmojiRef {
            name: name.clone(),
            id: Some(id.get()),
        },
        _ => EmojiRef {
            name: None,
            id: None,
        },
    }
}

/// Gateway form of an engine emoji.
#[must_use]
pub fn reaction_type(emoji: &EmojiRef) -> ReactionType {
    match emoji.id {
        Some(id) => ReactionType::Custom {
            animated: false,
            id: EmojiId::new(id),
            name: emoji.name.clone(),
        },
        None => ReactionType::Unicode(emoji.name.clone().unwrap_or_default()),
    }
}

/// Engine view of a Discord user.
#[must_use]
pub fn platform_user(user: &User) -> PlatformUser {
    PlatformUser {
        id: UserId(user.id.get()),
        name: user.tag(),
        bot: user.bot,
    }
}

fn option_kind(kind: SlashOptionKind) -> CommandOptionType {
    match kind {
        SlashOptionKind::SubCommandGroup => CommandOptionType::SubCommandGroup,
        SlashOptionKind::SubCommand => CommandOptionType::SubCommand,
        SlashOptionKind::String => CommandOptionType::String,
    }
}

fn create_option(option: &SlashOption) -> CreateCommandOption {
    let mut builder =
        CreateCommandOption::new(option_kind(option.kind), &option.name, &option.description);
    if option.kind == SlashOptionKind::String {
        builder = builder.required(option.required);
    }
    for nested in &option.options {
        builder = builder.add_sub_option(create_option(nested));
    }
    builder
}

/// Build the registration payload of a slash command.
#[must_use]
pub fn create_command(command: &SlashCommand) -> CreateCommand {
    command.options.iter().fold(
        CreateCommand::new(&command.name).description(&command.description),
        |builder, option| builder.add_option(create_option(option)),
    )
}

/// Split interaction options into the sub-command path and the string
/// values of the innermost command. Non-string values are rendered as text.
pub fn flatten_options(
    options: &[CommandDataOption],
    path: &mut Vec<String>,
    values: &mut HashMap<String, String>,
) {
    for option in options {
        let value = match &option.value {
            CommandDataOptionValue::SubCommand(nested)
            | CommandDataOptionValue::SubCommandGroup(nested) => {
                path.push(option.name.clone());
                flatten_options(nested, path, values);
                continue;
            }
            CommandDataOptionValue::String(text) => text.clone(),
            CommandDataOptionValue::Integer(n) => n.to_string(),
            CommandDataOptionValue::Number(n) => n.to_string(),
            CommandDataOptionValue::Boolean(b) => b.to_string(),
            CommandDataOptionValue::User(id) => id.get().to_string(),
            CommandDataOptionValue::Channel(id) => id.get().to_string(),
            CommandDataOptionValue::Role(id) => id.get().to_string(),
            CommandDataOptionValue::Mentionable(id) => id.get().to_string(),
            _ => continue,
        };
        values.insert(option.name.clone(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use statpixel_commands::Embed;

    #[test]
    fn test_emoji_conversions() {
        let unicode = ReactionType::Unicode("✅".into());
        assert_eq!(emoji_ref(&unicode), EmojiRef::unicode("✅"));
        assert_eq!(reaction_type(&EmojiRef::unicode("✅")), unicode);

        let custom = ReactionType::Custom {
            animated: false,
            id: EmojiId::new(42),
            name: Some("pog".into()),
        };
        let emoji = emoji_ref(&custom);
        assert_eq!(emoji.id, Some(42));
        assert_eq!(emoji.name.as_deref(), Some("pog"));
        assert_eq!(reaction_type(&emoji), custom);
    }

    #[test]
    fn test_embed_payload() {
        let embed = Embed::new()
            .with_title("Global Leaderboard")
            .with_colour(0x00_6d_ff)
            .with_field("1. help", "3 uses", true)
            .with_footer("Showing 25 of 30 commands");

        let payload = serde_json::to_value(create_embed(&embed)).unwrap();
        assert_eq!(payload["title"], "Global Leaderboard");
        assert_eq!(payload["color"], 0x00_6d_ff);
        assert_eq!(payload["fields"][0]["name"], "1. help");
        assert_eq!(payload["footer"]["text"], "Showing 25 of 30 commands");
        assert!(payload.get("description").is_none());
    }

    #[test]
    fn test_command_payload() {
        let command = SlashCommand {
            name: "bedwars".into(),
            description: "Bed Wars statistics".into(),
            options: vec![SlashOption {
                kind: SlashOptionKind::SubCommand,
                name: "solo".into(),
                description: "Solo mode".into(),
                required: false,
                options: vec![SlashOption {
                    kind: SlashOptionKind::String,
                    name: "player".into(),
                    description: "Player name".into(),
                    required: true,
                    options: Vec::new(),
                }],
            }],
        };

        let payload = serde_json::to_value(create_command(&command)).unwrap();
        assert_eq!(payload["name"], "bedwars");
        assert_eq!(payload["options"][0]["name"], "solo");
        assert_eq!(payload["options"][0]["options"][0]["name"], "player");
        assert_eq!(payload["options"][0]["options"][0]["required"], true);
    }

    #[test]
    fn test_flatten_options() {
        let options: Vec<CommandDataOption> = serde_json::from_value(json!([{
            "name": "solo",
            "type": 1,
            "options": [
                { "name": "player", "type": 3, "value": "Notch" },
                { "name": "page", "type": 4, "value": 2 }
            ]
        }]))
        .unwrap();

        let mut path = vec!["bedwars".to_string()];
        let mut values = HashMap::new();
        flatten_options(&options, &mut path, &mut values);

        assert_eq!(path, vec!["bedwars", "solo"]);
        assert_eq!(values.get("player").map(String::as_str), Some("Notch"));
        assert_eq!(values.get("page").map(String::as_str), Some("2"));
    }
}
