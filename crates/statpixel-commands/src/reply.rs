//! Outbound message model shared by command bodies and the chat platform.

use serde::{Deserialize, Serialize};

/// A field inside an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    /// Field title.
    pub name: String,
    /// Field body.
    pub value: String,
    /// Whether the field is laid out inline.
    pub inline: bool,
}

/// Rich embed content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    /// Author line shown above the title.
    pub author: Option<String>,
    /// Embed title.
    pub title: Option<String>,
    /// Embed body.
    pub description: Option<String>,
    /// Side colour; filled from guild settings when unset.
    pub colour: Option<u32>,
    /// Embed fields.
    pub fields: Vec<EmbedField>,
    /// Footer text.
    pub footer: Option<String>,
}

impl Embed {
    /// Create an empty embed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an embed holding only a description.
    pub fn description(text: impl Into<String>) -> Self {
        Self {
            description: Some(text.into()),
            ..Self::default()
        }
    }

    /// Set the author line.
    #[must_use]
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Set the colour.
    #[must_use]
    pub const fn with_colour(mut self, colour: u32) -> Self {
        self.colour = Some(colour);
        self
    }

    /// Append a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    /// Set the footer.
    #[must_use]
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

/// A message to deliver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// Plain message content.
    pub content: Option<String>,
    /// Optional embed.
    pub embed: Option<Embed>,
}

impl Reply {
    /// A reply with plain content only.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embed: None,
        }
    }

    /// A reply carrying a single embed.
    #[must_use]
    pub const fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embed: Some(embed),
        }
    }

    /// Fill the embed colour if the body left it unset.
    #[must_use]
    pub fn with_default_colour(mut self, colour: Option<u32>) -> Self {
        if let (Some(embed), Some(colour)) = (self.embed.as_mut(), colour) {
            embed.colour.get_or_insert(colour);
        }
        self
    }

    /// Text of the reply as a user would read it.
    #[must_use]
    pub fn visible_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(content) = &self.content {
            parts.push(content.clone());
        }
        if let Some(embed) = &self.embed {
            parts.extend(embed.author.clone());
            parts.extend(embed.title.clone());
            parts.extend(embed.description.clone());
            for field in &embed.fields {
                parts.push(format!("{}: {}", field.name, field.value));
            }
        }
        parts.join("\n")
    }
}

/// What a command body hands back to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Nothing to send.
    None,
    /// A plain description, wrapped in an embed.
    Text(String),
    /// A structured reply forwarded as-is.
    Reply(Reply),
}

impl CommandOutput {
    /// Convert into the reply to send, if any.
    #[must_use]
    pub fn into_reply(self) -> Option<Reply> {
        match self {
            Self::None => None,
            Self::Text(text) => Some(Reply::embed(Embed::description(text))),
            Self::Reply(reply) => Some(reply),
        }
    }
}

impl From<String> for CommandOutput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for CommandOutput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Reply> for CommandOutput {
    fn from(reply: Reply) -> Self {
        Self::Reply(reply)
    }
}

impl From<Embed> for CommandOutput {
    fn from(embed: Embed) -> Self {
        Self::Reply(Reply::embed(embed))
    }
}
