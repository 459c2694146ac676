//! Shared utility functions for message formatting and id parsing.

use chrono::{DateTime, Utc};

/// Renders a timestamp as a Discord relative-time marker (e.g. "in 3 hours").
pub fn relative_timestamp(timestamp: DateTime<Utc>) -> String {
    format!("<t:{}:R>", timestamp.timestamp())
}

/// Escapes Discord markdown control characters.
pub fn escape_markdown(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '*' | '_' | '`' | '~' | '|' | '\\' | '>') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Parses a bare snowflake of 17 to 19 digits.
pub fn parse_snowflake(input: &str) -> Option<u64> {
    if !(17..=19).contains(&input.len()) || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    input.parse().ok()
}

/// Extracts the id from a mention such as `<@!123>` or `<:name:123>`, falling
/// back to the input itself.
pub fn strip_mention(input: &str) -> &str {
    input
        .strip_suffix('>')
        .and_then(|body| {
            let start = body
                .char_indices()
                .rev()
                .take_while(|(_, c)| c.is_ascii_digit())
                .last()
                .map(|(i, _)| i)?;
            Some(&body[start..])
        })
        .unwrap_or(input)
}
