//! Splitting chat text into command tokens.

use statpixel_common::UserId;

/// Split `input` on whitespace, keeping double-quoted spans together.
///
/// A quoted span opens at `"` and closes at the first later `"` that ends a
/// word (followed by whitespace or the end of input), so quotes inside a
/// word do not close it. Inside a span, `""` stands for a literal quote.
/// A quoted span must hold at least one character.
#[must_use]
pub fn tokenize(input: &str) -> Vec<String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }

        if chars[i] == '"' {
            let close = (i + 2..chars.len()).find(|&j| {
                chars[j] == '"' && chars.get(j + 1).map_or(true, |c| c.is_whitespace())
            });
            if let Some(close) = close {
                let inner: String = chars[i + 1..close].iter().collect();
                tokens.push(inner.replace("\"\"", "\""));
                i = close + 1;
                continue;
            }
        }

        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() {
            i += 1;
        }
        tokens.push(chars[start..i].iter().collect());
    }

    tokens
}

/// If `content` starts with a mention of `bot`, return the text after it.
#[must_use]
pub fn strip_bot_mention(content: &str, bot: UserId) -> Option<&str> {
    let plain = format!("<@{bot}>");
    let nick = format!("<@!{bot}>");
    content
        .strip_prefix(plain.as_str())
        .or_else(|| content.strip_prefix(nick.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use statpixel_common::test_utils::property_testing::token_strategy;

    #[test]
    fn test_quoted_span_is_one_token() {
        assert_eq!(tokenize(r#"foo "bar baz" qux"#), vec!["foo", "bar baz", "qux"]);
    }

    #[test]
    fn test_quote_edge_cases() {
        assert_eq!(tokenize(r#""say ""hi""" now"#), vec![r#"say "hi""#, "now"]);
        assert_eq!(tokenize(r#""a b"c d""#), vec![r#"a b"c d"#]);
        assert_eq!(tokenize(r#""unterminated span"#), vec!["\"unterminated", "span"]);
        assert_eq!(tokenize(r#""" x"#), vec!["\"\"", "x"]);
        assert_eq!(tokenize("  a\tb\nc  "), vec!["a", "b", "c"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn test_strip_bot_mention() {
        let bot = UserId(111_111_111_111_111_111);
        assert_eq!(strip_bot_mention("<@111111111111111111> help", bot), Some(" help"));
        assert_eq!(strip_bot_mention("<@!111111111111111111>", bot), Some(""));
        assert_eq!(strip_bot_mention("<@222222222222222222> help", bot), None);
        assert_eq!(strip_bot_mention("-help", bot), None);
    }

    proptest! {
        #[test]
        fn prop_plain_words_round_trip(words in prop::collection::vec(token_strategy(), 0..8)) {
            let line = words.join(" ");
            prop_assert_eq!(tokenize(&line), words);
        }

        #[test]
        fn prop_quoting_preserves_spaces(left in token_strategy(), right in token_strategy()) {
            let input = format!("cmd \"{left} {right}\" tail");
            prop_assert_eq!(
                tokenize(&input),
                vec!["cmd".to_string(), format!("{left} {right}"), "tail".to_string()]
            );
        }
    }
}
