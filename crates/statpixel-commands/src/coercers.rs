//! Standard coercers shared by command definitions.

use crate::argument::{ArgValue, Coercer, Coercion, FnCoercer, RawInput};
use crate::context::Invocation;
use async_trait::async_trait;
use statpixel_common::{parse_snowflake, strip_mention, UserId};

/// Parse the longest leading decimal number, ignoring leading whitespace.
///
/// `"12.5kg"` parses as `12.5`; input without a leading number yields `None`.
#[must_use]
pub fn parse_leading_float(input: &str) -> Option<f64> {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Sum every `<digits><unit>` pair in `input` into milliseconds.
///
/// Units are `s`, `m`, `h`, `d` and `w`. Returns `None` when no pair is found.
#[must_use]
pub fn parse_time_span(input: &str) -> Option<u64> {
    let mut total: u64 = 0;
    let mut matched = false;
    let mut digits = String::new();

    for c in input.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c {
            's' => Some(1_000),
            'm' => Some(60_000),
            'h' => Some(3_600_000),
            'd' => Some(86_400_000),
            'w' => Some(604_800_000),
            _ => None,
        };
        if let (Some(unit), false) = (unit, digits.is_empty()) {
            let amount: u64 = digits.parse().ok()?;
            total = total.checked_add(amount.checked_mul(unit)?)?;
            matched = true;
        }
        digits.clear();
    }

    matched.then_some(total)
}

#[allow(clippy::cast_possible_truncation)]
fn js_round(n: f64) -> i64 {
    (n + 0.5).floor() as i64
}

/// Round `n`, refusing non-zero input that rounds to zero.
#[allow(clippy::float_cmp)]
fn round_nonvanishing(n: f64) -> Option<i64> {
    let rounded = js_round(n);
    (n == 0.0 || rounded != 0).then_some(rounded)
}

/// Any leading number.
pub fn number() -> impl Coercer {
    FnCoercer(|input: RawInput| {
        input
            .as_text()
            .and_then(parse_leading_float)
            .map(ArgValue::Number)
    })
}

/// A number rounded to the nearest whole number.
pub fn whole_number() -> impl Coercer {
    FnCoercer(|input: RawInput| {
        input
            .as_text()
            .and_then(parse_leading_float)
            .filter(|n| n.is_finite())
            .and_then(round_nonvanishing)
            .map(ArgValue::Integer)
    })
}

/// The absolute value of a number, rounded to a whole number.
pub fn positive_integer() -> impl Coercer {
    FnCoercer(|input: RawInput| {
        input
            .as_text()
            .and_then(parse_leading_float)
            .filter(|n| n.is_finite())
            .and_then(|n| round_nonvanishing(n.abs()))
            .map(ArgValue::Integer)
    })
}

/// The absolute value of a number.
pub fn positive_number() -> impl Coercer {
    FnCoercer(|input: RawInput| {
        input
            .as_text()
            .and_then(parse_leading_float)
            .map(|n| ArgValue::Number(n.abs()))
    })
}

/// Accepts anything that is present.
pub fn present() -> impl Coercer {
    FnCoercer(|input: RawInput| match input {
        RawInput::Missing => None,
        RawInput::Text(s) => Some(ArgValue::Text(s)),
        RawInput::List(items) => Some(ArgValue::List(items)),
    })
}

/// Lower-cases text.
pub fn lowercase() -> impl Coercer {
    FnCoercer(|input: RawInput| input.as_text().map(|s| ArgValue::Text(s.to_lowercase())))
}

/// A non-empty time span such as `1h30m`, in milliseconds.
pub fn time_span() -> impl Coercer {
    FnCoercer(|input: RawInput| {
        input
            .as_text()
            .and_then(parse_time_span)
            .filter(|&ms| ms > 0)
            .map(ArgValue::Duration)
    })
}

/// Text no longer than `max` characters.
pub fn max_length(max: usize) -> impl Coercer {
    FnCoercer(move |input: RawInput| {
        input
            .as_text()
            .filter(|s| s.chars().count() <= max)
            .map(|s| ArgValue::Text(s.to_string()))
    })
}

/// A user given by id or mention, resolved through the chat platform.
pub struct UserCoercer;

/// Construct a [`UserCoercer`].
#[must_use]
pub const fn user() -> UserCoercer {
    UserCoercer
}

#[async_trait]
impl Coercer for UserCoercer {
    async fn coerce(&self, input: RawInput, ctx: &Invocation) -> anyhow::Result<Coercion> {
        let Some(id) = input.as_text().map(strip_mention).and_then(parse_snowflake) else {
            return Ok(Coercion::Rejected);
        };

        let user = ctx.data.platform.fetch_user(UserId(id)).await?;
        Ok(Coercion::from_option(user.map(ArgValue::User)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestHarness;

    #[test]
    fn test_parse_leading_float() {
        assert_eq!(parse_leading_float("12"), Some(12.0));
        assert_eq!(parse_leading_float("  -3.5xyz"), Some(-3.5));
        assert_eq!(parse_leading_float(".5"), Some(0.5));
        assert_eq!(parse_leading_float("1e3"), Some(1000.0));
        assert_eq!(parse_leading_float("1e"), Some(1.0));
        assert_eq!(parse_leading_float("abc"), None);
        assert_eq!(parse_leading_float("-"), None);
        assert_eq!(parse_leading_float("."), None);
    }

    #[test]
    fn test_parse_time_span() {
        assert_eq!(parse_time_span("1h"), Some(3_600_000));
        assert_eq!(parse_time_span("1h30m"), Some(5_400_000));
        assert_eq!(parse_time_span("2w 1d"), Some(1_296_000_000));
        assert_eq!(parse_time_span("10x5s"), Some(5_000));
        assert_eq!(parse_time_span("forever"), None);
        assert_eq!(parse_time_span("h"), None);
    }

    async fn coerce(coercer: impl Coercer, text: &str) -> Coercion {
        let harness = TestHarness::new(Vec::new()).await;
        coercer
            .coerce(RawInput::Text(text.to_string()), &harness.invocation())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_rounding_to_zero_rejects() {
        assert_eq!(coerce(whole_number(), "0.4").await, Coercion::Rejected);
        assert_eq!(coerce(whole_number(), "-0.4").await, Coercion::Rejected);
        assert_eq!(coerce(positive_integer(), "-0.2").await, Coercion::Rejected);
        assert_eq!(
            coerce(whole_number(), "0").await,
            Coercion::Accepted(ArgValue::Integer(0))
        );
        assert_eq!(
            coerce(positive_integer(), "-2.6").await,
            Coercion::Accepted(ArgValue::Integer(3))
        );
    }

    #[tokio::test]
    async fn test_zero_time_span_rejects() {
        assert_eq!(coerce(time_span(), "0s").await, Coercion::Rejected);
        assert_eq!(coerce(time_span(), "0h0m").await, Coercion::Rejected);
        assert_eq!(
            coerce(time_span(), "0h5m").await,
            Coercion::Accepted(ArgValue::Duration(300_000))
        );
    }

    #[test]
    fn test_js_round_matches_half_up() {
        assert_eq!(js_round(2.5), 3);
        assert_eq!(js_round(-2.5), -2);
        assert_eq!(js_round(2.4), 2);
    }
}
