//! Argument descriptors, coerced values, and typed access for command bodies.

use crate::context::Invocation;
use crate::platform::PlatformUser;
use async_trait::async_trait;
use statpixel_common::{Result, StatError};
use std::fmt;
use std::sync::Arc;

/// A value in a positional argument slot.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// A raw token or coerced string.
    Text(String),
    /// A list of tokens.
    List(Vec<String>),
    /// A floating point number.
    Number(f64),
    /// A whole number.
    Integer(i64),
    /// A time span in milliseconds.
    Duration(u64),
    /// A resolved user.
    User(PlatformUser),
    /// A boolean flag.
    Bool(bool),
}

impl ArgValue {
    /// The kind of this value.
    #[must_use]
    pub const fn kind(&self) -> ArgKind {
        match self {
            Self::Text(_) => ArgKind::Text,
            Self::List(_) => ArgKind::List,
            Self::Number(_) => ArgKind::Number,
            Self::Integer(_) => ArgKind::Integer,
            Self::Duration(_) => ArgKind::Duration,
            Self::User(_) => ArgKind::User,
            Self::Bool(_) => ArgKind::Bool,
        }
    }

    /// Loose truthiness used when a boolean argument casts its value.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Text(s) => !s.is_empty(),
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Integer(n) => *n != 0,
            Self::Duration(ms) => *ms != 0,
            Self::Bool(b) => *b,
            Self::List(_) | Self::User(_) => true,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::List(items) => f.write_str(&items.join(" ")),
            Self::Number(n) => write!(f, "{n}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Duration(ms) => write!(f, "{ms}"),
            Self::User(user) => write!(f, "{}", user.id),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// The declared type of an argument slot after coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    /// [`ArgValue::Text`]
    Text,
    /// [`ArgValue::List`]
    List,
    /// [`ArgValue::Number`]
    Number,
    /// [`ArgValue::Integer`]
    Integer,
    /// [`ArgValue::Duration`]
    Duration,
    /// [`ArgValue::User`]
    User,
    /// [`ArgValue::Bool`]
    Bool,
}

impl ArgKind {
    /// Lower-case name used in type errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::List => "list",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Duration => "duration",
            Self::User => "user",
            Self::Bool => "boolean",
        }
    }
}

/// Input handed to a coercer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    /// The slot was empty.
    Missing,
    /// A single token, or remaining tokens joined by a space.
    Text(String),
    /// Remaining tokens for array arguments.
    List(Vec<String>),
}

impl RawInput {
    /// The text, if this is a single string.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Result of a single coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Coercion {
    /// The input is valid; the value may be written back to its slot.
    Accepted(ArgValue),
    /// The input is invalid.
    Rejected,
}

impl Coercion {
    /// Accept when `value` is present, reject otherwise.
    #[must_use]
    pub fn from_option(value: Option<ArgValue>) -> Self {
        value.map_or(Self::Rejected, Self::Accepted)
    }
}

/// Validates and converts raw input for one argument.
///
/// Coercers may perform I/O. Errors and panics are both treated as a
/// rejection by the pipeline.
#[async_trait]
pub trait Coercer: Send + Sync {
    /// Coerce `input` in the context of the running invocation.
    async fn coerce(&self, input: RawInput, ctx: &Invocation) -> anyhow::Result<Coercion>;
}

/// Adapts a synchronous closure into a [`Coercer`].
pub struct FnCoercer<F>(pub F);

#[async_trait]
impl<F> Coercer for FnCoercer<F>
where
    F: Fn(RawInput) -> Option<ArgValue> + Send + Sync,
{
    async fn coerce(&self, input: RawInput, _ctx: &Invocation) -> anyhow::Result<Coercion> {
        Ok(Coercion::from_option((self.0)(input)))
    }
}

/// Descriptor of one positional parameter.
#[derive(Clone)]
pub struct ArgumentSpec {
    name: String,
    description: String,
    coercer: Arc<dyn Coercer>,
    error: String,
    kind: ArgKind,
    optional: bool,
    remaining: bool,
    array: bool,
    overwrite: bool,
    boolean: bool,
    start_at: Option<usize>,
    stop_at: Option<usize>,
    schema_optional: Option<bool>,
}

impl fmt::Debug for ArgumentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("optional", &self.optional)
            .field("remaining", &self.remaining)
            .field("array", &self.array)
            .field("overwrite", &self.overwrite)
            .finish_non_exhaustive()
    }
}

impl ArgumentSpec {
    /// Create a required, single-token argument whose slot keeps its raw text.
    ///
    /// `error` may contain `{prefix}`. An empty `error` makes rejections
    /// silent: the pipeline moves on, clearing the slot if it is overwritten.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        coercer: impl Coercer + 'static,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            coercer: Arc::new(coercer),
            error: error.into(),
            kind: ArgKind::Text,
            optional: false,
            remaining: false,
            array: false,
            overwrite: false,
            boolean: false,
            start_at: None,
            stop_at: None,
            schema_optional: None,
        }
    }

    /// Create an argument from a synchronous coercion closure.
    pub fn from_fn<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        coerce: F,
        error: impl Into<String>,
    ) -> Self
    where
        F: Fn(RawInput) -> Option<ArgValue> + Send + Sync + 'static,
    {
        Self::new(name, description, FnCoercer(coerce), error)
    }

    /// Allow the slot to be absent.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Consume every remaining token instead of exactly one.
    #[must_use]
    pub const fn remaining(mut self) -> Self {
        self.remaining = true;
        self
    }

    /// Pass remaining tokens as a list rather than joined text.
    #[must_use]
    pub const fn array(mut self) -> Self {
        self.array = true;
        self
    }

    /// Write the coerced value back into the slot, declaring its kind.
    #[must_use]
    pub const fn overwrite(mut self, kind: ArgKind) -> Self {
        self.overwrite = true;
        self.kind = kind;
        self
    }

    /// Cast the written value to a boolean.
    #[must_use]
    pub const fn boolean(mut self) -> Self {
        self.boolean = true;
        self
    }

    /// Bound the remaining slice to `[start, stop)`.
    #[must_use]
    pub const fn slice(mut self, start: Option<usize>, stop: Option<usize>) -> Self {
        self.start_at = start;
        self.stop_at = stop;
        self
    }

    /// Override whether the slash option is optional.
    #[must_use]
    pub const fn schema_optional(mut self, optional: bool) -> Self {
        self.schema_optional = Some(optional);
        self
    }

    /// Parameter name, also the slash option name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Error template.
    #[must_use]
    pub fn error_template(&self) -> &str {
        &self.error
    }

    /// The coercer.
    #[must_use]
    pub fn coercer(&self) -> &dyn Coercer {
        self.coercer.as_ref()
    }

    /// Kind of the slot once this argument has run.
    #[must_use]
    pub const fn kind(&self) -> ArgKind {
        if self.overwrite && self.boolean {
            ArgKind::Bool
        } else {
            self.kind
        }
    }

    /// Whether the slot may be absent.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether remaining tokens are consumed.
    #[must_use]
    pub const fn is_remaining(&self) -> bool {
        self.remaining
    }

    /// Whether remaining tokens are passed as a list.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        self.array
    }

    /// Whether the coerced value replaces the raw token.
    #[must_use]
    pub const fn is_overwrite(&self) -> bool {
        self.overwrite
    }

    /// Whether the written value is cast to a boolean.
    #[must_use]
    pub const fn is_boolean(&self) -> bool {
        self.boolean
    }

    /// Bounds applied to the remaining slice.
    #[must_use]
    pub const fn bounds(&self) -> (Option<usize>, Option<usize>) {
        (self.start_at, self.stop_at)
    }

    /// Whether the slash option is optional.
    #[must_use]
    pub fn is_schema_optional(&self) -> bool {
        self.schema_optional.unwrap_or(self.optional)
    }
}

/// Positional arguments handed to a command body.
///
/// Typed accessors return `Ok(None)` for an empty slot and
/// [`StatError::ArgumentType`] when the slot holds another kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Vec<Option<ArgValue>>,
}

macro_rules! typed_accessor {
    ($(#[$meta:meta])* $fn:ident, $variant:ident, $kind:ident, $ty:ty, |$v:ident| $map:expr) => {
        $(#[$meta])*
        pub fn $fn(&self, index: usize) -> Result<Option<$ty>> {
            match self.get(index) {
                None => Ok(None),
                Some(ArgValue::$variant($v)) => Ok(Some($map)),
                Some(_) => Err(StatError::ArgumentType {
                    index,
                    expected: ArgKind::$kind.name(),
                }),
            }
        }
    };
}

impl Args {
    /// Wrap positional slots.
    #[must_use]
    pub const fn new(values: Vec<Option<ArgValue>>) -> Self {
        Self { values }
    }

    /// Slot `index`, if filled.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ArgValue> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Slots from `index` onward rendered as text and joined by spaces.
    #[must_use]
    pub fn joined_from(&self, index: usize) -> Option<String> {
        let parts: Vec<String> = self
            .values
            .iter()
            .skip(index)
            .flatten()
            .map(ToString::to_string)
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    /// The underlying slots.
    #[must_use]
    pub fn into_inner(self) -> Vec<Option<ArgValue>> {
        self.values
    }

    typed_accessor!(
        /// Text at `index`.
        text, Text, Text, &str, |v| v.as_str()
    );
    typed_accessor!(
        /// List at `index`.
        list, List, List, &[String], |v| v.as_slice()
    );
    typed_accessor!(
        /// Number at `index`.
        number, Number, Number, f64, |v| *v
    );
    typed_accessor!(
        /// Whole number at `index`.
        integer, Integer, Integer, i64, |v| *v
    );
    typed_accessor!(
        /// Milliseconds at `index`.
        duration, Duration, Duration, u64, |v| *v
    );
    typed_accessor!(
        /// User at `index`.
        user, User, User, &PlatformUser, |v| v
    );
    typed_accessor!(
        /// Flag at `index`.
        flag, Bool, Bool, bool, |v| *v
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Option<ArgValue> {
        Some(ArgValue::Text(s.to_string()))
    }

    #[test]
    fn test_typed_access_checks_kind() {
        let args = Args::new(vec![text("a"), None, Some(ArgValue::Duration(5))]);

        assert_eq!(args.text(0).unwrap(), Some("a"));
        assert_eq!(args.duration(1).unwrap(), None);
        assert_eq!(args.duration(2).unwrap(), Some(5));
        assert_eq!(args.duration(9).unwrap(), None);

        let err = args.user(0).unwrap_err();
        assert!(matches!(
            err,
            StatError::ArgumentType {
                index: 0,
                expected: "user"
            }
        ));
    }

    #[test]
    fn test_joined_from_skips_empty_slots() {
        let args = Args::new(vec![text("id"), None, text("spamming"), text("again")]);
        assert_eq!(args.joined_from(1).as_deref(), Some("spamming again"));
        assert_eq!(args.joined_from(4), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!ArgValue::Text(String::new()).is_truthy());
        assert!(!ArgValue::Integer(0).is_truthy());
        assert!(!ArgValue::Number(f64::NAN).is_truthy());
        assert!(ArgValue::List(Vec::new()).is_truthy());
    }

    #[test]
    fn test_spec_kind_and_schema_flags() {
        let spec = ArgumentSpec::from_fn("d", "", |_| None, "").optional();
        assert_eq!(spec.kind(), ArgKind::Text);
        assert!(spec.is_schema_optional());

        let spec = spec.overwrite(ArgKind::Duration).schema_optional(false);
        assert_eq!(spec.kind(), ArgKind::Duration);
        assert!(!spec.is_schema_optional());

        assert_eq!(spec.boolean().kind(), ArgKind::Bool);
    }
}
