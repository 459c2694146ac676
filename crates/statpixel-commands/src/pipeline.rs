//! The argument coercion pipeline.
//!
//! Arguments are checked strictly left to right against a shared positional
//! vector: a `remaining` argument reads every slot from its own onward, and
//! `overwrite` arguments replace their slot with the coerced value. The first
//! rendered rejection stops the pipeline.

use crate::argument::{ArgValue, ArgumentSpec, Coercion, RawInput};
use crate::context::Invocation;
use futures::FutureExt;
use statpixel_common::{Result, StatError};
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};

/// Outcome of checking one argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The argument was valid.
    Accepted,
    /// The slot was empty and the argument optional.
    Skipped,
    /// The argument was invalid; carries the rendered error.
    Rejected(String),
}

/// Runs argument descriptors over positional slots.
pub struct ArgumentPipeline;

fn build_input(spec: &ArgumentSpec, index: usize, positional: &[Option<ArgValue>]) -> RawInput {
    if !spec.is_remaining() {
        return positional
            .get(index)
            .and_then(Option::as_ref)
            .map_or(RawInput::Missing, |v| RawInput::Text(v.to_string()));
    }

    let tail: Vec<String> = positional
        .iter()
        .skip(index)
        .flatten()
        .map(ToString::to_string)
        .collect();
    let (start, stop) = spec.bounds();
    let start = start.unwrap_or(0).min(tail.len());
    let stop = stop.unwrap_or(tail.len()).clamp(start, tail.len());
    let slice = tail[start..stop].to_vec();

    if spec.is_array() {
        RawInput::List(slice)
    } else {
        RawInput::Text(slice.join(" "))
    }
}

fn render(template: &str, prefix: &str) -> String {
    template.replace("{prefix}", prefix)
}

impl ArgumentPipeline {
    /// Check argument `index` of the invoked command.
    pub async fn check(
        spec: &ArgumentSpec,
        index: usize,
        positional: &mut Vec<Option<ArgValue>>,
        ctx: &Invocation,
    ) -> StepOutcome {
        let present = positional.get(index).is_some_and(Option::is_some);
        if !present && spec.is_optional() {
            return StepOutcome::Skipped;
        }

        let input = build_input(spec, index, positional);
        let coerced = AssertUnwindSafe(spec.coercer().coerce(input, ctx))
            .catch_unwind()
            .await;

        let value = match coerced {
            Ok(Ok(Coercion::Accepted(ArgValue::Bool(false)) | Coercion::Rejected)) => None,
            Ok(Ok(Coercion::Accepted(value))) => Some(value),
            Ok(Err(e)) => {
                debug!(argument = spec.name(), error = %e, "Coercer failed");
                None
            }
            Err(_) => {
                warn!(argument = spec.name(), "Coercer panicked");
                None
            }
        };

        let Some(value) = value else {
            let template = spec.error_template();
            if template.is_empty() {
                // A raw token left in a typed slot would fail `verify`.
                if spec.is_overwrite() {
                    if let Some(slot) = positional.get_mut(index) {
                        *slot = None;
                    }
                }
                return StepOutcome::Accepted;
            }
            return StepOutcome::Rejected(render(template, ctx.prefix()));
        };

        if spec.is_overwrite() {
            let value = if spec.is_boolean() {
                ArgValue::Bool(value.is_truthy())
            } else {
                value
            };
            if positional.len() <= index {
                positional.resize(index + 1, None);
            }
            positional[index] = Some(value);
        }
        StepOutcome::Accepted
    }

    /// Check every argument in order, stopping at the first rendered rejection.
    pub async fn run(
        specs: &[ArgumentSpec],
        positional: &mut Vec<Option<ArgValue>>,
        ctx: &Invocation,
    ) -> std::result::Result<(), String> {
        for (index, spec) in specs.iter().enumerate() {
            if let StepOutcome::Rejected(error) = Self::check(spec, index, positional, ctx).await {
                return Err(error);
            }
        }
        Ok(())
    }

    /// Confirm every overwritten slot holds the kind its argument declares.
    pub fn verify(specs: &[ArgumentSpec], positional: &[Option<ArgValue>]) -> Result<()> {
        for (index, spec) in specs.iter().enumerate() {
            if !spec.is_overwrite() {
                continue;
            }
            if let Some(Some(value)) = positional.get(index) {
                if value.kind() != spec.kind() {
                    return Err(StatError::ArgumentType {
                        index,
                        expected: spec.kind().name(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::{ArgKind, Coercer};
    use crate::coercers;
    use crate::test_utils::TestHarness;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn slots(tokens: &[&str]) -> Vec<Option<ArgValue>> {
        tokens.iter().map(|t| Some(ArgValue::Text((*t).to_string()))).collect()
    }

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl Coercer for Counting {
        async fn coerce(&self, input: RawInput, _ctx: &Invocation) -> anyhow::Result<Coercion> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(Coercion::from_option(input.as_text().map(|s| ArgValue::Text(s.into()))))
        }
    }

    struct Panicking;

    #[async_trait]
    impl Coercer for Panicking {
        async fn coerce(&self, _input: RawInput, _ctx: &Invocation) -> anyhow::Result<Coercion> {
            panic!("lookup exploded");
        }
    }

    #[test]
    fn test_remaining_input_respects_bounds() {
        let spec = ArgumentSpec::new("rest", "", coercers::present(), "").remaining();
        let positional = slots(&["a", "b", "c", "d"]);
        assert_eq!(build_input(&spec, 1, &positional), RawInput::Text("b c d".into()));

        let spec = spec.array().slice(Some(1), Some(2));
        assert_eq!(build_input(&spec, 1, &positional), RawInput::List(vec!["c".into()]));

        let spec = ArgumentSpec::new("rest", "", coercers::present(), "")
            .remaining()
            .array()
            .slice(Some(9), None);
        assert_eq!(build_input(&spec, 0, &positional), RawInput::List(Vec::new()));
    }

    #[tokio::test]
    async fn test_rejection_stops_later_arguments() {
        let harness = TestHarness::new(Vec::new()).await;
        let ctx = harness.invocation();
        let calls = Arc::new(AtomicUsize::new(0));

        let specs = vec![
            ArgumentSpec::new("a", "", Counting(calls.clone()), "bad a"),
            ArgumentSpec::new("b", "", coercers::number(), "Use {prefix}help for b."),
            ArgumentSpec::new("c", "", Counting(calls.clone()), "bad c"),
        ];
        let mut positional = slots(&["x", "not-a-number", "z"]);

        let result = ArgumentPipeline::run(&specs, &mut positional, &ctx).await;
        assert_eq!(result, Err("Use -help for b.".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_optional_absent_is_skipped() {
        let harness = TestHarness::new(Vec::new()).await;
        let ctx = harness.invocation();
        let spec = ArgumentSpec::new("n", "", coercers::number(), "bad")
            .optional()
            .overwrite(ArgKind::Number);
        let mut positional = Vec::new();

        let outcome = ArgumentPipeline::check(&spec, 0, &mut positional, &ctx).await;
        assert_eq!(outcome, StepOutcome::Skipped);
        assert!(positional.is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_and_raw_slots() {
        let harness = TestHarness::new(Vec::new()).await;
        let ctx = harness.invocation();
        let specs = vec![
            ArgumentSpec::new("n", "", coercers::whole_number(), "bad").overwrite(ArgKind::Integer),
            ArgumentSpec::new("m", "", coercers::whole_number(), "bad"),
            ArgumentSpec::new("flag", "", coercers::present(), "bad")
                .overwrite(ArgKind::Text)
                .boolean(),
        ];
        let mut positional = slots(&["2.5", "7.2", "yes"]);

        ArgumentPipeline::run(&specs, &mut positional, &ctx).await.unwrap();
        assert_eq!(positional[0], Some(ArgValue::Integer(3)));
        assert_eq!(positional[1], Some(ArgValue::Text("7.2".into())));
        assert_eq!(positional[2], Some(ArgValue::Bool(true)));
        assert!(ArgumentPipeline::verify(&specs, &positional).is_ok());
    }

    #[tokio::test]
    async fn test_panicking_coercer_is_a_rejection() {
        let harness = TestHarness::new(Vec::new()).await;
        let ctx = harness.invocation();
        let spec = ArgumentSpec::new("p", "", Panicking, "nope");
        let mut positional = slots(&["x"]);

        let outcome = ArgumentPipeline::check(&spec, 0, &mut positional, &ctx).await;
        assert_eq!(outcome, StepOutcome::Rejected("nope".into()));
    }

    #[tokio::test]
    async fn test_empty_template_rejects_silently() {
        let harness = TestHarness::new(Vec::new()).await;
        let ctx = harness.invocation();
        let spec = ArgumentSpec::new("n", "", coercers::number(), "").overwrite(ArgKind::Number);
        let mut positional = slots(&["abc"]);

        let outcome = ArgumentPipeline::check(&spec, 0, &mut positional, &ctx).await;
        assert_eq!(outcome, StepOutcome::Accepted);
        assert_eq!(positional[0], None);
        assert!(ArgumentPipeline::verify(&[spec], &positional).is_ok());
    }

    #[test]
    fn test_verify_catches_kind_mismatch() {
        let spec = ArgumentSpec::new("n", "", coercers::number(), "").overwrite(ArgKind::Duration);
        let positional = vec![Some(ArgValue::Number(1.0))];
        assert!(ArgumentPipeline::verify(&[spec], &positional).is_err());
    }
}
