//! Test helpers for engine tests
//!
//! Small step-program builders shared across the suite.

use serde_json::Value as JsonValue;

use crate::engine::{StepContext, StepFault, StepFn, StepProgram, StepSignal};

/// Program that settles on the first step with a fixed value.
pub fn complete_with(value: JsonValue) -> impl StepProgram {
    StepFn(move |ctx: &mut StepContext<'_>| {
        ctx.complete(value.clone());
        Ok(StepSignal::Continue)
    })
}

/// Program that must never be stepped. Used to show that operations
/// like force-return bypass the remaining steps entirely.
pub fn never_stepped() -> impl StepProgram {
    StepFn(|_ctx: &mut StepContext<'_>| {
        Err(StepFault::Malformed("step should not have run".to_string()))
    })
}

/// Program that yields its payload once, then completes with whatever
/// value it is resumed with.
pub fn echo_after_one_yield() -> impl StepProgram {
    StepFn(|ctx: &mut StepContext<'_>| match ctx.cursor().position() {
        1 => {
            let payload = ctx.payload().clone();
            ctx.advance();
            Ok(StepSignal::Yield(payload))
        }
        2 => {
            let value = ctx.take_input();
            ctx.complete(value);
            Ok(StepSignal::Continue)
        }
        other => Err(StepFault::Malformed(format!("no step at {other}"))),
    })
}
