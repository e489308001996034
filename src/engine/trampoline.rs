//! Trampoline driver
//!
//! This module contains the drive() function, the loop that advances a
//! computation step by step instead of relying on call-stack recursion
//! or native suspension. It runs until a step yields a value to the
//! caller or the cursor reaches the terminal position, then selects the
//! resumption outcome from the completion slot.

use serde_json::Value as JsonValue;

use super::errors::{EngineError, StepFault};
use super::state::{Completion, ExecutionState};
use super::step::{StepContext, StepProgram, StepSignal};

/* ===================== Resume Outcome ===================== */

/// Result of one resumption operation as seen by the external driver.
#[derive(Debug, Clone, PartialEq)]
pub enum ResumeOutcome {
    /// The computation yielded a value and is waiting to be resumed.
    Suspended(JsonValue),
    /// The computation settled with this final value.
    Completed(JsonValue),
}

/* ===================== Driver ===================== */

/// Advance the computation until it suspends or settles.
///
/// Expects the state to be in the processing status. Raised step errors
/// go through `set_error` and the loop continues, which lets an installed
/// catch position run once before the error becomes terminal. Malformed
/// step results fail the call immediately and settle the state as failed
/// without touching the completion slot.
pub(crate) fn drive<P>(
    state: &mut ExecutionState,
    program: &mut P,
) -> Result<ResumeOutcome, EngineError>
where
    P: StepProgram + ?Sized,
{
    while !state.cursor().is_terminal() {
        let signal = program.step(&mut StepContext::new(state));

        match signal {
            Ok(StepSignal::Yield(value)) => {
                state.clear_processing();
                return Ok(ResumeOutcome::Suspended(value));
            }

            Ok(StepSignal::Continue) => continue,

            Err(StepFault::Raised(error)) => {
                // The pending input is void once the step it was meant
                // for has thrown.
                state.set_input(JsonValue::Null);
                state.set_error(error);
            }

            Err(StepFault::Malformed(detail)) => {
                state.settle_failed();
                return Err(EngineError::MalformedStep(detail));
            }
        }
    }

    // Terminal cursor: consume the completion. An error completion wins
    // over any value recorded before it; no completion at all is the
    // fall-through case and settles with null.
    match state.completion().cloned() {
        Some(Completion::Error(error)) => {
            state.settle_failed();
            Err(EngineError::Faulted(error))
        }
        Some(Completion::Value(value)) => {
            state.settle_completed();
            Ok(ResumeOutcome::Completed(value))
        }
        None => {
            state.set_value(JsonValue::Null);
            state.settle_completed();
            Ok(ResumeOutcome::Completed(JsonValue::Null))
        }
    }
}
