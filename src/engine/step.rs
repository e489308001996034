//! Step-program contract
//!
//! The engine is parameterized by the concrete per-request step logic.
//! A [`StepProgram`] is invoked once per trampoline iteration with a
//! [`StepContext`], the restricted view of the execution state a step is
//! allowed to manipulate: read the payload and the last resumed input,
//! move the cursor, install a catch position, record the completion, or
//! hand control to a nested resumable.

use serde_json::Value as JsonValue;

use super::errors::StepFault;
use super::resumable::ResumableHandle;
use super::state::{Cursor, ExecutionState};

/* ===================== Step Signal ===================== */

/// What one step invocation tells the trampoline to do next.
#[derive(Debug, PartialEq)]
pub enum StepSignal {
    /// Suspend and hand `value` to the external driver. The cursor the
    /// step left behind is where the computation resumes.
    Yield(JsonValue),
    /// Keep stepping from the current cursor.
    Continue,
}

/* ===================== Step Context ===================== */

/// The slice of execution state a step program may act on.
pub struct StepContext<'a> {
    state: &'a mut ExecutionState,
}

impl<'a> StepContext<'a> {
    pub(crate) fn new(state: &'a mut ExecutionState) -> Self {
        StepContext { state }
    }

    /// The position this step was dispatched at.
    pub fn cursor(&self) -> Cursor {
        self.state.cursor()
    }

    /// The opaque request payload the state was created from.
    pub fn payload(&self) -> &JsonValue {
        self.state.payload()
    }

    /// The last value fed in by a resumption.
    pub fn input(&self) -> &JsonValue {
        self.state.input()
    }

    /// Take the last resumed value, leaving null behind.
    pub fn take_input(&mut self) -> JsonValue {
        self.state.take_input()
    }

    /// Overwrite the pending input. Used when a completed nested
    /// computation feeds its final value into this one.
    pub fn set_input(&mut self, value: JsonValue) {
        self.state.set_input(value);
    }

    /// Move the cursor to another position.
    pub fn jump(&mut self, to: Cursor) {
        self.state.set_cursor(to);
    }

    /// Move the cursor to the next position.
    pub fn advance(&mut self) {
        let next = self.state.cursor().next();
        self.state.set_cursor(next);
    }

    /// Record the final value and move the cursor to terminal.
    pub fn complete(&mut self, value: JsonValue) {
        self.state.set_value(value);
    }

    /// Install a one-shot recovery position for the next raised error.
    pub fn install_catch(&mut self, handler: Cursor) {
        self.state.install_catch(handler);
    }

    /// The error a catch step is recovering from, if any.
    pub fn pending_error(&self) -> Option<&JsonValue> {
        self.state.pending_error()
    }

    /// Install a nested resumable. Subsequent resumptions are forwarded
    /// to it until it completes; this computation then resumes at
    /// `resume_at` with the inner final value as its input.
    pub fn delegate_to(&mut self, inner: Box<dyn ResumableHandle>, resume_at: Cursor) {
        self.state.set_cursor(resume_at);
        self.state.set_delegate(inner);
    }
}

/* ===================== Step Program ===================== */

/// Per-request step logic plugged into the trampoline.
///
/// Implementations are supplied by the surrounding request builder; the
/// engine only defines the resumption and suspension contract around
/// them. Closures are adapted with [`StepFn`].
pub trait StepProgram: Send {
    fn step(&mut self, ctx: &mut StepContext<'_>) -> Result<StepSignal, StepFault>;
}

/// Adapter that lets a closure serve as a step program.
pub struct StepFn<F>(pub F);

impl<F> StepProgram for StepFn<F>
where
    F: FnMut(&mut StepContext<'_>) -> Result<StepSignal, StepFault> + Send,
{
    fn step(&mut self, ctx: &mut StepContext<'_>) -> Result<StepSignal, StepFault> {
        (self.0)(ctx)
    }
}
