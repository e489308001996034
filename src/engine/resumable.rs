//! Resumable protocol adapter
//!
//! [`Resumable`] is the operation surface an external scheduler drives:
//! resume with a value, resume with an injected error, or force an early
//! return. Every operation enters the processing guard first, forwards
//! to an active nested delegate if one is installed, and runs the
//! trampoline until the computation suspends again or settles.

use serde_json::Value as JsonValue;

use super::errors::EngineError;
use super::state::{ExecutionState, ExecutionStatus};
use super::step::StepProgram;
use super::trampoline::{drive, ResumeOutcome};

/* ===================== Handle Trait ===================== */

/// Object-safe form of the three resumption operations.
///
/// Used for the delegate slot: one resumable driving another holds the
/// inner one through this trait, never through implicit call-stack
/// delegation.
pub trait ResumableHandle: Send {
    fn resume(&mut self, value: JsonValue) -> Result<ResumeOutcome, EngineError>;
    fn resume_with_error(&mut self, error: JsonValue) -> Result<ResumeOutcome, EngineError>;
    fn force_return(&mut self, value: JsonValue) -> Result<ResumeOutcome, EngineError>;
}

/* ===================== Resumable ===================== */

/// One suspended computation plus the step program that advances it.
pub struct Resumable<P: StepProgram> {
    state: ExecutionState,
    program: P,
}

impl<P: StepProgram> Resumable<P> {
    /// Wrap a fresh execution state for `payload`.
    pub fn new(payload: JsonValue, program: P) -> Self {
        Resumable {
            state: ExecutionState::new(payload),
            program,
        }
    }

    /// Reattach a program to a previously captured state.
    pub fn from_state(state: ExecutionState, program: P) -> Self {
        Resumable { state, program }
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    pub fn status(&self) -> ExecutionStatus {
        self.state.status()
    }

    /// Feed `value` into the computation and advance it.
    ///
    /// With a delegate active the value is forwarded to it first; only
    /// when the delegate completes does its final value become this
    /// state's input and the own steps continue.
    pub fn resume(&mut self, value: JsonValue) -> Result<ResumeOutcome, EngineError> {
        self.state.mark_processing()?;

        if let Some(mut inner) = self.state.take_delegate() {
            match inner.resume(value) {
                Ok(ResumeOutcome::Suspended(yielded)) => {
                    return Ok(self.still_delegating(inner, yielded));
                }
                Ok(ResumeOutcome::Completed(final_value)) => {
                    self.state.set_input(final_value);
                }
                Err(EngineError::Faulted(error)) => {
                    self.state.set_error(error);
                }
                Err(fatal) => {
                    self.state.set_delegate(inner);
                    self.state.clear_processing();
                    return Err(fatal);
                }
            }
        } else {
            self.state.set_input(value);
        }

        drive(&mut self.state, &mut self.program)
    }

    /// Inject `error` at the current suspension point.
    ///
    /// Forwarded to an active delegate's own error injection; without a
    /// delegate the error is recorded directly, which moves the cursor
    /// to the installed catch position if one exists.
    pub fn resume_with_error(&mut self, error: JsonValue) -> Result<ResumeOutcome, EngineError> {
        self.state.mark_processing()?;

        if let Some(mut inner) = self.state.take_delegate() {
            match inner.resume_with_error(error) {
                Ok(ResumeOutcome::Suspended(yielded)) => {
                    return Ok(self.still_delegating(inner, yielded));
                }
                Ok(ResumeOutcome::Completed(final_value)) => {
                    self.state.set_input(final_value);
                }
                Err(EngineError::Faulted(inner_error)) => {
                    self.state.set_error(inner_error);
                }
                Err(fatal) => {
                    self.state.set_delegate(inner);
                    self.state.clear_processing();
                    return Err(fatal);
                }
            }
        } else {
            self.state.set_error(error);
        }

        drive(&mut self.state, &mut self.program)
    }

    /// Request early termination with `value` as the final result.
    ///
    /// An active delegate is asked to terminate first and the outcome of
    /// that inner termination is what this state completes with. The
    /// trampoline still runs afterwards so cleanup suspensions, if the
    /// delegate produces any, reach the caller.
    pub fn force_return(&mut self, value: JsonValue) -> Result<ResumeOutcome, EngineError> {
        self.state.mark_processing()?;

        if let Some(mut inner) = self.state.take_delegate() {
            match inner.force_return(value) {
                Ok(ResumeOutcome::Suspended(yielded)) => {
                    return Ok(self.still_delegating(inner, yielded));
                }
                Ok(ResumeOutcome::Completed(final_value)) => {
                    self.state.set_value(final_value);
                }
                Err(EngineError::Faulted(error)) => {
                    self.state.set_error(error);
                }
                Err(fatal) => {
                    self.state.set_delegate(inner);
                    self.state.clear_processing();
                    return Err(fatal);
                }
            }
        } else {
            self.state.set_value(value);
        }

        drive(&mut self.state, &mut self.program)
    }

    /// A forwarded delegate suspended again: keep it installed and
    /// surface its yielded value.
    fn still_delegating(
        &mut self,
        inner: Box<dyn ResumableHandle>,
        yielded: JsonValue,
    ) -> ResumeOutcome {
        self.state.set_delegate(inner);
        self.state.clear_processing();
        ResumeOutcome::Suspended(yielded)
    }
}

impl<P: StepProgram> ResumableHandle for Resumable<P> {
    fn resume(&mut self, value: JsonValue) -> Result<ResumeOutcome, EngineError> {
        Resumable::resume(self, value)
    }

    fn resume_with_error(&mut self, error: JsonValue) -> Result<ResumeOutcome, EngineError> {
        Resumable::resume_with_error(self, error)
    }

    fn force_return(&mut self, value: JsonValue) -> Result<ResumeOutcome, EngineError> {
        Resumable::force_return(self, value)
    }
}
