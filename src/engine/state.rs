//! Execution state
//!
//! One [`ExecutionState`] exists per in-flight request. It holds everything
//! the trampoline needs to advance the computation and everything a caller
//! needs to observe its outcome:
//! - cursor: the position the next step resumes from
//! - input: the last value fed in by a resumption
//! - completion: the single authoritative final value or error
//! - status: the externally visible protocol state, doubling as the
//!   reentrancy guard

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

use super::errors::EngineError;
use super::resumable::ResumableHandle;

/* ===================== Cursor ===================== */

/// Resumption position of a suspended computation.
///
/// Position 0 is the designated terminal position; live step programs
/// occupy positions starting at 1. The trampoline loops until the cursor
/// reaches terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(u32);

impl Cursor {
    /// The terminal position. Reaching it stops the trampoline.
    pub const TERMINAL: Cursor = Cursor(0);

    /// The position a fresh computation starts from.
    pub const START: Cursor = Cursor(1);

    pub fn at(position: u32) -> Cursor {
        Cursor(position)
    }

    pub fn is_terminal(self) -> bool {
        self.0 == 0
    }

    pub fn position(self) -> u32 {
        self.0
    }

    pub fn next(self) -> Cursor {
        Cursor(self.0 + 1)
    }
}

/* ===================== Completion ===================== */

/// The terminal outcome of a computation once it stops yielding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Completion {
    Value(JsonValue),
    Error(JsonValue),
}

/* ===================== Status ===================== */

/// Protocol state of an execution.
///
/// `Processing` is the reentrancy guard: it is set for the duration of a
/// resumption operation and no second operation is accepted while it
/// holds. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Suspended,
    Processing,
    Completed,
    Failed,
}

/* ===================== Execution State ===================== */

/// Mutable record for one in-flight request.
///
/// Created from an opaque payload, mutated only by the trampoline and the
/// resumption operations, discarded once the completion is consumed.
///
/// The state is serializable so a suspended computation can be captured
/// between resumptions. A delegate handle in flight is not captured;
/// snapshots are meaningful only when no delegate is installed.
#[derive(Serialize, Deserialize)]
pub struct ExecutionState {
    cursor: Cursor,
    input: JsonValue,
    status: ExecutionStatus,
    completion: Option<Completion>,
    catch_cursor: Option<Cursor>,
    payload: JsonValue,
    #[serde(skip)]
    delegate: Option<Box<dyn ResumableHandle>>,
}

impl ExecutionState {
    /// Create a fresh state for a request payload.
    pub fn new(payload: JsonValue) -> Self {
        ExecutionState {
            cursor: Cursor::START,
            input: JsonValue::Null,
            status: ExecutionStatus::Suspended,
            completion: None,
            catch_cursor: None,
            payload,
            delegate: None,
        }
    }

    /* ----- protocol guard ----- */

    /// Enter the processing state.
    ///
    /// Fails with [`EngineError::Reentrancy`] if a resumption is already
    /// executing and with [`EngineError::InvalidState`] if the state has
    /// settled. On error the state is left untouched.
    pub fn mark_processing(&mut self) -> Result<(), EngineError> {
        match self.status {
            ExecutionStatus::Processing => Err(EngineError::Reentrancy),
            ExecutionStatus::Completed | ExecutionStatus::Failed => Err(EngineError::InvalidState),
            ExecutionStatus::Suspended => {
                self.status = ExecutionStatus::Processing;
                Ok(())
            }
        }
    }

    /// Leave the processing state without settling.
    pub fn clear_processing(&mut self) {
        if self.status == ExecutionStatus::Processing {
            self.status = ExecutionStatus::Suspended;
        }
    }

    /* ----- completion operations ----- */

    /// Record an error completion.
    ///
    /// Moves the cursor to the installed catch position if one exists,
    /// consuming it, otherwise to terminal. A later `set_value` from a
    /// recovery step replaces the recorded error.
    pub fn set_error(&mut self, error: JsonValue) {
        self.completion = Some(Completion::Error(error));
        self.cursor = self.catch_cursor.take().unwrap_or(Cursor::TERMINAL);
    }

    /// Record a value completion and move the cursor to terminal.
    pub fn set_value(&mut self, value: JsonValue) {
        self.completion = Some(Completion::Value(value));
        self.cursor = Cursor::TERMINAL;
    }

    /* ----- accessors ----- */

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn status(&self) -> ExecutionStatus {
        self.status
    }

    pub fn payload(&self) -> &JsonValue {
        &self.payload
    }

    pub fn input(&self) -> &JsonValue {
        &self.input
    }

    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }

    /// The pending error completion, if one is recorded. Catch steps read
    /// the error they are recovering from through this.
    pub fn pending_error(&self) -> Option<&JsonValue> {
        match &self.completion {
            Some(Completion::Error(error)) => Some(error),
            _ => None,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(
            self.status,
            ExecutionStatus::Completed | ExecutionStatus::Failed
        )
    }

    /* ----- trampoline internals ----- */

    pub(crate) fn set_input(&mut self, value: JsonValue) {
        self.input = value;
    }

    pub(crate) fn take_input(&mut self) -> JsonValue {
        std::mem::replace(&mut self.input, JsonValue::Null)
    }

    pub(crate) fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }

    pub(crate) fn install_catch(&mut self, handler: Cursor) {
        self.catch_cursor = Some(handler);
    }

    pub(crate) fn set_delegate(&mut self, inner: Box<dyn ResumableHandle>) {
        self.delegate = Some(inner);
    }

    pub(crate) fn take_delegate(&mut self) -> Option<Box<dyn ResumableHandle>> {
        self.delegate.take()
    }

    pub(crate) fn settle_completed(&mut self) {
        self.status = ExecutionStatus::Completed;
    }

    pub(crate) fn settle_failed(&mut self) {
        self.status = ExecutionStatus::Failed;
    }
}

impl fmt::Debug for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionState")
            .field("cursor", &self.cursor)
            .field("input", &self.input)
            .field("status", &self.status)
            .field("completion", &self.completion)
            .field("catch_cursor", &self.catch_cursor)
            .field("payload", &self.payload)
            .field("delegate", &self.delegate.is_some())
            .finish()
    }
}
