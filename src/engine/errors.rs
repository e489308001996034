//! Error types for the resumption protocol

use serde_json::Value as JsonValue;
use thiserror::Error;

/// Protocol-level failure surfaced by a resumption operation.
#[derive(Debug, PartialEq, Error)]
pub enum EngineError {
    /// A resumption operation was invoked while another was already
    /// executing on the same state.
    #[error("resumption already in progress")]
    Reentrancy,

    /// A resumption operation was invoked after the state settled.
    #[error("resuming a completed computation")]
    InvalidState,

    /// A step produced a result the engine cannot interpret. Fails the
    /// call immediately and is never absorbed by a catch step.
    #[error("malformed step result: {0}")]
    MalformedStep(String),

    /// The computation settled with an error completion. Carries the
    /// opaque error value recorded by the failing step.
    #[error("computation failed: {0}")]
    Faulted(JsonValue),
}

/// Failure raised by one invocation of a step program.
///
/// `Raised` enters the normal error path (one recovery attempt via an
/// installed catch position); `Malformed` fails the resumption call fast.
#[derive(Debug, PartialEq)]
pub enum StepFault {
    Raised(JsonValue),
    Malformed(String),
}
