//! # Resumable request engine
//!
//! Explicit state machine for the request lifecycle of a batch RPC
//! transport: a computation that pauses at defined points, hands a value
//! to an external driver, and continues when given a resumed value or an
//! injected error.
//!
//! ## Core Principles
//!
//! 1. **Explicit state**: all progress lives in [`ExecutionState`], no
//!    native coroutine support is used
//! 2. **Cursor-level execution**: each resumption runs the step program
//!    from the position the computation suspended at
//! 3. **Centralized completion**: one tagged slot holds the final value
//!    or error, selected once the cursor reaches terminal
//! 4. **Pure engine**: no IO, no async; runs until suspend or settle

pub mod errors;
pub mod resumable;
pub mod state;
pub mod step;
pub mod trampoline;

#[cfg(test)]
mod tests;

// Re-export commonly used items
pub use errors::{EngineError, StepFault};
pub use resumable::{Resumable, ResumableHandle};
pub use state::{Completion, Cursor, ExecutionState, ExecutionStatus};
pub use step::{StepContext, StepFn, StepProgram, StepSignal};
pub use trampoline::ResumeOutcome;
