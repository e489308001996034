pub mod engine;
pub mod scheduler;
pub mod script;
pub mod session;
pub mod types;

// Re-export main types
pub use types::*;

// Re-export the resumption protocol for convenience
pub use engine::{
    Completion, Cursor, EngineError, ExecutionState, ExecutionStatus, Resumable, ResumableHandle,
    ResumeOutcome, StepContext, StepFault, StepFn, StepProgram, StepSignal,
};
