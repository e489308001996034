//! Scripted step programs
//!
//! A [`ScriptedProgram`] is a step program decoded from data: a list of
//! instructions occupying positions 1.. of the cursor space. Scripts are
//! how canned request programs are loaded from JSON by the CLI and by
//! test fixtures; real request logic implements [`StepProgram`] in code.
//!
//! A cursor pointing at a position with no instruction is the concrete
//! malformed-step case and fails the resumption call fast.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::engine::{
    Cursor, EngineError, Resumable, ResumeOutcome, StepContext, StepFault, StepProgram, StepSignal,
};

/* ===================== Operands ===================== */

/// Where an instruction operand takes its value from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum ValueSource {
    /// A literal value.
    Lit(JsonValue),
    /// The last value fed in by a resumption.
    Input,
    /// The opaque request payload.
    Payload,
}

impl ValueSource {
    fn resolve(&self, ctx: &StepContext<'_>) -> JsonValue {
        match self {
            ValueSource::Lit(value) => value.clone(),
            ValueSource::Input => ctx.input().clone(),
            ValueSource::Payload => ctx.payload().clone(),
        }
    }
}

/* ===================== Instructions ===================== */

/// One scripted instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum Op {
    /// Yield a value; the computation resumes at `resume_at`.
    Yield { value: ValueSource, resume_at: u32 },
    /// Move to another position without suspending. Position 0 ends the
    /// computation with a fall-through null completion.
    Jump { to: u32 },
    /// Install a one-shot error handler at `handler`, then continue with
    /// the next instruction.
    Catch { handler: u32 },
    /// Complete the computation with a value.
    Return { value: ValueSource },
    /// Raise an error value.
    Raise { error: ValueSource },
    /// Run an inner scripted computation, forwarding resumptions to it
    /// until it completes; its final value becomes the input at
    /// `resume_at`.
    Delegate {
        payload: JsonValue,
        body: Vec<Op>,
        resume_at: u32,
    },
}

/* ===================== Program ===================== */

/// Step program interpreting a list of instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedProgram {
    ops: Vec<Op>,
}

impl ScriptedProgram {
    pub fn new(ops: Vec<Op>) -> Self {
        ScriptedProgram { ops }
    }

    fn op_at(&self, cursor: Cursor) -> Option<&Op> {
        let position = cursor.position() as usize;
        self.ops.get(position.checked_sub(1)?)
    }
}

impl StepProgram for ScriptedProgram {
    fn step(&mut self, ctx: &mut StepContext<'_>) -> Result<StepSignal, StepFault> {
        let op = self.op_at(ctx.cursor()).cloned().ok_or_else(|| {
            StepFault::Malformed(format!(
                "no instruction at position {}",
                ctx.cursor().position()
            ))
        })?;

        match op {
            Op::Yield { value, resume_at } => {
                let yielded = value.resolve(ctx);
                ctx.jump(Cursor::at(resume_at));
                Ok(StepSignal::Yield(yielded))
            }

            Op::Jump { to } => {
                ctx.jump(Cursor::at(to));
                Ok(StepSignal::Continue)
            }

            Op::Catch { handler } => {
                ctx.install_catch(Cursor::at(handler));
                ctx.advance();
                Ok(StepSignal::Continue)
            }

            Op::Return { value } => {
                let final_value = value.resolve(ctx);
                ctx.complete(final_value);
                Ok(StepSignal::Continue)
            }

            Op::Raise { error } => {
                let raised = error.resolve(ctx);
                Err(StepFault::Raised(raised))
            }

            Op::Delegate {
                payload,
                body,
                resume_at,
            } => {
                let mut inner = Resumable::new(payload, ScriptedProgram::new(body));
                match inner.resume(JsonValue::Null) {
                    Ok(ResumeOutcome::Suspended(yielded)) => {
                        ctx.delegate_to(Box::new(inner), Cursor::at(resume_at));
                        Ok(StepSignal::Yield(yielded))
                    }
                    Ok(ResumeOutcome::Completed(final_value)) => {
                        ctx.set_input(final_value);
                        ctx.jump(Cursor::at(resume_at));
                        Ok(StepSignal::Continue)
                    }
                    Err(EngineError::Faulted(error)) => Err(StepFault::Raised(error)),
                    Err(fatal) => Err(StepFault::Malformed(fatal.to_string())),
                }
            }
        }
    }
}
