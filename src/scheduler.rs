//! Promise-bridging scheduler
//!
//! Converts the pull-based resumption protocol into a single future.
//! Each yielded value is handed to a caller-supplied async resolver;
//! fulfillment resumes the computation with the resolved value,
//! rejection injects the error at the suspension point. The loop runs
//! until the computation settles. No iteration limit is imposed; a
//! non-terminating computation never settles the returned future.

use std::future::Future;

use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::engine::{EngineError, Resumable, ResumeOutcome, StepProgram};

/// Drive `resumable` to completion.
///
/// `resolve` awaits one yielded value and reports fulfillment or
/// rejection. Every failure path surfaces as an error here; nothing is
/// swallowed.
pub async fn run<P, R, Fut>(
    resumable: &mut Resumable<P>,
    mut resolve: R,
) -> Result<JsonValue, EngineError>
where
    P: StepProgram,
    R: FnMut(JsonValue) -> Fut,
    Fut: Future<Output = Result<JsonValue, JsonValue>>,
{
    let mut outcome = resumable.resume(JsonValue::Null)?;

    loop {
        match outcome {
            ResumeOutcome::Completed(value) => {
                debug!(value = %value, "computation completed");
                return Ok(value);
            }
            ResumeOutcome::Suspended(pending) => {
                debug!(pending = %pending, "computation suspended");
                outcome = match resolve(pending).await {
                    Ok(value) => resumable.resume(value)?,
                    Err(error) => resumable.resume_with_error(error)?,
                };
            }
        }
    }
}

/// Like [`run`], but observes a cancellation token while a yielded value
/// is being awaited.
///
/// Cancellation requests early termination through `force_return` with a
/// null result and keeps driving, so a delegate wound down by the forced
/// return can still surface its cleanup suspensions.
pub async fn run_with_cancellation<P, R, Fut>(
    resumable: &mut Resumable<P>,
    mut resolve: R,
    token: &CancellationToken,
) -> Result<JsonValue, EngineError>
where
    P: StepProgram,
    R: FnMut(JsonValue) -> Fut,
    Fut: Future<Output = Result<JsonValue, JsonValue>>,
{
    let mut outcome = resumable.resume(JsonValue::Null)?;

    loop {
        match outcome {
            ResumeOutcome::Completed(value) => {
                debug!(value = %value, "computation completed");
                return Ok(value);
            }
            ResumeOutcome::Suspended(pending) => {
                outcome = tokio::select! {
                    _ = token.cancelled() => {
                        debug!("cancellation requested, forcing return");
                        resumable.force_return(JsonValue::Null)?
                    }
                    settled = resolve(pending) => match settled {
                        Ok(value) => resumable.resume(value)?,
                        Err(error) => resumable.resume_with_error(error)?,
                    },
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Cursor, StepContext, StepFault, StepFn, StepSignal};
    use serde_json::json;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_completes_without_suspension() {
        // A program that settles on the first step never calls the resolver
        let program = StepFn(|ctx: &mut StepContext<'_>| {
            ctx.complete(json!("done"));
            Ok(StepSignal::Continue)
        });
        let mut resumable = Resumable::new(json!(null), program);

        let mut calls = 0;
        let result = run(&mut resumable, |pending| {
            calls += 1;
            async move { Ok(pending) }
        })
        .await
        .unwrap();

        assert_eq!(result, json!("done"));
        assert_eq!(calls, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_run_performs_one_cycle_per_yield() {
        // Three yields before completing: exactly three resolve cycles
        let program = StepFn(|ctx: &mut StepContext<'_>| {
            let pos = ctx.cursor().position();
            match pos {
                1 | 2 | 3 => {
                    ctx.advance();
                    Ok(StepSignal::Yield(json!(pos)))
                }
                4 => {
                    ctx.complete(json!("finished"));
                    Ok(StepSignal::Continue)
                }
                other => Err(StepFault::Malformed(format!("no step at {other}"))),
            }
        });
        let mut resumable = Resumable::new(json!(null), program);

        let mut calls = 0;
        let result = run(&mut resumable, |pending| {
            calls += 1;
            async move { Ok(pending) }
        })
        .await
        .unwrap();

        assert_eq!(result, json!("finished"));
        assert_eq!(calls, 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rejection_is_injected_as_error() {
        // The resolver rejects; with no catch installed the rejection
        // becomes the computation's failure
        let program = StepFn(|ctx: &mut StepContext<'_>| match ctx.cursor().position() {
            1 => {
                ctx.advance();
                Ok(StepSignal::Yield(json!("pending")))
            }
            other => Err(StepFault::Malformed(format!("no step at {other}"))),
        });
        let mut resumable = Resumable::new(json!(null), program);

        let result = run(&mut resumable, |_pending| async move {
            Err(json!({"code": "unavailable"}))
        })
        .await;

        assert_eq!(
            result,
            Err(EngineError::Faulted(json!({"code": "unavailable"})))
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rejection_recovered_by_catch_step() {
        // Position 1 installs a handler at 4 and yields from 2; the
        // injected rejection skips the normal continuation at 3 and
        // lands in the handler, which recovers with a value
        let program = StepFn(|ctx: &mut StepContext<'_>| match ctx.cursor().position() {
            1 => {
                ctx.install_catch(Cursor::at(4));
                ctx.advance();
                Ok(StepSignal::Continue)
            }
            2 => {
                ctx.advance();
                Ok(StepSignal::Yield(json!("pending")))
            }
            3 => {
                let value = ctx.take_input();
                ctx.complete(value);
                Ok(StepSignal::Continue)
            }
            4 => {
                let error = ctx.pending_error().cloned().unwrap();
                ctx.complete(json!({ "recovered_from": error }));
                Ok(StepSignal::Continue)
            }
            other => Err(StepFault::Malformed(format!("no step at {other}"))),
        });
        let mut resumable = Resumable::new(json!(null), program);

        let result = run(&mut resumable, |_pending| async move { Err(json!("boom")) })
            .await
            .unwrap();

        assert_eq!(result, json!({"recovered_from": "boom"}));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_step_error_on_first_resume_fails_the_future() {
        let program = StepFn(|_ctx: &mut StepContext<'_>| Err(StepFault::Raised(json!("exploded immediately"))));
        let mut resumable = Resumable::new(json!(null), program);

        let result = run(&mut resumable, |pending| async move { Ok(pending) }).await;

        assert_eq!(
            result,
            Err(EngineError::Faulted(json!("exploded immediately")))
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_cancellation_forces_return() {
        // The resolver never settles; cancelling the token forces an
        // early return with a null result
        let program = StepFn(|ctx: &mut StepContext<'_>| match ctx.cursor().position() {
            1 => {
                ctx.advance();
                Ok(StepSignal::Yield(json!("pending")))
            }
            other => Err(StepFault::Malformed(format!("no step at {other}"))),
        });
        let mut resumable = Resumable::new(json!(null), program);

        let token = CancellationToken::new();
        token.cancel();

        let result = run_with_cancellation(
            &mut resumable,
            |_pending| std::future::pending::<Result<JsonValue, JsonValue>>(),
            &token,
        )
        .await
        .unwrap();

        assert_eq!(result, JsonValue::Null);
    }
}
