//! Request sessions
//!
//! High-level driver API around one payload's trip through the engine:
//! construct a session from a payload, dispatch it with a step program
//! and a resolver, and read the recorded outcome afterwards. Each
//! session carries a generated request id and timestamps in its record.

use std::future::Future;

use chrono::Utc;
use serde_json::Value as JsonValue;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::engine::{EngineError, Resumable, StepProgram};
use crate::scheduler;
use crate::types::{RequestRecord, RequestStatus};

/// One request's lifecycle, from payload to recorded outcome.
pub struct RequestSession {
    record: RequestRecord,
}

impl RequestSession {
    pub fn new(payload: JsonValue) -> Self {
        RequestSession {
            record: RequestRecord {
                id: Uuid::new_v4().to_string(),
                payload,
                status: RequestStatus::Pending,
                result: None,
                error: None,
                created_at: Utc::now(),
                completed_at: None,
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn record(&self) -> &RequestRecord {
        &self.record
    }

    /// Drive the payload through `program` until it settles, recording
    /// the outcome on the session.
    pub async fn dispatch<P, R, Fut>(
        &mut self,
        program: P,
        resolve: R,
    ) -> Result<JsonValue, EngineError>
    where
        P: StepProgram,
        R: FnMut(JsonValue) -> Fut,
        Fut: Future<Output = Result<JsonValue, JsonValue>>,
    {
        let span = info_span!("request", id = %self.record.id);

        self.record.status = RequestStatus::Running;
        let mut resumable = Resumable::new(self.record.payload.clone(), program);

        let outcome = scheduler::run(&mut resumable, resolve)
            .instrument(span)
            .await;

        self.finish(outcome)
    }

    /// Like [`dispatch`](Self::dispatch), observing a cancellation token
    /// while yielded values are awaited.
    pub async fn dispatch_with_cancellation<P, R, Fut>(
        &mut self,
        program: P,
        resolve: R,
        token: &CancellationToken,
    ) -> Result<JsonValue, EngineError>
    where
        P: StepProgram,
        R: FnMut(JsonValue) -> Fut,
        Fut: Future<Output = Result<JsonValue, JsonValue>>,
    {
        let span = info_span!("request", id = %self.record.id);

        self.record.status = RequestStatus::Running;
        let mut resumable = Resumable::new(self.record.payload.clone(), program);

        let outcome = scheduler::run_with_cancellation(&mut resumable, resolve, token)
            .instrument(span)
            .await;

        self.finish(outcome)
    }

    fn finish(&mut self, outcome: Result<JsonValue, EngineError>) -> Result<JsonValue, EngineError> {
        self.record.completed_at = Some(Utc::now());

        match outcome {
            Ok(value) => {
                self.record.status = RequestStatus::Completed;
                self.record.result = Some(value.clone());
                Ok(value)
            }
            Err(EngineError::Faulted(error)) => {
                self.record.status = RequestStatus::Failed;
                self.record.error = Some(error.clone());
                Err(EngineError::Faulted(error))
            }
            Err(fatal) => {
                self.record.status = RequestStatus::Failed;
                self.record.error = Some(JsonValue::String(fatal.to_string()));
                Err(fatal)
            }
        }
    }
}
