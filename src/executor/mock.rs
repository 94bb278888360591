//! Deterministic request sender for tests.
//!
//! Replies are scripted per endpoint, optionally after an artificial delay,
//! and every call is recorded so tests can assert what reached the wire.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::core::{IntegratorError, IntegratorResult, Request, RequestSender, Response};

#[derive(Clone, Debug)]
enum Outcome {
    Respond(Response),
    Fail(String),
    TimeOut(Duration),
}

#[derive(Clone, Debug)]
struct Script {
    outcome: Outcome,
    delay: Duration,
}

/// One request as seen by the sender.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub endpoint: String,
    pub request: Request,
}

#[derive(Default)]
pub struct MockSender {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<RecordedCall>>,
    completed: AtomicUsize,
}

impl MockSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to `endpoint` with `response`.
    pub fn respond(self, endpoint: &str, response: Response) -> Self {
        self.script(endpoint, Outcome::Respond(response), Duration::ZERO)
    }

    /// Reply to `endpoint` with `response` after `delay`.
    pub fn respond_after(self, endpoint: &str, response: Response, delay: Duration) -> Self {
        self.script(endpoint, Outcome::Respond(response), delay)
    }

    /// Fail calls to `endpoint` with a transport error.
    pub fn fail(self, endpoint: &str, cause: &str) -> Self {
        self.script(endpoint, Outcome::Fail(cause.to_string()), Duration::ZERO)
    }

    /// Fail calls to `endpoint` with a timeout after `delay`.
    pub fn time_out(self, endpoint: &str, delay: Duration) -> Self {
        self.script(endpoint, Outcome::TimeOut(delay), delay)
    }

    fn script(mut self, endpoint: &str, outcome: Outcome, delay: Duration) -> Self {
        self.scripts
            .insert(endpoint.to_string(), Script { outcome, delay });
        self
    }

    /// Calls received so far, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Number of calls that ran to completion (were not abandoned).
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestSender for MockSender {
    async fn send(&self, endpoint: &str, request: &Request) -> IntegratorResult<Response> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                endpoint: endpoint.to_string(),
                request: request.clone(),
            });
        }

        let script = self.scripts.get(endpoint).cloned().ok_or_else(|| {
            IntegratorError::Transport(format!("no scripted reply for {endpoint}"))
        })?;

        if !script.delay.is_zero() {
            tokio::time::sleep(script.delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);

        match script.outcome {
            Outcome::Respond(response) => Ok(response),
            Outcome::Fail(cause) => Err(IntegratorError::Transport(cause)),
            Outcome::TimeOut(after) => Err(IntegratorError::Timeout(after)),
        }
    }
}
