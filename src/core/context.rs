//! Per-call execution context
//!
//! Each execute invocation owns its context: a correlation id for logs, the
//! start instant, the whole-call deadline and the caller's cancel signal.
//! Nothing in here is shared between calls.

use std::time::{Duration, Instant};

use tokio::sync::watch;
use uuid::Uuid;

/// Caller side of a cancellation pair.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Create a handle together with the signal to hand to `execute_with_cancel`.
    pub fn new() -> (Self, CancelSignal) {
        let (sender, receiver) = watch::channel(false);
        (Self { sender }, CancelSignal { receiver })
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

/// Observer side of a cancellation pair.
#[derive(Clone, Debug)]
pub struct CancelSignal {
    receiver: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_sender, receiver) = watch::channel(false);
        Self { receiver }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancellation is requested. If the handle is dropped
    /// without cancelling, this never resolves.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.receiver.borrow_and_update() {
                return;
            }
            if self.receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// State owned by a single execute call
#[derive(Debug)]
pub struct ExecutionContext {
    pub execution_id: String,
    pub integration_id: String,
    pub timeout: Option<Duration>,
    pub cancel: CancelSignal,
    started: Instant,
}

impl ExecutionContext {
    pub fn new(integration_id: &str, timeout: Option<Duration>, cancel: CancelSignal) -> Self {
        Self {
            execution_id: Uuid::new_v4().to_string(),
            integration_id: integration_id.to_string(),
            timeout,
            cancel,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
