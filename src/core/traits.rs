//! Core traits for Weaver components
//!
//! The request executor is the only component that performs I/O, so it is
//! the seam where tests substitute a deterministic fake.

use async_trait::async_trait;

use super::{
    error::IntegratorResult,
    types::{Request, Response},
};

/// Sends one already-authenticated request to one service endpoint.
///
/// Any status code the remote returns is a valid `Response`; only
/// connection failures and timeouts are errors.
#[async_trait]
pub trait RequestSender: Send + Sync {
    async fn send(&self, endpoint: &str, request: &Request) -> IntegratorResult<Response>;
}
