//! Core abstractions and interfaces for Weaver
//!
//! This module provides the error taxonomy, the request/response records,
//! the executor seam and the immutable integration registry.

pub mod context;
pub mod error;
pub mod registry;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use context::{CancelHandle, CancelSignal, ExecutionContext};
pub use error::{IntegratorError, IntegratorResult};
pub use registry::IntegrationRegistry;
pub use traits::*;
pub use types::{HttpMethod, Request, Response};
