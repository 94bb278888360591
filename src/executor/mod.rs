//! Request executors
//!
//! Implementations of `RequestSender`: the reqwest-backed HTTP executor
//! used in production and a scripted fake for tests. The fake is only built
//! for this crate's tests or with the `test-util` feature.

pub mod http;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use self::http::{HttpExecutor, HttpExecutorConfig};
#[cfg(any(test, feature = "test-util"))]
pub use self::mock::MockSender;
