//! Request orchestration layer
//!
//! Coordinates authentication, dispatch and flow combination for one
//! integration without any of those stages knowing about each other.

pub mod combiner;
pub mod integrator;

pub use combiner::FlowCombiner;
pub use integrator::{Integrator, IntegratorOptions};
