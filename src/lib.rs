//! This module contains the core logic of the Weaver integration orchestrator.
//!
//! It defines the modules for configuration, authentication, request
//! execution and orchestration of multi-service integrations.

pub mod auth;
pub mod config;
pub mod core;
pub mod executor;
pub mod logging;
pub mod orchestration;
pub(crate) mod utils;
