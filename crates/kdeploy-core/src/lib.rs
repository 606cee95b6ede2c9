//! `kdeploy-core` — kubectl resolution and action dispatch for a pipeline
//! deploy step.
//!
//! A run resolves a kubectl binary (declared version, `PATH`, or the tool
//! cache, installing on demand), validates the step inputs, and dispatches to
//! exactly one of deploy, promote or reject. See [`dispatch`] for the state
//! machine.

pub mod actions;
pub mod advisory;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod inputs;
pub mod installer;
pub mod io;
pub mod kubectl;
pub mod locator;
pub mod manifest;
pub mod platform;
pub mod report;
pub mod tool_cache;
pub mod types;

pub use error::{KdeployError, Result};
