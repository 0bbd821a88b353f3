//! Backend worker thread: owns the Tokio runtime and the turn controller.

pub mod commands;
pub mod runtime;
