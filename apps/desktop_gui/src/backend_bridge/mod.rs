//! Backend worker: owns the tokio runtime that performs network and decode work.

pub mod commands;
pub mod runtime;
