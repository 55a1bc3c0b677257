//! `tracing_subscriber::Layer` implementations.

pub mod context;
pub mod fields;
