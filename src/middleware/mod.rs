//! # Middleware Module
//!
//! Hooks that run around every dispatched request: `before` may answer early,
//! `after` sees the response and the handler latency.

mod core;
mod metrics;
mod tracing;

pub use core::Middleware;
pub use metrics::MetricsMiddleware;
pub use tracing::TracingMiddleware;
