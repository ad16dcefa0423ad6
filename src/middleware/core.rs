use std::time::Duration;

use crate::dispatcher::{HandlerResponse, RequestInfo};

pub trait Middleware: Send + Sync {
    /// Runs before the handler. Returning a response skips the handler.
    fn before(&self, _req: &RequestInfo) -> Option<HandlerResponse> {
        None
    }

    /// Runs after the handler (or the early response) with the measured latency.
    fn after(&self, _req: &RequestInfo, _res: &mut HandlerResponse, _latency: Duration) {}
}
