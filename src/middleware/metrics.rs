use dashmap::DashMap;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Middleware;
use crate::dispatcher::{HandlerResponse, RequestInfo};

/// Middleware for collecting Prometheus-compatible metrics
///
/// Tracks total and per-handler request counts, responses by status code,
/// latency, and requests answered outside the dispatcher (health checks,
/// 404s, validation failures). Counters are atomics; the per-handler maps are
/// `DashMap`s so recording never takes a global lock.
#[derive(Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    top_level_requests: AtomicUsize,
    by_handler: DashMap<String, u64>,
    by_status: DashMap<u16, u64>,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of dispatched requests
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Mean handler latency across all dispatched requests
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
    }

    /// Count a request the server answered itself, with its status.
    pub fn record_top_level(&self, status: u16) {
        self.top_level_requests.fetch_add(1, Ordering::Relaxed);
        *self.by_status.entry(status).or_insert(0) += 1;
    }

    pub fn top_level_request_count(&self) -> usize {
        self.top_level_requests.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn handler_count(&self, handler: &str) -> u64 {
        self.by_handler.get(handler).map(|c| *c).unwrap_or(0)
    }

    #[must_use]
    pub fn status_count(&self, status: u16) -> u64 {
        self.by_status.get(&status).map(|c| *c).unwrap_or(0)
    }

    /// Prometheus text exposition of all counters.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = write!(
            out,
            "# HELP person_api_requests_total Total number of dispatched requests\n\
             # TYPE person_api_requests_total counter\n\
             person_api_requests_total {}\n\
             # HELP person_api_top_level_requests_total Requests answered without a handler\n\
             # TYPE person_api_top_level_requests_total counter\n\
             person_api_top_level_requests_total {}\n\
             # HELP person_api_request_latency_seconds Average handler latency in seconds\n\
             # TYPE person_api_request_latency_seconds gauge\n\
             person_api_request_latency_seconds {}\n",
            self.request_count(),
            self.top_level_request_count(),
            self.average_latency().as_secs_f64(),
        );

        out.push_str("# HELP person_api_handler_requests_total Requests per handler\n");
        out.push_str("# TYPE person_api_handler_requests_total counter\n");
        let mut handlers: Vec<(String, u64)> = self
            .by_handler
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        handlers.sort();
        for (handler, count) in handlers {
            let _ = writeln!(
                out,
                "person_api_handler_requests_total{{handler=\"{handler}\"}} {count}"
            );
        }

        out.push_str("# HELP person_api_responses_total Responses by status code\n");
        out.push_str("# TYPE person_api_responses_total counter\n");
        let mut statuses: Vec<(u16, u64)> =
            self.by_status.iter().map(|e| (*e.key(), *e.value())).collect();
        statuses.sort_unstable();
        for (status, count) in statuses {
            let _ = writeln!(
                out,
                "person_api_responses_total{{status=\"{status}\"}} {count}"
            );
        }
        out
    }
}

impl Middleware for MetricsMiddleware {
    fn after(&self, req: &RequestInfo, res: &mut HandlerResponse, latency: Duration) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        *self.by_handler.entry(req.handler_name.clone()).or_insert(0) += 1;
        *self.by_status.entry(res.status).or_insert(0) += 1;
    }
}
