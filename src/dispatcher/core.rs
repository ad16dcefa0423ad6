use crate::ids::RequestId;
use crate::middleware::Middleware;
use crate::models::UploadedFile;
use crate::router::RouteMatch;
use crate::runtime_config::RuntimeConfig;
use http::Method;
use may::coroutine;
use may::sync::mpsc;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// What the server hands over after routing and parameter validation.
#[derive(Debug, Clone, Default)]
pub struct RequestPayload {
    /// JSON body, if the request sent one
    pub body: Option<Value>,
    /// File parts of a multipart body
    pub files: Vec<UploadedFile>,
    /// Declared parameters after decoding and validation, keyed by parameter name
    pub params: Map<String, Value>,
}

/// Request data passed to a handler coroutine
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    pub request_id: RequestId,
    pub method: Method,
    /// Route pattern that matched (e.g. `/person/{person_id}`)
    pub path: String,
    pub handler_name: String,
    pub body: Option<Value>,
    pub files: Vec<UploadedFile>,
    /// Declared parameters, decoded to their schema types
    pub params: Map<String, Value>,
    /// Where the handler sends its one response
    pub reply_tx: mpsc::Sender<HandlerResponse>,
}

/// Identity of a dispatched request, as seen by middleware.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub request_id: RequestId,
    pub method: Method,
    /// Route pattern that matched
    pub path: String,
    pub handler_name: String,
}

/// Status and JSON body produced for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: Value,
}

impl HandlerResponse {
    #[must_use]
    pub fn json(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    /// `{"detail": message}` with the given status
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, serde_json::json!({ "detail": message }))
    }
}

/// Type alias for a channel sender that dispatches requests to a handler
pub type HandlerSender = mpsc::Sender<HandlerRequest>;

/// Dispatcher that routes requests to registered handler coroutines
#[derive(Clone)]
pub struct Dispatcher {
    /// Handler name to the sending side of its coroutine's channel
    pub handlers: HashMap<String, HandlerSender>,
    /// Run in insertion order around every dispatched request
    pub middlewares: Vec<Arc<dyn Middleware>>,
    stack_size: usize,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// An empty dispatcher whose handler coroutines get the stack size from
    /// [`RuntimeConfig::from_env`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_stack_size(RuntimeConfig::from_env().stack_size)
    }

    #[must_use]
    pub fn with_stack_size(stack_size: usize) -> Self {
        Dispatcher {
            handlers: HashMap::new(),
            middlewares: Vec::new(),
            stack_size,
        }
    }

    pub fn add_middleware(&mut self, mw: Arc<dyn Middleware>) {
        self.middlewares.push(mw);
    }

    /// Names of all registered handlers, sorted.
    #[must_use]
    pub fn handler_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Spawn a coroutine running `handler_fn` for every request sent to `name`.
    ///
    /// Handler panics are caught and answered with a 500.
    ///
    /// # Safety
    ///
    /// Calls `may::coroutine::Builder::spawn()`, which is unsafe in the `may`
    /// runtime. The caller must ensure the runtime is configured and that the
    /// handler sends exactly one response per request.
    pub unsafe fn register_handler<F>(&mut self, name: &str, handler_fn: F)
    where
        F: Fn(HandlerRequest) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<HandlerRequest>();
        let handler_name = name.to_string();
        let stack_size = self.stack_size;

        // SAFETY: the closure owns the receiver and the handler, both Send + 'static.
        let spawn_result = unsafe {
            coroutine::Builder::new()
                .name(handler_name.clone())
                .stack_size(stack_size)
                .spawn(move || {
                    for req in rx.iter() {
                        serve_one(&handler_fn, req);
                    }
                })
        };

        if let Err(e) = spawn_result {
            error!(
                handler_name = %handler_name,
                error = %e,
                stack_size = stack_size,
                "Failed to spawn handler coroutine - CRITICAL"
            );
            return;
        }

        info!(handler_name = %handler_name, stack_size, "Handler registered");
        self.handlers.insert(handler_name, tx);
    }

    /// Send a routed request to its handler and wait for the answer.
    ///
    /// Returns `None` when no handler is registered under the route's name.
    /// A handler whose coroutine is gone yields a 503.
    #[must_use]
    pub fn dispatch(
        &self,
        route_match: RouteMatch,
        payload: RequestPayload,
        request_id: RequestId,
    ) -> Option<HandlerResponse> {
        let Some(tx) = self.handlers.get(&route_match.handler_name) else {
            error!(
                request_id = %request_id,
                handler_name = %route_match.handler_name,
                available_handlers = ?self.handler_names(),
                "Handler not found - CRITICAL"
            );
            return None;
        };

        let info = RequestInfo {
            request_id,
            method: route_match.route.method.clone(),
            path: route_match.route.path_pattern.clone(),
            handler_name: route_match.handler_name,
        };

        // The first middleware to answer wins; every `before` still runs.
        let early = self
            .middlewares
            .iter()
            .fold(None, |early, mw| early.or(mw.before(&info)));

        let (mut resp, latency) = match early {
            Some(r) => {
                debug!(request_id = %request_id, "Middleware answered before the handler");
                (r, Duration::ZERO)
            }
            None => match call_handler(tx, &info, payload) {
                Ok(answer) => answer,
                Err(unavailable) => return Some(unavailable),
            },
        };

        for mw in &self.middlewares {
            mw.after(&info, &mut resp, latency);
        }
        Some(resp)
    }
}

/// Send the request to its handler coroutine and wait for the reply.
///
/// The only reply sender travels with the request, so a handler that drops
/// it without answering disconnects the channel instead of blocking us.
fn call_handler(
    tx: &HandlerSender,
    info: &RequestInfo,
    payload: RequestPayload,
) -> Result<(HandlerResponse, Duration), HandlerResponse> {
    let request_id = info.request_id;
    let handler_name = info.handler_name.as_str();
    debug!(
        request_id = %request_id,
        handler_name = %handler_name,
        method = %info.method,
        path = %info.path,
        "Request dispatched to handler"
    );

    let (reply_tx, reply_rx) = mpsc::channel();
    let request = HandlerRequest {
        request_id,
        method: info.method.clone(),
        path: info.path.clone(),
        handler_name: info.handler_name.clone(),
        body: payload.body,
        files: payload.files,
        params: payload.params,
        reply_tx,
    };

    let start = Instant::now();
    if let Err(e) = tx.send(request) {
        error!(
            request_id = %request_id,
            handler_name = %handler_name,
            error = %e,
            "Failed to send request to handler"
        );
        return Err(HandlerResponse::error(
            503,
            &format!("Handler '{handler_name}' is not available"),
        ));
    }

    match reply_rx.recv() {
        Ok(response) => {
            let latency = start.elapsed();
            debug!(
                request_id = %request_id,
                handler_name = %handler_name,
                latency_ms = latency.as_millis() as u64,
                status = response.status,
                "Handler response received"
            );
            Ok((response, latency))
        }
        Err(e) => {
            error!(
                request_id = %request_id,
                handler_name = %handler_name,
                error = %e,
                "Handler dropped the request without replying"
            );
            Err(HandlerResponse::error(
                503,
                &format!("Handler '{handler_name}' is not responding"),
            ))
        }
    }
}

/// Run one request through `handler_fn`, answering 500 if it panics.
fn serve_one<F>(handler_fn: &F, req: HandlerRequest)
where
    F: Fn(HandlerRequest),
{
    let reply_tx = req.reply_tx.clone();
    let handler_name = req.handler_name.clone();
    let request_id = req.request_id;

    if let Err(panic) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler_fn(req)))
    {
        let message = panic_message(&*panic);
        error!(
            request_id = %request_id,
            handler_name = %handler_name,
            panic_message = %message,
            "Handler panicked - CRITICAL"
        );
        // The dispatcher may have given up waiting; nothing to do then.
        let _ = reply_tx.send(HandlerResponse::error(
            500,
            &format!("Handler panicked: {message}"),
        ));
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
