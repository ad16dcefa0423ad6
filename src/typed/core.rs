use crate::dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
use crate::error::ApiError;
use crate::ids::RequestId;
use http::Method;
use serde::Serialize;
use std::convert::TryFrom;
use tracing::{debug, error};

/// Trait implemented by typed coroutine handlers.
pub trait Handler: Send + 'static {
    /// The typed request type (converted from HandlerRequest)
    type Request: TryFrom<HandlerRequest, Error = ApiError> + Send + 'static;
    /// The typed response type (serialized to JSON)
    type Response: Serialize + Send + 'static;

    /// Status code written when `handle` succeeds.
    const STATUS: u16 = 200;

    /// Handle a typed request and return a typed response or an HTTP error
    fn handle(&self, req: TypedHandlerRequest<Self::Request>) -> Result<Self::Response, ApiError>;
}

/// Typed request data passed to a Handler
#[derive(Debug, Clone)]
pub struct TypedHandlerRequest<T> {
    pub request_id: RequestId,
    pub method: Method,
    /// Route pattern that matched
    pub path: String,
    pub handler_name: String,
    /// Typed request data (validated and converted)
    pub data: T,
}

/// Request type for handlers that take no input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoInput;

impl TryFrom<HandlerRequest> for NoInput {
    type Error = ApiError;

    fn try_from(_req: HandlerRequest) -> Result<Self, Self::Error> {
        Ok(NoInput)
    }
}

/// Convert, handle and serialize one request.
pub fn respond<H: Handler>(handler: &H, req: HandlerRequest) -> HandlerResponse {
    let request_id = req.request_id;
    let method = req.method.clone();
    let path = req.path.clone();
    let handler_name = req.handler_name.clone();

    let data = match H::Request::try_from(req) {
        Ok(v) => v,
        Err(err) => {
            debug!(
                request_id = %request_id,
                handler_name = %handler_name,
                error = %err,
                "Request conversion failed"
            );
            return err.into_response();
        }
    };

    let typed_req = TypedHandlerRequest {
        request_id,
        method,
        path,
        handler_name,
        data,
    };

    match handler.handle(typed_req) {
        Ok(result) => match serde_json::to_value(result) {
            Ok(body) => HandlerResponse::json(H::STATUS, body),
            Err(e) => {
                error!(request_id = %request_id, error = %e, "Failed to serialize response");
                HandlerResponse::error(500, "Failed to serialize response")
            }
        },
        Err(err) => err.into_response(),
    }
}

impl Dispatcher {
    /// Register a typed handler under `name`.
    ///
    /// # Safety
    ///
    /// Spawns a coroutine through [`Dispatcher::register_handler`]; the same
    /// requirements apply.
    pub unsafe fn register_typed<H>(&mut self, name: &str, handler: H)
    where
        H: Handler,
    {
        // SAFETY: forwarded to the caller.
        unsafe {
            self.register_handler(name, move |req: HandlerRequest| {
                let reply_tx = req.reply_tx.clone();
                let response = respond(&handler, req);
                // The dispatcher may have given up waiting; nothing to do then.
                let _ = reply_tx.send(response);
            });
        }
    }
}
