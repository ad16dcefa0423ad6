//! # Dispatcher Module
//!
//! Coroutine-based request handler dispatch.
//!
//! Each registered handler runs in its own `may` coroutine and receives
//! [`HandlerRequest`]s over an MPSC channel. Every request carries a reply
//! channel on which the handler sends exactly one [`HandlerResponse`].
//!
//! ```rust,ignore
//! use person_api::dispatcher::{Dispatcher, HandlerRequest, HandlerResponse};
//!
//! let mut dispatcher = Dispatcher::new();
//! unsafe {
//!     dispatcher.register_handler("home", |req: HandlerRequest| {
//!         let _ = req.reply_tx.send(HandlerResponse::json(
//!             200,
//!             serde_json::json!({ "Hello": "World" }),
//!         ));
//!     });
//! }
//! ```
//!
//! ## Request Flow
//!
//! 1. Router matches incoming request → route metadata
//! 2. Dispatcher looks up the handler by name
//! 3. Middleware `before` hooks run; any of them may answer early
//! 4. Request is sent to the handler coroutine, the dispatcher waits on the reply channel
//! 5. Middleware `after` hooks see the response and the latency
//!
//! ## Error Handling
//!
//! - Missing handlers make `dispatch` return `None` (the server answers 500)
//! - Handler panics are caught and turned into 500 responses
//! - A closed handler channel yields a 503 response

mod core;

pub use core::{
    Dispatcher, HandlerRequest, HandlerResponse, HandlerSender, RequestInfo, RequestPayload,
};
