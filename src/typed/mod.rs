//! # Typed Handlers
//!
//! Type-safe request/response handling on top of the dispatcher. A handler
//! declares a request type built from [`HandlerRequest`] with `TryFrom`
//! (where body models are deserialized and validated) and a `Serialize`
//! response type. Conversion failures become 422 responses; handler errors
//! become their own status with a `{"detail": ...}` body.
//!
//! ```rust,ignore
//! struct Home;
//!
//! impl Handler for Home {
//!     type Request = NoInput;
//!     type Response = serde_json::Value;
//!
//!     fn handle(&self, _req: TypedHandlerRequest<NoInput>) -> Result<Self::Response, ApiError> {
//!         Ok(serde_json::json!({ "Hello": "World" }))
//!     }
//! }
//! ```

mod core;
mod extract;

pub use core::{respond, Handler, NoInput, TypedHandlerRequest};
pub use extract::{from_params, json_body_field, required_file};
