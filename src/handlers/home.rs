use crate::error::ApiError;
use crate::typed::{Handler, NoInput, TypedHandlerRequest};
use serde_json::{json, Value};

/// `GET /`
pub struct Home;

impl Handler for Home {
    type Request = NoInput;
    type Response = Value;

    fn handle(&self, _req: TypedHandlerRequest<NoInput>) -> Result<Value, ApiError> {
        Ok(json!({ "Hello": "World" }))
    }
}
