//! # Models
//!
//! Request and response records exchanged with clients. Field constraints are
//! declared with `validator` derive attributes and enforced by
//! [`crate::validation::deserialize_validated`]; each model also publishes a
//! JSON Schema used for response validation and the OpenAPI document.

mod card;
mod file;
mod location;
mod login;
mod person;

pub use card::{CardBrand, CardNumberError, PaymentCardNumber};
pub use file::{ImageInfo, UploadedFile};
pub use location::Location;
pub use login::{LoginOut, LOGIN_MESSAGE};
pub use person::{HairColor, Person, PersonOut};

use serde_json::Value;

/// A named record with a JSON Schema description.
pub trait ApiModel {
    /// Component name in the OpenAPI document.
    const NAME: &'static str;

    /// Self-contained JSON Schema (no `$ref`s) for the model.
    fn schema() -> Value;

    /// Example instance shown in the OpenAPI document.
    fn example() -> Option<Value> {
        None
    }

    /// Schema with the example attached, as published in `components.schemas`.
    fn documented_schema() -> Value {
        let mut schema = Self::schema();
        if let (Some(example), Some(obj)) = (Self::example(), schema.as_object_mut()) {
            obj.insert("example".to_string(), example);
        }
        schema
    }
}

/// `{"type": [ty, "null"]}` for an optional field.
pub(crate) fn nullable(mut schema: Value) -> Value {
    if let Some(obj) = schema.as_object_mut() {
        if let Some(Value::String(ty)) = obj.get("type").cloned() {
            obj.insert("type".to_string(), serde_json::json!([ty, "null"]));
        }
        if let Some(Value::Array(values)) = obj.get_mut("enum") {
            values.push(Value::Null);
        }
    }
    schema
}

/// Bounded string schema shared by the name-like fields.
pub(crate) fn bounded_string(min: u64, max: u64) -> Value {
    serde_json::json!({ "type": "string", "minLength": min, "maxLength": max })
}
