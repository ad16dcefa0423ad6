use super::{bounded_string, ApiModel};
use crate::validation::{BodyFields, BodyModel};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct Location {
    #[validate(length(min = 1, max = 50))]
    pub city: String,
    #[validate(length(min = 1, max = 50))]
    pub state: String,
    #[validate(length(min = 1, max = 50))]
    pub country: String,
}

impl BodyModel for Location {
    fn read(fields: &mut BodyFields) -> Self {
        Self {
            city: fields.required("city"),
            state: fields.required("state"),
            country: fields.required("country"),
        }
    }
}

impl ApiModel for Location {
    const NAME: &'static str = "Location";

    fn schema() -> Value {
        json!({
            "title": "Location",
            "type": "object",
            "required": ["city", "state", "country"],
            "properties": {
                "city": bounded_string(1, 50),
                "state": bounded_string(1, 50),
                "country": bounded_string(1, 50)
            }
        })
    }

    fn example() -> Option<Value> {
        Some(json!({ "city": "Bogotá", "state": "Cundinamarca", "country": "Colombia" }))
    }
}
