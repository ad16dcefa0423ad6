use super::ApiModel;
use serde::Serialize;
use serde_json::{json, Value};

/// Message returned on every successful login.
pub const LOGIN_MESSAGE: &str = "Login Succesfully!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginOut {
    pub username: String,
    pub message: String,
}

impl LoginOut {
    #[must_use]
    pub fn for_user(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            message: LOGIN_MESSAGE.to_string(),
        }
    }
}

impl ApiModel for LoginOut {
    const NAME: &'static str = "LoginOut";

    fn schema() -> Value {
        json!({
            "title": "LoginOut",
            "type": "object",
            "required": ["username", "message"],
            "additionalProperties": false,
            "properties": {
                "username": { "type": "string", "maxLength": 20 },
                "message": { "type": "string", "default": LOGIN_MESSAGE }
            }
        })
    }

    fn example() -> Option<Value> {
        Some(json!({ "username": "miguel2021", "message": LOGIN_MESSAGE }))
    }
}
