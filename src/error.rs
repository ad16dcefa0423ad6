//! Error types shared by the request pipeline and handlers.
//!
//! Validation failures are reported in the shape clients of FastAPI-style
//! services expect:
//!
//! ```json
//! {"detail": [{"loc": ["body", "age"], "msg": "...", "type": "value_error.range"}]}
//! ```
//!
//! while handler-raised errors carry a single string: `{"detail": "..."}`.

use crate::dispatcher::HandlerResponse;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Where a request value came from. Used as the first element of `loc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    Body,
    Query,
    Path,
    Header,
    Cookie,
    Form,
    File,
}

impl ParamLocation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ParamLocation::Body => "body",
            ParamLocation::Query => "query",
            ParamLocation::Path => "path",
            ParamLocation::Header => "header",
            ParamLocation::Cookie => "cookie",
            // Form and file fields both arrive in the request body
            ParamLocation::Form | ParamLocation::File => "body",
        }
    }
}

impl std::fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a 422 `detail` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ErrorDetail {
    pub fn new(loc: Vec<String>, msg: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            kind: kind.into(),
        }
    }

    /// A required value was absent.
    #[must_use]
    pub fn missing(loc: Vec<String>) -> Self {
        Self::new(loc, "field required", "value_error.missing")
    }

    /// Build a `loc` from a location and trailing path segments.
    #[must_use]
    pub fn loc(location: ParamLocation, rest: &[&str]) -> Vec<String> {
        std::iter::once(location.as_str())
            .chain(rest.iter().copied())
            .map(str::to_string)
            .collect()
    }
}

/// Errors a request can fail with before or inside a handler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// One or more request values failed validation (HTTP 422).
    #[error("request validation failed with {} error(s)", .0.len())]
    Validation(Vec<ErrorDetail>),
    /// A handler-raised HTTP error with a plain `detail` message.
    #[error("{status}: {detail}")]
    Http { status: u16, detail: String },
}

impl ApiError {
    #[must_use]
    pub fn not_found(detail: impl Into<String>) -> Self {
        ApiError::Http {
            status: 404,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 422,
            ApiError::Http { status, .. } => *status,
        }
    }

    #[must_use]
    pub fn into_response(self) -> HandlerResponse {
        match self {
            ApiError::Validation(details) => {
                HandlerResponse::json(422, json!({ "detail": details }))
            }
            ApiError::Http { status, detail } => {
                HandlerResponse::json(status, json!({ "detail": detail }))
            }
        }
    }
}

impl From<Vec<ErrorDetail>> for ApiError {
    fn from(details: Vec<ErrorDetail>) -> Self {
        ApiError::Validation(details)
    }
}
