//! # Server Module
//!
//! The HTTP front: parses raw requests (query, headers, cookies, JSON,
//! urlencoded and multipart bodies), answers the built-in endpoints and
//! hands everything else to the router and dispatcher.

mod http_server;
mod multipart;
mod request;
mod response;
mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use multipart::{boundary, parse_multipart, MultipartError};
pub use request::{
    parse_body, parse_cookies, parse_query_params, parse_request, BodyError, HeaderVec,
    ParsedBody, ParsedRequest, MAX_INLINE_HEADERS,
};
pub use response::{write_detail, write_json, write_text};
pub use service::{health_endpoint, metrics_endpoint, openapi_yaml_endpoint, AppService};
