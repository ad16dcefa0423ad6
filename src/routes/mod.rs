//! # Routes Module
//!
//! The route table is the single description of the service's HTTP surface.
//! The [`crate::router`] compiles it into path matchers, the server uses the
//! declared parameters to decode and validate incoming values, and
//! [`crate::openapi`] renders it as an OpenAPI 3.1 document.
//!
//! ```rust
//! use person_api::routes::route_table;
//!
//! for route in route_table() {
//!     println!("{} {} -> {}", route.method, route.path_pattern, route.handler_name);
//! }
//! ```

mod table;
mod types;

pub use table::route_table;
pub use types::{BodyKind, ParameterMeta, RequestBodyMeta, RouteMeta};
