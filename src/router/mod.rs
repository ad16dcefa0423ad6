//! # Router Module
//!
//! Path matching and route resolution. Route patterns from the
//! [`crate::routes`] table (e.g. `/person/{person_id}`) are compiled into
//! anchored regexes at startup; each request is tested against them in
//! declaration order and the captured segments become path parameters.
//!
//! ```rust
//! use person_api::router::Router;
//! use person_api::routes::route_table;
//! use http::Method;
//!
//! let router = Router::new(route_table());
//! let m = router.route(Method::GET, "/person/detail/3").unwrap();
//! assert_eq!(m.handler_name, "show_person_by_id");
//! assert_eq!(m.get_path_param("person_id"), Some("3"));
//! ```

mod core;
#[cfg(test)]
mod tests;

pub use core::{ParamVec, RouteMatch, Router, MAX_INLINE_PARAMS};
