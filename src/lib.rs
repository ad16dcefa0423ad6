//! # Person API
//!
//! A small HTTP service that validates every kind of request input (JSON
//! bodies, query, path, header and cookie parameters, urlencoded forms and
//! multipart uploads) and answers with echoed, merged or looked-up data.
//!
//! ## Architecture
//!
//! ```text
//! TCP ─▶ server::AppService (may_minihttp)
//!         ├─ built-ins: /health, /metrics, /openapi.json, /openapi.yaml
//!         ├─ router      method + path ─▶ RouteMatch
//!         ├─ validation  declared parameters ─▶ decoded values or 422
//!         ├─ dispatcher  one coroutine per handler, middleware around it
//!         ├─ typed       HandlerRequest ─▶ validated request type
//!         └─ handlers    home, persons, login, contact, post-image
//! ```
//!
//! The route table in [`routes`] is the single description of the API: the
//! router, parameter validation and the [`openapi`] document are all built
//! from it.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use person_api::config::AppConfig;
//! use person_api::registry::build_service;
//! use person_api::server::HttpServer;
//!
//! let config = AppConfig::default();
//! let addr = config.bind_addr.clone();
//! // SAFETY: spawns the handler coroutines
//! let service = unsafe { build_service(config) };
//! let handle = HttpServer(service).start(addr.as_str()).unwrap();
//! handle.join().unwrap();
//! ```
//!
//! ## Errors
//!
//! Validation failures answer 422 with `{"detail": [{"loc", "msg", "type"}]}`;
//! handler errors answer their own status with `{"detail": "..."}`. See
//! [`error`].
//!
//! ## Runtime
//!
//! Handlers run on `may` coroutines. Their stack size comes from
//! `PERSON_API_STACK_SIZE` (see [`runtime_config`]).

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod ids;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod otel;
pub mod registry;
pub mod router;
pub mod routes;
pub mod runtime_config;
pub mod server;
pub mod typed;
pub mod validation;
pub mod validator_cache;

pub use config::AppConfig;
pub use error::{ApiError, ErrorDetail, ParamLocation};
pub use routes::{route_table, RouteMeta};
