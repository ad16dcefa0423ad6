//! # CLI Module
//!
//! Command-line entry points of the `person-api` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Run the HTTP service:
//!
//! ```bash
//! person-api serve --config person-api.yaml --addr 127.0.0.1:8000
//! ```
//!
//! Options:
//! - `--config <FILE>` - YAML configuration (`PERSON_API_CONFIG`); defaults apply without it
//! - `--addr <ADDR>` - Bind address (`PERSON_API_ADDR`), overrides `bind_addr` from the file
//! - `--log-level <LEVEL>` - Log level (`PERSON_API_LOG_LEVEL`)
//!
//! ### `routes`
//!
//! Print the route table:
//!
//! ```bash
//! person-api routes
//! ```
//!
//! ### `openapi`
//!
//! Print the generated OpenAPI document:
//!
//! ```bash
//! person-api openapi --format yaml
//! ```

mod commands;


pub use commands::{run_cli, run_command, Cli, Commands, OutputFormat};
