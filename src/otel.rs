//! Logging initialization and configuration
//!
//! Structured logging with `tracing`:
//! - JSON lines for production, human-readable text for development
//! - Redaction of sensitive field values (`password`, `card_number`)
//! - Optional non-blocking output through `tracing-appender`
//!
//! Configuration comes from `PERSON_API_LOG_*` environment variables;
//! `RUST_LOG` overrides the level when set.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::env;
use std::fmt;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::field::RecordFields;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub const LOG_LEVEL_VAR: &str = "PERSON_API_LOG_LEVEL";
pub const LOG_FORMAT_VAR: &str = "PERSON_API_LOG_FORMAT";
pub const LOG_ASYNC_VAR: &str = "PERSON_API_LOG_ASYNC";
pub const LOG_TARGET_FILTER_VAR: &str = "PERSON_API_LOG_TARGET_FILTER";
pub const LOG_INCLUDE_LOCATION_VAR: &str = "PERSON_API_LOG_INCLUDE_LOCATION";

/// Replacement text for sensitive values.
pub const REDACTED: &str = "<REDACTED>";

/// Field names whose values never reach the log output.
pub const SENSITIVE_FIELDS: &[&str] = &["password", "card_number"];

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json, // Default to JSON
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Write through a background thread instead of blocking the caller
    pub async_logging: bool,
    /// Extra filter directives (comma-separated)
    pub target_filter: Option<String>,
    /// Include file:line location (dev only)
    pub include_location: bool,
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            log_level: env::var(LOG_LEVEL_VAR).unwrap_or_else(|_| "info".to_string()),
            format: LogFormat::parse(
                &env::var(LOG_FORMAT_VAR).unwrap_or_else(|_| "json".to_string()),
            ),
            async_logging: env_flag(LOG_ASYNC_VAR, true),
            target_filter: env::var(LOG_TARGET_FILTER_VAR).ok(),
            include_location: env_flag(LOG_INCLUDE_LOCATION_VAR, false),
        }
    }

    /// Create a default configuration for development
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            async_logging: false,
            target_filter: None,
            include_location: true,
        }
    }

    /// Create a default production configuration
    pub fn default_prod() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            async_logging: true,
            target_filter: None,
            include_location: false,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let mut env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.log_level.to_lowercase()));

        // Client disconnects are logged by may_minihttp at info level
        if let Ok(directive) = "may_minihttp=warn".parse() {
            env_filter = env_filter.add_directive(directive);
        }

        if let Some(target_filter) = &self.target_filter {
            for filter in target_filter.split(',').map(str::trim) {
                if filter.is_empty() {
                    continue;
                }
                match filter.parse() {
                    Ok(directive) => env_filter = env_filter.add_directive(directive),
                    Err(_) => eprintln!("Warning: Invalid log filter directive: {filter}"),
                }
            }
        }
        env_filter
    }
}

/// Whether values of `field_name` must be redacted.
#[must_use]
pub fn is_sensitive(field_name: &str) -> bool {
    let lower = field_name.to_ascii_lowercase();
    SENSITIVE_FIELDS.iter().any(|s| lower.contains(s))
}

/// Collects event fields as JSON values, redacting sensitive ones.
#[derive(Default)]
struct RedactingVisitor {
    fields: Map<String, Value>,
}

impl RedactingVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        let value = if is_sensitive(field.name()) {
            Value::String(REDACTED.to_string())
        } else {
            value
        };
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for RedactingVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }
}

/// One JSON object per line: timestamp, level, target, span names and the
/// (redacted) event fields.
pub struct RedactedJson {
    include_location: bool,
}

impl<S, N> FormatEvent<S, N> for RedactedJson
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut visitor = RedactingVisitor::default();
        event.record(&mut visitor);

        let mut timestamp = String::new();
        SystemTime.format_time(&mut Writer::new(&mut timestamp))?;

        let meta = event.metadata();
        let mut line = Map::new();
        line.insert("timestamp".to_string(), Value::String(timestamp));
        line.insert("level".to_string(), Value::from(meta.level().as_str()));
        line.insert("target".to_string(), Value::from(meta.target()));
        if let Some(scope) = ctx.event_scope() {
            let spans: Vec<Value> = scope.from_root().map(|s| Value::from(s.name())).collect();
            if !spans.is_empty() {
                line.insert("spans".to_string(), Value::Array(spans));
            }
        }
        if self.include_location {
            if let (Some(file), Some(line_no)) = (meta.file(), meta.line()) {
                line.insert("location".to_string(), Value::from(format!("{file}:{line_no}")));
            }
        }
        line.insert("fields".to_string(), Value::Object(visitor.fields));

        writeln!(writer, "{}", Value::Object(line))
    }
}

/// Text field formatter: message first, then `key=value` pairs, with
/// sensitive values redacted.
pub struct RedactedFields;

impl<'writer> FormatFields<'writer> for RedactedFields {
    fn format_fields<R: RecordFields>(&self, mut writer: Writer<'writer>, fields: R) -> fmt::Result {
        let mut visitor = RedactingVisitor::default();
        fields.record(&mut visitor);

        let mut sep = "";
        if let Some(Value::String(message)) = visitor.fields.remove("message") {
            write!(writer, "{message}")?;
            sep = " ";
        }
        for (key, value) in visitor.fields {
            match value {
                Value::String(s) => write!(writer, "{sep}{key}={s}")?,
                other => write!(writer, "{sep}{key}={other}")?,
            }
            sep = " ";
        }
        Ok(())
    }
}

/// Keeps the background log writer alive; drop it to flush on shutdown.
#[must_use = "dropping the guard stops the background log writer"]
pub struct LoggingGuard(Option<WorkerGuard>);

/// Initialize logging with the level overridden by `log_level`.
///
/// # Example
///
/// ```no_run
/// let _guard = person_api::otel::init_logging("info")
///     .expect("Failed to initialize logging");
/// ```
pub fn init_logging(log_level: &str) -> Result<LoggingGuard> {
    let mut config = LogConfig::from_env();
    config.log_level = log_level.to_string();
    init_logging_with_config(&config)
}

/// Initialize logging with a complete configuration.
pub fn init_logging_with_config(config: &LogConfig) -> Result<LoggingGuard> {
    let (writer, guard) = if config.async_logging {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
        (BoxMakeWriter::new(non_blocking), Some(guard))
    } else {
        (BoxMakeWriter::new(std::io::stdout), None)
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .event_format(RedactedJson {
                include_location: config.include_location,
            })
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .fmt_fields(RedactedFields)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(config.env_filter())
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(LoggingGuard(guard))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("invalid"), LogFormat::Json);
    }

    #[test]
    fn test_log_config_presets() {
        let dev = LogConfig::default_dev();
        assert_eq!(dev.format, LogFormat::Pretty);
        assert!(!dev.async_logging);
        let prod = LogConfig::default_prod();
        assert_eq!(prod.format, LogFormat::Json);
        assert!(prod.async_logging);
    }

    #[test]
    fn test_sensitive_field_names() {
        assert!(is_sensitive("password"));
        assert!(is_sensitive("new_password"));
        assert!(is_sensitive("CARD_NUMBER"));
        assert!(!is_sensitive("first_name"));
    }

    #[test]
    fn test_json_output_redacts_sensitive_fields() {
        let capture = Capture::default();
        let sink = capture.clone();
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .event_format(RedactedJson {
                    include_location: false,
                })
                .with_writer(move || sink.clone()),
        );

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(password = "hunter22", age = 30, "Person received");
        });

        let line: Value = serde_json::from_str(capture.text().trim()).unwrap();
        assert_eq!(line["level"], "INFO");
        assert_eq!(line["fields"]["password"], REDACTED);
        assert_eq!(line["fields"]["age"], 30);
        assert_eq!(line["fields"]["message"], "Person received");
    }

    #[test]
    fn test_text_output_redacts_sensitive_fields() {
        let capture = Capture::default();
        let sink = capture.clone();
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .fmt_fields(RedactedFields)
                .with_writer(move || sink.clone()),
        );

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(card_number = "4242424242424242", "Card seen");
        });

        let text = capture.text();
        assert!(text.contains("Card seen"));
        assert!(text.contains("card_number=<REDACTED>"));
        assert!(!text.contains("4242424242424242"));
    }
}
