//! # Validation
//!
//! Turns raw request values into validated data and reports every problem
//! as an [`ErrorDetail`]:
//!
//! - declared parameters (path, query, header, cookie, form, file) are
//!   decoded to their schema type and checked against their JSON Schema;
//! - JSON bodies are decoded one field at a time with serde and then
//!   checked with the model's `validator` constraints, so a single 422 lists
//!   every missing, mistyped and out-of-range field.

use crate::error::{ErrorDetail, ParamLocation};
use crate::models::UploadedFile;
use crate::router::ParamVec;
use crate::routes::{ParameterMeta, RouteMeta};
use crate::server::HeaderVec;
use crate::validator_cache::ValidatorCache;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;
use validator::{Validate, ValidationErrors};

/// Raw parameter values of one request, by location.
#[derive(Debug, Clone, Copy)]
pub struct RawParams<'a> {
    pub path: &'a ParamVec,
    pub query: &'a ParamVec,
    pub headers: &'a HeaderVec,
    pub cookies: &'a HeaderVec,
    pub form: &'a ParamVec,
    pub files: &'a [UploadedFile],
}

impl RawParams<'_> {
    fn lookup(&self, param: &ParameterMeta) -> Option<&str> {
        let name = param.wire_name();
        match param.location {
            ParamLocation::Path => last_value(self.path, &name),
            ParamLocation::Query => last_value(self.query, &name),
            ParamLocation::Form => last_value(self.form, &name),
            ParamLocation::Header => self
                .headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(&name))
                .map(|(_, v)| v.as_str()),
            ParamLocation::Cookie => self
                .cookies
                .iter()
                .find(|(k, _)| k.as_ref() == name)
                .map(|(_, v)| v.as_str()),
            ParamLocation::File | ParamLocation::Body => None,
        }
    }
}

/// Repeated keys resolve to the last value.
fn last_value<'v>(values: &'v ParamVec, name: &str) -> Option<&'v str> {
    values
        .iter()
        .rfind(|(k, _)| k.as_ref() == name)
        .map(|(_, v)| v.as_str())
}

/// Decode a raw string parameter according to its schema `type`.
///
/// Values that do not parse as the declared type are left as strings so the
/// schema check reports them.
#[must_use]
pub fn decode_param_value(value: &str, schema: &Value) -> Value {
    match schema.get("type").and_then(Value::as_str) {
        Some("integer") => value
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(value.to_string())),
        Some("number") => value
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string())),
        Some("boolean") => match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Value::Bool(true),
            "false" | "0" | "no" | "off" => Value::Bool(false),
            _ => Value::String(value.to_string()),
        },
        _ => Value::String(value.to_string()),
    }
}

fn type_mismatch(schema: &Value, decoded: &Value) -> Option<(&'static str, &'static str)> {
    match (schema.get("type").and_then(Value::as_str), decoded) {
        (Some("integer"), v) if !v.is_i64() => {
            Some(("value is not a valid integer", "type_error.integer"))
        }
        (Some("number"), v) if !v.is_number() => {
            Some(("value is not a valid float", "type_error.float"))
        }
        (Some("boolean"), v) if !v.is_boolean() => {
            Some(("value could not be parsed to a boolean", "type_error.bool"))
        }
        _ => None,
    }
}

/// Decode and validate every declared parameter of `route`.
///
/// Returns the decoded values keyed by parameter name, or all problems found.
pub fn validate_parameters(
    route: &RouteMeta,
    raw: RawParams<'_>,
    cache: &ValidatorCache,
) -> Result<Map<String, Value>, Vec<ErrorDetail>> {
    let mut decoded = Map::new();
    let mut errors = Vec::new();

    for param in &route.parameters {
        let loc = ErrorDetail::loc(param.location, &[param.wire_name().as_str()]);

        if param.location == ParamLocation::File {
            if param.required && !raw.files.iter().any(|f| f.field == param.name) {
                errors.push(ErrorDetail::missing(loc));
            }
            continue;
        }

        let Some(value) = raw.lookup(param) else {
            if param.required {
                errors.push(ErrorDetail::missing(loc));
            }
            continue;
        };

        let value = decode_param_value(value, &param.schema);
        if let Some((msg, kind)) = type_mismatch(&param.schema, &value) {
            errors.push(ErrorDetail::new(loc, msg, kind));
            continue;
        }

        let key = format!("{}:{}:{}", route.handler_name, param.location, param.name);
        let violations = cache.validate(&key, &param.schema, &value);
        if violations.is_empty() {
            decoded.insert(param.name.clone(), value);
        } else {
            errors.extend(
                violations
                    .into_iter()
                    .map(|msg| ErrorDetail::new(loc.clone(), msg, "value_error")),
            );
        }
    }

    if errors.is_empty() {
        Ok(decoded)
    } else {
        debug!(
            handler_name = %route.handler_name,
            error_count = errors.len(),
            "Parameter validation failed"
        );
        Err(errors)
    }
}

/// A request body model read field by field, so one bad field never hides
/// the others.
pub trait BodyModel: Validate + Sized {
    /// Build the model from `fields`. Fields that fail to decode are recorded
    /// in `fields` and replaced by a default here.
    fn read(fields: &mut BodyFields) -> Self;
}

/// The fields of one JSON object plus the errors found while decoding them.
#[derive(Debug)]
pub struct BodyFields {
    object: Map<String, Value>,
    loc: Vec<String>,
    errors: Vec<ErrorDetail>,
    failed: HashSet<String>,
}

impl BodyFields {
    /// # Errors
    ///
    /// A single `type_error.dict` when `value` is not a JSON object.
    pub fn new(value: Value, loc: &[String]) -> Result<Self, Vec<ErrorDetail>> {
        match value {
            Value::Object(object) => Ok(Self {
                object,
                loc: loc.to_vec(),
                errors: Vec::new(),
                failed: HashSet::new(),
            }),
            _ => Err(vec![ErrorDetail::new(
                loc.to_vec(),
                "value is not a valid dict",
                "type_error.dict",
            )]),
        }
    }

    /// Decode a required field. Absent, `null` and undecodable values are
    /// recorded and yield `T::default()`.
    pub fn required<T: DeserializeOwned + Default>(&mut self, name: &str) -> T {
        match self.object.remove(name) {
            None => {
                self.fail(name, ErrorDetail::missing);
                T::default()
            }
            Some(Value::Null) => {
                self.fail(name, |loc| {
                    ErrorDetail::new(
                        loc,
                        "none is not an allowed value",
                        "type_error.none.not_allowed",
                    )
                });
                T::default()
            }
            Some(v) => self.decode(name, v).unwrap_or_default(),
        }
    }

    /// Decode an optional field. Absent and `null` values are `None`.
    pub fn optional<T: DeserializeOwned>(&mut self, name: &str) -> Option<T> {
        match self.object.remove(name) {
            None | Some(Value::Null) => None,
            Some(v) => self.decode(name, v),
        }
    }

    fn decode<T: DeserializeOwned>(&mut self, name: &str, value: Value) -> Option<T> {
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                self.fail(name, |loc| serde_error(loc, &e));
                None
            }
        }
    }

    fn fail(&mut self, name: &str, detail: impl FnOnce(Vec<String>) -> ErrorDetail) {
        let mut loc = self.loc.clone();
        loc.push(name.to_string());
        self.errors.push(detail(loc));
        self.failed.insert(name.to_string());
    }
}

/// Decode `value` as `T` and run its field constraints.
///
/// Every missing or mistyped field and every constraint violation on the
/// remaining fields is reported, sorted by location. `loc` prefixes every
/// reported location (e.g. `["body", "person"]`).
pub fn deserialize_validated<T: BodyModel>(
    value: Value,
    loc: &[String],
) -> Result<T, Vec<ErrorDetail>> {
    let mut fields = BodyFields::new(value, loc)?;
    let item = T::read(&mut fields);
    let BodyFields {
        mut errors, failed, ..
    } = fields;

    if let Err(violations) = item.validate() {
        // Constraints on substituted defaults say nothing about the request.
        errors.extend(
            validation_errors(loc, &violations)
                .into_iter()
                .filter(|d| !d.loc.get(loc.len()).is_some_and(|f| failed.contains(f))),
        );
    }

    if errors.is_empty() {
        Ok(item)
    } else {
        errors.sort_by(|a, b| a.loc.cmp(&b.loc));
        Err(errors)
    }
}

/// Map a serde failure for a single field to a detail entry at `loc`.
fn serde_error(loc: Vec<String>, err: &serde_json::Error) -> ErrorDetail {
    let text = err.to_string();
    if text.starts_with("unknown variant") {
        return ErrorDetail::new(loc, text, "type_error.enum");
    }
    let expected = text
        .strip_prefix("invalid type")
        .and_then(|t| t.rsplit_once("expected "))
        .map(|(_, e)| e);
    if let Some(expected) = expected {
        let (msg, kind) = match expected {
            "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64" => {
                ("value is not a valid integer", "type_error.integer")
            }
            "f32" | "f64" => ("value is not a valid float", "type_error.float"),
            "a string" => ("str type expected", "type_error.str"),
            "a boolean" => ("value could not be parsed to a boolean", "type_error.bool"),
            _ => return ErrorDetail::new(loc, text, "type_error"),
        };
        return ErrorDetail::new(loc, msg, kind);
    }
    ErrorDetail::new(loc, text, "value_error")
}

/// Map `validator` failures to detail entries, sorted by location.
#[must_use]
pub fn validation_errors(loc: &[String], errors: &ValidationErrors) -> Vec<ErrorDetail> {
    let mut details: Vec<ErrorDetail> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let mut field_loc = loc.to_vec();
            field_loc.push(field.to_string());
            errs.iter()
                .map(move |e| describe(field_loc.clone(), e))
                .collect::<Vec<_>>()
        })
        .collect();
    details.sort_by(|a, b| a.loc.cmp(&b.loc));
    details
}

fn describe(loc: Vec<String>, err: &validator::ValidationError) -> ErrorDetail {
    let bound = |name: &str| err.params.get(name).and_then(Value::as_f64);
    match &*err.code {
        "length" => {
            let len = err
                .params
                .get("value")
                .and_then(Value::as_str)
                .map(|s| s.chars().count() as f64);
            match (bound("min"), bound("max"), len) {
                (Some(min), _, Some(len)) if len < min => ErrorDetail::new(
                    loc,
                    format!("ensure this value has at least {min} characters"),
                    "value_error.any_str.min_length",
                ),
                (_, Some(max), _) => ErrorDetail::new(
                    loc,
                    format!("ensure this value has at most {max} characters"),
                    "value_error.any_str.max_length",
                ),
                _ => ErrorDetail::new(loc, "invalid length", "value_error.any_str"),
            }
        }
        "range" => {
            let value = err.params.get("value").and_then(Value::as_f64);
            match (bound("min"), bound("max"), value) {
                (Some(min), _, Some(v)) if v < min => ErrorDetail::new(
                    loc,
                    format!("ensure this value is greater than or equal to {min}"),
                    "value_error.number.not_ge",
                ),
                (_, Some(max), _) => ErrorDetail::new(
                    loc,
                    format!("ensure this value is less than or equal to {max}"),
                    "value_error.number.not_le",
                ),
                _ => ErrorDetail::new(loc, "value out of range", "value_error.number"),
            }
        }
        "email" => ErrorDetail::new(loc, "value is not a valid email address", "value_error.email"),
        code => ErrorDetail::new(
            loc,
            err.message
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| code.to_string()),
            format!("value_error.{code}"),
        ),
    }
}
