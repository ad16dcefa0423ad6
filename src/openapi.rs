//! # OpenAPI Document
//!
//! Builds an OpenAPI 3.1 document from the route table, so the published
//! contract and the served routes cannot drift apart.

use crate::error::ParamLocation;
use crate::models::{ApiModel, ImageInfo, Location, LoginOut, Person, PersonOut};
use crate::routes::{BodyKind, ParameterMeta, RouteMeta};
use serde_json::{json, Map, Value};

pub const TITLE: &str = "Person API";

fn components() -> Value {
    json!({
        "schemas": {
            Person::NAME: Person::documented_schema(),
            PersonOut::NAME: PersonOut::documented_schema(),
            Location::NAME: Location::documented_schema(),
            LoginOut::NAME: LoginOut::documented_schema(),
            ImageInfo::NAME: ImageInfo::documented_schema(),
            "ValidationError": {
                "title": "ValidationError",
                "type": "object",
                "required": ["loc", "msg", "type"],
                "properties": {
                    "loc": { "type": "array", "items": { "type": "string" } },
                    "msg": { "type": "string" },
                    "type": { "type": "string" }
                }
            },
            "HTTPValidationError": {
                "title": "HTTPValidationError",
                "type": "object",
                "properties": {
                    "detail": {
                        "type": "array",
                        "items": { "$ref": "#/components/schemas/ValidationError" }
                    }
                }
            }
        }
    })
}

fn parameter(param: &ParameterMeta) -> Value {
    let mut out = json!({
        "name": param.wire_name(),
        "in": param.location.as_str(),
        "required": param.required,
        "schema": param.schema,
    });
    if let Some(description) = &param.description {
        out["description"] = json!(description);
    }
    if let Some(example) = &param.example {
        out["example"] = example.clone();
    }
    out
}

/// Object schema describing the form or file fields of a route.
fn form_schema(route: &RouteMeta) -> Value {
    let fields = route
        .parameters
        .iter()
        .filter(|p| matches!(p.location, ParamLocation::Form | ParamLocation::File));
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        properties.insert(field.name.clone(), field.schema.clone());
        if field.required {
            required.push(json!(field.name));
        }
    }
    json!({ "type": "object", "required": required, "properties": properties })
}

fn request_body(route: &RouteMeta) -> Option<Value> {
    let body = route.request_body.as_ref()?;
    let schema = match body.kind {
        BodyKind::Json => body.schema.clone().unwrap_or_else(|| json!({})),
        BodyKind::Form | BodyKind::Multipart => form_schema(route),
    };
    Some(json!({
        "required": body.required,
        "content": { body.kind.content_type(): { "schema": schema } }
    }))
}

fn responses(route: &RouteMeta) -> Value {
    let success_schema = match &route.response_model {
        Some((name, _)) => json!({ "$ref": format!("#/components/schemas/{name}") }),
        None => json!({}),
    };
    let mut responses = json!({
        route.success_status.to_string(): {
            "description": "Successful Response",
            "content": { "application/json": { "schema": success_schema } }
        }
    });
    let takes_input = !route.parameters.is_empty() || route.request_body.is_some();
    if takes_input {
        responses["422"] = json!({
            "description": "Validation Error",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/HTTPValidationError" }
                }
            }
        });
    }
    responses
}

fn operation(route: &RouteMeta) -> Value {
    let parameters: Vec<Value> = route
        .parameters
        .iter()
        .filter(|p| !matches!(p.location, ParamLocation::Form | ParamLocation::File))
        .map(parameter)
        .collect();

    let mut op = json!({
        "operationId": route.handler_name,
        "summary": route.summary,
        "tags": route.tags,
        "responses": responses(route),
    });
    if let Some(description) = &route.description {
        op["description"] = json!(description);
    }
    if !parameters.is_empty() {
        op["parameters"] = Value::Array(parameters);
    }
    if let Some(body) = request_body(route) {
        op["requestBody"] = body;
    }
    if route.deprecated {
        op["deprecated"] = json!(true);
    }
    op
}

/// The OpenAPI 3.1 document for `routes`.
#[must_use]
pub fn build_openapi(routes: &[RouteMeta]) -> Value {
    let mut paths = Map::new();
    for route in routes {
        let item = paths
            .entry(route.path_pattern.clone())
            .or_insert_with(|| json!({}));
        item[route.method.as_str().to_ascii_lowercase()] = operation(route);
    }

    json!({
        "openapi": "3.1.0",
        "info": {
            "title": TITLE,
            "version": env!("CARGO_PKG_VERSION"),
        },
        "paths": paths,
        "components": components(),
    })
}
