use crate::error::ParamLocation;
use http::Method;
use serde_json::Value;

/// A declared request parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterMeta {
    /// Name the handler sees the decoded value under.
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    /// JSON Schema the decoded value must satisfy.
    pub schema: Value,
    pub description: Option<String>,
    pub example: Option<Value>,
}

impl ParameterMeta {
    fn new(name: &str, location: ParamLocation, required: bool, schema: Value) -> Self {
        Self {
            name: name.to_string(),
            location,
            required,
            schema,
            description: None,
            example: None,
        }
    }

    #[must_use]
    pub fn path(name: &str, schema: Value) -> Self {
        Self::new(name, ParamLocation::Path, true, schema)
    }

    #[must_use]
    pub fn query(name: &str, required: bool, schema: Value) -> Self {
        Self::new(name, ParamLocation::Query, required, schema)
    }

    #[must_use]
    pub fn header(name: &str, schema: Value) -> Self {
        Self::new(name, ParamLocation::Header, false, schema)
    }

    #[must_use]
    pub fn cookie(name: &str, schema: Value) -> Self {
        Self::new(name, ParamLocation::Cookie, false, schema)
    }

    #[must_use]
    pub fn form(name: &str, schema: Value) -> Self {
        Self::new(name, ParamLocation::Form, true, schema)
    }

    #[must_use]
    pub fn file(name: &str) -> Self {
        Self::new(
            name,
            ParamLocation::File,
            true,
            serde_json::json!({ "type": "string", "format": "binary" }),
        )
    }

    #[must_use]
    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    #[must_use]
    pub fn example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    /// Name the value travels under on the wire. Header parameters use
    /// hyphens where the declared name has underscores (`user_agent` is
    /// read from `User-Agent`).
    #[must_use]
    pub fn wire_name(&self) -> String {
        match self.location {
            ParamLocation::Header => self.name.replace('_', "-"),
            _ => self.name.clone(),
        }
    }
}

/// Encoding of the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Form,
    Multipart,
}

impl BodyKind {
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            BodyKind::Json => "application/json",
            BodyKind::Form => "application/x-www-form-urlencoded",
            BodyKind::Multipart => "multipart/form-data",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestBodyMeta {
    pub kind: BodyKind,
    pub required: bool,
    /// Schema for JSON bodies. Form and multipart bodies are described by
    /// the route's form/file parameters instead.
    pub schema: Option<Value>,
}

/// Everything known about one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMeta {
    pub method: Method,
    pub path_pattern: String,
    pub handler_name: String,
    pub summary: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub parameters: Vec<ParameterMeta>,
    pub request_body: Option<RequestBodyMeta>,
    /// Status code written on success.
    pub success_status: u16,
    /// Response model name and schema, when the operation declares one.
    pub response_model: Option<(String, Value)>,
    pub deprecated: bool,
}

impl RouteMeta {
    #[must_use]
    pub fn new(method: Method, path_pattern: &str, handler_name: &str, summary: &str) -> Self {
        Self {
            method,
            path_pattern: path_pattern.to_string(),
            handler_name: handler_name.to_string(),
            summary: summary.to_string(),
            description: None,
            tags: Vec::new(),
            parameters: Vec::new(),
            request_body: None,
            success_status: 200,
            response_model: None,
            deprecated: false,
        }
    }

    #[must_use]
    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    #[must_use]
    pub fn describe(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    #[must_use]
    pub fn param(mut self, param: ParameterMeta) -> Self {
        self.parameters.push(param);
        self
    }

    #[must_use]
    pub fn json_body(mut self, schema: Value) -> Self {
        self.request_body = Some(RequestBodyMeta {
            kind: BodyKind::Json,
            required: true,
            schema: Some(schema),
        });
        self
    }

    #[must_use]
    pub fn form_body(mut self) -> Self {
        self.request_body = Some(RequestBodyMeta {
            kind: BodyKind::Form,
            required: true,
            schema: None,
        });
        self
    }

    #[must_use]
    pub fn multipart_body(mut self) -> Self {
        self.request_body = Some(RequestBodyMeta {
            kind: BodyKind::Multipart,
            required: true,
            schema: None,
        });
        self
    }

    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.success_status = status;
        self
    }

    #[must_use]
    pub fn response_model(mut self, name: &str, schema: Value) -> Self {
        self.response_model = Some((name.to_string(), schema));
        self
    }

    /// Parameters declared for one location, in declaration order.
    pub fn parameters_in(&self, location: ParamLocation) -> impl Iterator<Item = &ParameterMeta> {
        self.parameters
            .iter()
            .filter(move |p| p.location == location)
    }
}
