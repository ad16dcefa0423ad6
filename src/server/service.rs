use super::request::{parse_request, BodyError, ParsedBody, ParsedRequest};
use super::response::{write_detail, write_json, write_text};
use crate::config::AppConfig;
use crate::dispatcher::{Dispatcher, HandlerResponse, RequestPayload};
use crate::error::{ApiError, ErrorDetail, ParamLocation};
use crate::ids::RequestId;
use crate::middleware::MetricsMiddleware;
use crate::router::{RouteMatch, Router};
use crate::routes::BodyKind;
use crate::validation::{validate_parameters, RawParams};
use crate::validator_cache::ValidatorCache;
use http::Method;
use may_minihttp::{HttpService, Request, Response};
use serde_json::{json, Value};
use std::io;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// The `may_minihttp` service: built-in endpoints, routing, parameter
/// validation, dispatch and response-model checks.
#[derive(Clone)]
pub struct AppService {
    pub router: Arc<Router>,
    pub dispatcher: Arc<Dispatcher>,
    pub validators: Arc<ValidatorCache>,
    pub metrics: Option<Arc<MetricsMiddleware>>,
    pub openapi: Arc<Value>,
    pub config: Arc<AppConfig>,
}

impl AppService {
    #[must_use]
    pub fn new(router: Router, dispatcher: Dispatcher, openapi: Value, config: AppConfig) -> Self {
        Self {
            router: Arc::new(router),
            dispatcher: Arc::new(dispatcher),
            validators: Arc::new(ValidatorCache::new()),
            metrics: None,
            openapi: Arc::new(openapi),
            config: Arc::new(config),
        }
    }

    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<MetricsMiddleware>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn record_top_level(&self, status: u16) {
        if let Some(metrics) = &self.metrics {
            metrics.record_top_level(status);
        }
    }

    /// Answer the built-in endpoints. Returns `false` when `path` is not one.
    fn builtin(&self, path: &str, res: &mut Response) -> bool {
        match path {
            "/health" => health_endpoint(res),
            "/metrics" => match &self.metrics {
                Some(metrics) => metrics_endpoint(res, metrics),
                None => write_detail(res, 404, "Not Found"),
            },
            "/openapi.json" => write_json(res, 200, &self.openapi),
            "/openapi.yaml" => openapi_yaml_endpoint(res, &self.openapi),
            _ => return false,
        }
        true
    }

    /// Route, validate and dispatch one parsed request.
    fn handle(&self, parsed: ParsedRequest, request_id: RequestId) -> Outcome {
        let ParsedRequest {
            method,
            path,
            headers,
            cookies,
            query_params,
            body,
        } = parsed;

        let Ok(method) = Method::from_bytes(method.as_bytes()) else {
            return Outcome::Rejected(HandlerResponse::error(400, "Invalid HTTP method"));
        };

        let Some(mut route_match) = self.router.route(method.clone(), &path) else {
            return Outcome::Rejected(if self.router.allowed_methods(&path).is_empty() {
                HandlerResponse::error(404, "Not Found")
            } else {
                HandlerResponse::error(405, "Method Not Allowed")
            });
        };
        route_match.query_params = query_params;

        let body = match body {
            Ok(body) => body,
            Err(e) => return Outcome::Rejected(body_error_response(&e)),
        };

        if let Some(missing) = missing_json_body(&route_match, &body) {
            return Outcome::Rejected(ApiError::from(vec![missing]).into_response());
        }

        let params = match validate_parameters(
            &route_match.route,
            RawParams {
                path: &route_match.path_params,
                query: &route_match.query_params,
                headers: &headers,
                cookies: &cookies,
                form: &body.form,
                files: &body.files,
            },
            &self.validators,
        ) {
            Ok(params) => params,
            Err(details) => {
                debug!(
                    request_id = %request_id,
                    handler_name = %route_match.handler_name,
                    errors = ?details,
                    "Request validation failed"
                );
                return Outcome::Rejected(ApiError::from(details).into_response());
            }
        };

        let route = Arc::clone(&route_match.route);
        let payload = RequestPayload {
            body: body.json,
            files: body.files,
            params,
        };

        let Some(response) = self.dispatcher.dispatch(route_match, payload, request_id) else {
            return Outcome::Rejected(HandlerResponse::error(
                500,
                "Handler failed or not registered",
            ));
        };

        if !self.config.validate_responses || response.status != route.success_status {
            return Outcome::Dispatched(response);
        }
        let Some((model, schema)) = &route.response_model else {
            return Outcome::Dispatched(response);
        };

        let key = format!("{}:response", route.handler_name);
        let errors = self.validators.validate(&key, schema, &response.body);
        if errors.is_empty() {
            return Outcome::Dispatched(response);
        }
        error!(
            request_id = %request_id,
            handler_name = %route.handler_name,
            response_model = %model,
            errors = ?errors,
            "Response validation failed"
        );
        Outcome::Dispatched(HandlerResponse::json(
            500,
            json!({ "detail": "Response validation failed", "errors": errors }),
        ))
    }
}

/// Whether a response came back from a handler or was produced by the
/// server before dispatch.
enum Outcome {
    Dispatched(HandlerResponse),
    Rejected(HandlerResponse),
}

/// A JSON body the route requires but the request did not send.
fn missing_json_body(route_match: &RouteMatch, body: &ParsedBody) -> Option<ErrorDetail> {
    let declared = route_match.route.request_body.as_ref()?;
    (declared.kind == BodyKind::Json && declared.required && body.json.is_none())
        .then(|| ErrorDetail::missing(ErrorDetail::loc(ParamLocation::Body, &[])))
}

fn body_error_response(err: &BodyError) -> HandlerResponse {
    match err {
        BodyError::TooLarge { .. } => HandlerResponse::error(413, "Request body too large"),
        BodyError::InvalidJson(e) => ApiError::from(vec![ErrorDetail::new(
            vec![ParamLocation::Body.to_string(), e.column().to_string()],
            e.to_string(),
            "value_error.jsondecode",
        )])
        .into_response(),
        BodyError::Multipart(_) | BodyError::Io(_) => {
            HandlerResponse::error(400, "There was an error parsing the body")
        }
    }
}

/// Basic health check endpoint returning `{ "status": "ok" }`.
pub fn health_endpoint(res: &mut Response) {
    write_json(res, 200, &json!({ "status": "ok" }));
}

/// Metrics endpoint returning Prometheus text format statistics.
pub fn metrics_endpoint(res: &mut Response, metrics: &MetricsMiddleware) {
    write_text(
        res,
        200,
        "Content-Type: text/plain; version=0.0.4",
        metrics.render(),
    );
}

/// The generated OpenAPI document rendered as YAML.
pub fn openapi_yaml_endpoint(res: &mut Response, document: &Value) {
    match serde_yaml::to_string(document) {
        Ok(yaml) => write_text(res, 200, "Content-Type: application/yaml", yaml),
        Err(e) => {
            error!(error = %e, "Failed to render OpenAPI document as YAML");
            write_detail(res, 500, "Internal Server Error");
        }
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let parsed = parse_request(req, self.config.max_body_bytes);
        let request_id = RequestId::from_header_or_new(parsed.header("x-request-id"));

        if parsed.method == "GET" && self.builtin(&parsed.path, res) {
            self.record_top_level(200);
            return Ok(());
        }

        let method = parsed.method.clone();
        let path = parsed.path.clone();
        // Dispatched requests are counted by the metrics middleware
        let response = match self.handle(parsed, request_id) {
            Outcome::Dispatched(response) => response,
            Outcome::Rejected(response) => {
                self.record_top_level(response.status);
                response
            }
        };

        if response.status >= 500 {
            warn!(
                request_id = %request_id,
                method = %method,
                path = %path,
                status = response.status,
                "Request failed"
            );
        }

        write_json(res, response.status, &response.body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::HandlerRequest;
    use crate::routes::route_table;

    /// A service whose `create_person` handler echoes the submitted body,
    /// password included.
    fn echo_service(config: AppConfig) -> AppService {
        let mut dispatcher = Dispatcher::with_stack_size(0x8000);
        unsafe {
            dispatcher.register_handler("create_person", |req: HandlerRequest| {
                let body = req.body.unwrap_or(Value::Null);
                let _ = req.reply_tx.send(HandlerResponse::json(201, body));
            });
        }
        AppService::new(Router::new(route_table()), dispatcher, json!({}), config)
    }

    fn create(service: &AppService, body: Value) -> Outcome {
        let parsed = ParsedRequest {
            method: "POST".to_string(),
            path: "/person/new".to_string(),
            headers: Default::default(),
            cookies: Default::default(),
            query_params: Default::default(),
            body: Ok(ParsedBody {
                json: Some(body),
                ..ParsedBody::default()
            }),
        };
        service.handle(parsed, RequestId::new())
    }

    fn leaky_person() -> Value {
        json!({
            "first_name": "Facundo",
            "last_name": "García Martoni",
            "age": 21,
            "password": "holasoyfacundo"
        })
    }

    #[test]
    fn test_response_breaking_its_model_is_500() {
        let service = echo_service(AppConfig::default());
        let Outcome::Dispatched(resp) = create(&service, leaky_person()) else {
            panic!("expected a dispatched response");
        };
        assert_eq!(resp.status, 500);
        assert_eq!(resp.body["detail"], "Response validation failed");
        let errors = resp.body["errors"].as_array().unwrap();
        assert!(!errors.is_empty());

        let mut clean = leaky_person();
        clean.as_object_mut().unwrap().remove("password");
        let Outcome::Dispatched(resp) = create(&service, clean.clone()) else {
            panic!("expected a dispatched response");
        };
        assert_eq!(resp, HandlerResponse::json(201, clean));
    }

    #[test]
    fn test_response_validation_can_be_disabled() {
        let service = echo_service(AppConfig {
            validate_responses: false,
            ..AppConfig::default()
        });
        let Outcome::Dispatched(resp) = create(&service, leaky_person()) else {
            panic!("expected a dispatched response");
        };
        assert_eq!(resp, HandlerResponse::json(201, leaky_person()));
    }
}
