//! Helpers for building typed requests out of a [`HandlerRequest`].

use crate::dispatcher::HandlerRequest;
use crate::error::{ApiError, ErrorDetail, ParamLocation};
use crate::models::UploadedFile;
use crate::validation::{deserialize_validated, BodyModel};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::error;

/// Deserialize the route's decoded parameters into `T`.
///
/// Parameters were already checked against their declared schemas by the
/// server, so a failure here means the parameter struct and the route table
/// disagree. That is a server bug, reported as a 500.
pub fn from_params<T: DeserializeOwned>(req: &HandlerRequest) -> Result<T, ApiError> {
    serde_json::from_value(Value::Object(req.params.clone())).map_err(|e| {
        error!(
            request_id = %req.request_id,
            handler_name = %req.handler_name,
            error = %e,
            "Validated parameters do not fit the handler's parameter type"
        );
        ApiError::Http {
            status: 500,
            detail: "Internal Server Error".to_string(),
        }
    })
}

/// Take `field` out of the JSON body (the whole body when `field` is `None`),
/// then deserialize and validate it as `T`.
pub fn json_body_field<T: BodyModel>(
    body: &mut Option<Value>,
    field: Option<&str>,
) -> Result<T, Vec<ErrorDetail>> {
    let (value, loc): (Option<Value>, Vec<&str>) = match field {
        None => (body.take(), Vec::new()),
        Some(name) => (
            body.as_mut()
                .and_then(Value::as_object_mut)
                .and_then(|obj| obj.remove(name)),
            vec![name],
        ),
    };
    match value {
        Some(v) => deserialize_validated(v, &ErrorDetail::loc(ParamLocation::Body, &loc)),
        None => Err(vec![ErrorDetail::missing(ErrorDetail::loc(
            ParamLocation::Body,
            &loc,
        ))]),
    }
}

/// The uploaded file sent under `field`, or a "field required" error.
pub fn required_file(req: &mut HandlerRequest, field: &str) -> Result<UploadedFile, ApiError> {
    match req.files.iter().position(|f| f.field == field) {
        Some(idx) => Ok(req.files.swap_remove(idx)),
        None => Err(ApiError::Validation(vec![ErrorDetail::missing(
            ErrorDetail::loc(ParamLocation::File, &[field]),
        )])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RequestId;
    use crate::models::Person;
    use http::Method;
    use may::sync::mpsc;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct ById {
        person_id: i64,
    }

    fn request(params: Value, body: Option<Value>) -> HandlerRequest {
        let (reply_tx, _reply_rx) = mpsc::channel();
        HandlerRequest {
            request_id: RequestId::new(),
            method: Method::GET,
            path: "/person/{person_id}".to_string(),
            handler_name: "show_person".to_string(),
            body,
            files: Vec::new(),
            params: params.as_object().cloned().unwrap_or_default(),
            reply_tx,
        }
    }

    #[test]
    fn test_from_params_decodes_declared_params() {
        let by_id: ById = from_params(&request(json!({ "person_id": 7 }), None)).unwrap();
        assert_eq!(by_id.person_id, 7);
    }

    #[test]
    fn test_from_params_mismatch_is_server_error() {
        let err = from_params::<ById>(&request(json!({ "id": 7 }), None)).unwrap_err();
        assert_eq!(err.status(), 500);
        assert!(matches!(err, ApiError::Http { status: 500, .. }));
    }

    #[test]
    fn test_json_body_field_missing_and_nested_loc() {
        let mut body = Some(json!({ "location": {} }));
        let err = json_body_field::<Person>(&mut body, Some("person")).unwrap_err();
        assert_eq!(
            err,
            vec![ErrorDetail::missing(ErrorDetail::loc(
                ParamLocation::Body,
                &["person"]
            ))]
        );

        let mut body = Some(json!({ "person": { "first_name": "A" } }));
        let err = json_body_field::<Person>(&mut body, Some("person")).unwrap_err();
        assert!(err.iter().all(|d| d.loc[..2] == ["body", "person"]));
        assert_eq!(err.len(), 3);
    }
}
