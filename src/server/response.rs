use may_minihttp::Response;
use serde_json::Value;
use tracing::error;

fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Payload Too Large",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "OK",
    }
}

/// Write `body` as JSON with the given status.
pub fn write_json(res: &mut Response, status: u16, body: &Value) {
    res.status_code(status as usize, status_reason(status));
    res.header("Content-Type: application/json");
    match serde_json::to_vec(body) {
        Ok(bytes) => {
            res.body_vec(bytes);
        }
        Err(e) => {
            // Only reachable with non-string map keys, which Value cannot hold
            error!(error = %e, "Failed to serialize response body");
            res.status_code(500, status_reason(500));
            res.body_vec(br#"{"detail":"Internal Server Error"}"#.to_vec());
        }
    }
}

/// `{"detail": message}` with the given status.
pub fn write_detail(res: &mut Response, status: u16, message: &str) {
    write_json(res, status, &serde_json::json!({ "detail": message }));
}

/// Write a non-JSON body. `content_type` is a full header line.
pub fn write_text(res: &mut Response, status: u16, content_type: &'static str, body: String) {
    res.status_code(status as usize, status_reason(status));
    res.header(content_type);
    res.body_vec(body.into_bytes());
}
