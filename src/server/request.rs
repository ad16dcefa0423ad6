use super::multipart::{self, MultipartError};
use crate::models::UploadedFile;
use crate::router::ParamVec;
use may_minihttp::Request;
use serde_json::Value;
use smallvec::SmallVec;
use std::io::Read;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Maximum inline headers/cookies before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header or cookie pairs, names as received (headers lowercased).
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Why a request body could not be turned into data.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    #[error("failed to read request body: {0}")]
    Io(#[from] std::io::Error),
}

/// Decoded request body, by encoding.
#[derive(Debug, Default)]
pub struct ParsedBody {
    pub json: Option<Value>,
    pub form: ParamVec,
    pub files: Vec<UploadedFile>,
}

/// Parsed HTTP request data used by `AppService`.
#[derive(Debug)]
pub struct ParsedRequest {
    /// HTTP method (GET, POST, etc.)
    pub method: String,
    /// Request path without the query string
    pub path: String,
    /// HTTP headers (lowercase names)
    pub headers: HeaderVec,
    /// Parsed cookies from Cookie header
    pub cookies: HeaderVec,
    /// Parsed query string parameters, in order of appearance
    pub query_params: ParamVec,
    pub body: Result<ParsedBody, BodyError>,
}

impl ParsedRequest {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Cookies of a `Cookie` header value (`a=b; c=d`).
#[must_use]
pub fn parse_cookies(header: &str) -> HeaderVec {
    header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            let value = parts.next().unwrap_or("").trim();
            Some((Arc::from(name), value.to_string()))
        })
        .collect()
}

/// Parse query string parameters from a URL path
///
/// Extracts everything after the `?` character and URL-decodes parameter names and values.
#[must_use]
pub fn parse_query_params(path: &str) -> ParamVec {
    match path.split_once('?') {
        Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
            .collect(),
        None => ParamVec::new(),
    }
}

/// Decode `bytes` according to the request's content type.
///
/// Urlencoded and multipart bodies fill `form`/`files`; anything else that
/// is non-empty must be JSON.
pub fn parse_body(content_type: &str, bytes: &[u8]) -> Result<ParsedBody, BodyError> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    match mime.as_str() {
        "application/x-www-form-urlencoded" => Ok(ParsedBody {
            form: url::form_urlencoded::parse(bytes)
                .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
                .collect(),
            ..ParsedBody::default()
        }),
        "multipart/form-data" => {
            let boundary =
                multipart::boundary(content_type).ok_or(MultipartError::MissingBoundary)?;
            let (form, files) = multipart::parse_multipart(bytes, &boundary)?;
            Ok(ParsedBody {
                form,
                files,
                ..ParsedBody::default()
            })
        }
        _ if bytes.iter().all(u8::is_ascii_whitespace) => Ok(ParsedBody::default()),
        _ => Ok(ParsedBody {
            json: Some(serde_json::from_slice(bytes)?),
            ..ParsedBody::default()
        }),
    }
}

fn read_body(req: Request, max_body_bytes: usize) -> Result<Vec<u8>, BodyError> {
    let mut bytes = Vec::new();
    // One extra byte tells an exactly-full body from an oversized one
    req.body()
        .take(max_body_bytes as u64 + 1)
        .read_to_end(&mut bytes)?;
    if bytes.len() > max_body_bytes {
        return Err(BodyError::TooLarge {
            limit: max_body_bytes,
        });
    }
    Ok(bytes)
}

/// Parse an incoming HTTP request into a ParsedRequest
///
/// Bodies larger than `max_body_bytes` are not buffered in full; they yield
/// [`BodyError::TooLarge`].
pub fn parse_request(req: Request, max_body_bytes: usize) -> ParsedRequest {
    let method = req.method().to_string();
    let raw_path = req.path().to_string();
    let path = raw_path.split('?').next().unwrap_or("/").to_string();

    let headers: HeaderVec = req
        .headers()
        .iter()
        .map(|h| {
            (
                Arc::from(h.name.to_ascii_lowercase().as_str()),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();

    debug!(
        header_count = headers.len(),
        header_names = ?headers.iter().take(20).map(|(k, _)| k.as_ref()).collect::<Vec<_>>(),
        "Headers extracted"
    );

    let cookies = headers
        .iter()
        .find(|(k, _)| k.as_ref() == "cookie")
        .map(|(_, v)| parse_cookies(v))
        .unwrap_or_default();
    debug!(
        cookie_count = cookies.len(),
        cookie_names = ?cookies.iter().map(|(k, _)| k.as_ref()).collect::<Vec<_>>(),
        "Cookies extracted"
    );

    let query_params = parse_query_params(&raw_path);
    debug!(param_count = query_params.len(), "Query params parsed");

    let content_type = headers
        .iter()
        .find(|(k, _)| k.as_ref() == "content-type")
        .map(|(_, v)| v.clone())
        .unwrap_or_default();

    let parse_start = std::time::Instant::now();
    let body = read_body(req, max_body_bytes).and_then(|bytes| {
        if !bytes.is_empty() {
            info!(
                content_type = %content_type,
                body_size_bytes = bytes.len(),
                "Request body read"
            );
        }
        parse_body(&content_type, &bytes)
    });

    match &body {
        Ok(parsed) => debug!(
            parse_duration_us = parse_start.elapsed().as_micros() as u64,
            json = parsed.json.is_some(),
            form_fields = parsed.form.len(),
            files = parsed.files.len(),
            "Request body parsed"
        ),
        Err(e) => warn!(error = %e, content_type = %content_type, "Request body rejected"),
    }

    info!(
        method = %method,
        path = %path,
        headers_count = headers.len(),
        "HTTP request parsed"
    );

    ParsedRequest {
        method,
        path,
        headers,
        cookies,
        query_params,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cookies() {
        let cookies = parse_cookies("a=b; c=d; ads=yes");
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies[0].0.as_ref(), "a");
        assert_eq!(cookies[2].1, "yes");
    }

    #[test]
    fn test_parse_query_params() {
        let q = parse_query_params("/person/detail?name=Ana%20Mar%C3%ADa&age=25");
        assert_eq!(q.len(), 2);
        assert_eq!(q[0].1, "Ana María");
        assert_eq!(q[1].1, "25");
        assert!(parse_query_params("/person/detail").is_empty());
    }

    #[test]
    fn test_parse_body_by_content_type() {
        let json = parse_body("application/json", br#"{"a": 1}"#).unwrap();
        assert_eq!(json.json, Some(serde_json::json!({ "a": 1 })));

        let form = parse_body(
            "application/x-www-form-urlencoded",
            b"username=ana&password=secret+word",
        )
        .unwrap();
        assert!(form.json.is_none());
        assert_eq!(form.form[1].1, "secret word");

        let empty = parse_body("application/json", b"").unwrap();
        assert!(empty.json.is_none());
    }

    #[test]
    fn test_parse_body_errors() {
        assert!(matches!(
            parse_body("application/json", b"{not json"),
            Err(BodyError::InvalidJson(_))
        ));
        assert!(matches!(
            parse_body("multipart/form-data", b"--x--"),
            Err(BodyError::Multipart(MultipartError::MissingBoundary))
        ));
    }
}
