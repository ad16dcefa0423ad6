//! Minimal `multipart/form-data` decoding.
//!
//! Parts with a `filename` in their `Content-Disposition` become
//! [`UploadedFile`]s; all other parts are text fields.

use crate::models::UploadedFile;
use crate::router::ParamVec;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MultipartError {
    #[error("multipart content type without a boundary")]
    MissingBoundary,
    #[error("malformed multipart body: {0}")]
    Malformed(&'static str),
}

/// Boundary parameter of a `multipart/form-data` content type.
#[must_use]
pub fn boundary(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("boundary")
            .then(|| value.trim().trim_matches('"').to_string())
            .filter(|b| !b.is_empty())
    })
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// `name="value"` parameters of a `Content-Disposition` header.
fn disposition_param<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Split `body` into text fields and files.
pub fn parse_multipart(
    body: &[u8],
    boundary: &str,
) -> Result<(ParamVec, Vec<UploadedFile>), MultipartError> {
    let delimiter = format!("--{boundary}").into_bytes();
    let part_end = format!("\r\n--{boundary}").into_bytes();

    let mut fields = ParamVec::new();
    let mut files = Vec::new();

    let mut pos = find(body, &delimiter, 0)
        .ok_or(MultipartError::Malformed("opening boundary not found"))?
        + delimiter.len();

    loop {
        match body.get(pos..pos + 2) {
            Some(b"--") => break,
            Some(b"\r\n") => pos += 2,
            _ => return Err(MultipartError::Malformed("boundary not followed by CRLF")),
        }

        let headers_end = find(body, b"\r\n\r\n", pos)
            .ok_or(MultipartError::Malformed("part headers not terminated"))?;
        let headers = String::from_utf8_lossy(&body[pos..headers_end]);
        let content_start = headers_end + 4;
        let content_end = find(body, &part_end, content_start)
            .ok_or(MultipartError::Malformed("closing boundary not found"))?;
        let content = &body[content_start..content_end];

        let mut disposition = None;
        let mut content_type = None;
        for line in headers.split("\r\n") {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            if name.trim().eq_ignore_ascii_case("content-disposition") {
                disposition = Some(value.trim().to_string());
            } else if name.trim().eq_ignore_ascii_case("content-type") {
                content_type = Some(value.trim().to_string());
            }
        }

        let disposition =
            disposition.ok_or(MultipartError::Malformed("part without Content-Disposition"))?;
        let name = disposition_param(&disposition, "name")
            .ok_or(MultipartError::Malformed("part without a name"))?;

        match disposition_param(&disposition, "filename") {
            Some(filename) => files.push(UploadedFile {
                field: name.to_string(),
                filename: filename.to_string(),
                content_type: content_type
                    .unwrap_or_else(|| "application/octet-stream".to_string()),
                bytes: content.to_vec(),
            }),
            None => fields.push((
                Arc::from(name),
                String::from_utf8_lossy(content).into_owned(),
            )),
        }

        pos = content_end + part_end.len();
    }

    Ok((fields, files))
}
