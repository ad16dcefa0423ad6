use super::ApiModel;
use serde::Serialize;
use serde_json::{json, Value};

/// A file part received in a `multipart/form-data` body.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Form field the file was sent under.
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

// Keep file contents out of debug output and logs.
impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("field", &self.field)
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadedFile {
    /// Size in kibibytes rounded to two decimals.
    #[must_use]
    pub fn size_kb(&self) -> f64 {
        (self.bytes.len() as f64 / 1024.0 * 100.0).round() / 100.0
    }
}

/// Summary returned for an uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageInfo {
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Format")]
    pub format: String,
    #[serde(rename = "Size(kb)")]
    pub size_kb: f64,
}

impl From<&UploadedFile> for ImageInfo {
    fn from(file: &UploadedFile) -> Self {
        Self {
            filename: file.filename.clone(),
            format: file.content_type.clone(),
            size_kb: file.size_kb(),
        }
    }
}

impl ApiModel for ImageInfo {
    const NAME: &'static str = "ImageInfo";

    fn schema() -> Value {
        json!({
            "title": "ImageInfo",
            "type": "object",
            "required": ["Filename", "Format", "Size(kb)"],
            "properties": {
                "Filename": { "type": "string" },
                "Format": { "type": "string" },
                "Size(kb)": { "type": "number", "minimum": 0 }
            }
        })
    }
}
