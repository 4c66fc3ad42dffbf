//! Hand-assembled `multipart/form-data` bodies
//!
//! Publishing endpoints want one binary attachment plus a handful of text
//! fields, with an exact `Content-Length`. The body is assembled in memory so
//! its length is known before the request is sent.

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::{Error, Result};

const CRLF: &str = "\r\n";

/// The single binary part of a multipart body
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field_name: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// A fully assembled multipart body
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the `Content-Type` header
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Exact byte length of the assembled body
    pub fn content_length(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Builder for a body with text fields and exactly one attachment
#[derive(Debug, Clone)]
pub struct MultipartBuilder {
    boundary: String,
    fields: Vec<(String, String)>,
    file: Option<FilePart>,
}

impl Default for MultipartBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartBuilder {
    pub fn new() -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(24)
            .map(char::from)
            .collect();
        Self::with_boundary(format!("----MediarelayBoundary{}", suffix))
    }

    /// Use a fixed boundary; mostly useful for deterministic tests
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            fields: Vec::new(),
            file: None,
        }
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn texts<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.fields.extend(fields);
        self
    }

    pub fn attachment(mut self, file: FilePart) -> Self {
        self.file = Some(file);
        self
    }

    /// Assemble the body. Fails when no attachment was supplied.
    pub fn build(self) -> Result<MultipartBody> {
        let file = self
            .file
            .ok_or_else(|| Error::validation("file", "multipart body requires one attachment"))?;

        let boundary = self.boundary;
        let mut bytes = Vec::with_capacity(file.data.len() + 256 * (self.fields.len() + 1));

        for (name, value) in &self.fields {
            bytes.extend_from_slice(format!("--{}{}", boundary, CRLF).as_bytes());
            bytes.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"{}{}",
                    header_param(name),
                    CRLF,
                    CRLF
                )
                .as_bytes(),
            );
            bytes.extend_from_slice(value.as_bytes());
            bytes.extend_from_slice(CRLF.as_bytes());
        }

        bytes.extend_from_slice(format!("--{}{}", boundary, CRLF).as_bytes());
        bytes.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"{}",
                header_param(&file.field_name),
                file_name_param(&file.file_name),
                CRLF
            )
            .as_bytes(),
        );
        bytes.extend_from_slice(format!("Content-Type: {}{}{}", file.content_type, CRLF, CRLF).as_bytes());
        bytes.extend_from_slice(&file.data);
        bytes.extend_from_slice(CRLF.as_bytes());

        bytes.extend_from_slice(format!("--{}--{}", boundary, CRLF).as_bytes());

        Ok(MultipartBody { boundary, bytes })
    }
}

/// Quoted-string value for a `Content-Disposition` parameter: `"` becomes
/// `%22` and line breaks are dropped, as browsers do.
fn header_param(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect::<String>()
        .replace('"', "%22")
}

fn file_name_param(file_name: &str) -> String {
    let escaped = header_param(file_name);
    if escaped.trim().is_empty() {
        "upload".to_string()
    } else {
        escaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    fn photo() -> FilePart {
        FilePart {
            field_name: "source".to_string(),
            file_name: "cat.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            data: vec![0xFF, 0xD8, 0x00, 0x0D, 0x0A, 0xFF, 0xD9],
        }
    }

    #[test]
    fn test_one_field_one_attachment_boundaries() {
        let body = MultipartBuilder::with_boundary("XBOUNDARYX")
            .text("caption", "hello")
            .attachment(photo())
            .build()
            .unwrap();

        let bytes = body.as_bytes();
        assert_eq!(count(bytes, b"--XBOUNDARYX\r\n"), 2);
        assert_eq!(count(bytes, b"--XBOUNDARYX--\r\n"), 1);
        assert!(bytes.ends_with(b"--XBOUNDARYX--\r\n"));
        assert_eq!(body.content_length(), bytes.len() as u64);
    }

    #[test]
    fn test_exact_layout() {
        let body = MultipartBuilder::with_boundary("B")
            .text("caption", "hi")
            .attachment(FilePart {
                field_name: "source".to_string(),
                file_name: "a.png".to_string(),
                content_type: "image/png".to_string(),
                data: b"PNG".to_vec(),
            })
            .build()
            .unwrap();

        let expected = "--B\r\n\
            Content-Disposition: form-data; name=\"caption\"\r\n\r\n\
            hi\r\n\
            --B\r\n\
            Content-Disposition: form-data; name=\"source\"; filename=\"a.png\"\r\n\
            Content-Type: image/png\r\n\r\n\
            PNG\r\n\
            --B--\r\n";
        assert_eq!(body.as_bytes(), expected.as_bytes());
        assert_eq!(body.content_length(), expected.len() as u64);
        assert_eq!(body.content_type(), "multipart/form-data; boundary=B");
    }

    #[test]
    fn test_quotes_and_line_breaks_in_file_name_are_escaped() {
        let mut part = photo();
        part.file_name = "a\"; name=\"evil\r\n.png".to_string();
        let body = MultipartBuilder::with_boundary("B").attachment(part).build().unwrap();

        let text = String::from_utf8_lossy(body.as_bytes());
        assert!(text.contains("name=\"source\"; filename=\"a%22; name=%22evil.png\"\r\n"));
        assert_eq!(count(body.as_bytes(), b"name=\""), 2);
    }

    #[test]
    fn test_blank_file_name_falls_back() {
        let mut part = photo();
        part.file_name = "\r\n".to_string();
        let body = MultipartBuilder::with_boundary("B").attachment(part).build().unwrap();
        assert_eq!(count(body.as_bytes(), b"filename=\"upload\""), 1);
    }

    #[test]
    fn test_attachment_required() {
        let result = MultipartBuilder::new().text("caption", "x").build();
        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn test_random_boundaries_differ() {
        let a = MultipartBuilder::new().attachment(photo()).build().unwrap();
        let b = MultipartBuilder::new().attachment(photo()).build().unwrap();
        assert_ne!(a.boundary(), b.boundary());
        assert!(a.boundary().starts_with("----MediarelayBoundary"));
    }
}
