//! HTTP request builder for provider API requests
//!
//! Turns a logical request plus a resolved [`ProviderDescriptor`] into a
//! wire-ready [`PreparedRequest`]: JSON for the generation providers, JSON or
//! hand-built multipart for the publishing provider.

use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::http::auth::{create_auth_handler, AuthHandler, RequestParts};
use crate::http::multipart::{FilePart, MultipartBody, MultipartBuilder};
use crate::types::{GenerationRequest, PayloadShape, ProviderDescriptor, PublishKind, PublishRequest, TargetShape};
use crate::{Error, Result};

/// Aspect ratio catalog, widest first
pub const ASPECT_RATIOS: [(&str, f64); 7] = [
    ("21:9", 21.0 / 9.0),
    ("16:10", 16.0 / 10.0),
    ("16:9", 16.0 / 9.0),
    ("4:3", 4.0 / 3.0),
    ("1:1", 1.0),
    ("3:4", 3.0 / 4.0),
    ("9:16", 9.0 / 16.0),
];

const DEFAULT_ASPECT_RATIO: &str = "1:1";
const TIE_EPSILON: f64 = 1e-9;

/// Pick the catalog ratio nearest to `width / height`.
///
/// Degenerate input (zero or negative sides) and ties between catalog
/// entries resolve to `1:1`.
pub fn nearest_aspect_ratio(width: i64, height: i64) -> &'static str {
    if width <= 0 || height <= 0 {
        return DEFAULT_ASPECT_RATIO;
    }
    let ratio = width as f64 / height as f64;

    let mut best = DEFAULT_ASPECT_RATIO;
    let mut best_diff = f64::INFINITY;
    let mut tied = false;
    for (label, value) in ASPECT_RATIOS {
        let diff = (ratio - value).abs();
        if diff < best_diff - TIE_EPSILON {
            best = label;
            best_diff = diff;
            tied = false;
        } else if (diff - best_diff).abs() <= TIE_EPSILON {
            tied = true;
        }
    }

    if tied {
        DEFAULT_ASPECT_RATIO
    } else {
        best
    }
}

/// Map a quality tier to the provider resolution tier
pub fn image_size_for_quality(tier: &str) -> &'static str {
    match tier.to_lowercase().as_str() {
        "hd" => "4K",
        "medium" => "2K",
        _ => "1K",
    }
}

/// Pixel size for a resolution tier and catalog ratio
pub fn pixel_size(image_size: &str, aspect_ratio: &str) -> &'static str {
    match (image_size, aspect_ratio) {
        ("4K", "1:1") => "4096x4096",
        ("4K", "16:9") => "5504x3072",
        ("4K", "9:16") => "3072x5504",
        ("4K", "21:9") => "6336x2688",
        ("4K", "4:3") => "4800x3584",
        ("4K", "3:4") => "3584x4800",
        ("4K", "16:10") => "5504x3440",
        ("2K", "1:1") => "2048x2048",
        ("2K", "16:9") => "2752x1536",
        ("2K", "9:16") => "1536x2752",
        ("2K", "21:9") => "3168x1344",
        ("2K", "4:3") => "2400x1792",
        ("2K", "3:4") => "1792x2400",
        ("2K", "16:10") => "2752x1720",
        ("1K", "16:9") => "1376x768",
        ("1K", "9:16") => "768x1376",
        ("1K", "21:9") => "1584x672",
        ("1K", "4:3") => "1200x896",
        ("1K", "3:4") => "896x1200",
        ("1K", "16:10") => "1376x860",
        _ => "1024x1024",
    }
}

fn catalog_ratio(label: &str) -> Option<&'static str> {
    ASPECT_RATIOS
        .iter()
        .map(|(l, _)| *l)
        .find(|l| *l == label)
}

/// Body of a prepared request
#[derive(Debug, Clone)]
pub enum WirePayload {
    Json(Value),
    Multipart(MultipartBody),
}

/// A request ready for [`crate::http::TransportClient::send`]
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: WirePayload,
}

impl PreparedRequest {
    pub fn is_multipart(&self) -> bool {
        matches!(self.body, WirePayload::Multipart(_))
    }

    /// URL without the query string, safe to log
    pub fn redacted_url(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        url.to_string()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Builder for constructing provider requests from descriptors
#[derive(Clone)]
pub struct RequestBuilder {
    provider: ProviderDescriptor,
    auth: Arc<dyn AuthHandler>,
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("provider", &self.provider.name)
            .field("auth", &self.auth.describe())
            .finish()
    }
}

impl RequestBuilder {
    /// Create a RequestBuilder for a resolved provider
    pub fn new(provider: &ProviderDescriptor) -> Result<Self> {
        let auth = Arc::from(create_auth_handler(provider)?);
        Ok(Self {
            provider: provider.clone(),
            auth,
        })
    }

    pub fn provider(&self) -> &ProviderDescriptor {
        &self.provider
    }

    /// Build an image generation request for this provider
    pub fn build_generation(&self, request: &GenerationRequest) -> Result<PreparedRequest> {
        let url = self.parse_url(&self.provider.endpoint())?;
        let body = match self.provider.shape {
            PayloadShape::GenerateContent => self.generate_content_body(request)?,
            PayloadShape::ChatCompletion => self.chat_completion_body(request)?,
            PayloadShape::GraphUpload => {
                return Err(Error::validation(
                    "provider",
                    format!("{} is a publishing provider", self.provider.name),
                ))
            }
        };
        self.finish_json(url, body)
    }

    /// Build the single request for a text, photo or video post
    pub fn build_publish(&self, request: &PublishRequest) -> Result<PreparedRequest> {
        let account = self.account_id()?;
        let description = request.description.clone().or_else(|| request.message.clone());

        match request.kind {
            PublishKind::Text => {
                let message = request
                    .message
                    .clone()
                    .filter(|m| !m.trim().is_empty())
                    .ok_or_else(|| Error::validation("message", "a text post requires a message"))?;
                self.build_graph_json(account, "feed", vec![("message".to_string(), message)])
            }
            PublishKind::Photo => {
                let mut fields = Vec::new();
                if let Some(message) = &request.message {
                    fields.push(("caption".to_string(), message.clone()));
                }
                self.build_graph_upload(account, "photos", fields, first_file(request)?)
            }
            PublishKind::Video => {
                let mut fields = Vec::new();
                if let Some(title) = &request.title {
                    fields.push(("title".to_string(), title.clone()));
                }
                if let Some(description) = description {
                    fields.push(("description".to_string(), description));
                }
                self.build_graph_upload(account, "videos", fields, first_file(request)?)
            }
            PublishKind::PhotoSet => Err(Error::validation(
                "kind",
                "photo sets are published in several steps",
            )),
        }
    }

    /// Album creation request for a photo set
    pub fn build_album(&self, name: &str) -> Result<PreparedRequest> {
        let account = self.account_id()?;
        self.build_graph_json(account, "albums", vec![("name".to_string(), name.to_string())])
    }

    /// Upload of one photo into an existing album
    pub fn build_album_photo(&self, album_id: &str, file: &Path) -> Result<PreparedRequest> {
        self.build_graph_upload(album_id, "photos", Vec::new(), file)
    }

    /// JSON request against `{base}/{node}/{edge}`
    pub fn build_graph_json(
        &self,
        node: &str,
        edge: &str,
        fields: Vec<(String, String)>,
    ) -> Result<PreparedRequest> {
        let url = self.graph_url(node, edge)?;
        let body: Map<String, Value> = fields
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect();
        self.finish_json(url, Value::Object(body))
    }

    /// Multipart upload of one local file against `{base}/{node}/{edge}`
    pub fn build_graph_upload(
        &self,
        node: &str,
        edge: &str,
        fields: Vec<(String, String)>,
        file: &Path,
    ) -> Result<PreparedRequest> {
        if !file.is_file() {
            return Err(Error::validation(
                "file",
                format!("file does not exist: {}", file.display()),
            ));
        }
        let data = std::fs::read(file)?;
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();

        let mut parts = RequestParts::new(self.graph_url(node, edge)?);
        parts.fields = fields;
        self.auth.apply_auth(&mut parts);

        let body = MultipartBuilder::new()
            .texts(parts.fields)
            .attachment(FilePart {
                field_name: "source".to_string(),
                file_name,
                content_type: "application/octet-stream".to_string(),
                data,
            })
            .build()?;

        let mut headers = parts.headers;
        headers.push(("Content-Type".to_string(), body.content_type()));
        headers.push(("Content-Length".to_string(), body.content_length().to_string()));

        debug!(
            provider = %self.provider.name,
            bytes = body.content_length(),
            "Built multipart upload"
        );

        Ok(PreparedRequest {
            url: parts.url,
            headers,
            body: WirePayload::Multipart(body),
        })
    }

    fn generate_content_body(&self, request: &GenerationRequest) -> Result<Value> {
        let aspect_ratio = match &request.target {
            TargetShape::Dimensions { width, height } => {
                nearest_aspect_ratio(i64::from(*width), i64::from(*height))
            }
            TargetShape::AspectRatio(label) => catalog_ratio(label).ok_or_else(|| {
                Error::validation("size", format!("unsupported aspect ratio '{}'", label))
            })?,
        };
        let image_size = image_size_for_quality(&request.quality);

        let mut parts = vec![json!({ "text": request.prompt })];
        for image in self.limited_images(request) {
            parts.push(json!({
                "inline_data": {
                    "mime_type": image.mime_type,
                    "data": base64::engine::general_purpose::STANDARD.encode(&image.data),
                }
            }));
        }

        Ok(json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
                "imageConfig": {
                    "aspectRatio": aspect_ratio,
                    "imageSize": image_size,
                }
            }
        }))
    }

    fn chat_completion_body(&self, request: &GenerationRequest) -> Result<Value> {
        let size = match &request.target {
            TargetShape::Dimensions { width, height } => format!("{}x{}", width, height),
            TargetShape::AspectRatio(label) => {
                let ratio = catalog_ratio(label).ok_or_else(|| {
                    Error::validation("size", format!("unsupported aspect ratio '{}'", label))
                })?;
                pixel_size(image_size_for_quality(&request.quality), ratio).to_string()
            }
        };

        let mut body = json!({
            "model": self.provider.model.clone().unwrap_or_default(),
            "size": size,
            "quality": request.quality,
            "messages": [{ "role": "user", "content": request.prompt }],
        });
        if self.provider.capabilities.batch {
            body["n"] = json!(request.count);
        }
        if let Some(image) = self.limited_images(request).first() {
            body["image"] = Value::String(format!(
                "data:{};base64,{}",
                image.mime_type,
                base64::engine::general_purpose::STANDARD.encode(&image.data)
            ));
        }
        Ok(body)
    }

    fn limited_images<'a>(&self, request: &'a GenerationRequest) -> &'a [crate::types::ReferenceImage] {
        let limit = self.provider.capabilities.max_reference_images;
        let images = &request.reference_images;
        if images.len() > limit {
            warn!(
                provider = %self.provider.name,
                supplied = images.len(),
                limit,
                "Dropping reference images beyond provider limit"
            );
            &images[..limit]
        } else {
            images
        }
    }

    fn finish_json(&self, url: Url, body: Value) -> Result<PreparedRequest> {
        let mut parts = RequestParts::new(url);
        self.auth.apply_auth(&mut parts);

        let body = match body {
            Value::Object(mut map) => {
                for (key, value) in parts.fields {
                    map.insert(key, Value::String(value));
                }
                Value::Object(map)
            }
            other => other,
        };

        let mut headers = parts.headers;
        headers.push(("Content-Type".to_string(), "application/json".to_string()));

        Ok(PreparedRequest {
            url: parts.url,
            headers,
            body: WirePayload::Json(body),
        })
    }

    fn graph_url(&self, node: &str, edge: &str) -> Result<Url> {
        let base = self.provider.base_url.trim_end_matches('/');
        self.parse_url(&format!("{}/{}/{}", base, node, edge))
    }

    fn parse_url(&self, raw: &str) -> Result<Url> {
        Url::parse(raw).map_err(|e| Error::Configuration {
            message: format!("Invalid endpoint URL for {}: {}", self.provider.name, raw),
            source: Some(e.into()),
        })
    }

    fn account_id(&self) -> Result<&str> {
        self.provider.account_id.as_deref().ok_or_else(|| {
            Error::configuration(format!(
                "{} requires {} to be set",
                self.provider.name,
                self.provider
                    .credential
                    .account_var
                    .as_deref()
                    .unwrap_or("an account id")
            ))
        })
    }
}

fn first_file(request: &PublishRequest) -> Result<&Path> {
    request
        .files
        .first()
        .map(|p| p.as_path())
        .ok_or_else(|| Error::validation("file", format!("a {} post requires a file", request.kind)))
}
