//! Core data types for Mediarelay
//!
//! Requests, provider descriptors and normalized results. Every value here
//! lives for a single request and is dropped when the request finishes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::http::auth::CredentialPlacement;
use crate::http::builder::ASPECT_RATIOS;
use crate::{Error, Result};

/// Upper bound on reference images accepted by any provider
pub const MAX_REFERENCE_IMAGES: usize = 14;

/// Inclusive bounds for the requested output count
pub const MIN_OUTPUT_COUNT: u32 = 1;
pub const MAX_OUTPUT_COUNT: u32 = 10;

// ========================================
// Generation requests
// ========================================

/// A reference image sent alongside the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl ReferenceImage {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    /// Load a reference image from disk, inferring the MIME type from the extension
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::validation(
                "reference_images",
                format!("file does not exist: {}", path.display()),
            ));
        }
        let data = std::fs::read(path)?;
        Ok(Self::new(data, mime_for_path(path)))
    }
}

/// Guess an image MIME type from a file extension; JPEG when unknown
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}

/// Requested output geometry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetShape {
    /// Explicit pixel dimensions, e.g. `1920x1080`
    Dimensions { width: u32, height: u32 },
    /// A catalog aspect ratio label, e.g. `16:9`
    AspectRatio(String),
}

impl Default for TargetShape {
    fn default() -> Self {
        TargetShape::Dimensions {
            width: 1024,
            height: 1024,
        }
    }
}

impl FromStr for TargetShape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        if let Some((w, h)) = s.split_once('x') {
            let width = w.trim().parse::<u32>();
            let height = h.trim().parse::<u32>();
            if let (Ok(width), Ok(height)) = (width, height) {
                return Ok(TargetShape::Dimensions { width, height });
            }
        } else if s.contains(':') {
            return Ok(TargetShape::AspectRatio(s));
        }
        Err(Error::validation(
            "size",
            format!("invalid size '{}', expected WIDTHxHEIGHT or W:H", s),
        ))
    }
}

impl fmt::Display for TargetShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetShape::Dimensions { width, height } => write!(f, "{}x{}", width, height),
            TargetShape::AspectRatio(ratio) => write!(f, "{}", ratio),
        }
    }
}

/// One logical "generate an image" request
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub reference_images: Vec<ReferenceImage>,
    pub target: TargetShape,
    /// Quality tier: `hd`, `medium` or `standard`
    pub quality: String,
    pub count: u32,
    pub force_provider: Option<String>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            reference_images: Vec::new(),
            target: TargetShape::default(),
            quality: "standard".to_string(),
            count: 1,
            force_provider: None,
        }
    }

    pub fn with_target(mut self, target: TargetShape) -> Self {
        self.target = target;
        self
    }

    pub fn with_quality(mut self, quality: impl Into<String>) -> Self {
        self.quality = quality.into();
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_reference_image(mut self, image: ReferenceImage) -> Self {
        self.reference_images.push(image);
        self
    }

    pub fn with_force_provider(mut self, provider: impl Into<String>) -> Self {
        self.force_provider = Some(provider.into());
        self
    }

    /// Request-level checks that hold regardless of provider
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(Error::validation("prompt", "prompt must not be empty"));
        }
        if !(MIN_OUTPUT_COUNT..=MAX_OUTPUT_COUNT).contains(&self.count) {
            return Err(Error::validation(
                "count",
                format!(
                    "must be between {} and {}, got {}",
                    MIN_OUTPUT_COUNT, MAX_OUTPUT_COUNT, self.count
                ),
            ));
        }
        if self.reference_images.len() > MAX_REFERENCE_IMAGES {
            return Err(Error::validation(
                "reference_images",
                format!(
                    "at most {} reference images are supported, got {}",
                    MAX_REFERENCE_IMAGES,
                    self.reference_images.len()
                ),
            ));
        }
        if let TargetShape::AspectRatio(label) = &self.target {
            if !ASPECT_RATIOS.iter().any(|(known, _)| *known == label.as_str()) {
                return Err(Error::validation(
                    "size",
                    format!("unsupported aspect ratio '{}'", label),
                ));
            }
        }
        Ok(())
    }
}

// ========================================
// Publish requests
// ========================================

/// Content variant of a publish request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishKind {
    Text,
    Photo,
    PhotoSet,
    Video,
}

impl fmt::Display for PublishKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishKind::Text => write!(f, "text"),
            PublishKind::Photo => write!(f, "photo"),
            PublishKind::PhotoSet => write!(f, "photo-set"),
            PublishKind::Video => write!(f, "video"),
        }
    }
}

/// One logical "publish media" request
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub kind: PublishKind,
    pub message: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub files: Vec<PathBuf>,
    pub force_provider: Option<String>,
}

impl PublishRequest {
    pub fn new(kind: PublishKind) -> Self {
        Self {
            kind,
            message: None,
            title: None,
            description: None,
            files: Vec::new(),
            force_provider: None,
        }
    }

    pub fn text(message: impl Into<String>) -> Self {
        Self::new(PublishKind::Text).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    /// Mandatory-field and local-file checks for the chosen content variant
    pub fn validate(&self) -> Result<()> {
        match self.kind {
            PublishKind::Text => {
                let has_message = self.message.as_deref().is_some_and(|m| !m.trim().is_empty());
                if !has_message {
                    return Err(Error::validation("message", "a text post requires a message"));
                }
            }
            PublishKind::Photo | PublishKind::Video => {
                if self.files.len() != 1 {
                    return Err(Error::validation(
                        "file",
                        format!("a {} post requires exactly one file, got {}", self.kind, self.files.len()),
                    ));
                }
            }
            PublishKind::PhotoSet => {
                if self.files.is_empty() {
                    return Err(Error::validation("files", "a photo set requires at least one file"));
                }
            }
        }

        for file in &self.files {
            if !file.is_file() {
                return Err(Error::validation(
                    "file",
                    format!("file does not exist: {}", file.display()),
                ));
            }
        }
        Ok(())
    }
}

// ========================================
// Providers
// ========================================

/// Which credential a provider needs and where it goes on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSpec {
    /// Environment variable holding the secret
    pub key_var: String,
    pub placement: CredentialPlacement,
    /// Optional second variable naming the account/page the provider acts on
    pub account_var: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub multipart: bool,
    pub max_reference_images: usize,
    pub batch: bool,
}

/// Selects both the request schema and the response normalizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    /// `contents`/`parts` body, inline image parts in `candidates`
    GenerateContent,
    /// `messages` body, base64 data-URIs embedded in returned text
    ChatCompletion,
    /// Graph-style publishing: JSON or multipart form, `{id, post_id}` replies
    GraphUpload,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    pub name: String,
    pub base_url: String,
    /// Path appended to `base_url` for generation providers
    pub path: String,
    pub model: Option<String>,
    pub credential: CredentialSpec,
    pub capabilities: Capabilities,
    pub shape: PayloadShape,
    /// Filled in by the registry when the credential is found
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(skip)]
    pub account_id: Option<String>,
}

impl ProviderDescriptor {
    pub fn endpoint(&self) -> String {
        join_url(&self.base_url, &self.path)
    }
}

impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("path", &self.path)
            .field("model", &self.model)
            .field("credential", &self.credential)
            .field("capabilities", &self.capabilities)
            .field("shape", &self.shape)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Join a base URL and a path with exactly one slash between them
pub fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.trim_end_matches('/').to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

// ========================================
// Results
// ========================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaPayload {
    /// Base64-encoded media bytes
    Inline { data: String },
    /// Identifier of a resource created remotely
    RemoteId { id: String, post_id: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub index: usize,
    pub payload: MediaPayload,
    pub mime_type: String,
}

impl MediaItem {
    /// File extension used when persisting this item
    pub fn extension(&self) -> &'static str {
        if self.mime_type.contains("jpeg") {
            "jpg"
        } else {
            "png"
        }
    }
}

/// The uniform result of a successful orchestration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedResult {
    pub provider: String,
    pub items: Vec<MediaItem>,
    /// Public link to the created post or album, when one exists
    pub permalink: Option<String>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

impl NormalizedResult {
    pub fn new(provider: impl Into<String>, items: Vec<MediaItem>) -> Self {
        Self {
            provider: provider.into(),
            items,
            permalink: None,
            completed_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_shape_parsing() {
        assert_eq!(
            "1920x1080".parse::<TargetShape>().unwrap(),
            TargetShape::Dimensions { width: 1920, height: 1080 }
        );
        assert_eq!(
            "16:9".parse::<TargetShape>().unwrap(),
            TargetShape::AspectRatio("16:9".to_string())
        );
        assert!("big".parse::<TargetShape>().is_err());
        assert!("12xabc".parse::<TargetShape>().is_err());
    }

    #[test]
    fn test_generation_count_bounds() {
        assert!(GenerationRequest::new("cat").with_count(1).validate().is_ok());
        assert!(GenerationRequest::new("cat").with_count(10).validate().is_ok());

        let err = GenerationRequest::new("cat").with_count(0).validate().unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "count"));
        assert!(GenerationRequest::new("cat").with_count(11).validate().is_err());
    }

    #[test]
    fn test_generation_rejects_too_many_images() {
        let mut request = GenerationRequest::new("collage");
        for _ in 0..=MAX_REFERENCE_IMAGES {
            request = request.with_reference_image(ReferenceImage::new(vec![1], "image/png"));
        }
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_generation_rejects_unknown_aspect_label() {
        let request = GenerationRequest::new("cat").with_target(TargetShape::AspectRatio("5:4".to_string()));
        assert!(matches!(request.validate(), Err(Error::Validation { ref field, .. }) if field == "size"));
        assert!(GenerationRequest::new("cat")
            .with_target(TargetShape::AspectRatio("21:9".to_string()))
            .validate()
            .is_ok());
    }

    #[test]
    fn test_text_post_requires_message() {
        assert!(PublishRequest::new(PublishKind::Text).validate().is_err());
        assert!(PublishRequest::text("  ").validate().is_err());
        assert!(PublishRequest::text("hello").validate().is_ok());
    }

    #[test]
    fn test_photo_requires_existing_file() {
        let err = PublishRequest::new(PublishKind::Photo)
            .with_file("/definitely/not/here.jpg")
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));

        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(PublishRequest::new(PublishKind::Photo)
            .with_file(file.path())
            .validate()
            .is_ok());
    }

    #[test]
    fn test_media_extension() {
        let item = |mime: &str| MediaItem {
            index: 0,
            payload: MediaPayload::Inline { data: String::new() },
            mime_type: mime.to_string(),
        };
        assert_eq!(item("image/jpeg").extension(), "jpg");
        assert_eq!(item("image/png").extension(), "png");
        assert_eq!(item("image/webp").extension(), "png");
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("http://h:1/", "/v1/messages"), "http://h:1/v1/messages");
        assert_eq!(join_url("http://h:1", "v1"), "http://h:1/v1");
        assert_eq!(join_url("http://h:1/", ""), "http://h:1");
    }

    #[test]
    fn test_descriptor_debug_masks_api_key() {
        let mut provider = crate::registry::publishing_catalog().remove(0);
        provider.api_key = Some("EAAG-page-secret".to_string());
        provider.account_id = Some("page42".to_string());

        let text = format!("{:?}", provider);
        assert!(!text.contains("EAAG-page-secret"));
        assert!(text.contains("api_key: Some(\"***\")"));
        assert!(text.contains("page42"));
    }
}
