//! Response normalization for provider API responses
//!
//! Each [`PayloadShape`] maps to exactly one extraction strategy. The
//! strategy is chosen from the provider descriptor, never by sniffing the
//! response body.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::types::{MediaItem, MediaPayload, PayloadShape};

const DEFAULT_INLINE_MIME: &str = "image/jpeg";

fn data_uri_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"data:(image/[a-zA-Z0-9+.-]+);base64,([A-Za-z0-9+/]+={0,2})")
            .expect("data URI pattern is valid")
    })
}

/// Extraction strategy for one response format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseNormalizer {
    /// `candidates[].content.parts[].inlineData { data, mimeType }`
    InlineParts,
    /// base64 data URIs inside `content[].text` blocks
    EmbeddedDataUri,
    /// `{ id, post_id? }` from a publishing endpoint
    ResourceId,
}

impl ResponseNormalizer {
    pub fn for_shape(shape: PayloadShape) -> Self {
        match shape {
            PayloadShape::GenerateContent => ResponseNormalizer::InlineParts,
            PayloadShape::ChatCompletion => ResponseNormalizer::EmbeddedDataUri,
            PayloadShape::GraphUpload => ResponseNormalizer::ResourceId,
        }
    }

    /// Pull media items out of a successful response body.
    ///
    /// An empty vector is a valid answer; the orchestrator decides whether
    /// that means trying the next provider.
    pub fn extract(&self, response: &Value) -> Vec<MediaItem> {
        let found: Vec<(MediaPayload, String)> = match self {
            ResponseNormalizer::InlineParts => inline_parts(response),
            ResponseNormalizer::EmbeddedDataUri => embedded_data_uris(response),
            ResponseNormalizer::ResourceId => resource_id(response).into_iter().collect(),
        };

        debug!(normalizer = ?self, items = found.len(), "Extracted media items");

        found
            .into_iter()
            .enumerate()
            .map(|(index, (payload, mime_type))| MediaItem {
                index,
                payload,
                mime_type,
            })
            .collect()
    }
}

fn inline_parts(response: &Value) -> Vec<(MediaPayload, String)> {
    let mut items = Vec::new();
    let Some(candidates) = response.get("candidates").and_then(Value::as_array) else {
        return items;
    };

    for candidate in candidates {
        let parts = candidate
            .pointer("/content/parts")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for part in parts {
            let Some(inline) = part.get("inlineData").or_else(|| part.get("inline_data")) else {
                continue;
            };
            let Some(data) = inline.get("data").and_then(Value::as_str) else {
                continue;
            };
            let mime = inline
                .get("mimeType")
                .or_else(|| inline.get("mime_type"))
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_INLINE_MIME);
            items.push((MediaPayload::Inline { data: data.to_string() }, mime.to_string()));
        }
    }
    items
}

fn embedded_data_uris(response: &Value) -> Vec<(MediaPayload, String)> {
    let blocks = response
        .get("content")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    blocks
        .iter()
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .flat_map(|text| data_uri_pattern().captures_iter(text))
        .map(|caps| {
            (
                MediaPayload::Inline { data: caps[2].to_string() },
                caps[1].to_string(),
            )
        })
        .collect()
}

fn resource_id(response: &Value) -> Option<(MediaPayload, String)> {
    let id = match response.get("id")? {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let post_id = response
        .get("post_id")
        .and_then(Value::as_str)
        .map(str::to_string);
    Some((MediaPayload::RemoteId { id, post_id }, "application/json".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shape_selects_normalizer() {
        assert_eq!(
            ResponseNormalizer::for_shape(PayloadShape::GenerateContent),
            ResponseNormalizer::InlineParts
        );
        assert_eq!(
            ResponseNormalizer::for_shape(PayloadShape::ChatCompletion),
            ResponseNormalizer::EmbeddedDataUri
        );
        assert_eq!(
            ResponseNormalizer::for_shape(PayloadShape::GraphUpload),
            ResponseNormalizer::ResourceId
        );
    }

    #[test]
    fn test_inline_parts_in_discovery_order() {
        let response = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "here you go"},
                        {"inlineData": {"data": "AAAA", "mimeType": "image/png"}},
                        {"inlineData": {"data": "BBBB"}}
                    ]
                }
            }]
        });

        let items = ResponseNormalizer::InlineParts.extract(&response);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].index, 0);
        assert_eq!(items[0].payload, MediaPayload::Inline { data: "AAAA".into() });
        assert_eq!(items[0].mime_type, "image/png");
        assert_eq!(items[1].index, 1);
        assert_eq!(items[1].mime_type, "image/jpeg");
    }

    #[test]
    fn test_data_uris_in_text_blocks() {
        let response = json!({
            "content": [
                {"type": "text", "text": "first ![img](data:image/png;base64,iVBORw0KGgo=) and"},
                {"type": "text", "text": "second data:image/jpeg;base64,/9j/4AAQSkZJRg== done"}
            ]
        });

        let items = ResponseNormalizer::EmbeddedDataUri.extract(&response);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].mime_type, "image/png");
        assert_eq!(items[0].payload, MediaPayload::Inline { data: "iVBORw0KGgo=".into() });
        assert_eq!(items[1].index, 1);
        assert_eq!(items[1].mime_type, "image/jpeg");
        assert_eq!(items[1].payload, MediaPayload::Inline { data: "/9j/4AAQSkZJRg==".into() });
    }

    #[test]
    fn test_other_response_layouts_are_not_scanned() {
        let response = json!({
            "content": "data:image/png;base64,QUJD",
            "choices": [{"message": {"content": "data:image/webp;base64,UklGRg=="}}],
            "data": [{"b64_json": "QUJD"}]
        });
        assert!(ResponseNormalizer::EmbeddedDataUri.extract(&response).is_empty());
    }

    #[test]
    fn test_text_without_images_is_empty() {
        let response = json!({"content": [{"type": "text", "text": "I cannot draw that."}]});
        assert!(ResponseNormalizer::EmbeddedDataUri.extract(&response).is_empty());
        assert!(ResponseNormalizer::InlineParts.extract(&json!({"candidates": []})).is_empty());
    }

    #[test]
    fn test_resource_id() {
        let items = ResponseNormalizer::ResourceId.extract(&json!({"id": "111", "post_id": "999_111"}));
        assert_eq!(items.len(), 1);
        assert_eq!(
            items[0].payload,
            MediaPayload::RemoteId {
                id: "111".into(),
                post_id: Some("999_111".into())
            }
        );

        assert!(ResponseNormalizer::ResourceId.extract(&json!({"success": true})).is_empty());
    }
}
