//! Failover orchestration across providers
//!
//! One logical request walks the resolved provider list in priority order.
//! Each provider goes through build, send (with retry) and normalize; the
//! first provider that yields at least one media item wins. Anything else
//! is recorded as a [`ProviderFailure`] and the next provider is tried.
//!
//! ```text
//! Init -> SelectProvider -> Build -> Send -> Normalize -> Success
//!              ^              |        |         |
//!              +------ NextProvider <--+---------+
//!              |
//!              +-> AllFailed (no providers left)
//! ```

use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::error::{FailureCause, ProviderFailure};
use crate::http::builder::{PreparedRequest, RequestBuilder};
use crate::http::client::{TransportClient, TransportConfig};
use crate::http::error::HttpError;
use crate::http::normalizer::ResponseNormalizer;
use crate::http::retry::{execute_with_retry, RetryPolicy};
use crate::registry::ProviderRegistry;
use crate::types::{
    GenerationRequest, MediaItem, MediaPayload, NormalizedResult, PayloadShape, ProviderDescriptor,
    PublishKind, PublishRequest,
};
use crate::{Error, Result};

/// Public web host used to build links to published content
pub const FACEBOOK_WEB_URL: &str = "https://www.facebook.com";

/// Videos above this size get a warning before upload
pub const LARGE_VIDEO_BYTES: u64 = 1024 * 1024 * 1024;

const DEFAULT_ALBUM_NAME: &str = "Photo Album";

/// Settings shared by every request an orchestrator serves
#[derive(Debug, Clone, Default)]
pub struct OrchestratorConfig {
    pub retry: RetryPolicy,
    pub transport: TransportConfig,
}

/// What the caller asked for
#[derive(Debug, Clone, Copy)]
enum Job<'a> {
    Generate(&'a GenerationRequest),
    Publish(&'a PublishRequest),
}

/// The wire work planned for one provider
#[derive(Debug)]
enum Plan {
    Single(PreparedRequest),
    /// Album creation, then one upload per file into the new album
    Album {
        create: PreparedRequest,
        files: Vec<PathBuf>,
    },
}

#[derive(Debug)]
enum State {
    SelectProvider,
    Build(ProviderDescriptor),
    Send(ProviderDescriptor, RequestBuilder, Plan),
    Normalize(ProviderDescriptor, Value),
    NextProvider(ProviderFailure),
    Success(NormalizedResult),
    AllFailed,
}

/// Drives requests across the providers of one registry
#[derive(Debug, Clone)]
pub struct FailoverOrchestrator {
    registry: ProviderRegistry,
    client: TransportClient,
    retry: RetryPolicy,
}

impl FailoverOrchestrator {
    pub fn new(registry: ProviderRegistry, config: OrchestratorConfig) -> Result<Self> {
        let client = TransportClient::new(&config.transport)?;
        Ok(Self::with_client(registry, client, config.retry))
    }

    pub fn with_client(registry: ProviderRegistry, client: TransportClient, retry: RetryPolicy) -> Self {
        Self {
            registry,
            client,
            retry,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Generate images, failing over across providers
    pub async fn generate(&self, request: &GenerationRequest) -> Result<NormalizedResult> {
        request.validate()?;
        let providers = self.registry.resolve(request.force_provider.as_deref())?;
        info!(
            providers = providers.len(),
            count = request.count,
            target = %request.target,
            "Starting image generation"
        );
        self.run(Job::Generate(request), providers).await
    }

    /// Publish a post, photo, photo set or video
    pub async fn publish(&self, request: &PublishRequest) -> Result<NormalizedResult> {
        request.validate()?;
        let providers = self.registry.resolve(request.force_provider.as_deref())?;
        if request.kind == PublishKind::Video {
            warn_if_large_video(request);
        }
        info!(providers = providers.len(), kind = %request.kind, "Starting publish");
        self.run(Job::Publish(request), providers).await
    }

    async fn run(&self, job: Job<'_>, providers: Vec<ProviderDescriptor>) -> Result<NormalizedResult> {
        let mut queue = providers.into_iter();
        let mut failures: Vec<ProviderFailure> = Vec::new();
        let mut state = State::SelectProvider;

        loop {
            state = match state {
                State::SelectProvider => match queue.next() {
                    Some(provider) => State::Build(provider),
                    None => State::AllFailed,
                },

                State::Build(provider) => match plan(job, &provider) {
                    Ok((builder, plan)) => State::Send(provider, builder, plan),
                    Err(e) => State::NextProvider(ProviderFailure {
                        provider: provider.name,
                        cause: FailureCause::Build { message: e.to_string() },
                    }),
                },

                State::Send(provider, _, Plan::Single(request)) => {
                    let span = info_span!("provider_attempt", provider = %provider.name);
                    match self.send(&request).instrument(span).await {
                        Ok(body) => State::Normalize(provider, body),
                        Err(error) => State::NextProvider(ProviderFailure {
                            provider: provider.name,
                            cause: FailureCause::Transport { error },
                        }),
                    }
                }

                State::Send(provider, builder, Plan::Album { create, files }) => {
                    let span = info_span!("provider_attempt", provider = %provider.name);
                    match self.publish_album(&builder, &create, &files).instrument(span).await {
                        Ok(result) => State::Success(result),
                        Err(cause) => State::NextProvider(ProviderFailure {
                            provider: provider.name,
                            cause,
                        }),
                    }
                }

                State::Normalize(provider, body) => {
                    let items = ResponseNormalizer::for_shape(provider.shape).extract(&body);
                    if items.is_empty() {
                        State::NextProvider(ProviderFailure {
                            provider: provider.name,
                            cause: FailureCause::EmptyResult,
                        })
                    } else {
                        let permalink = match provider.shape {
                            PayloadShape::GraphUpload => items.first().and_then(post_permalink),
                            _ => None,
                        };
                        let mut result = NormalizedResult::new(provider.name, items);
                        result.permalink = permalink;
                        State::Success(result)
                    }
                }

                State::NextProvider(failure) => {
                    warn!(provider = %failure.provider, reason = %failure.cause, "Provider failed, moving on");
                    failures.push(failure);
                    State::SelectProvider
                }

                State::Success(result) => {
                    info!(
                        provider = %result.provider,
                        items = result.items.len(),
                        failed_providers = failures.len(),
                        "Request succeeded"
                    );
                    return Ok(result);
                }

                State::AllFailed => {
                    warn!(attempted = failures.len(), "All providers failed");
                    return Err(Error::AllProvidersFailed { failures });
                }
            };
        }
    }

    async fn send(&self, request: &PreparedRequest) -> std::result::Result<Value, HttpError> {
        execute_with_retry(|| self.client.send(request), self.retry.clone()).await
    }

    /// Create an album, then upload every photo into it in order.
    ///
    /// The first upload failure stops the flow. Photos already uploaded are
    /// left in place and named in the failure.
    async fn publish_album(
        &self,
        builder: &RequestBuilder,
        create: &PreparedRequest,
        files: &[PathBuf],
    ) -> std::result::Result<NormalizedResult, FailureCause> {
        let body = self
            .send(create)
            .await
            .map_err(|error| FailureCause::Transport { error })?;
        let album_id = match ResponseNormalizer::ResourceId.extract(&body).into_iter().next() {
            Some(MediaItem {
                payload: MediaPayload::RemoteId { id, .. },
                ..
            }) => id,
            _ => return Err(FailureCause::EmptyResult),
        };
        info!(album_id = %album_id, photos = files.len(), "Album created");

        let mut uploaded: Vec<String> = Vec::new();
        let mut items = Vec::with_capacity(files.len());

        for (position, file) in files.iter().enumerate() {
            let number = position + 1;
            let request = builder
                .build_album_photo(&album_id, file)
                .map_err(|e| partial(&album_id, &uploaded, number, &e.to_string()))?;
            let body = self
                .send(&request)
                .await
                .map_err(|e| partial(&album_id, &uploaded, number, &e.to_string()))?;

            let item = ResponseNormalizer::ResourceId
                .extract(&body)
                .into_iter()
                .next()
                .ok_or_else(|| partial(&album_id, &uploaded, number, "response carried no photo id"))?;
            if let MediaPayload::RemoteId { id, .. } = &item.payload {
                debug!(photo = number, total = files.len(), id = %id, "Photo uploaded");
                uploaded.push(id.clone());
            }
            items.push(MediaItem { index: position, ..item });
        }

        let mut result = NormalizedResult::new(builder.provider().name.clone(), items);
        result.permalink = Some(album_permalink(&album_id));
        Ok(result)
    }
}

/// Build the request(s) one provider needs for a job
fn plan(job: Job<'_>, provider: &ProviderDescriptor) -> Result<(RequestBuilder, Plan)> {
    let builder = RequestBuilder::new(provider)?;
    let plan = match job {
        Job::Generate(request) => Plan::Single(builder.build_generation(request)?),
        Job::Publish(request) if request.kind == PublishKind::PhotoSet => {
            let name = request
                .message
                .as_deref()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(DEFAULT_ALBUM_NAME);
            Plan::Album {
                create: builder.build_album(name)?,
                files: request.files.clone(),
            }
        }
        Job::Publish(request) => Plan::Single(builder.build_publish(request)?),
    };
    Ok((builder, plan))
}

fn partial(album_id: &str, uploaded: &[String], number: usize, reason: &str) -> FailureCause {
    let uploaded = if uploaded.is_empty() {
        "none".to_string()
    } else {
        uploaded.join(", ")
    };
    FailureCause::Partial {
        message: format!(
            "album {}: photo {} failed ({}); uploaded so far: {}",
            album_id, number, reason, uploaded
        ),
    }
}

/// Link to a created post; Graph ids of the form `<page>_<post>` link to the post part
pub fn post_permalink(item: &MediaItem) -> Option<String> {
    let MediaPayload::RemoteId { id, post_id } = &item.payload else {
        return None;
    };
    let raw = post_id.as_deref().unwrap_or(id);
    let post = raw.split_once('_').map(|(_, post)| post).unwrap_or(raw);
    Some(format!("{}/{}", FACEBOOK_WEB_URL, post))
}

pub fn album_permalink(album_id: &str) -> String {
    format!("{}/media/set/?set={}", FACEBOOK_WEB_URL, album_id)
}

fn warn_if_large_video(request: &PublishRequest) {
    for file in &request.files {
        if let Ok(metadata) = std::fs::metadata(file) {
            if metadata.len() > LARGE_VIDEO_BYTES {
                warn!(
                    path = %file.display(),
                    size_mb = metadata.len() / (1024 * 1024),
                    "Video is larger than 1 GiB; a resumable upload may be needed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(id: &str, post_id: Option<&str>) -> MediaItem {
        MediaItem {
            index: 0,
            payload: MediaPayload::RemoteId {
                id: id.to_string(),
                post_id: post_id.map(str::to_string),
            },
            mime_type: "application/json".to_string(),
        }
    }

    #[test]
    fn test_post_permalink_prefers_post_id() {
        assert_eq!(
            post_permalink(&remote("555", Some("123_777"))).as_deref(),
            Some("https://www.facebook.com/777")
        );
        assert_eq!(
            post_permalink(&remote("123_888", None)).as_deref(),
            Some("https://www.facebook.com/888")
        );
        assert_eq!(
            post_permalink(&remote("999", None)).as_deref(),
            Some("https://www.facebook.com/999")
        );
    }

    #[test]
    fn test_album_permalink() {
        assert_eq!(album_permalink("42"), "https://www.facebook.com/media/set/?set=42");
    }

    #[test]
    fn test_partial_failure_names_album_and_uploads() {
        let cause = partial("A1", &["p1".to_string(), "p2".to_string()], 3, "HTTP 500");
        let text = cause.to_string();
        assert!(text.contains("album A1"));
        assert!(text.contains("photo 3"));
        assert!(text.contains("p1, p2"));

        let first = partial("A1", &[], 1, "boom").to_string();
        assert!(first.contains("uploaded so far: none"));
    }

    #[test]
    fn test_plan_for_photo_set_creates_album_first() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut provider = crate::registry::publishing_catalog().remove(0);
        provider.api_key = Some("tok".to_string());
        provider.account_id = Some("page".to_string());

        let request = PublishRequest::new(PublishKind::PhotoSet).with_file(file.path());
        let (_, plan) = plan(Job::Publish(&request), &provider).unwrap();
        match plan {
            Plan::Album { create, files } => {
                assert_eq!(create.url.path(), "/v24.0/page/albums");
                assert_eq!(files.len(), 1);
            }
            Plan::Single(_) => panic!("expected album plan"),
        }
    }
}
