//! Publishing flows against a mock Graph endpoint


use std::io::Write;

use mediarelay_core::registry::FACEBOOK;
use mediarelay_core::{Error, FailureCause, MediaPayload, PublishKind, PublishRequest};
use serde_json::json;
use tempfile::NamedTempFile;
use test_support::*;
use wiremock::matchers::{body_partial_json, body_string_contains, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn image_file(bytes: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
    file.write_all(bytes).unwrap();
    file
}

#[tokio::test]
async fn test_text_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}/feed", PAGE_ID)))
        .and(body_partial_json(json!({"message": "hello page", "access_token": PAGE_TOKEN})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "page42_1001"})))
        .expect(1)
        .mount(&server)
        .await;

    let result = orchestrator(publishing_registry(&server))
        .publish(&PublishRequest::text("hello page"))
        .await
        .unwrap();

    assert_eq!(result.provider, FACEBOOK);
    assert_eq!(result.permalink.as_deref(), Some("https://www.facebook.com/1001"));
}

#[tokio::test]
async fn test_photo_upload_is_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}/photos", PAGE_ID)))
        .and(header_regex("content-type", "^multipart/form-data; boundary=.+"))
        .and(body_string_contains("name=\"source\"; filename=\""))
        .and(body_string_contains("name=\"caption\"\r\n\r\nsunset\r\n"))
        .and(body_string_contains("name=\"access_token\"\r\n\r\npage-token\r\n"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "ph1", "post_id": "page42_2002"})))
        .expect(1)
        .mount(&server)
        .await;

    let file = image_file(b"jpeg-bytes");
    let request = PublishRequest::new(PublishKind::Photo)
        .with_message("sunset")
        .with_file(file.path());

    let result = orchestrator(publishing_registry(&server)).publish(&request).await.unwrap();
    assert_eq!(
        result.items[0].payload,
        MediaPayload::RemoteId {
            id: "ph1".into(),
            post_id: Some("page42_2002".into())
        }
    );
    assert_eq!(result.permalink.as_deref(), Some("https://www.facebook.com/2002"));
}

#[tokio::test]
async fn test_video_upload_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}/videos", PAGE_ID)))
        .and(body_string_contains("name=\"title\"\r\n\r\nLaunch\r\n"))
        .and(body_string_contains("name=\"description\"\r\n\r\nfrom message\r\n"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "vid9"})))
        .expect(1)
        .mount(&server)
        .await;

    let file = image_file(b"mp4-bytes");
    let request = PublishRequest::new(PublishKind::Video)
        .with_title("Launch")
        .with_message("from message")
        .with_file(file.path());

    let result = orchestrator(publishing_registry(&server)).publish(&request).await.unwrap();
    assert_eq!(result.items.len(), 1);
}

#[tokio::test]
async fn test_photo_set_creates_album_then_uploads_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}/albums", PAGE_ID)))
        .and(body_partial_json(json!({"name": "Trip", "access_token": PAGE_TOKEN})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "album7"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/album7/photos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "photo"})))
        .expect(3)
        .mount(&server)
        .await;

    let files = [image_file(b"a"), image_file(b"b"), image_file(b"c")];
    let mut request = PublishRequest::new(PublishKind::PhotoSet).with_message("Trip");
    for file in &files {
        request = request.with_file(file.path());
    }

    let result = orchestrator(publishing_registry(&server)).publish(&request).await.unwrap();
    assert_eq!(result.items.len(), 3);
    assert_eq!(result.items[2].index, 2);
    assert_eq!(
        result.permalink.as_deref(),
        Some("https://www.facebook.com/media/set/?set=album7")
    );
}

#[tokio::test]
async fn test_photo_set_aborts_on_first_failed_upload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}/albums", PAGE_ID)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "album8"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/album8/photos"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"message": "Permissions error", "code": 200}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let files = [image_file(b"a"), image_file(b"b")];
    let request = PublishRequest::new(PublishKind::PhotoSet)
        .with_file(files[0].path())
        .with_file(files[1].path());

    let err = orchestrator(publishing_registry(&server))
        .publish(&request)
        .await
        .unwrap_err();

    match err {
        Error::AllProvidersFailed { failures } => {
            assert_eq!(failures.len(), 1);
            match &failures[0].cause {
                FailureCause::Partial { message } => {
                    assert!(message.contains("album8"));
                    assert!(message.contains("photo 1"));
                    assert!(message.contains("uploaded so far: none"));
                }
                other => panic!("unexpected cause: {:?}", other),
            }
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_throttled_post_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "Temporarily blocked", "code": 368}
        })))
        .expect(3)
        .mount(&server)
        .await;

    let err = orchestrator(publishing_registry(&server))
        .publish(&PublishRequest::text("again"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AllProvidersFailed { .. }));
}

#[tokio::test]
async fn test_missing_file_rejected_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = PublishRequest::new(PublishKind::Photo).with_file("/no/such/photo.jpg");
    let err = orchestrator(publishing_registry(&server))
        .publish(&request)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Validation { .. }));
}
