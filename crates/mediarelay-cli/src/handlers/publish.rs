//! Publish command handler

use crate::cli::{PublishArgs, PublishType};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::{OutputWriter, ResultReport};
use mediarelay_core::registry::publishing_catalog;
use mediarelay_core::{ProviderRegistry, PublishRequest};

/// Handle the publish command
pub async fn handle_publish(args: PublishArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::new("publish");
    let request = build_request(args)?;
    request.validate()?;

    let registry = ProviderRegistry::publishing(config.credentials(&publishing_catalog()));
    let orchestrator = super::orchestrator(registry, config)?;

    output.info(&format!("Publishing {} post", request.kind))?;

    let spinner = if config.output.progress {
        output.spinner("Uploading...")
    } else {
        None
    };
    let outcome = orchestrator.publish(&request).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let result = outcome?;

    output.success(&format!("✓ Published via {}", result.provider))?;
    output.report(&ResultReport::new(&result, Vec::new()))
}

/// Map command-line arguments onto a publish request
fn build_request(args: PublishArgs) -> Result<PublishRequest> {
    let mut request = PublishRequest::new(args.kind.into());
    request.message = args.message;
    request.title = args.title;
    request.description = args.description;
    request.force_provider = args.force_provider;

    match args.kind {
        PublishType::Text => {
            if args.file.is_some() || !args.files.is_empty() {
                return Err(Error::invalid_args("text posts do not take files"));
            }
        }
        PublishType::Photo | PublishType::Video => {
            if !args.files.is_empty() {
                return Err(Error::invalid_args("use --file for a single photo or video"));
            }
            request.files.extend(args.file);
        }
        PublishType::Photos => {
            request.files.extend(args.file);
            request.files.extend(args.files);
        }
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use mediarelay_core::PublishKind;
    use std::path::PathBuf;

    fn publish_args(argv: &[&str]) -> PublishArgs {
        let mut full = vec!["mediarelay", "publish"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Publish(args) => args,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_text_post() {
        let request = build_request(publish_args(&["text", "--message", "hello"])).unwrap();
        assert_eq!(request.kind, PublishKind::Text);
        assert_eq!(request.message.as_deref(), Some("hello"));
        assert!(request.files.is_empty());
    }

    #[test]
    fn test_text_post_rejects_files() {
        let err = build_request(publish_args(&["text", "--message", "hi", "--file", "a.jpg"])).unwrap_err();
        assert!(matches!(err, Error::InvalidArgs(_)));
    }

    #[test]
    fn test_video_fields() {
        let request = build_request(publish_args(&[
            "video",
            "--file",
            "clip.mp4",
            "--title",
            "Launch",
            "--description",
            "Day one",
        ]))
        .unwrap();

        assert_eq!(request.kind, PublishKind::Video);
        assert_eq!(request.files, vec![PathBuf::from("clip.mp4")]);
        assert_eq!(request.title.as_deref(), Some("Launch"));
        assert_eq!(request.description.as_deref(), Some("Day one"));
    }

    #[test]
    fn test_photo_set_collects_all_files() {
        let request = build_request(publish_args(&[
            "photos", "--file", "a.jpg", "--files", "b.jpg", "c.jpg",
        ]))
        .unwrap();

        assert_eq!(request.kind, PublishKind::PhotoSet);
        assert_eq!(
            request.files,
            vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg"), PathBuf::from("c.jpg")]
        );
    }

    #[test]
    fn test_single_photo_rejects_file_list() {
        let err = build_request(publish_args(&["photo", "--files", "a.jpg", "b.jpg"])).unwrap_err();
        assert!(matches!(err, Error::InvalidArgs(_)));
    }
}
