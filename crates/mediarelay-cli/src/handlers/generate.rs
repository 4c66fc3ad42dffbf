//! Generate command handler

use crate::cli::GenerateArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::{OutputWriter, ResultReport};
use mediarelay_core::registry::image_generation_catalog;
use mediarelay_core::{persist_items, GenerationRequest, ProviderRegistry, ReferenceImage, TargetShape};
use std::path::PathBuf;

/// Handle the generate command
pub async fn handle_generate(args: GenerateArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::new("generate");
    let request = build_request(&args)?;
    request.validate()?;

    let registry = ProviderRegistry::image_generation(config.credentials(&image_generation_catalog()));
    let orchestrator = super::orchestrator(registry, config)?;

    output.info(&format!(
        "Generating {} image(s) at {} ({})",
        request.count, request.target, request.quality
    ))?;

    let spinner = if config.output.progress {
        output.spinner("Waiting for provider...")
    } else {
        None
    };
    let outcome = orchestrator.generate(&request).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let result = outcome?;

    let files = if args.no_save {
        Vec::new()
    } else {
        let dir = output_directory(&args, config);
        persist_items(&result.items, &dir, &args.prefix)?
    };

    output.success(&format!("✓ Generated with {}", result.provider))?;
    output.report(&ResultReport::new(&result, files))
}

/// Map command-line arguments onto a generation request
fn build_request(args: &GenerateArgs) -> Result<GenerationRequest> {
    let target: TargetShape = args.size.parse()?;

    let mut request = GenerationRequest::new(args.prompt.clone())
        .with_target(target)
        .with_quality(args.quality.as_str())
        .with_count(args.count);

    for path in &args.images {
        request = request.with_reference_image(ReferenceImage::from_path(path)?);
    }
    if let Some(provider) = &args.force_provider {
        request = request.with_force_provider(provider.clone());
    }

    Ok(request)
}

fn output_directory(args: &GenerateArgs, config: &Config) -> PathBuf {
    args.output_dir
        .clone()
        .unwrap_or_else(|| config.output.directory.clone())
}
