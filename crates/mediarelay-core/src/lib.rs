//! Mediarelay Core - provider failover for media generation and publishing
//!
//! This crate turns one logical request ("generate an image", "publish
//! media") into protocol-correct calls against external HTTP providers,
//! retrying transient failures, failing over across providers in priority
//! order and normalizing every provider's response into one result shape.
//!
//! # Main Components
//!
//! - **Registry**: built-in provider catalogs bound to explicit credentials
//! - **HTTP layer**: request building, transport, retry and normalization
//! - **Orchestrator**: the per-request failover state machine
//! - **Persistence**: writing generated media to disk through a temp manifest
//!
//! # Example
//!
//! ```no_run
//! use mediarelay_core::{
//!     Credentials, FailoverOrchestrator, GenerationRequest, OrchestratorConfig, ProviderRegistry,
//! };
//!
//! async fn example() -> mediarelay_core::Result<()> {
//!     let credentials = Credentials::new().with("ALLAPI_KEY", "...");
//!     let registry = ProviderRegistry::image_generation(credentials);
//!     let orchestrator = FailoverOrchestrator::new(registry, OrchestratorConfig::default())?;
//!
//!     let result = orchestrator.generate(&GenerationRequest::new("a lighthouse at dusk")).await?;
//!     println!("{} returned {} image(s)", result.provider, result.items.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod http;
pub mod manifest;
pub mod orchestrator;
pub mod persist;
pub mod registry;
pub mod types;

pub use error::{Error, FailureCause, ProviderFailure, Result};
pub use manifest::TempManifest;
pub use orchestrator::{FailoverOrchestrator, OrchestratorConfig};
pub use persist::persist_items;
pub use registry::{Credentials, ProviderRegistry};
pub use types::{
    GenerationRequest, MediaItem, MediaPayload, NormalizedResult, PayloadShape, ProviderDescriptor,
    PublishKind, PublishRequest, ReferenceImage, TargetShape,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
