//! Command handlers for CLI subcommands
//!
//! Each handler turns parsed arguments plus the loaded configuration into a
//! core request, runs it, and reports through the [`OutputWriter`].
//!
//! [`OutputWriter`]: crate::output::OutputWriter

mod completions;
mod config;
mod generate;
mod publish;

pub use completions::handle_completions;
pub use config::handle_config;
pub use generate::handle_generate;
pub use publish::handle_publish;

use crate::config::Config;
use crate::error::Result;
use mediarelay_core::{FailoverOrchestrator, OrchestratorConfig, ProviderRegistry};

/// Build an orchestrator from configuration
fn orchestrator(registry: ProviderRegistry, config: &Config) -> Result<FailoverOrchestrator> {
    let registry = config.apply_overrides(registry);
    let orchestrator = FailoverOrchestrator::new(
        registry,
        OrchestratorConfig {
            retry: config.retry_policy(),
            transport: config.transport_config(),
        },
    )?;
    Ok(orchestrator)
}
