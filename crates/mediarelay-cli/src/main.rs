//! Mediarelay CLI - image generation and media publishing with provider failover
//!
//! Entry point: parses arguments, loads `.env` and configuration, sets up
//! logging, then dispatches to a subcommand handler.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{redaction::redact_sensitive, timing::Timer, LoggingConfig};
use output::OutputWriter;
use std::process;
use tracing::instrument;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    // A missing .env file is normal
    dotenv::dotenv().ok();

    control::set_override(cli.use_color());

    if let Err(e) = init_logging(&cli) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(()) => process::exit(0),
        Err(e) => {
            let message = error::format_error(&e, control::SHOULD_COLORIZE.should_colorize());
            eprintln!("{}", redact_sensitive(&message));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
#[instrument(skip(cli), fields(command = command_name(&cli.command)))]
async fn run(cli: Cli) -> Result<()> {
    let _timer = Timer::new("cli_execution");

    let config = {
        let _config_timer = Timer::new("config_loading");
        Config::load_with_file(cli.config.as_deref())?
    };

    let mut output = OutputWriter::new(cli.output, cli.use_color(), cli.quiet);

    tracing::info!(
        command = command_name(&cli.command),
        verbosity = cli.verbosity_level(),
        "Executing command"
    );

    match cli.command {
        Commands::Generate(args) => handlers::handle_generate(args, &config, &mut output).await,
        Commands::Publish(args) => handlers::handle_publish(args, &config, &mut output).await,
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output).await,
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Subcommand name for logs; arguments may carry prompts or file paths
fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Generate(_) => "generate",
        Commands::Publish(_) => "publish",
        Commands::Config(_) => "config",
        Commands::Completions(_) => "completions",
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli) -> Result<()> {
    let mut logging_config = LoggingConfig::from_verbosity(cli.verbosity_level());
    logging_config.merge_with_env();

    if cli.quiet {
        logging_config.level = "error".to_string();
    }

    logging::init_logging(logging_config)
}
