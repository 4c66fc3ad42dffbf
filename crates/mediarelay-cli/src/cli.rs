//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Mediarelay CLI - Generate images and publish media with provider failover
///
/// Requests are sent to the first configured provider; transient failures
/// are retried and, when a provider gives up, the next one is tried.
#[derive(Parser, Debug)]
#[command(
    name = "mediarelay",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "MEDIARELAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate images from a prompt
    Generate(GenerateArgs),

    /// Publish text, photos or a video to the configured page
    Publish(PublishArgs),

    /// Inspect configuration
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Arguments for the generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Description of the image to generate
    #[arg(value_name = "PROMPT")]
    pub prompt: String,

    /// Target size as WIDTHxHEIGHT or an aspect ratio such as 16:9
    #[arg(long, default_value = "1024x1024")]
    pub size: String,

    /// Quality tier
    #[arg(long, value_enum, default_value = "standard")]
    pub quality: Quality,

    /// Number of images to generate (1-10)
    #[arg(short = 'n', long = "n", default_value = "1")]
    pub count: u32,

    /// Reference images, comma separated
    #[arg(long, value_delimiter = ',', value_name = "PATHS")]
    pub images: Vec<PathBuf>,

    /// Only try this provider
    #[arg(long, value_name = "PROVIDER")]
    pub force_provider: Option<String>,

    /// Directory to write images into (defaults to the configured output directory)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// File name prefix for saved images
    #[arg(long, default_value = "generated")]
    pub prefix: String,

    /// Do not write images to disk
    #[arg(long)]
    pub no_save: bool,
}

/// Arguments for the publish command
#[derive(Parser, Debug)]
pub struct PublishArgs {
    /// What to publish
    #[arg(value_enum)]
    pub kind: PublishType,

    /// Post text, or caption for a photo/video
    #[arg(long)]
    pub message: Option<String>,

    /// Single file for photo or video posts
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Files for a photo set
    #[arg(long, num_args = 1..)]
    pub files: Vec<PathBuf>,

    /// Video title
    #[arg(long)]
    pub title: Option<String>,

    /// Video description
    #[arg(long)]
    pub description: Option<String>,

    /// Only try this provider
    #[arg(long, value_name = "PROVIDER")]
    pub force_provider: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the merged configuration with secrets redacted
    Show(ConfigShowArgs),
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Quality tiers understood by the providers
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Quality {
    Hd,
    Medium,
    Standard,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Hd => "hd",
            Quality::Medium => "medium",
            Quality::Standard => "standard",
        }
    }
}

/// Publish content types
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PublishType {
    /// Text-only post
    Text,
    /// One photo
    Photo,
    /// Several photos in a new album
    Photos,
    /// One video
    Video,
}

impl From<PublishType> for mediarelay_core::PublishKind {
    fn from(kind: PublishType) -> Self {
        match kind {
            PublishType::Text => mediarelay_core::PublishKind::Text,
            PublishType::Photo => mediarelay_core::PublishKind::Photo,
            PublishType::Photos => mediarelay_core::PublishKind::PhotoSet,
            PublishType::Video => mediarelay_core::PublishKind::Video,
        }
    }
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
