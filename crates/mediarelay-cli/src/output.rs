//! Output formatting and writing utilities
//!
//! Results are written to stdout in the selected format (human, JSON,
//! YAML). Progress spinners and status lines are only shown for the human
//! format on a terminal.

use crate::cli::OutputFormat;
use crate::error::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mediarelay_core::{MediaPayload, NormalizedResult};
use serde::Serialize;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::time::Duration;

/// What a command reports once a request has succeeded
#[derive(Debug, Clone, Serialize)]
pub struct ResultReport {
    pub provider: String,
    pub item_count: usize,
    /// Files written locally, in item order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<PathBuf>,
    /// Identifiers of resources created remotely
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub remote_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl ResultReport {
    pub fn new(result: &NormalizedResult, files: Vec<PathBuf>) -> Self {
        let remote_ids = result
            .items
            .iter()
            .filter_map(|item| match &item.payload {
                MediaPayload::RemoteId { id, .. } => Some(id.clone()),
                MediaPayload::Inline { .. } => None,
            })
            .collect();

        Self {
            provider: result.provider.clone(),
            item_count: result.items.len(),
            files,
            remote_ids,
            permalink: result.permalink.clone(),
            completed_at: result.completed_at,
        }
    }
}

/// Trait for formatting output
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format a result report
    fn format_report(&self, report: &ResultReport) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }

    fn format_report(&self, report: &ResultReport) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_report_human(report, false)),
            _ => self.format(report),
        }
    }
}

/// Plain-text rendering of a report
pub fn format_report_human(report: &ResultReport, use_color: bool) -> String {
    let label = |text: &str| {
        if use_color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    };

    let mut lines = vec![
        format!("{} {}", label("Provider:"), report.provider),
        format!("{} {}", label("Items:"), report.item_count),
    ];
    for file in &report.files {
        lines.push(format!("  saved {}", file.display()));
    }
    if !report.remote_ids.is_empty() {
        lines.push(format!("{} {}", label("Ids:"), report.remote_ids.join(", ")));
    }
    if let Some(link) = &report.permalink {
        lines.push(format!("{} {}", label("Link:"), link));
    }
    lines.join("\n")
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && format == OutputFormat::Human && io::stdout().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    #[cfg(test)]
    pub fn with_writer(format: OutputFormat, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color: false,
            show_progress: false,
            quiet,
            writer,
        }
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message (human format only)
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message (human format only)
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message (human format only)
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write a result report
    pub fn report(&mut self, report: &ResultReport) -> Result<()> {
        let formatted = match self.format {
            OutputFormat::Human => format_report_human(report, self.use_color),
            other => other.format_report(report)?,
        };
        self.writeln(formatted.trim_end())
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }
}

fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg} [{elapsed}]")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}
