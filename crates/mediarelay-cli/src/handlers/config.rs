//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat, ConfigShowArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use mediarelay_core::registry::{image_generation_catalog, publishing_catalog};

/// Handle the config command
pub async fn handle_config(args: ConfigArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match args.action {
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
    }
}

/// Handle config show subcommand
fn handle_config_show(args: ConfigShowArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    output.writeln(render(&config.redacted(), args.format)?.trim_end())?;

    let mut catalog = image_generation_catalog();
    catalog.extend(publishing_catalog());
    let visible = config.env_credentials(&catalog);
    if visible.is_empty() {
        output.warning("No provider credentials found in the environment")?;
    } else {
        output.info(&format!("Credentials from environment: {}", visible.join(", ")))?;
    }

    Ok(())
}

fn render(config: &Config, format: ConfigFormat) -> Result<String> {
    let content = match format {
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_secret() -> Config {
        let mut config = Config::default();
        config
            .credentials
            .insert("ALLAPI_KEY".to_string(), "AIzaSy-secret-value".to_string());
        config.redacted()
    }

    #[test]
    fn test_render_masks_credentials_in_every_format() {
        for format in [ConfigFormat::Toml, ConfigFormat::Json, ConfigFormat::Yaml] {
            let text = render(&with_secret(), format).unwrap();
            assert!(text.contains("ALLAPI_KEY"), "{:?}: {}", format, text);
            assert!(text.contains("***REDACTED***"), "{:?}: {}", format, text);
            assert!(!text.contains("AIzaSy-secret-value"));
        }
    }

    #[test]
    fn test_render_json_is_parseable() {
        let text = render(&Config::default(), ConfigFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["retry"]["max_attempts"], 3);
        assert_eq!(value["retry"]["delay_secs"], 5);
    }
}
