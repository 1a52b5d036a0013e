//! Configuration file support
//!
//! Settings can come from a TOML file and from the command line; command-line
//! flags win.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Output format for rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Tab-separated columns
    #[default]
    Text,
    /// One JSON object per row
    Json,
}

/// Contents of a pxdump TOML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub log_level: Option<String>,
    pub limit: Option<usize>,
    pub format: Option<OutputFormat>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

/// Effective settings after merging the file with command-line flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub log_level: String,
    pub limit: Option<usize>,
    pub format: OutputFormat,
}

impl Settings {
    pub fn merge(
        file: Config,
        log_level: Option<String>,
        limit: Option<usize>,
        format: Option<OutputFormat>,
    ) -> Self {
        Settings {
            log_level: log_level
                .or(file.log_level)
                .unwrap_or_else(|| "warn".to_string()),
            limit: limit.or(file.limit),
            format: format.or(file.format).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse("log_level = \"debug\"\nlimit = 25\nformat = \"json\"\n").unwrap();
        assert_eq!(
            config,
            Config {
                log_level: Some("debug".into()),
                limit: Some(25),
                format: Some(OutputFormat::Json),
            }
        );
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(Config::parse("listen = \"127.0.0.1:7419\"").is_err());
        assert!(Config::parse("format = \"xml\"").is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let file = Config {
            log_level: Some("debug".into()),
            limit: Some(10),
            format: Some(OutputFormat::Json),
        };
        let s = Settings::merge(file.clone(), Some("trace".into()), None, Some(OutputFormat::Text));
        assert_eq!(s.log_level, "trace");
        assert_eq!(s.limit, Some(10));
        assert_eq!(s.format, OutputFormat::Text);

        let s = Settings::merge(Config::default(), None, None, None);
        assert_eq!(s.log_level, "warn");
        assert_eq!(s.limit, None);
        assert_eq!(s.format, OutputFormat::Text);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pxdump.toml");
        std::fs::write(&path, "limit = 3\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().limit, Some(3));
        assert!(Config::load(&dir.path().join("missing.toml")).is_err());
    }
}
