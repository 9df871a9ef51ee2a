//! CLI configuration loading.
//!
//! Configuration is merged from multiple sources with priority:
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`JANUS_*`)
//! 3. Project config (`./janus.toml` in the current directory)
//! 4. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `JANUS_CHANNEL`: presentation channel (`text` / `widget`)
//! - `JANUS_VERBOSE`: verbose logging (`true` / `false`)

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

/// Presentation channel selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Channel {
    /// Line-oriented console output.
    #[default]
    Text,
    /// Retained-widget command dump (for widget hosts and debugging).
    Widget,
}

impl FromStr for Channel {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "text" => Ok(Self::Text),
            "widget" => Ok(Self::Widget),
            other => bail!("unknown channel '{other}' (expected 'text' or 'widget')"),
        }
    }
}

/// On-disk configuration shape (`janus.toml`).
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    channel: Option<String>,
    verbose: Option<bool>,
}

/// Effective configuration after merging all sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CliConfig {
    /// Selected presentation channel.
    pub channel: Channel,
    /// Verbose logging.
    pub verbose: bool,
}

impl CliConfig {
    /// Loads configuration, merging CLI arguments over environment
    /// variables over the project file over defaults.
    ///
    /// # Errors
    ///
    /// Fails on an unreadable or malformed `janus.toml`, or on an
    /// invalid channel name in any source.
    pub fn load(arg_channel: Option<Channel>, arg_verbose: bool) -> Result<Self> {
        let file = Self::read_file(Path::new("janus.toml"))?;
        let env_channel = std::env::var("JANUS_CHANNEL").ok();
        let env_verbose = std::env::var("JANUS_VERBOSE")
            .ok()
            .map(|value| value == "true" || value == "1");
        Self::merge(arg_channel, arg_verbose, env_channel, env_verbose, file)
    }

    fn read_file(path: &Path) -> Result<FileConfig> {
        if !path.exists() {
            return Ok(FileConfig::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    fn merge(
        arg_channel: Option<Channel>,
        arg_verbose: bool,
        env_channel: Option<String>,
        env_verbose: Option<bool>,
        file: FileConfig,
    ) -> Result<Self> {
        let channel = match (arg_channel, env_channel, file.channel) {
            (Some(channel), _, _) => channel,
            (None, Some(raw), _) => raw.parse()?,
            (None, None, Some(raw)) => raw.parse()?,
            (None, None, None) => Channel::default(),
        };
        let verbose = arg_verbose || env_verbose.or(file.verbose).unwrap_or(false);
        Ok(Self { channel, verbose })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_with_no_sources() {
        let config =
            CliConfig::merge(None, false, None, None, FileConfig::default()).unwrap();
        assert_eq!(config.channel, Channel::Text);
        assert!(!config.verbose);
    }

    #[test]
    fn arguments_win_over_environment_and_file() {
        let file = FileConfig {
            channel: Some("text".into()),
            verbose: Some(false),
        };
        let config = CliConfig::merge(
            Some(Channel::Widget),
            true,
            Some("text".into()),
            Some(false),
            file,
        )
        .unwrap();
        assert_eq!(config.channel, Channel::Widget);
        assert!(config.verbose);
    }

    #[test]
    fn environment_wins_over_file() {
        let file = FileConfig {
            channel: Some("text".into()),
            verbose: None,
        };
        let config =
            CliConfig::merge(None, false, Some("widget".into()), None, file).unwrap();
        assert_eq!(config.channel, Channel::Widget);
    }

    #[test]
    fn file_config_parses_toml() {
        let file: FileConfig = toml::from_str("channel = \"widget\"\nverbose = true").unwrap();
        assert_eq!(file.channel.as_deref(), Some("widget"));
        assert_eq!(file.verbose, Some(true));
    }

    #[test]
    fn invalid_channel_names_are_rejected() {
        let file = FileConfig {
            channel: Some("holographic".into()),
            verbose: None,
        };
        assert!(CliConfig::merge(None, false, None, None, file).is_err());
    }
}
