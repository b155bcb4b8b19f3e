use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use lib_ais::FeedConfig;
use lib_ais::loggers::LoggingOptions;
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_FILE: &str = "ais_lookup.conf";

#[derive(Parser, Deserialize, Serialize, Clone, Default)]
#[clap(about = "Resolve vessels by IMO number from the live AISStream feed", version)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[clap(value_name = "IMO", help = "One or more IMO numbers, e.g. 9412634 or \"IMO 9412634\".")]
    #[serde(default)]
    pub imo: Vec<String>,

    #[clap(long, env = "AISSTREAM_API_KEY", hide_env_values = true, help = "AISStream API key.")]
    pub api_key: Option<String>,

    #[clap(long, env = "AISSTREAM_URL", help = "Feed WebSocket URL.")]
    pub wss_url: Option<String>,

    #[clap(long, env = "AIS_BUDGET_SECS", help = "Total time budget per query in seconds (a floor applies).")]
    pub budget_secs: Option<u64>,

    #[clap(long, env = "AIS_CONFIG_PATH", help = "Path to the JSON configuration file.")]
    pub config_path: Option<PathBuf>,

    #[clap(long, env = "AIS_LOG_DIR", help = "Directory for log files.")]
    pub log_dir: Option<PathBuf>,

    #[clap(long, env = "AIS_LOG_LEVEL", help = "Logging level (trace, debug, info, warn, error).")]
    pub log_level: Option<String>,

    #[clap(long, help = "Emit JSON log lines.")]
    #[serde(default)]
    pub log_json: bool,

    #[clap(skip)]
    pub feed: Option<FeedConfig>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("imo", &self.imo)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("wss_url", &self.wss_url)
            .field("budget_secs", &self.budget_secs)
            .field("config_path", &self.config_path)
            .field("log_dir", &self.log_dir)
            .field("log_level", &self.log_level)
            .field("log_json", &self.log_json)
            .field("feed", &self.feed)
            .finish()
    }
}

impl Config {
    // Merge two Config structs, where 'other' overrides 'self' for Some values
    pub fn merge(self, other: Config) -> Config {
        Config {
            imo: if other.imo.is_empty() { self.imo } else { other.imo },
            api_key: other.api_key.or(self.api_key),
            wss_url: other.wss_url.or(self.wss_url),
            budget_secs: other.budget_secs.or(self.budget_secs),
            config_path: other.config_path.or(self.config_path),
            log_dir: other.log_dir.or(self.log_dir),
            log_level: other.log_level.or(self.log_level),
            log_json: other.log_json || self.log_json,
            feed: match (self.feed, other.feed) {
                (Some(base), Some(over)) => Some(base.merge(over)),
                (base, over) => over.or(base),
            },
        }
    }

    /// Feed settings: defaults, then the file's `feed` block, then `--wss-url`.
    pub fn feed_config(&self) -> FeedConfig {
        let mut feed = FeedConfig::defaults();
        if let Some(file_feed) = &self.feed {
            feed = feed.merge(file_feed.clone());
        }
        if let Some(url) = &self.wss_url {
            feed.wss_url = Some(url.clone());
        }
        feed
    }

    pub fn total_budget(&self) -> Option<Duration> {
        self.budget_secs.map(Duration::from_secs)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn logging_options(&self) -> LoggingOptions {
        LoggingOptions {
            app_name: "ais_lookup".to_string(),
            level: self.log_level.clone().unwrap_or_else(|| "info".to_string()),
            log_dir: self.log_dir.clone(),
            keep_files: 1,
            json: self.log_json,
        }
    }
}

fn read_config_file(path: &Path) -> Result<Config> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Layers defaults, the JSON config file and environment/CLI arguments.
///
/// Logging isn't up yet when this runs, so problems are returned, not logged.
pub fn load_config_from(cli: Config) -> Result<Config> {
    let defaults = Config {
        log_level: Some("info".to_string()),
        ..Default::default()
    };

    let explicit_path = cli.config_path.is_some();
    let config_file_path = cli
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut current = defaults;
    if config_file_path.exists() {
        current = current.merge(read_config_file(&config_file_path)?);
    } else if explicit_path {
        anyhow::bail!("Config file not found: {}", config_file_path.display());
    }

    Ok(current.merge(cli))
}

pub fn load_config() -> Result<Config> {
    load_config_from(Config::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cli_overrides_file_and_file_overrides_defaults() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"{{"apiKey": "from-file", "logLevel": "debug", "feed": {{"totalBudgetMs": 20000}}}}"#
        )
        .unwrap();

        let cli = Config::parse_from([
            "ais_lookup",
            "--config-path",
            tmp.path().to_str().unwrap(),
            "--wss-url",
            "ws://127.0.0.1:9000",
            "--api-key",
            "from-cli",
            "9412634",
        ]);
        let config = load_config_from(cli).unwrap();

        assert_eq!(config.imo, vec!["9412634".to_string()]);
        assert_eq!(config.api_key(), Some("from-cli"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        let feed = config.feed_config();
        assert_eq!(feed.wss_url(), "ws://127.0.0.1:9000");
        assert_eq!(feed.total_budget(), Duration::from_secs(20));
    }

    #[test]
    fn missing_explicit_config_file_is_an_error() {
        let cli = Config::parse_from(["ais_lookup", "--config-path", "/definitely/not/here.conf"]);
        assert!(load_config_from(cli).is_err());
    }

    #[test]
    fn debug_output_redacts_the_key() {
        let config = Config {
            api_key: Some("super-secret".into()),
            ..Default::default()
        };
        let shown = format!("{:?}", config);
        assert!(!shown.contains("super-secret"));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let config = Config {
            api_key: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(config.api_key(), None);
    }
}
