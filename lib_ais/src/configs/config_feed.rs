use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Public AISStream endpoint.
pub const DEFAULT_WSS_URL: &str = "wss://stream.aisstream.io/v0/stream";

const DEFAULT_TOTAL_BUDGET_MS: u64 = 16_000;
const DEFAULT_MIN_BUDGET_MS: u64 = 5_000;
// Phase 1 share of the total budget.
const DEFAULT_IDENTITY_SHARE: f64 = 0.625;
const DEFAULT_CLOSE_GRACE_MS: u64 = 2_000;
/// Ceiling applied to any requested total budget.
pub const MAX_TOTAL_BUDGET: Duration = Duration::from_secs(86_400);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// How a total budget is divided between the two resolver phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseBudgets {
    /// Wait for the static identity report.
    pub identity: Duration,
    /// Wait for a position report once the MMSI is known.
    pub status: Duration,
}

/// Feed configuration. Every field is optional so layers (defaults, file,
/// environment, CLI) can be merged; accessors fall back to the defaults.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedConfig {
    pub wss_url: Option<String>,
    pub total_budget_ms: Option<u64>,
    pub min_budget_ms: Option<u64>,
    pub identity_share: Option<f64>,
    pub server_side_mmsi_filter: Option<bool>,
    pub close_grace_ms: Option<u64>,
}

impl FeedConfig {
    /// A fully populated default configuration.
    pub fn defaults() -> Self {
        Self {
            wss_url: Some(DEFAULT_WSS_URL.to_string()),
            total_budget_ms: Some(DEFAULT_TOTAL_BUDGET_MS),
            min_budget_ms: Some(DEFAULT_MIN_BUDGET_MS),
            identity_share: Some(DEFAULT_IDENTITY_SHARE),
            server_side_mmsi_filter: Some(true),
            close_grace_ms: Some(DEFAULT_CLOSE_GRACE_MS),
        }
    }

    // Merge two configs, where 'other' overrides 'self' for Some values
    pub fn merge(self, other: FeedConfig) -> FeedConfig {
        FeedConfig {
            wss_url: other.wss_url.or(self.wss_url),
            total_budget_ms: other.total_budget_ms.or(self.total_budget_ms),
            min_budget_ms: other.min_budget_ms.or(self.min_budget_ms),
            identity_share: other.identity_share.or(self.identity_share),
            server_side_mmsi_filter: other.server_side_mmsi_filter.or(self.server_side_mmsi_filter),
            close_grace_ms: other.close_grace_ms.or(self.close_grace_ms),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Checks the values that would otherwise surface as confusing runtime failures.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(self.wss_url())
            .map_err(|e| ConfigError::Invalid(format!("wssUrl '{}': {}", self.wss_url(), e)))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConfigError::Invalid(format!(
                "wssUrl must use ws:// or wss://, got '{}'",
                url.scheme()
            )));
        }

        let share = self.identity_share();
        if !(share > 0.0 && share < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "identityShare must be strictly between 0 and 1, got {}",
                share
            )));
        }

        if self.total_budget().is_zero() || self.min_budget().is_zero() {
            return Err(ConfigError::Invalid("budgets must be greater than zero".into()));
        }
        Ok(())
    }

    pub fn wss_url(&self) -> &str {
        self.wss_url.as_deref().unwrap_or(DEFAULT_WSS_URL)
    }

    pub fn total_budget(&self) -> Duration {
        Duration::from_millis(self.total_budget_ms.unwrap_or(DEFAULT_TOTAL_BUDGET_MS))
    }

    /// Floor applied to any requested total budget.
    pub fn min_budget(&self) -> Duration {
        Duration::from_millis(self.min_budget_ms.unwrap_or(DEFAULT_MIN_BUDGET_MS))
    }

    pub fn identity_share(&self) -> f64 {
        self.identity_share.unwrap_or(DEFAULT_IDENTITY_SHARE)
    }

    pub fn server_side_mmsi_filter(&self) -> bool {
        self.server_side_mmsi_filter.unwrap_or(true)
    }

    /// Upper bound on the WebSocket close handshake.
    pub fn close_grace(&self) -> Duration {
        Duration::from_millis(self.close_grace_ms.unwrap_or(DEFAULT_CLOSE_GRACE_MS))
    }

    /// Splits a total budget (or the configured default) between the phases.
    ///
    /// The total is raised to the floor first, then capped at
    /// [`MAX_TOTAL_BUDGET`]. Phase 2's slice is independent
    /// of how long phase 1 actually took.
    pub fn budgets(&self, total: Option<Duration>) -> PhaseBudgets {
        let total = total
            .unwrap_or_else(|| self.total_budget())
            .max(self.min_budget())
            .min(MAX_TOTAL_BUDGET);
        let share = self.identity_share().clamp(0.05, 0.95);
        let identity = total.mul_f64(share);
        PhaseBudgets {
            identity,
            status: total.saturating_sub(identity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_split_is_ten_and_six_seconds() {
        let budgets = FeedConfig::defaults().budgets(None);
        assert_eq!(budgets.identity, Duration::from_secs(10));
        assert_eq!(budgets.status, Duration::from_secs(6));
    }

    #[test]
    fn floor_is_enforced() {
        let budgets = FeedConfig::defaults().budgets(Some(Duration::from_millis(10)));
        assert_eq!(budgets.identity + budgets.status, Duration::from_secs(5));
        assert!(budgets.identity > budgets.status);
    }

    #[test]
    fn huge_totals_are_capped() {
        for total in [Duration::MAX, Duration::from_secs(u64::MAX)] {
            let budgets = FeedConfig::defaults().budgets(Some(total));
            assert_eq!(budgets.identity + budgets.status, MAX_TOTAL_BUDGET);
        }
        let huge_default = FeedConfig {
            total_budget_ms: Some(u64::MAX),
            ..FeedConfig::defaults()
        };
        let budgets = huge_default.budgets(None);
        assert_eq!(budgets.identity + budgets.status, MAX_TOTAL_BUDGET);
    }

    #[test]
    fn merge_prefers_other() {
        let file = FeedConfig {
            wss_url: Some("ws://127.0.0.1:9000".into()),
            ..Default::default()
        };
        let merged = FeedConfig::defaults().merge(file);
        assert_eq!(merged.wss_url(), "ws://127.0.0.1:9000");
        assert_eq!(merged.total_budget(), Duration::from_secs(16));
    }

    #[test]
    fn parses_camel_case_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, r#"{{"totalBudgetMs": 20000, "serverSideMmsiFilter": false}}"#).unwrap();
        let cfg = FeedConfig::from_json_file(tmp.path()).unwrap();
        assert_eq!(cfg.total_budget_ms, Some(20_000));
        assert!(!cfg.server_side_mmsi_filter());
        assert_eq!(cfg.wss_url(), DEFAULT_WSS_URL);
    }

    #[test]
    fn validation() {
        assert!(FeedConfig::defaults().validate().is_ok());

        let http = FeedConfig { wss_url: Some("http://example.com".into()), ..FeedConfig::defaults() };
        assert!(matches!(http.validate(), Err(ConfigError::Invalid(_))));

        let share = FeedConfig { identity_share: Some(1.0), ..FeedConfig::defaults() };
        assert!(share.validate().is_err());

        let zero = FeedConfig { total_budget_ms: Some(0), ..FeedConfig::defaults() };
        assert!(zero.validate().is_err());

        assert!(matches!(FeedConfig::from_json_str("{oops"), Err(ConfigError::Parse(_))));
    }
}
