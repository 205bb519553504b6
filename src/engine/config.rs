//! Engine configuration.
//!
//! Every section defaults to the production thresholds, so a config file only
//! needs the values it overrides:
//!
//! ```json
//! {
//!   "funding": { "ratio_threshold_pct": 7.5 },
//!   "etf": { "neutral_band_usd": 20000000.0 }
//! }
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::history::HistoryConfig;
use crate::regime::{FundingConfig, TrendConfig};
use crate::validation::{EtfConfig, RiskThermometerConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub history: HistoryConfig,
    pub trend: TrendConfig,
    pub funding: FundingConfig,
    pub risk_thermometer: RiskThermometerConfig,
    pub etf: EtfConfig,
}

impl EngineConfig {
    /// Reject configurations the classifiers cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg)) };
        let history = &self.history;

        if history.long_capacity == 0 || history.short_capacity == 0 {
            return invalid("history capacities must be positive".into());
        }

        if self.trend.slope_window < 2 {
            return invalid(format!(
                "trend.slope_window must be at least 2, got {}",
                self.trend.slope_window
            ));
        }
        if self.trend.min_history > history.long_capacity {
            return invalid(format!(
                "trend.min_history ({}) exceeds history.long_capacity ({})",
                self.trend.min_history, history.long_capacity
            ));
        }

        if self.funding.slope_window < 2 {
            return invalid(format!(
                "funding.slope_window must be at least 2, got {}",
                self.funding.slope_window
            ));
        }
        if self.funding.min_history > history.short_capacity {
            return invalid(format!(
                "funding.min_history ({}) exceeds history.short_capacity ({})",
                self.funding.min_history, history.short_capacity
            ));
        }
        let threshold = self.funding.ratio_threshold_pct;
        if !(threshold > 0.0 && threshold <= 100.0) {
            return invalid(format!(
                "funding.ratio_threshold_pct must be in (0, 100], got {}",
                threshold
            ));
        }

        let t = &self.risk_thermometer;
        let ascending = t.low_fever_pct > 0.0
            && t.low_fever_pct < t.high_fever_pct
            && t.high_fever_pct < t.critical_pct;
        if !ascending {
            return invalid(format!(
                "risk_thermometer tiers must ascend: {} < {} < {}",
                t.low_fever_pct, t.high_fever_pct, t.critical_pct
            ));
        }

        let etf = &self.etf;
        if etf.trailing_days == 0 {
            return invalid("etf.trailing_days must be positive".into());
        }
        if etf.fallback_min_history > etf.sustained_min_history {
            return invalid(format!(
                "etf.fallback_min_history ({}) exceeds etf.sustained_min_history ({})",
                etf.fallback_min_history, etf.sustained_min_history
            ));
        }
        if etf.sustained_min_history > history.short_capacity {
            return invalid(format!(
                "etf.sustained_min_history ({}) exceeds history.short_capacity ({})",
                etf.sustained_min_history, history.short_capacity
            ));
        }
        if !(etf.consistency_ratio > 0.0 && etf.consistency_ratio <= 1.0) {
            return invalid(format!(
                "etf.consistency_ratio must be in (0, 1], got {}",
                etf.consistency_ratio
            ));
        }
        if !(etf.deceleration_ratio > 0.0 && etf.deceleration_ratio < 1.0) {
            return invalid(format!(
                "etf.deceleration_ratio must be in (0, 1), got {}",
                etf.deceleration_ratio
            ));
        }
        if etf.neutral_band_usd < 0.0
            || etf.trend_epsilon_ratio < 0.0
            || etf.flow_trend_floor_usd < 0.0
        {
            return invalid("etf bands must be non-negative".into());
        }

        Ok(())
    }
}

/// Load and validate an engine configuration from a JSON file.
pub fn load_config(path: &Path) -> anyhow::Result<EngineConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let config: EngineConfig = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("validating {}", path.display()))?;

    info!(path = %path.display(), "loaded engine config");
    Ok(config)
}
