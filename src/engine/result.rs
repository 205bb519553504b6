//! Evaluation output.
//!
//! Field names and nesting here are read directly by the dashboard and the
//! persisted state snapshot. Add fields freely; never rename or move one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::MetricKind;
use crate::regime::{FundingPosture, MarketState, RiskLevel, StateMapper, TrendDirection};
use crate::validation::{EtfRegime, FlowTrend, RiskTier};

/// Advisory validation readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationLayer {
    pub risk_thermometer: RiskTier,
    /// Percent below the all-time high.
    pub ath_drawdown: f64,
    pub ath_price: Option<f64>,
    pub etf_accelerator: EtfRegime,
    pub etf_net_flow: Option<f64>,
    pub etf_aum: Option<f64>,
    pub etf_flow_14d_sum: Option<f64>,
    pub etf_flow_pos_ratio: Option<f64>,
    pub etf_flow_recent_avg: Option<f64>,
    pub etf_flow_prev_avg: Option<f64>,
    pub etf_flow_trend: Option<FlowTrend>,
    pub etf_aum_trend: Option<FlowTrend>,
}

/// Raw intermediate values behind the classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateMetadata {
    pub btc_price: f64,
    pub ma50: f64,
    pub ma200: f64,
    pub ma50_slope: f64,
    pub ma200_slope: f64,
    pub total_market_cap: Option<f64>,
    pub stablecoin_market_cap: Option<f64>,
    /// Stablecoin share of total cap, percent.
    pub stablecoin_ratio: Option<f64>,
    pub stablecoin_change: f64,
    pub stablecoin_ratio_change: f64,
    pub stablecoin_slope: f64,
    pub total_slope: f64,
    pub ath_drawdown: f64,
    pub trend_degraded: bool,
    pub trend_pattern: String,
    pub trend_quality: Option<String>,
    pub funding_degraded: bool,
    pub funding_pattern: String,
    pub etf_pattern: String,
    pub trend_confidence: f64,
    pub funding_confidence: f64,
    /// Series whose minimum-history gate was not met.
    pub insufficient_history: Vec<MetricKind>,
}

/// Result of one evaluation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateResult {
    pub state: MarketState,
    pub trend: TrendDirection,
    pub funding: FundingPosture,
    pub risk_level: RiskLevel,
    /// Always within [0, 1].
    pub confidence: f64,
    pub validation: ValidationLayer,
    pub metadata: StateMetadata,
    pub evaluated_at: DateTime<Utc>,
}

impl StateResult {
    /// Build a result; state and risk level are derived, never supplied.
    pub fn assemble(
        trend: TrendDirection,
        funding: FundingPosture,
        confidence: f64,
        validation: ValidationLayer,
        metadata: StateMetadata,
        evaluated_at: DateTime<Utc>,
    ) -> Self {
        let state = StateMapper::map(trend, funding);
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            state,
            trend,
            funding,
            risk_level: state.risk_level(),
            confidence,
            validation,
            metadata,
            evaluated_at,
        }
    }

    /// One-line summary for logs and the CLI.
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) risk={} confidence={:.2} thermometer={} drawdown={:.1}% etf={}",
            self.state.as_str(),
            self.state.description(),
            self.risk_level.as_str(),
            self.confidence,
            self.validation.risk_thermometer.description(),
            self.validation.ath_drawdown,
            self.validation.etf_accelerator.as_str(),
        )
    }
}
