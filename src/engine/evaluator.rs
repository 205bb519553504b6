//! Regime evaluation engine.
//!
//! Runs one evaluation pass:
//! 1. Check mandatory current values (price, MA50, MA200)
//! 2. Append fresh history, then fill today's cap/flow day from the snapshot
//! 3. Classify trend and funding from snapshotted windows
//! 4. Read the risk thermometer and ETF accelerator
//! 5. Score confidence and assemble the four-quadrant state

use thiserror::Error;
use tracing::{debug, info};

use crate::data::{EvaluationInput, MarketSnapshot, MetricKind, MetricSample};
use crate::history::HistoryStore;
use crate::regime::{
    ConfidenceInputs, ConfidenceScorer, FundingClassifier, TrendClassifier,
};
use crate::validation::{EtfAccelerator, RiskThermometer};

use super::config::{ConfigError, EngineConfig};
use super::result::{StateMetadata, StateResult, ValidationLayer};

/// Metrics whose current snapshot value fills the evaluation day when no
/// supplied history covers it yet.
const SNAPSHOT_RECORDED: [MetricKind; 4] = [
    MetricKind::StablecoinMarketCap,
    MetricKind::TotalMarketCap,
    MetricKind::EtfNetFlow,
    MetricKind::EtfAum,
];

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Missing mandatory value: {field}")]
    MissingMandatoryValue { field: &'static str },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Current values without which no state can be computed.
#[derive(Debug, Clone, Copy)]
struct MandatoryValues {
    price: f64,
    ma50: f64,
    ma200: f64,
}

impl MandatoryValues {
    fn from_snapshot(snapshot: &MarketSnapshot) -> Result<Self, EngineError> {
        let price = require(snapshot.price, "price")?;
        if price <= 0.0 {
            return Err(EngineError::MissingMandatoryValue { field: "price" });
        }

        Ok(Self {
            price,
            ma50: require(snapshot.ma50, "ma50")?,
            ma200: require(snapshot.ma200, "ma200")?,
        })
    }
}

fn require(value: Option<f64>, field: &'static str) -> Result<f64, EngineError> {
    match value {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(EngineError::MissingMandatoryValue { field }),
    }
}

/// Market regime engine.
///
/// Owns the rolling history; share one instance (behind an `Arc` if needed)
/// between every caller that should see the same history.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    store: HistoryStore,
    trend: TrendClassifier,
    funding: FundingClassifier,
    thermometer: RiskThermometer,
    etf: EtfAccelerator,
}

impl Engine {
    /// Create an engine with an empty history store.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        Self {
            store: HistoryStore::new(&config.history),
            trend: TrendClassifier::new(&config.trend),
            funding: FundingClassifier::new(&config.funding),
            thermometer: RiskThermometer::new(config.risk_thermometer.clone()),
            etf: EtfAccelerator::new(config.etf.clone()),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryStore {
        &self.store
    }

    /// Evaluate the current market state.
    ///
    /// Fails only when a mandatory current value is missing; in that case the
    /// history store is left untouched.
    pub fn evaluate(&self, input: &EvaluationInput) -> Result<StateResult, EngineError> {
        let current = MandatoryValues::from_snapshot(&input.snapshot)?;
        let snapshot = &input.snapshot;

        self.ingest(input);

        let prices = self.store.snapshot(MetricKind::Price);
        let ma50_history = self.store.snapshot(MetricKind::Ma50);
        let ma200_history = self.store.snapshot(MetricKind::Ma200);
        let stablecoin_history = self.store.snapshot(MetricKind::StablecoinMarketCap);
        let total_history = self.store.snapshot(MetricKind::TotalMarketCap);
        let flow_history = self.store.snapshot(MetricKind::EtfNetFlow);
        let aum_history = self.store.snapshot(MetricKind::EtfAum);

        let trend = self.trend.classify(
            current.price,
            current.ma50,
            current.ma200,
            &ma50_history,
            &ma200_history,
        );
        let funding = self.funding.classify(
            snapshot.stablecoin_market_cap,
            snapshot.total_market_cap,
            &stablecoin_history,
            &total_history,
        );

        let thermometer = self.thermometer.read(current.price, &prices);
        let etf = self.etf.assess(
            snapshot.etf_net_flow,
            &flow_history,
            snapshot.etf_aum,
            &aum_history,
        );

        let confidence = ConfidenceScorer::score(&ConfidenceInputs {
            ma50: current.ma50,
            ma200: current.ma200,
            ma50_slope: trend.ma50_slope.slope,
            ma200_slope: trend.ma200_slope.slope,
            stablecoin_ratio_change: funding.stablecoin_ratio_change,
        });

        let mut insufficient_history = Vec::new();
        if !trend.ma50_slope.sufficient {
            insufficient_history.push(MetricKind::Ma50);
        }
        if !trend.ma200_slope.sufficient {
            insufficient_history.push(MetricKind::Ma200);
        }
        if !funding.stablecoin_slope.sufficient {
            insufficient_history.push(MetricKind::StablecoinMarketCap);
        }
        if !funding.total_slope.sufficient {
            insufficient_history.push(MetricKind::TotalMarketCap);
        }
        if flow_history.len() < self.config.etf.fallback_min_history {
            insufficient_history.push(MetricKind::EtfNetFlow);
        }

        let validation = ValidationLayer {
            risk_thermometer: thermometer.tier,
            ath_drawdown: thermometer.drawdown_pct,
            ath_price: Some(thermometer.ath_price),
            etf_accelerator: etf.regime,
            etf_net_flow: etf.net_flow,
            etf_aum: etf.aum,
            etf_flow_14d_sum: etf.flow_14d_sum,
            etf_flow_pos_ratio: etf.flow_pos_ratio,
            etf_flow_recent_avg: etf.flow_recent_avg,
            etf_flow_prev_avg: etf.flow_prev_avg,
            etf_flow_trend: etf.flow_trend,
            etf_aum_trend: etf.aum_trend,
        };

        let metadata = StateMetadata {
            btc_price: current.price,
            ma50: current.ma50,
            ma200: current.ma200,
            ma50_slope: trend.ma50_slope.slope,
            ma200_slope: trend.ma200_slope.slope,
            total_market_cap: snapshot.total_market_cap,
            stablecoin_market_cap: snapshot.stablecoin_market_cap,
            stablecoin_ratio: funding.stablecoin_ratio,
            stablecoin_change: funding.stablecoin_change,
            stablecoin_ratio_change: funding.stablecoin_ratio_change,
            stablecoin_slope: funding.stablecoin_slope.slope,
            total_slope: funding.total_slope.slope,
            ath_drawdown: thermometer.drawdown_pct,
            trend_degraded: trend.degraded,
            trend_pattern: trend.signal.pattern().to_string(),
            trend_quality: trend.quality.label().map(str::to_string),
            funding_degraded: funding.degraded,
            funding_pattern: funding.signal.label().to_string(),
            etf_pattern: etf.signal.label().to_string(),
            trend_confidence: confidence.trend_confidence,
            funding_confidence: confidence.funding_confidence,
            insufficient_history,
        };

        let result = StateResult::assemble(
            trend.direction,
            funding.posture,
            confidence.overall,
            validation,
            metadata,
            input.timestamp,
        );

        info!(
            state = result.state.as_str(),
            risk_level = result.risk_level.as_str(),
            confidence = result.confidence,
            thermometer = ?result.validation.risk_thermometer,
            etf = result.validation.etf_accelerator.as_str(),
            "state evaluated"
        );

        Ok(result)
    }

    /// Append supplied history, then record the snapshot's caps and flows as
    /// the evaluation day's provisional sample.
    ///
    /// Windows keep one sample per day, so evaluating the same input again
    /// later that day leaves every window as it was.
    fn ingest(&self, input: &EvaluationInput) {
        for metric in MetricKind::ALL {
            self.store.extend(metric, input.history.series(metric));
        }

        for metric in SNAPSHOT_RECORDED {
            if let Some(value) = input.snapshot.value(metric) {
                let recorded = self
                    .store
                    .record_provisional(MetricSample::new(metric, value, input.timestamp));
                if !recorded {
                    debug!(
                        metric = metric.as_str(),
                        "day already covered by supplied history, snapshot value not recorded"
                    );
                }
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}
