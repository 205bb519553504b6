//! Core data types for regime evaluation.
//!
//! These types mirror the document the market-data collaborator hands to the
//! engine: a snapshot of current values plus oldest-first history arrays.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a tracked market metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Price,
    Ma50,
    Ma200,
    StablecoinMarketCap,
    TotalMarketCap,
    EtfNetFlow,
    EtfAum,
}

impl MetricKind {
    /// Every metric, in storage order.
    pub const ALL: [MetricKind; 7] = [
        Self::Price,
        Self::Ma50,
        Self::Ma200,
        Self::StablecoinMarketCap,
        Self::TotalMarketCap,
        Self::EtfNetFlow,
        Self::EtfAum,
    ];

    /// Position of this metric in [`MetricKind::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Self::Price => 0,
            Self::Ma50 => 1,
            Self::Ma200 => 2,
            Self::StablecoinMarketCap => 3,
            Self::TotalMarketCap => 4,
            Self::EtfNetFlow => 5,
            Self::EtfAum => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Ma50 => "ma50",
            Self::Ma200 => "ma200",
            Self::StablecoinMarketCap => "stablecoin_market_cap",
            Self::TotalMarketCap => "total_market_cap",
            Self::EtfNetFlow => "etf_net_flow",
            Self::EtfAum => "etf_aum",
        }
    }

    /// Whether this metric lives in a long (price/MA) window.
    pub fn is_price_derived(&self) -> bool {
        matches!(self, Self::Price | Self::Ma50 | Self::Ma200)
    }
}

/// A single observation of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub metric: MetricKind,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl MetricSample {
    pub fn new(metric: MetricKind, value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            metric,
            value,
            timestamp,
        }
    }
}

/// One element of a collaborator-supplied history array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl HistoryPoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Build a daily series starting at `start`, one point per value.
    pub fn daily_series(start: DateTime<Utc>, values: &[f64]) -> Vec<HistoryPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| HistoryPoint::new(start + Duration::days(i as i64), value))
            .collect()
    }
}

/// Current values at evaluation time.
///
/// Every field is optional on the wire; the engine decides which absences
/// are fatal and which degrade.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub ma50: Option<f64>,
    #[serde(default)]
    pub ma200: Option<f64>,
    #[serde(default)]
    pub total_market_cap: Option<f64>,
    #[serde(default)]
    pub stablecoin_market_cap: Option<f64>,
    #[serde(default)]
    pub etf_net_flow: Option<f64>,
    #[serde(default)]
    pub etf_aum: Option<f64>,
}

impl MarketSnapshot {
    /// Current value for a metric, if supplied.
    pub fn value(&self, metric: MetricKind) -> Option<f64> {
        match metric {
            MetricKind::Price => self.price,
            MetricKind::Ma50 => self.ma50,
            MetricKind::Ma200 => self.ma200,
            MetricKind::StablecoinMarketCap => self.stablecoin_market_cap,
            MetricKind::TotalMarketCap => self.total_market_cap,
            MetricKind::EtfNetFlow => self.etf_net_flow,
            MetricKind::EtfAum => self.etf_aum,
        }
    }
}

/// Fresh historical points, each array oldest-first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketHistory {
    pub price_history: Vec<HistoryPoint>,
    pub ma50_history: Vec<HistoryPoint>,
    pub ma200_history: Vec<HistoryPoint>,
    pub stablecoin_history: Vec<HistoryPoint>,
    pub total_cap_history: Vec<HistoryPoint>,
    pub etf_flow_history: Vec<HistoryPoint>,
    pub etf_aum_history: Vec<HistoryPoint>,
}

impl MarketHistory {
    /// The supplied array for a metric.
    pub fn series(&self, metric: MetricKind) -> &[HistoryPoint] {
        match metric {
            MetricKind::Price => &self.price_history,
            MetricKind::Ma50 => &self.ma50_history,
            MetricKind::Ma200 => &self.ma200_history,
            MetricKind::StablecoinMarketCap => &self.stablecoin_history,
            MetricKind::TotalMarketCap => &self.total_cap_history,
            MetricKind::EtfNetFlow => &self.etf_flow_history,
            MetricKind::EtfAum => &self.etf_aum_history,
        }
    }
}

/// Everything one evaluation pass consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationInput {
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
    pub snapshot: MarketSnapshot,
    #[serde(default)]
    pub history: MarketHistory,
}

impl EvaluationInput {
    pub fn new(timestamp: DateTime<Utc>, snapshot: MarketSnapshot) -> Self {
        Self {
            timestamp,
            snapshot,
            history: MarketHistory::default(),
        }
    }

    pub fn with_history(mut self, history: MarketHistory) -> Self {
        self.history = history;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_metric_index_matches_all() {
        for (i, metric) in MetricKind::ALL.iter().enumerate() {
            assert_eq!(metric.index(), i);
        }
    }

    #[test]
    fn test_daily_series_spacing() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let series = HistoryPoint::daily_series(start, &[1.0, 2.0, 3.0]);
        assert_eq!(series.len(), 3);
        assert_eq!(series[2].timestamp - series[0].timestamp, Duration::days(2));
        assert_eq!(series[1].value, 2.0);
    }

    #[test]
    fn test_input_parses_with_missing_history() {
        let json = r#"{
            "timestamp": "2026-01-01T00:00:00Z",
            "snapshot": {"price": 50000.0, "ma50": 48000.0, "ma200": 45000.0}
        }"#;
        let input: EvaluationInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.snapshot.price, Some(50000.0));
        assert!(input.snapshot.etf_net_flow.is_none());
        assert!(input.history.ma200_history.is_empty());
    }

    #[test]
    fn test_metric_kind_wire_names() {
        let json = serde_json::to_string(&MetricKind::StablecoinMarketCap).unwrap();
        assert_eq!(json, "\"stablecoin_market_cap\"");
        assert_eq!(MetricKind::EtfAum.as_str(), "etf_aum");
    }
}
