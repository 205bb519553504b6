//! ETF flow accelerator.
//!
//! Detects whether spot ETF flows are a sustained tailwind or headwind. Rules
//! are tried in order and the first match wins:
//! 1. No current flow: unknown
//! 2. Fewer than 7 days of history: today's flow alone, with a $10M dead band
//! 3. At least 14 days, >= 70% of days one sign, trailing week agreeing: sustained
//! 4. At least 14 days, outflow halving between window halves: neutral
//! 5. Window average inside the $10M dead band: neutral
//! 6. Otherwise today's sign breaks the tie
//!
//! Advisory only. The reading never changes the market state.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// ETF flow regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EtfRegime {
    Tailwind,
    Headwind,
    Neutral,
    Unknown,
}

impl EtfRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tailwind => "tailwind",
            Self::Headwind => "headwind",
            Self::Neutral => "neutral",
            Self::Unknown => "unknown",
        }
    }
}

/// Direction of a recent-vs-previous average comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowTrend {
    Up,
    Down,
    Flat,
}

/// Which rule produced the ETF reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EtfSignal {
    NoCurrentFlow,
    SingleDayNearZero,
    SingleDayInflow,
    SingleDayOutflow,
    SustainedInflow,
    SustainedOutflow,
    OutflowDecelerating,
    NearBalance,
    MixedInflow,
    MixedOutflow,
    MixedFlat,
}

impl EtfSignal {
    pub fn regime(&self) -> EtfRegime {
        match self {
            Self::NoCurrentFlow => EtfRegime::Unknown,
            Self::SingleDayInflow | Self::SustainedInflow | Self::MixedInflow => {
                EtfRegime::Tailwind
            }
            Self::SingleDayOutflow | Self::SustainedOutflow | Self::MixedOutflow => {
                EtfRegime::Headwind
            }
            Self::SingleDayNearZero
            | Self::OutflowDecelerating
            | Self::NearBalance
            | Self::MixedFlat => EtfRegime::Neutral,
        }
    }

    /// Whether the short-history single-day rule produced the reading.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            Self::SingleDayNearZero | Self::SingleDayInflow | Self::SingleDayOutflow
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NoCurrentFlow => "no current flow",
            Self::SingleDayNearZero => "single day: near zero",
            Self::SingleDayInflow => "single day: inflow",
            Self::SingleDayOutflow => "single day: outflow",
            Self::SustainedInflow => "sustained inflow",
            Self::SustainedOutflow => "sustained outflow",
            Self::OutflowDecelerating => "deceleration: outflow slowing",
            Self::NearBalance => "average flow near balance",
            Self::MixedInflow => "mixed signals: today inflow",
            Self::MixedOutflow => "mixed signals: today outflow",
            Self::MixedFlat => "mixed signals: today flat",
        }
    }
}

/// ETF accelerator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EtfConfig {
    /// Below this many samples only today's flow is used.
    pub fallback_min_history: usize,
    /// Samples required for the sustained and deceleration rules.
    pub sustained_min_history: usize,
    /// Share of same-sign days required for a sustained regime.
    pub consistency_ratio: f64,
    /// Length of the trailing and previous averaging windows.
    pub trailing_days: usize,
    /// Flows inside +/- this band (USD) count as balanced.
    pub neutral_band_usd: f64,
    /// Second-half outflow below this share of the first half is deceleration.
    pub deceleration_ratio: f64,
    /// Relative band for up/down/flat trend tags.
    pub trend_epsilon_ratio: f64,
    /// Absolute floor (USD) of the flow trend band.
    pub flow_trend_floor_usd: f64,
}

impl Default for EtfConfig {
    fn default() -> Self {
        Self {
            fallback_min_history: 7,
            sustained_min_history: 14,
            consistency_ratio: 0.7,
            trailing_days: 7,
            neutral_band_usd: 10_000_000.0,
            deceleration_ratio: 0.5,
            trend_epsilon_ratio: 0.01,
            flow_trend_floor_usd: 1_000_000.0,
        }
    }
}

/// Accelerator output, including the observability metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtfReading {
    pub regime: EtfRegime,
    pub signal: EtfSignal,
    pub net_flow: Option<f64>,
    pub aum: Option<f64>,
    pub flow_14d_sum: Option<f64>,
    pub flow_pos_ratio: Option<f64>,
    pub flow_recent_avg: Option<f64>,
    pub flow_prev_avg: Option<f64>,
    pub flow_trend: Option<FlowTrend>,
    pub aum_trend: Option<FlowTrend>,
}

/// Sustained-flow regime detector.
#[derive(Debug, Clone)]
pub struct EtfAccelerator {
    config: EtfConfig,
}

impl EtfAccelerator {
    pub fn new(config: EtfConfig) -> Self {
        Self { config }
    }

    /// Assess today's flow against the retained flow and AUM histories.
    pub fn assess(
        &self,
        net_flow: Option<f64>,
        flow_history: &[f64],
        aum: Option<f64>,
        aum_history: &[f64],
    ) -> EtfReading {
        let signal = match net_flow {
            Some(today) => self.decide(today, flow_history),
            None => EtfSignal::NoCurrentFlow,
        };

        let days = self.config.trailing_days;
        let flow_recent_avg = trailing_avg(flow_history, days, 0);
        let flow_prev_avg = trailing_avg(flow_history, days, days);
        let aum_recent_avg = trailing_avg(aum_history, days, 0);
        let aum_prev_avg = trailing_avg(aum_history, days, days);

        let reading = EtfReading {
            regime: signal.regime(),
            signal,
            net_flow,
            aum,
            flow_14d_sum: trailing_sum(flow_history, 2 * days),
            flow_pos_ratio: positive_ratio(flow_history),
            flow_recent_avg,
            flow_prev_avg,
            flow_trend: self.trend_tag(
                flow_recent_avg,
                flow_prev_avg,
                self.config.flow_trend_floor_usd,
            ),
            aum_trend: self.trend_tag(aum_recent_avg, aum_prev_avg, 0.0),
        };

        info!(
            regime = reading.regime.as_str(),
            pattern = signal.label(),
            samples = flow_history.len(),
            net_flow = net_flow.unwrap_or(f64::NAN),
            "etf accelerator assessed"
        );
        reading
    }

    /// Pick the rule that fires for today's flow and the flow history.
    pub fn decide(&self, today: f64, history: &[f64]) -> EtfSignal {
        let band = self.config.neutral_band_usd;

        if history.len() < self.config.fallback_min_history {
            return if today.abs() < band {
                EtfSignal::SingleDayNearZero
            } else if today > 0.0 {
                EtfSignal::SingleDayInflow
            } else {
                EtfSignal::SingleDayOutflow
            };
        }

        if history.len() >= self.config.sustained_min_history {
            if let Some(signal) = self.sustained(history) {
                return signal;
            }
            if self.decelerating(history) {
                return EtfSignal::OutflowDecelerating;
            }
        }

        let window_avg = mean(history).unwrap_or(0.0);
        if window_avg.abs() < band {
            debug!(window_avg, "etf average flow inside neutral band");
            return EtfSignal::NearBalance;
        }

        if today > 0.0 {
            EtfSignal::MixedInflow
        } else if today < 0.0 {
            EtfSignal::MixedOutflow
        } else {
            EtfSignal::MixedFlat
        }
    }

    fn sustained(&self, history: &[f64]) -> Option<EtfSignal> {
        let total = history.len() as f64;
        let positive = history.iter().filter(|f| **f > 0.0).count() as f64;
        let negative = history.iter().filter(|f| **f < 0.0).count() as f64;
        let trailing = trailing_avg(history, self.config.trailing_days, 0)?;

        if positive / total >= self.config.consistency_ratio && trailing > 0.0 {
            Some(EtfSignal::SustainedInflow)
        } else if negative / total >= self.config.consistency_ratio && trailing < 0.0 {
            Some(EtfSignal::SustainedOutflow)
        } else {
            None
        }
    }

    fn decelerating(&self, history: &[f64]) -> bool {
        let (first, second) = history.split_at(history.len() / 2);
        match (mean(first), mean(second)) {
            (Some(first_avg), Some(second_avg)) => {
                first_avg < 0.0
                    && second_avg > first_avg
                    && second_avg.abs() < first_avg.abs() * self.config.deceleration_ratio
            }
            _ => false,
        }
    }

    fn trend_tag(
        &self,
        recent: Option<f64>,
        previous: Option<f64>,
        floor: f64,
    ) -> Option<FlowTrend> {
        let (recent, previous) = (recent?, previous?);
        let epsilon =
            (recent.abs().max(previous.abs()) * self.config.trend_epsilon_ratio).max(floor);
        let diff = recent - previous;

        Some(if diff > epsilon {
            FlowTrend::Up
        } else if diff < -epsilon {
            FlowTrend::Down
        } else {
            FlowTrend::Flat
        })
    }
}

impl Default for EtfAccelerator {
    fn default() -> Self {
        Self::new(EtfConfig::default())
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Average of `days` samples ending `skip` samples before the newest.
fn trailing_avg(values: &[f64], days: usize, skip: usize) -> Option<f64> {
    if days == 0 || values.len() < days + skip {
        return None;
    }
    let end = values.len() - skip;
    mean(&values[end - days..end])
}

fn trailing_sum(values: &[f64], days: usize) -> Option<f64> {
    if days == 0 || values.len() < days {
        return None;
    }
    Some(values[values.len() - days..].iter().sum())
}

fn positive_ratio(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let positive = values.iter().filter(|f| **f > 0.0).count();
    Some(positive as f64 / values.len() as f64)
}
