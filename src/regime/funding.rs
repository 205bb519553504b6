//! Funding posture classifier.
//!
//! Compares the direction of the stablecoin market cap with the direction of
//! the total crypto market cap:
//!
//! | Stablecoin | Total | Posture   | Pattern              |
//! |------------|-------|-----------|----------------------|
//! | up         | up    | Offensive | incremental offense  |
//! | down       | up    | Offensive | strong offense       |
//! | up         | down  | Defensive | de-risking           |
//! | down       | down  | Defensive | deep defense/retreat |
//!
//! With too little history, or when either slope is exactly flat, the call
//! falls back to the stablecoin share of total cap against an 8% threshold.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analytics::{SlopeEstimator, SlopeReading};

/// Capital posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingPosture {
    Offensive,
    Defensive,
}

impl FundingPosture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offensive => "offensive",
            Self::Defensive => "defensive",
        }
    }
}

/// Which rule produced the funding call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingSignal {
    /// Stablecoins up, total up.
    IncrementalOffense,
    /// Stablecoins down, total up.
    StrongOffense,
    /// Stablecoins up, total down.
    DeRisking,
    /// Stablecoins down, total down.
    DeepDefense,
    /// Fallback: stablecoin ratio under the threshold.
    LowStablecoinRatio { ratio_pct: f64 },
    /// Fallback: stablecoin ratio at or over the threshold.
    HighStablecoinRatio { ratio_pct: f64 },
    /// Fallback: ratio cannot be formed (missing caps or zero total).
    RatioUnavailable,
}

impl FundingSignal {
    pub fn posture(&self) -> FundingPosture {
        match self {
            Self::IncrementalOffense | Self::StrongOffense | Self::LowStablecoinRatio { .. } => {
                FundingPosture::Offensive
            }
            Self::DeRisking
            | Self::DeepDefense
            | Self::HighStablecoinRatio { .. }
            | Self::RatioUnavailable => FundingPosture::Defensive,
        }
    }

    /// Whether the ratio fallback produced the call.
    pub fn is_fallback(&self) -> bool {
        matches!(
            self,
            Self::LowStablecoinRatio { .. }
                | Self::HighStablecoinRatio { .. }
                | Self::RatioUnavailable
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::IncrementalOffense => "incremental offense",
            Self::StrongOffense => "strong offense",
            Self::DeRisking => "de-risking",
            Self::DeepDefense => "deep defense/retreat",
            Self::LowStablecoinRatio { .. } => "stablecoin ratio below threshold",
            Self::HighStablecoinRatio { .. } => "stablecoin ratio at or above threshold",
            Self::RatioUnavailable => "stablecoin ratio unavailable",
        }
    }
}

/// Funding classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FundingConfig {
    /// Trailing cap samples regressed for each slope.
    pub slope_window: usize,
    /// Samples of each series required before slopes are used.
    pub min_history: usize,
    /// Stablecoin share of total cap (percent) separating offense from defense.
    pub ratio_threshold_pct: f64,
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            slope_window: 10,
            min_history: 7,
            ratio_threshold_pct: 8.0,
        }
    }
}

/// Full output of the funding classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingClassification {
    pub posture: FundingPosture,
    pub signal: FundingSignal,
    pub degraded: bool,
    pub stablecoin_slope: SlopeReading,
    pub total_slope: SlopeReading,
    /// Stablecoin share of total cap in percent, when it can be formed.
    pub stablecoin_ratio: Option<f64>,
    /// Absolute stablecoin cap change over the window (slope path) or the
    /// current cap (fallback path).
    pub stablecoin_change: f64,
    /// Ratio change in percentage points over the window (slope path) or the
    /// distance from the threshold (fallback path).
    pub stablecoin_ratio_change: f64,
}

/// Stablecoin share of total cap, in percent.
pub fn stablecoin_ratio_pct(stablecoin_cap: Option<f64>, total_cap: Option<f64>) -> Option<f64> {
    match (stablecoin_cap, total_cap) {
        (Some(stable), Some(total)) if total > 0.0 && stable.is_finite() && total.is_finite() => {
            Some(stable / total * 100.0)
        }
        _ => None,
    }
}

/// Classify from the sign pair of the two slopes. `None` when either is flat.
pub fn decide_by_slopes(stablecoin_slope: f64, total_slope: f64) -> Option<FundingSignal> {
    let stable_up = stablecoin_slope > 0.0;
    let stable_down = stablecoin_slope < 0.0;
    let total_up = total_slope > 0.0;
    let total_down = total_slope < 0.0;

    match (stable_up, stable_down, total_up, total_down) {
        (true, _, true, _) => Some(FundingSignal::IncrementalOffense),
        (_, true, true, _) => Some(FundingSignal::StrongOffense),
        (true, _, _, true) => Some(FundingSignal::DeRisking),
        (_, true, _, true) => Some(FundingSignal::DeepDefense),
        _ => None,
    }
}

/// Classify from the stablecoin ratio alone.
pub fn decide_by_ratio(ratio_pct: Option<f64>, threshold_pct: f64) -> FundingSignal {
    match ratio_pct {
        Some(ratio_pct) if ratio_pct < threshold_pct => {
            FundingSignal::LowStablecoinRatio { ratio_pct }
        }
        Some(ratio_pct) => FundingSignal::HighStablecoinRatio { ratio_pct },
        None => FundingSignal::RatioUnavailable,
    }
}

/// Stablecoin/total-cap funding classifier.
#[derive(Debug, Clone)]
pub struct FundingClassifier {
    slopes: SlopeEstimator,
    ratio_threshold_pct: f64,
}

impl FundingClassifier {
    pub fn new(config: &FundingConfig) -> Self {
        Self {
            slopes: SlopeEstimator::new(config.slope_window, config.min_history),
            ratio_threshold_pct: config.ratio_threshold_pct,
        }
    }

    /// Classify from current caps and the cap histories (oldest-first).
    pub fn classify(
        &self,
        stablecoin_cap: Option<f64>,
        total_cap: Option<f64>,
        stablecoin_history: &[f64],
        total_history: &[f64],
    ) -> FundingClassification {
        let stablecoin_slope = self.slopes.estimate(stablecoin_history);
        let total_slope = self.slopes.estimate(total_history);
        let ratio = stablecoin_ratio_pct(stablecoin_cap, total_cap);

        let by_slopes = if stablecoin_slope.sufficient && total_slope.sufficient {
            decide_by_slopes(stablecoin_slope.slope, total_slope.slope)
        } else {
            warn!(
                stablecoin_samples = stablecoin_slope.samples,
                total_samples = total_slope.samples,
                required = self.slopes.min_samples(),
                "insufficient market cap history, using stablecoin ratio"
            );
            None
        };

        let (signal, stablecoin_change, stablecoin_ratio_change) = match by_slopes {
            Some(signal) => {
                let (change, ratio_change) =
                    window_changes(stablecoin_cap, ratio, stablecoin_history, total_history);
                (signal, change, ratio_change)
            }
            None => {
                let signal = decide_by_ratio(ratio, self.ratio_threshold_pct);
                let ratio_change = ratio.map(|r| r - self.ratio_threshold_pct).unwrap_or(0.0);
                (signal, stablecoin_cap.unwrap_or(0.0), ratio_change)
            }
        };

        info!(
            posture = signal.posture().as_str(),
            pattern = signal.label(),
            fallback = signal.is_fallback(),
            stablecoin_slope = stablecoin_slope.slope,
            total_slope = total_slope.slope,
            stablecoin_ratio = ratio.unwrap_or(f64::NAN),
            "funding classified"
        );

        FundingClassification {
            posture: signal.posture(),
            signal,
            degraded: signal.is_fallback(),
            stablecoin_slope,
            total_slope,
            stablecoin_ratio: ratio,
            stablecoin_change,
            stablecoin_ratio_change,
        }
    }
}

impl Default for FundingClassifier {
    fn default() -> Self {
        Self::new(&FundingConfig::default())
    }
}

/// Cap and ratio change from the oldest retained samples to now.
fn window_changes(
    stablecoin_cap: Option<f64>,
    ratio: Option<f64>,
    stablecoin_history: &[f64],
    total_history: &[f64],
) -> (f64, f64) {
    let current_stable = stablecoin_cap.or_else(|| stablecoin_history.last().copied());
    let first_stable = stablecoin_history.first().copied();
    let first_total = total_history.first().copied();

    let change = match (current_stable, first_stable) {
        (Some(now), Some(then)) => now - then,
        _ => 0.0,
    };

    let ratio_change = match ratio {
        Some(now) => {
            let then = stablecoin_ratio_pct(first_stable, first_total).unwrap_or(now);
            now - then
        }
        None => 0.0,
    };

    (change, ratio_change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn series(start: f64, ratio: f64, n: usize) -> Vec<f64> {
        (0..n).map(|i| start * ratio.powi(i as i32)).collect()
    }

    #[test]
    fn test_sign_pair_table() {
        assert_eq!(decide_by_slopes(0.1, 0.2), Some(FundingSignal::IncrementalOffense));
        assert_eq!(decide_by_slopes(-0.2, 0.3), Some(FundingSignal::StrongOffense));
        assert_eq!(decide_by_slopes(0.1, -0.2), Some(FundingSignal::DeRisking));
        assert_eq!(decide_by_slopes(-0.1, -0.2), Some(FundingSignal::DeepDefense));
    }

    #[test]
    fn test_flat_slope_is_ambiguous() {
        assert_eq!(decide_by_slopes(0.0, 0.3), None);
        assert_eq!(decide_by_slopes(-0.2, 0.0), None);
        assert_eq!(decide_by_slopes(0.0, 0.0), None);
    }

    #[test]
    fn test_strong_offense_scenario() {
        let signal = decide_by_slopes(-0.20, 0.30).unwrap();
        assert_eq!(signal.posture(), FundingPosture::Offensive);
        assert_eq!(signal.label(), "strong offense");
        assert!(!signal.is_fallback());
    }

    #[test]
    fn test_ratio_fallback() {
        assert_eq!(
            decide_by_ratio(Some(6.0), 8.0).posture(),
            FundingPosture::Offensive
        );
        assert_eq!(
            decide_by_ratio(Some(8.0), 8.0).posture(),
            FundingPosture::Defensive
        );
        assert_eq!(decide_by_ratio(None, 8.0), FundingSignal::RatioUnavailable);
        assert_eq!(
            FundingSignal::RatioUnavailable.posture(),
            FundingPosture::Defensive
        );
    }

    #[test]
    fn test_ratio_guards_zero_total() {
        assert_eq!(stablecoin_ratio_pct(Some(10.0), Some(0.0)), None);
        assert_eq!(stablecoin_ratio_pct(None, Some(100.0)), None);
        assert_abs_diff_eq!(
            stablecoin_ratio_pct(Some(6.0), Some(100.0)).unwrap(),
            6.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_five_days_uses_ratio_fallback() {
        let classifier = FundingClassifier::default();
        let stable = series(150e9, 1.001, 5);
        let total = series(2.5e12, 1.002, 5);

        let result = classifier.classify(Some(150e9), Some(2.5e12), &stable, &total);

        assert_eq!(result.posture, FundingPosture::Offensive);
        assert!(result.degraded);
        assert!(!result.stablecoin_slope.sufficient);
        assert_abs_diff_eq!(result.stablecoin_ratio.unwrap(), 6.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.stablecoin_ratio_change, -2.0, epsilon = 1e-9);
        assert_eq!(result.stablecoin_change, 150e9);
    }

    #[test]
    fn test_slope_path_strong_offense() {
        let classifier = FundingClassifier::default();
        let stable = series(160e9, 0.998, 12);
        let total = series(2.0e12, 1.003, 12);
        let stable_now = *stable.last().unwrap();
        let total_now = *total.last().unwrap();

        let result = classifier.classify(Some(stable_now), Some(total_now), &stable, &total);

        assert_eq!(result.signal, FundingSignal::StrongOffense);
        assert_eq!(result.posture, FundingPosture::Offensive);
        assert!(!result.degraded);
        assert!(result.stablecoin_slope.slope < 0.0);
        assert!(result.total_slope.slope > 0.0);
        assert!(result.stablecoin_change < 0.0);
        // Share of stablecoins fell over the window.
        assert!(result.stablecoin_ratio_change < 0.0);
    }

    #[test]
    fn test_slope_path_deep_defense() {
        let classifier = FundingClassifier::default();
        let stable = series(160e9, 0.999, 8);
        let total = series(2.0e12, 0.99, 8);

        let result = classifier.classify(
            Some(160e9 * 0.999_f64.powi(7)),
            Some(2.0e12 * 0.99_f64.powi(7)),
            &stable,
            &total,
        );

        assert_eq!(result.signal, FundingSignal::DeepDefense);
        assert_eq!(result.posture, FundingPosture::Defensive);
    }

    #[test]
    fn test_flat_stablecoin_history_falls_back() {
        let classifier = FundingClassifier::default();
        let stable = vec![200e9; 10];
        let total = series(2.0e12, 1.01, 10);

        let result = classifier.classify(Some(200e9), Some(2.0e12), &stable, &total);

        assert!(result.degraded);
        // 200B / 2T = 10% which is over the threshold.
        assert_eq!(result.posture, FundingPosture::Defensive);
        assert!(matches!(result.signal, FundingSignal::HighStablecoinRatio { .. }));
    }

    #[test]
    fn test_missing_total_cap_is_defensive() {
        let classifier = FundingClassifier::default();
        let result = classifier.classify(Some(150e9), None, &[], &[]);
        assert_eq!(result.signal, FundingSignal::RatioUnavailable);
        assert_eq!(result.posture, FundingPosture::Defensive);
        assert_eq!(result.stablecoin_ratio_change, 0.0);
    }
}
