//! Trend structure classifier.
//!
//! Reads price against MA200 and the direction of MA200 itself:
//! - Bullish: price above a flat or rising MA200
//! - Bearish: price below a falling MA200
//!
//! When the two conditions disagree, price position wins and the call is
//! flagged degraded. MA50 only annotates quality; it never flips direction.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analytics::{SlopeEstimator, SlopeReading};

/// Trend direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Bullish,
    Bearish,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
        }
    }
}

/// Which rule produced the trend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendSignal {
    /// Price above MA200, MA200 flat or rising.
    BullishAligned,
    /// Price below MA200, MA200 falling.
    BearishAligned,
    /// Price above MA200 but MA200 falling.
    BullishAgainstSlope,
    /// Price below MA200 but MA200 flat or rising.
    BearishAgainstSlope,
    /// Price exactly on MA200, MA200 rising.
    OnMa200Rising,
    /// Price exactly on MA200, MA200 falling.
    OnMa200Falling,
    /// Price exactly on a flat MA200. Resolved to bearish.
    Indeterminate,
}

impl TrendSignal {
    pub fn direction(&self) -> TrendDirection {
        match self {
            Self::BullishAligned | Self::BullishAgainstSlope | Self::OnMa200Rising => {
                TrendDirection::Bullish
            }
            Self::BearishAligned
            | Self::BearishAgainstSlope
            | Self::OnMa200Falling
            | Self::Indeterminate => TrendDirection::Bearish,
        }
    }

    /// Whether anything other than the primary rule produced the call.
    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::BullishAligned | Self::BearishAligned)
    }

    pub fn pattern(&self) -> &'static str {
        match self {
            Self::BullishAligned => "price above rising MA200",
            Self::BearishAligned => "price below falling MA200",
            Self::BullishAgainstSlope => "price above falling MA200",
            Self::BearishAgainstSlope => "price below rising MA200",
            Self::OnMa200Rising => "price on rising MA200",
            Self::OnMa200Falling => "price on falling MA200",
            Self::Indeterminate => "indeterminate: price on flat MA200",
        }
    }
}

/// Observability annotation of the moving-average stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendQuality {
    /// MA50 above MA200.
    MomentumConfirmed,
    /// Price < MA50 < MA200.
    BearishStack,
    Unremarkable,
}

impl TrendQuality {
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::MomentumConfirmed => Some("momentum-confirmed"),
            Self::BearishStack => {
                Some("classic bearish stack, rallies are resistance retests not reversals")
            }
            Self::Unremarkable => None,
        }
    }
}

/// Trend classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Trailing MA samples regressed for the slope.
    pub slope_window: usize,
    /// MA samples required before a slope is trusted.
    pub min_history: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            slope_window: 10,
            min_history: 10,
        }
    }
}

/// Full output of the trend classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendClassification {
    pub direction: TrendDirection,
    pub signal: TrendSignal,
    pub degraded: bool,
    pub quality: TrendQuality,
    pub ma50_slope: SlopeReading,
    pub ma200_slope: SlopeReading,
}

/// Decide the trend from price, MA200 and the MA200 slope.
pub fn decide(price: f64, ma200: f64, ma200_slope: f64) -> TrendSignal {
    if price > ma200 {
        if ma200_slope >= 0.0 {
            TrendSignal::BullishAligned
        } else {
            TrendSignal::BullishAgainstSlope
        }
    } else if price < ma200 {
        if ma200_slope < 0.0 {
            TrendSignal::BearishAligned
        } else {
            TrendSignal::BearishAgainstSlope
        }
    } else if ma200_slope > 0.0 {
        TrendSignal::OnMa200Rising
    } else if ma200_slope < 0.0 {
        TrendSignal::OnMa200Falling
    } else {
        TrendSignal::Indeterminate
    }
}

/// Annotate the moving-average stack.
pub fn quality(price: f64, ma50: f64, ma200: f64) -> TrendQuality {
    if ma50 > ma200 {
        TrendQuality::MomentumConfirmed
    } else if price < ma50 && ma50 < ma200 {
        TrendQuality::BearishStack
    } else {
        TrendQuality::Unremarkable
    }
}

/// Price/moving-average trend classifier.
#[derive(Debug, Clone)]
pub struct TrendClassifier {
    slopes: SlopeEstimator,
}

impl TrendClassifier {
    pub fn new(config: &TrendConfig) -> Self {
        Self {
            slopes: SlopeEstimator::new(config.slope_window, config.min_history),
        }
    }

    /// Classify from current values and the MA histories (oldest-first).
    pub fn classify(
        &self,
        price: f64,
        ma50: f64,
        ma200: f64,
        ma50_history: &[f64],
        ma200_history: &[f64],
    ) -> TrendClassification {
        let ma50_slope = self.slopes.estimate(ma50_history);
        let ma200_slope = self.slopes.estimate(ma200_history);

        for (name, reading) in [("ma50", &ma50_slope), ("ma200", &ma200_slope)] {
            if reading.sufficient {
                debug!(
                    series = name,
                    slope = reading.slope,
                    samples = reading.samples,
                    window = self.slopes.window(),
                    "slope computed"
                );
            } else {
                warn!(
                    series = name,
                    available = reading.samples,
                    required = self.slopes.min_samples(),
                    "insufficient history for slope, using 0.0"
                );
            }
        }

        let signal = decide(price, ma200, ma200_slope.slope);
        let quality = quality(price, ma50, ma200);

        info!(
            direction = signal.direction().as_str(),
            pattern = signal.pattern(),
            degraded = signal.is_degraded(),
            quality = quality.label().unwrap_or("-"),
            price,
            ma50,
            ma200,
            ma200_slope = ma200_slope.slope,
            "trend classified"
        );

        TrendClassification {
            direction: signal.direction(),
            signal,
            degraded: signal.is_degraded(),
            quality,
            ma50_slope,
            ma200_slope,
        }
    }
}

impl Default for TrendClassifier {
    fn default() -> Self {
        Self::new(&TrendConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 45_000.0 * 1.001_f64.powi(i as i32)).collect()
    }

    fn falling(n: usize) -> Vec<f64> {
        (0..n).map(|i| 45_000.0 * 0.999_f64.powi(i as i32)).collect()
    }

    #[test]
    fn test_primary_rules() {
        assert_eq!(decide(50_000.0, 45_000.0, 0.10), TrendSignal::BullishAligned);
        assert_eq!(decide(50_000.0, 45_000.0, 0.0), TrendSignal::BullishAligned);
        assert_eq!(decide(40_000.0, 45_000.0, -0.10), TrendSignal::BearishAligned);
        assert!(!TrendSignal::BullishAligned.is_degraded());
        assert!(!TrendSignal::BearishAligned.is_degraded());
    }

    #[test]
    fn test_degraded_rules_follow_price() {
        let signal = decide(50_000.0, 45_000.0, -0.05);
        assert_eq!(signal, TrendSignal::BullishAgainstSlope);
        assert_eq!(signal.direction(), TrendDirection::Bullish);
        assert!(signal.is_degraded());

        let signal = decide(40_000.0, 45_000.0, 0.0);
        assert_eq!(signal, TrendSignal::BearishAgainstSlope);
        assert_eq!(signal.direction(), TrendDirection::Bearish);
        assert!(signal.is_degraded());
    }

    #[test]
    fn test_price_on_ma200() {
        assert_eq!(decide(45_000.0, 45_000.0, 0.2), TrendSignal::OnMa200Rising);
        assert_eq!(decide(45_000.0, 45_000.0, -0.2), TrendSignal::OnMa200Falling);

        let signal = decide(45_000.0, 45_000.0, 0.0);
        assert_eq!(signal, TrendSignal::Indeterminate);
        assert!(signal.is_degraded());
        assert_eq!(signal.direction(), TrendDirection::Bearish);
    }

    #[test]
    fn test_momentum_confirmed_scenario() {
        let signal = decide(50_000.0, 45_000.0, 0.10);
        assert_eq!(signal.direction(), TrendDirection::Bullish);
        let q = quality(50_000.0, 48_000.0, 45_000.0);
        assert_eq!(q, TrendQuality::MomentumConfirmed);
        assert_eq!(q.label(), Some("momentum-confirmed"));
    }

    #[test]
    fn test_bearish_stack_quality() {
        let q = quality(38_000.0, 40_000.0, 45_000.0);
        assert_eq!(q, TrendQuality::BearishStack);
        assert_eq!(quality(42_000.0, 40_000.0, 45_000.0), TrendQuality::Unremarkable);
    }

    #[test]
    fn test_classify_with_rising_ma200() {
        let classifier = TrendClassifier::default();
        let result = classifier.classify(50_000.0, 48_000.0, 45_000.0, &rising(30), &rising(12));
        assert_eq!(result.direction, TrendDirection::Bullish);
        assert_eq!(result.signal, TrendSignal::BullishAligned);
        assert!(result.ma200_slope.sufficient);
        assert!(result.ma200_slope.slope > 0.0);
        assert!(!result.degraded);
    }

    #[test]
    fn test_classify_with_falling_ma200() {
        let classifier = TrendClassifier::default();
        let result = classifier.classify(38_000.0, 40_000.0, 45_000.0, &falling(30), &falling(30));
        assert_eq!(result.signal, TrendSignal::BearishAligned);
        assert_eq!(result.quality, TrendQuality::BearishStack);
    }

    #[test]
    fn test_short_history_zeroes_slope() {
        let classifier = TrendClassifier::default();
        let result = classifier.classify(40_000.0, 41_000.0, 45_000.0, &falling(9), &falling(9));
        assert!(!result.ma200_slope.sufficient);
        assert_eq!(result.ma200_slope.slope, 0.0);
        assert_eq!(result.ma50_slope.slope, 0.0);
        // Zero slope with price below MA200 is the degraded bearish branch.
        assert_eq!(result.signal, TrendSignal::BearishAgainstSlope);
        assert!(result.degraded);
    }
}
