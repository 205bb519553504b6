//! Log-linear slope estimation.
//!
//! Regresses ln(value) on the sample index and reports the slope in percent
//! per sample. Working in log space makes the rate scale-invariant, so a MA200
//! at 45,000 and a stablecoin cap at 160B are read on the same footing.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Result of a gated slope computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlopeReading {
    /// Percent change per sample; 0.0 when the gate was not met.
    pub slope: f64,
    /// Samples that went into the regression.
    pub samples: usize,
    /// Whether the minimum-history gate was met.
    pub sufficient: bool,
}

impl SlopeReading {
    fn insufficient(available: usize) -> Self {
        Self {
            slope: 0.0,
            samples: available,
            sufficient: false,
        }
    }
}

/// Windowed slope estimator with a minimum-history gate.
#[derive(Debug, Clone, Copy)]
pub struct SlopeEstimator {
    window: usize,
    min_samples: usize,
}

impl SlopeEstimator {
    /// `window` is the number of trailing samples regressed; `min_samples` is
    /// the fewest samples for which a slope is reported at all.
    pub fn new(window: usize, min_samples: usize) -> Self {
        Self {
            window,
            min_samples,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Slope over the trailing window of `values` (oldest-first).
    pub fn estimate(&self, values: &[f64]) -> SlopeReading {
        if values.len() < self.min_samples.max(2) {
            return SlopeReading::insufficient(values.len());
        }

        let start = values.len().saturating_sub(self.window);
        let recent = &values[start..];

        SlopeReading {
            slope: log_linear_slope(recent),
            samples: recent.len(),
            sufficient: true,
        }
    }
}

/// OLS slope of ln(value) against index 0..n-1, times 100.
///
/// Non-positive or non-finite values are dropped before the log transform.
/// Returns 0.0 when fewer than two usable values remain.
pub fn log_linear_slope(values: &[f64]) -> f64 {
    let logs: Vec<f64> = values
        .iter()
        .filter(|v| v.is_finite() && **v > 0.0)
        .map(|v| v.ln())
        .collect();

    if logs.len() < values.len() {
        warn!(
            usable = logs.len(),
            supplied = values.len(),
            "dropped non-positive values before slope regression"
        );
    }
    if logs.len() < 2 {
        return 0.0;
    }

    // Shifting by the first log leaves the slope unchanged and keeps a flat
    // series at exactly zero.
    let base = logs[0];
    let n = logs.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = logs.iter().map(|y| y - base).sum::<f64>() / n;

    let (numerator, denominator) = logs
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, &y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - base - y_mean), den + dx * dx)
        });

    if denominator == 0.0 {
        return 0.0;
    }

    numerator / denominator * 100.0
}
