//! Confidence scoring.
//!
//! Blends how far apart the moving averages are, how steep they are, and how
//! far the stablecoin ratio has moved into a single score in [0, 1].

use serde::{Deserialize, Serialize};

/// MA spread multiplier in the trend component.
const CLARITY_WEIGHT: f64 = 5.0;
/// Average MA slope (%/day) treated as maximal clarity.
const SLOPE_SATURATION: f64 = 0.5;
/// Weight of slope confidence in the trend component.
const SLOPE_WEIGHT: f64 = 0.5;
/// Ratio change (percentage points) treated as maximal funding confidence.
const FUNDING_SATURATION: f64 = 8.0;

/// Inputs already computed by the classifiers.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceInputs {
    pub ma50: f64,
    pub ma200: f64,
    pub ma50_slope: f64,
    pub ma200_slope: f64,
    pub stablecoin_ratio_change: f64,
}

/// Score components.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    pub trend_clarity: f64,
    pub slope_confidence: f64,
    pub trend_confidence: f64,
    pub funding_confidence: f64,
    pub overall: f64,
}

/// Confidence scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceScorer;

impl ConfidenceScorer {
    pub fn score(inputs: &ConfidenceInputs) -> ConfidenceBreakdown {
        let trend_clarity = if inputs.ma200 != 0.0 {
            finite_or_zero((inputs.ma50 - inputs.ma200).abs() / inputs.ma200.abs())
        } else {
            0.0
        };

        let slope_strength = (inputs.ma50_slope.abs() + inputs.ma200_slope.abs()) / 2.0;
        let slope_confidence = unit(slope_strength / SLOPE_SATURATION);

        let trend_confidence = unit(trend_clarity * CLARITY_WEIGHT + slope_confidence * SLOPE_WEIGHT);
        let funding_confidence = unit(inputs.stablecoin_ratio_change.abs() / FUNDING_SATURATION);

        ConfidenceBreakdown {
            trend_clarity,
            slope_confidence,
            trend_confidence,
            funding_confidence,
            overall: unit((trend_confidence + funding_confidence) / 2.0),
        }
    }
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Clamp into [0, 1]; NaN becomes 0.
fn unit(x: f64) -> f64 {
    finite_or_zero(x).clamp(0.0, 1.0)
}
