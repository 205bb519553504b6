//! Risk thermometer.
//!
//! Drawdown from the all-time high seen in the retained price window:
//! - < 20%: normal
//! - 20% to 35%: low/mid fever
//! - 35% to 60%: high fever
//! - >= 60%: critical
//!
//! Advisory only. The reading never changes the market state.

use serde::{Deserialize, Serialize};

/// Drawdown tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Normal,
    LowMidFever,
    HighFever,
    Critical,
}

impl RiskTier {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Normal => "Normal temperature, room to press",
            Self::LowMidFever => "Low/mid fever, market needs repair",
            Self::HighFever => "High fever, bear dominance likely",
            Self::Critical => "Critical, deep capitulation zone",
        }
    }
}

/// Tier boundaries, in drawdown percent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskThermometerConfig {
    pub low_fever_pct: f64,
    pub high_fever_pct: f64,
    pub critical_pct: f64,
}

impl Default for RiskThermometerConfig {
    fn default() -> Self {
        Self {
            low_fever_pct: 20.0,
            high_fever_pct: 35.0,
            critical_pct: 60.0,
        }
    }
}

/// Thermometer output.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThermometerReading {
    pub tier: RiskTier,
    pub drawdown_pct: f64,
    pub ath_price: f64,
}

/// All-time-high drawdown tiering.
#[derive(Debug, Clone)]
pub struct RiskThermometer {
    config: RiskThermometerConfig,
}

impl RiskThermometer {
    pub fn new(config: RiskThermometerConfig) -> Self {
        Self { config }
    }

    /// Read the thermometer for `price` against the retained price history.
    pub fn read(&self, price: f64, price_history: &[f64]) -> ThermometerReading {
        let ath = price_history
            .iter()
            .copied()
            .filter(|p| p.is_finite())
            .fold(price, f64::max);

        let drawdown_pct = drawdown_pct(ath, price);

        ThermometerReading {
            tier: self.tier_for(drawdown_pct),
            drawdown_pct,
            ath_price: ath,
        }
    }

    /// Tier for a drawdown; lower bounds inclusive.
    pub fn tier_for(&self, drawdown_pct: f64) -> RiskTier {
        if drawdown_pct >= self.config.critical_pct {
            RiskTier::Critical
        } else if drawdown_pct >= self.config.high_fever_pct {
            RiskTier::HighFever
        } else if drawdown_pct >= self.config.low_fever_pct {
            RiskTier::LowMidFever
        } else {
            RiskTier::Normal
        }
    }
}

impl Default for RiskThermometer {
    fn default() -> Self {
        Self::new(RiskThermometerConfig::default())
    }
}

/// Percent below the high, floored at zero; zero when the high is zero.
pub fn drawdown_pct(ath: f64, price: f64) -> f64 {
    if ath <= 0.0 || !ath.is_finite() {
        return 0.0;
    }
    ((ath - price) * 100.0 / ath).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twenty_percent_is_low_fever() {
        let thermometer = RiskThermometer::default();
        let reading = thermometer.read(80.0, &[90.0, 100.0, 85.0]);
        assert_eq!(reading.ath_price, 100.0);
        assert_eq!(reading.drawdown_pct, 20.0);
        assert_eq!(reading.tier, RiskTier::LowMidFever);
    }

    #[test]
    fn test_tier_boundaries() {
        let thermometer = RiskThermometer::default();
        assert_eq!(thermometer.tier_for(19.999), RiskTier::Normal);
        assert_eq!(thermometer.tier_for(20.0), RiskTier::LowMidFever);
        assert_eq!(thermometer.tier_for(34.999), RiskTier::LowMidFever);
        assert_eq!(thermometer.tier_for(35.0), RiskTier::HighFever);
        assert_eq!(thermometer.tier_for(59.999), RiskTier::HighFever);
        assert_eq!(thermometer.tier_for(60.0), RiskTier::Critical);
    }

    #[test]
    fn test_exactly_thirty_five_percent() {
        let reading = RiskThermometer::default().read(65.0, &[100.0]);
        assert_eq!(reading.drawdown_pct, 35.0);
        assert_eq!(reading.tier, RiskTier::HighFever);
    }

    #[test]
    fn test_new_high_has_no_drawdown() {
        let reading = RiskThermometer::default().read(120.0, &[90.0, 100.0]);
        assert_eq!(reading.ath_price, 120.0);
        assert_eq!(reading.drawdown_pct, 0.0);
        assert_eq!(reading.tier, RiskTier::Normal);
    }

    #[test]
    fn test_empty_history_uses_current_price() {
        let reading = RiskThermometer::default().read(50_000.0, &[]);
        assert_eq!(reading.ath_price, 50_000.0);
        assert_eq!(reading.drawdown_pct, 0.0);
    }

    #[test]
    fn test_zero_ath_guard() {
        assert_eq!(drawdown_pct(0.0, 0.0), 0.0);
        assert_eq!(drawdown_pct(100.0, 30.0), 70.0);
    }
}
