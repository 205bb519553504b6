//! Four-quadrant state mapping.

use serde::{Deserialize, Serialize};

use super::funding::FundingPosture;
use super::trend::TrendDirection;

/// Four-quadrant market state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketState {
    /// Bullish trend, capital on offense.
    BullOffensive,
    /// Bullish trend, capital defensive (repair phase).
    BullDefensive,
    /// Bearish trend, capital on offense (relief rally).
    BearOffensive,
    /// Bearish trend, capital defensive (digestion).
    BearDefensive,
}

impl MarketState {
    /// Static risk level of the state.
    pub fn risk_level(&self) -> RiskLevel {
        match self {
            Self::BullOffensive => RiskLevel::High,
            Self::BullDefensive => RiskLevel::Medium,
            Self::BearOffensive => RiskLevel::Medium,
            Self::BearDefensive => RiskLevel::Low,
        }
    }

    pub fn trend(&self) -> TrendDirection {
        match self {
            Self::BullOffensive | Self::BullDefensive => TrendDirection::Bullish,
            Self::BearOffensive | Self::BearDefensive => TrendDirection::Bearish,
        }
    }

    pub fn funding(&self) -> FundingPosture {
        match self {
            Self::BullOffensive | Self::BearOffensive => FundingPosture::Offensive,
            Self::BullDefensive | Self::BearDefensive => FundingPosture::Defensive,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BullOffensive => "bull_offensive",
            Self::BullDefensive => "bull_defensive",
            Self::BearOffensive => "bear_offensive",
            Self::BearDefensive => "bear_defensive",
        }
    }

    /// Description of the state.
    pub fn description(&self) -> &'static str {
        match self {
            Self::BullOffensive => "Bull market, capital pressing risk assets",
            Self::BullDefensive => "Bull market repair, capital parked in stablecoins",
            Self::BearOffensive => "Bear market rally",
            Self::BearDefensive => "Bear market digestion",
        }
    }
}

/// Risk level attached to a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

/// Lookup from (trend, funding) to state.
///
/// Validation layers are deliberately absent from the signature.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateMapper;

impl StateMapper {
    pub fn map(trend: TrendDirection, funding: FundingPosture) -> MarketState {
        match (trend, funding) {
            (TrendDirection::Bullish, FundingPosture::Offensive) => MarketState::BullOffensive,
            (TrendDirection::Bullish, FundingPosture::Defensive) => MarketState::BullDefensive,
            (TrendDirection::Bearish, FundingPosture::Offensive) => MarketState::BearOffensive,
            (TrendDirection::Bearish, FundingPosture::Defensive) => MarketState::BearDefensive,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_table() {
        let cases = [
            (TrendDirection::Bullish, FundingPosture::Offensive, MarketState::BullOffensive, RiskLevel::High),
            (TrendDirection::Bullish, FundingPosture::Defensive, MarketState::BullDefensive, RiskLevel::Medium),
            (TrendDirection::Bearish, FundingPosture::Offensive, MarketState::BearOffensive, RiskLevel::Medium),
            (TrendDirection::Bearish, FundingPosture::Defensive, MarketState::BearDefensive, RiskLevel::Low),
        ];

        for (trend, funding, state, risk) in cases {
            // Repeated lookups never drift.
            for _ in 0..3 {
                let mapped = StateMapper::map(trend, funding);
                assert_eq!(mapped, state);
                assert_eq!(mapped.risk_level(), risk);
                assert_eq!(mapped.trend(), trend);
                assert_eq!(mapped.funding(), funding);
            }
        }
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&MarketState::BullOffensive).unwrap(),
            "\"bull_offensive\""
        );
        assert_eq!(serde_json::to_string(&RiskLevel::Medium).unwrap(), "\"MEDIUM\"");
        assert_eq!(RiskLevel::Low.as_str(), "LOW");
        assert_eq!(MarketState::BearDefensive.as_str(), "bear_defensive");
    }
}
