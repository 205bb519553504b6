//! Market regime classification module.
//!
//! Two independent signal dimensions decide the state:
//! - Trend: price against MA200 and the MA200 slope
//! - Funding: stablecoin cap direction against total cap direction
//!
//! The pair maps onto one of four states, each with a fixed risk level.

pub mod confidence;
pub mod funding;
pub mod state;
pub mod trend;

pub use confidence::{ConfidenceBreakdown, ConfidenceInputs, ConfidenceScorer};
pub use funding::{
    FundingClassification, FundingClassifier, FundingConfig, FundingPosture, FundingSignal,
};
pub use state::{MarketState, RiskLevel, StateMapper};
pub use trend::{
    TrendClassification, TrendClassifier, TrendConfig, TrendDirection, TrendQuality, TrendSignal,
};
