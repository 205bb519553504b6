pub mod analytics;
pub mod data;
pub mod engine;
pub mod history;
pub mod regime;
pub mod validation;

// Re-export commonly used types
pub use data::{EvaluationInput, HistoryPoint, MarketHistory, MarketSnapshot, MetricKind};
pub use engine::{load_config, Engine, EngineConfig, EngineError, StateResult};
pub use history::{HistoryConfig, HistoryStore};
pub use regime::{FundingPosture, MarketState, RiskLevel, StateMapper, TrendDirection};
pub use validation::{EtfRegime, RiskTier};
pub use analytics::{log_linear_slope, SlopeEstimator};
