pub mod types;

pub use types::{
    EvaluationInput, HistoryPoint, MarketHistory, MarketSnapshot, MetricKind, MetricSample,
};
