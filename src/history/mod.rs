//! Rolling metric history.
//!
//! Holds the only mutable state that survives between evaluations:
//! - 200-sample windows for price, MA50 and MA200
//! - 30-sample windows for stablecoin cap, total cap, ETF flow and ETF AUM

pub mod store;

pub use store::{HistoryConfig, HistoryStore, HistoryWindow};
