//! Evaluation engine.
//!
//! Wires the history store, classifiers and validation layers into a single
//! `evaluate()` pass producing a `StateResult`.

pub mod config;
pub mod evaluator;
pub mod result;

pub use config::{load_config, ConfigError, EngineConfig};
pub use evaluator::{Engine, EngineError};
pub use result::{StateMetadata, StateResult, ValidationLayer};
