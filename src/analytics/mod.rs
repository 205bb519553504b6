//! Series analytics shared by the classifiers.

pub mod slope;

pub use slope::{log_linear_slope, SlopeEstimator, SlopeReading};
