//! Validation layers.
//!
//! Advisory readings reported alongside the state, never feeding back into it:
//! - Risk thermometer (drawdown from all-time high)
//! - ETF accelerator (sustained spot ETF flow regime)

pub mod etf;
pub mod thermometer;

pub use etf::{EtfAccelerator, EtfConfig, EtfReading, EtfRegime, EtfSignal, FlowTrend};
pub use thermometer::{RiskThermometer, RiskThermometerConfig, RiskTier, ThermometerReading};
