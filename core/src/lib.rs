//! Reduction core for RF device sweeps.
//!
//! Raw instrument readings are reduced point by point into derived metrics,
//! corrected through an optional positional calibration overlay, grouped by
//! LO frequency and scanned for the 1 dB compression point once a sweep ends.

pub mod interface;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use interface::{CalibrationEntry, CutoffRecord, DerivedPoint, RawReading};
pub use prelude::{CutoffMetric, SessionConfig, SweepError, SweepResult};
pub use processing::{ResultSession, SessionState};
