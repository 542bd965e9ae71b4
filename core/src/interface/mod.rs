pub mod reading;
pub mod record;

pub use reading::RawReading;
pub use record::{CalibrationEntry, CutoffRecord, DerivedPoint};
