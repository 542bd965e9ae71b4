pub mod calibration;
pub mod cutoff;
pub mod reducer;
pub mod series;
pub mod session;

pub use calibration::{
    CalibrationOverlay, CalibrationStore, Correction, JsonCalibrationStore, LengthMismatch,
    MemoryCalibrationStore,
};
pub use cutoff::{CompressionPointDetector, CutoffSearch};
pub use reducer::{PointReducer, Reduction};
pub use series::{FrequencyKey, FrequencySeries, SeriesAccumulator, SeriesPair};
pub use session::{ResultSession, SessionState};
