use serde::{Deserialize, Serialize};

/// Reduced, display-rounded record for one sweep step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedPoint {
    pub lo_p: f64,
    /// LO frequency in GHz.
    pub lo_f: f64,
    pub lo_p_loss: f64,
    pub p_in: f64,
    pub p_in_db: f64,
    pub p_out: f64,
    pub p_carr: f64,
    pub p_sb: f64,
    pub p_3_harm: f64,
    pub kp: f64,
    pub src_u: f64,
    /// Supply current in A.
    pub src_i: f64,
}

/// Positional correction for the point at the same index in a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationEntry {
    pub lo_p: f64,
    pub lo_f: f64,
    /// Added to `kp` of the matching point.
    pub kp: f64,
}

impl CalibrationEntry {
    pub fn zeroed(point: &DerivedPoint) -> Self {
        Self {
            lo_p: point.lo_p,
            lo_f: point.lo_f,
            kp: 0.0,
        }
    }
}

/// Compression point found for one LO frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutoffRecord {
    /// LO frequency in GHz.
    pub lo_f: f64,
    /// Input level in dB at which compression was detected.
    pub cutoff_input_level: f64,
    /// `false` when the sweep ended before the threshold was crossed and the
    /// last input level is reported instead.
    pub compressed: bool,
}
