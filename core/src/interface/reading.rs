use crate::prelude::{SweepError, SweepResult};
use serde::{Deserialize, Serialize};

/// One sweep step as delivered by the acquisition side.
///
/// Every field is optional on the wire; a missing or non-finite value is
/// rejected at ingestion with [`SweepError::MalformedInput`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawReading {
    /// LO set power, dBm.
    pub lo_p: Option<f64>,
    /// LO frequency, Hz.
    pub lo_f: Option<f64>,
    /// Cable/fixture loss at `lo_f`, dB.
    pub loss: Option<f64>,
    /// Modulator input level, linear %.
    pub mod_u: Option<f64>,
    /// Modulator input level, dB.
    pub mod_u_db: Option<f64>,
    /// Supply voltage, V.
    pub src_u: Option<f64>,
    /// Supply current, mA.
    pub src_i: Option<f64>,
    pub sa_p_out: Option<f64>,
    pub sa_p_carr: Option<f64>,
    pub sa_p_sb: Option<f64>,
    pub sa_p_3_harm: Option<f64>,
}

/// A reading whose fields have all been checked present and finite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CheckedReading {
    pub lo_p: f64,
    pub lo_f: f64,
    pub loss: f64,
    pub mod_u: f64,
    pub mod_u_db: f64,
    pub src_u: f64,
    pub src_i: f64,
    pub sa_p_out: f64,
    pub sa_p_carr: f64,
    pub sa_p_sb: f64,
    pub sa_p_3_harm: f64,
}

impl RawReading {
    fn require(value: Option<f64>, field: &'static str) -> SweepResult<f64> {
        match value {
            Some(v) if v.is_finite() => Ok(v),
            _ => Err(SweepError::MalformedInput { field }),
        }
    }

    pub(crate) fn check(&self) -> SweepResult<CheckedReading> {
        Ok(CheckedReading {
            lo_p: Self::require(self.lo_p, "lo_p")?,
            lo_f: Self::require(self.lo_f, "lo_f")?,
            loss: Self::require(self.loss, "loss")?,
            mod_u: Self::require(self.mod_u, "mod_u")?,
            mod_u_db: Self::require(self.mod_u_db, "mod_u_db")?,
            src_u: Self::require(self.src_u, "src_u")?,
            src_i: Self::require(self.src_i, "src_i")?,
            sa_p_out: Self::require(self.sa_p_out, "sa_p_out")?,
            sa_p_carr: Self::require(self.sa_p_carr, "sa_p_carr")?,
            sa_p_sb: Self::require(self.sa_p_sb, "sa_p_sb")?,
            sa_p_3_harm: Self::require(self.sa_p_3_harm, "sa_p_3_harm")?,
        })
    }
}
