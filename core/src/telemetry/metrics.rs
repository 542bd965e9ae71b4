use serde::Serialize;

/// Per-session counters. The owning session is the only writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepMetrics {
    reduced: usize,
    rejected: usize,
    uncorrected: usize,
}

impl SweepMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_reduced(&mut self) {
        self.reduced += 1;
    }

    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }

    /// A calibrated run emitted a point without a matching correction.
    pub fn record_uncorrected(&mut self) {
        self.uncorrected += 1;
    }

    pub fn reduced(&self) -> usize {
        self.reduced
    }

    pub fn rejected(&self) -> usize {
        self.rejected
    }

    pub fn uncorrected(&self) -> usize {
        self.uncorrected
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
