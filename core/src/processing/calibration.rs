use crate::interface::{CalibrationEntry, DerivedPoint};
use crate::prelude::{SweepError, SweepResult};
use crate::telemetry::log::LogManager;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Persistence seam for the positional calibration table.
pub trait CalibrationStore {
    /// Returns `Ok(None)` when no calibration artifact exists.
    fn load(&self) -> SweepResult<Option<Vec<CalibrationEntry>>>;
    fn save(&self, entries: &[CalibrationEntry]) -> SweepResult<()>;
}

/// Calibration table persisted as a JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonCalibrationStore {
    path: PathBuf,
}

impl JsonCalibrationStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CalibrationStore for JsonCalibrationStore {
    fn load(&self) -> SweepResult<Option<Vec<CalibrationEntry>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        let entries = serde_json::from_str(&contents)?;
        Ok(Some(entries))
    }

    fn save(&self, entries: &[CalibrationEntry]) -> SweepResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

/// In-memory store; clones share the same table.
#[derive(Debug, Clone, Default)]
pub struct MemoryCalibrationStore {
    entries: Rc<RefCell<Option<Vec<CalibrationEntry>>>>,
}

impl MemoryCalibrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<CalibrationEntry>) -> Self {
        Self {
            entries: Rc::new(RefCell::new(Some(entries))),
        }
    }

    /// Replaces the stored table, as a hand edit between runs would.
    pub fn replace(&self, entries: Option<Vec<CalibrationEntry>>) {
        *self.entries.borrow_mut() = entries;
    }

    pub fn snapshot(&self) -> Option<Vec<CalibrationEntry>> {
        self.entries.borrow().clone()
    }
}

impl CalibrationStore for MemoryCalibrationStore {
    fn load(&self) -> SweepResult<Option<Vec<CalibrationEntry>>> {
        Ok(self.snapshot())
    }

    fn save(&self, entries: &[CalibrationEntry]) -> SweepResult<()> {
        self.replace(Some(entries.to_vec()));
        Ok(())
    }
}

/// Outcome of a positional correction lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    /// No table loaded.
    Uncalibrated,
    Applied(f64),
    /// Table loaded but shorter than the point index; the point stays uncorrected.
    OutOfRange,
}

impl Correction {
    pub fn offset(&self) -> f64 {
        match self {
            Correction::Applied(value) => *value,
            Correction::Uncalibrated | Correction::OutOfRange => 0.0,
        }
    }
}

/// Table length that disagreed with the sweep plan at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthMismatch {
    pub entries: usize,
    pub expected: usize,
}

/// Positional `kp` correction table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalibrationOverlay {
    entries: Option<Vec<CalibrationEntry>>,
    mismatch: Option<LengthMismatch>,
}

impl CalibrationOverlay {
    pub fn uncalibrated() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<CalibrationEntry>) -> Self {
        Self {
            entries: Some(entries),
            mismatch: None,
        }
    }

    /// Loads the table from `store`, warning when its length disagrees with
    /// the number of points the sweep plan will produce.
    pub fn load(
        store: &dyn CalibrationStore,
        expected_points: Option<usize>,
        logger: &LogManager,
    ) -> SweepResult<Self> {
        let Some(entries) = store.load()? else {
            logger.record("no calibration table found, running uncalibrated");
            return Ok(Self::uncalibrated());
        };

        if let Some(idx) = entries.iter().position(|entry| !entry.kp.is_finite()) {
            return Err(SweepError::Calibration(format!(
                "entry {} has a non-finite correction",
                idx
            )));
        }

        let mismatch = match expected_points {
            Some(expected) if expected != entries.len() => {
                logger.warn(&format!(
                    "calibration table has {} entries but the sweep plan produces {} points",
                    entries.len(),
                    expected
                ));
                Some(LengthMismatch {
                    entries: entries.len(),
                    expected,
                })
            }
            _ => {
                logger.record(&format!("loaded {} calibration entries", entries.len()));
                None
            }
        };

        Ok(Self {
            entries: Some(entries),
            mismatch,
        })
    }

    /// Set when the loaded table length differs from the expected point count.
    pub fn length_mismatch(&self) -> Option<LengthMismatch> {
        self.mismatch
    }

    pub fn is_loaded(&self) -> bool {
        self.entries.is_some()
    }

    pub fn entries(&self) -> Option<&[CalibrationEntry]> {
        self.entries.as_deref()
    }

    pub fn correction_at(&self, index: usize) -> Option<f64> {
        self.entries
            .as_ref()
            .and_then(|entries| entries.get(index))
            .map(|entry| entry.kp)
    }

    pub fn lookup(&self, index: usize) -> Correction {
        if !self.is_loaded() {
            return Correction::Uncalibrated;
        }
        match self.correction_at(index) {
            Some(value) => Correction::Applied(value),
            None => Correction::OutOfRange,
        }
    }

    /// Writes a zero-correction template for `points` unless a non-empty table
    /// is already present, in memory or in the store. Returns whether a
    /// template was written.
    ///
    /// A stored artifact that fails to parse is reported as an error and left
    /// untouched.
    pub fn save_template(
        &mut self,
        points: &[DerivedPoint],
        store: &dyn CalibrationStore,
    ) -> SweepResult<bool> {
        if self.entries.as_ref().is_some_and(|entries| !entries.is_empty()) {
            return Ok(false);
        }
        if store.load()?.is_some_and(|entries| !entries.is_empty()) {
            return Ok(false);
        }
        let template: Vec<CalibrationEntry> =
            points.iter().map(CalibrationEntry::zeroed).collect();
        store.save(&template)?;
        self.entries = Some(template);
        Ok(true)
    }
}
