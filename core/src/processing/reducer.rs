use crate::interface::{DerivedPoint, RawReading};
use crate::math::rounding::RoundingHelper;
use crate::math::units::{hz_to_display_ghz, milli_to_base};
use crate::prelude::{CutoffMetric, SweepResult};
use crate::processing::calibration::{CalibrationOverlay, Correction};
use crate::processing::series::FrequencyKey;
use crate::telemetry::log::LogManager;

/// Everything produced by reducing one reading.
///
/// `point` carries display-rounded values; the remaining fields are the
/// unrounded intermediates the series is built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduction {
    pub point: DerivedPoint,
    pub key: FrequencyKey,
    pub input_db: f64,
    pub output_power: f64,
    pub corrected_gain: f64,
    pub correction: Correction,
}

impl Reduction {
    /// Quantity recorded for compression detection.
    pub fn metric(&self, metric: CutoffMetric) -> f64 {
        match metric {
            CutoffMetric::OutputPower => self.output_power,
            CutoffMetric::CorrectedGain => self.corrected_gain,
        }
    }
}

/// Turns raw readings into derived points.
pub struct PointReducer {
    logger: LogManager,
}

impl PointReducer {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new("reducer"),
        }
    }

    /// Reduces `raw` as the point at position `produced` of the sweep.
    pub fn reduce(
        &self,
        raw: &RawReading,
        calibration: &CalibrationOverlay,
        produced: usize,
    ) -> SweepResult<Reduction> {
        let reading = raw.check()?;

        let loss = reading.loss;
        let p_out = reading.sa_p_out + loss;
        let p_carr = reading.sa_p_carr + loss;
        let p_sb = reading.sa_p_sb + loss;
        let p_3_harm = reading.sa_p_3_harm + loss;

        let correction = calibration.lookup(produced);
        if correction == Correction::OutOfRange {
            self.logger.detail(&format!(
                "no calibration entry for point {}, emitting uncorrected kp",
                produced
            ));
        }
        let kp = p_out - reading.mod_u_db + correction.offset();

        let point = DerivedPoint {
            lo_p: RoundingHelper::display(reading.lo_p),
            lo_f: hz_to_display_ghz(reading.lo_f),
            lo_p_loss: RoundingHelper::display(loss),
            p_in: RoundingHelper::display(reading.mod_u),
            p_in_db: RoundingHelper::display(reading.mod_u_db),
            p_out: RoundingHelper::display(p_out),
            p_carr: RoundingHelper::display(p_carr),
            p_sb: RoundingHelper::display(p_sb),
            p_3_harm: RoundingHelper::display(p_3_harm),
            kp: RoundingHelper::display(kp),
            src_u: RoundingHelper::display(reading.src_u),
            src_i: RoundingHelper::display(milli_to_base(reading.src_i)),
        };

        Ok(Reduction {
            point,
            key: FrequencyKey::from_hz(reading.lo_f),
            input_db: reading.mod_u_db,
            output_power: p_out,
            corrected_gain: kp,
            correction,
        })
    }
}

impl Default for PointReducer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::CalibrationEntry;
    use crate::prelude::SweepError;

    fn reading(loss: f64, sa_p_out: f64, mod_u_db: f64) -> RawReading {
        RawReading {
            lo_p: Some(-3.0),
            lo_f: Some(2_450_000_000.0),
            loss: Some(loss),
            mod_u: Some(56.234),
            mod_u_db: Some(mod_u_db),
            src_u: Some(12.0),
            src_i: Some(345.678),
            sa_p_out: Some(sa_p_out),
            sa_p_carr: Some(-40.0),
            sa_p_sb: Some(-31.5),
            sa_p_3_harm: Some(-60.0),
        }
    }

    #[test]
    fn loss_compensated_gain() {
        let reduction = PointReducer::new()
            .reduce(&reading(2.0, -10.0, -5.0), &CalibrationOverlay::uncalibrated(), 0)
            .unwrap();
        let point = &reduction.point;
        assert_eq!(point.p_out, -8.0);
        assert_eq!(point.kp, -3.0);
        assert_eq!(point.p_carr, -38.0);
        assert_eq!(point.p_sb, -29.5);
        assert_eq!(point.p_3_harm, -58.0);
        assert_eq!(point.lo_f, 2.45);
        assert_eq!(point.src_i, 0.35);
        assert_eq!(point.p_in, 56.23);
        assert_eq!(reduction.correction, Correction::Uncalibrated);
    }

    #[test]
    fn correction_applies_by_position() {
        let calibration = CalibrationOverlay::from_entries(vec![
            CalibrationEntry {
                lo_p: -3.0,
                lo_f: 2.45,
                kp: 0.5,
            },
            CalibrationEntry {
                lo_p: -3.0,
                lo_f: 2.45,
                kp: -1.25,
            },
        ]);
        let reducer = PointReducer::new();
        let raw = reading(2.0, -10.0, -5.0);

        assert_eq!(reducer.reduce(&raw, &calibration, 0).unwrap().point.kp, -2.5);
        assert_eq!(reducer.reduce(&raw, &calibration, 1).unwrap().point.kp, -4.25);
        let skipped = reducer.reduce(&raw, &calibration, 2).unwrap();
        assert_eq!(skipped.point.kp, -3.0);
        assert_eq!(skipped.correction, Correction::OutOfRange);
    }

    #[test]
    fn series_values_are_unrounded() {
        let reduction = PointReducer::new()
            .reduce(&reading(0.004, -10.0, -5.001), &CalibrationOverlay::uncalibrated(), 0)
            .unwrap();
        assert_eq!(reduction.input_db, -5.001);
        assert_eq!(reduction.output_power, -10.0 + 0.004);
        assert_eq!(reduction.point.p_out, -10.0);
        assert_eq!(
            reduction.metric(CutoffMetric::CorrectedGain),
            -10.0 + 0.004 - -5.001
        );
    }

    #[test]
    fn malformed_reading_is_rejected() {
        let raw = RawReading {
            mod_u_db: None,
            ..reading(1.0, -10.0, -5.0)
        };
        let result = PointReducer::new().reduce(&raw, &CalibrationOverlay::uncalibrated(), 0);
        assert!(matches!(
            result,
            Err(SweepError::MalformedInput { field: "mod_u_db" })
        ));
    }
}
