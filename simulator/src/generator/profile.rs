use crate::workflow::config::SweepPlan;
use anyhow::ensure;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sweepcore::RawReading;

/// Simulated device under test and bench wiring used to synthesize readings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceProfile {
    /// Small-signal conversion gain, dB.
    pub gain_db: f64,
    /// Input level where compression reaches 3 dB.
    pub knee_input_db: f64,
    /// Knee shift per GHz of LO frequency.
    pub knee_slope_db_per_ghz: f64,
    /// Cable loss at 1 GHz and its growth per GHz.
    pub loss_db: f64,
    pub loss_slope_db_per_ghz: f64,
    pub supply_voltage: f64,
    pub idle_current_ma: f64,
    /// Peak-to-peak measurement jitter, dB.
    pub noise_db: f64,
    pub seed: u64,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            gain_db: 8.0,
            knee_input_db: -8.0,
            knee_slope_db_per_ghz: -1.5,
            loss_db: 1.2,
            loss_slope_db_per_ghz: 0.4,
            supply_voltage: 5.0,
            idle_current_ma: 85.0,
            noise_db: 0.05,
            seed: 0,
        }
    }
}

impl DeviceProfile {
    fn loss_at(&self, lo_f_hz: f64) -> f64 {
        self.loss_db + self.loss_slope_db_per_ghz * (lo_f_hz / 1.0e9 - 1.0)
    }

    fn knee_at(&self, lo_f_hz: f64) -> f64 {
        self.knee_input_db + self.knee_slope_db_per_ghz * (lo_f_hz / 1.0e9 - 1.0)
    }

    /// Soft compression that reaches 3 dB at the knee.
    fn compression_db(&self, input_db: f64, knee_db: f64) -> f64 {
        10.0 * (1.0 + 10f64.powf((input_db - knee_db) / 10.0)).log10()
    }
}

fn jitter(rng: &mut StdRng, noise_db: f64) -> f64 {
    if noise_db > 0.0 {
        rng.gen_range(-noise_db / 2.0..noise_db / 2.0)
    } else {
        0.0
    }
}

/// Builds one reading per sweep step, in plan order.
pub fn build_readings(plan: &SweepPlan, device: &DeviceProfile) -> anyhow::Result<Vec<RawReading>> {
    let inputs = plan.input_levels();
    let count = plan.point_count();
    ensure!(count > 0, "sweep plan produces no points");

    let mut rng = StdRng::seed_from_u64(device.seed);
    let mut readings = Vec::with_capacity(count);

    for &lo_p in &plan.lo_powers_dbm {
        for &lo_f in &plan.lo_frequencies_hz {
            let loss = device.loss_at(lo_f);
            let knee = device.knee_at(lo_f) + lo_p * 0.5;
            for &input_db in &inputs {
                let compression = device.compression_db(input_db, knee);
                let output = input_db + device.gain_db - compression
                    + jitter(&mut rng, device.noise_db);
                let output_mw = 10f64.powf(output / 10.0);

                readings.push(RawReading {
                    lo_p: Some(lo_p),
                    lo_f: Some(lo_f),
                    loss: Some(loss),
                    mod_u: Some(100.0 * 10f64.powf(input_db / 20.0)),
                    mod_u_db: Some(input_db),
                    src_u: Some(device.supply_voltage),
                    src_i: Some(device.idle_current_ma + 40.0 * output_mw.min(10.0)),
                    sa_p_out: Some(output - loss),
                    sa_p_carr: Some(output - 35.0 + jitter(&mut rng, device.noise_db) - loss),
                    sa_p_sb: Some(output - 6.0 + jitter(&mut rng, device.noise_db) - loss),
                    sa_p_3_harm: Some(output - 45.0 + 3.0 * compression - loss),
                });
            }
        }
    }

    Ok(readings)
}
