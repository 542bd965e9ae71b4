pub struct RoundingHelper;

impl RoundingHelper {
    /// Rounds half away from zero to `decimals` places.
    pub fn round(value: f64, decimals: i32) -> f64 {
        let scale = 10f64.powi(decimals);
        (value * scale).round() / scale
    }

    /// Two-decimal rounding used for every displayed magnitude.
    pub fn display(value: f64) -> f64 {
        Self::round(value, 2)
    }
}
