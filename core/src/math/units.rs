use crate::math::rounding::RoundingHelper;

pub const MILLI: f64 = 1_000.0;
pub const GIGA: f64 = 1_000_000_000.0;

/// mA to A.
pub fn milli_to_base(value: f64) -> f64 {
    value / MILLI
}

/// Hz to GHz, rounded to 3 decimals for display.
pub fn hz_to_display_ghz(hz: f64) -> f64 {
    RoundingHelper::round(hz / GIGA, 3)
}
