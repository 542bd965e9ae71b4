pub mod rounding;
pub mod units;

pub use rounding::RoundingHelper;
pub use units::{GIGA, MILLI};
