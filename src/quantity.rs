#[macro_use]
mod macros;

pub mod cost;
pub mod energy;
pub mod rate;

/// Round the exact binary value to the given number of decimal places, ties to even.
///
/// Goes through the decimal formatting, because scaling by a power of ten is lossy and
/// `f64::round` breaks ties away from zero.
#[must_use]
pub fn round_to(value: f64, n_decimals: usize) -> f64 {
    format!("{value:.n_decimals$}").parse().unwrap_or(value)
}
