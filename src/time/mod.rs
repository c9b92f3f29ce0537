//! Clock access and time-of-day arithmetic.

pub mod of_day;
pub mod simulate;
pub mod source;

pub use of_day::TimeOfDay;
