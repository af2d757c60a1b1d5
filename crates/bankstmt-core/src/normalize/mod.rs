//! Field normalization: raw date and amount tokens into canonical values.

pub mod amounts;
pub mod dates;
pub mod patterns;

pub use amounts::{normalize_amount, parse_amount};
pub use dates::{normalize_date, normalize_date_with, DateOrder};
