//! Common types used across the application.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{Currency, MONEY_SCALE, fits_money_column, format_amount, max_money};
