//! Money helpers over `rust_decimal::Decimal`.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Balances and amounts are `Decimal` values stored as `NUMERIC(18,2)`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency the ledger is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Indian Rupee
    #[default]
    Inr,
}

impl Currency {
    /// Returns the display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Inr => "₹",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inr => write!(f, "INR"),
        }
    }
}

/// Decimal places carried by every stored amount and balance.
pub const MONEY_SCALE: u32 = 2;

/// Largest value a `NUMERIC(18,2)` money column holds.
#[must_use]
pub fn max_money() -> Decimal {
    Decimal::new(999_999_999_999_999_999, MONEY_SCALE)
}

/// Returns true if `amount` can be stored in a money column without
/// rounding or overflow.
#[must_use]
pub fn fits_money_column(amount: Decimal) -> bool {
    amount.normalize().scale() <= MONEY_SCALE && amount.abs() <= max_money()
}

/// Formats an amount for audit comments, e.g. `₹300` or `₹12.5`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("{}{}", Currency::Inr.symbol(), amount.normalize())
}
