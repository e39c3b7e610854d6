//! Audit comment texts.

use rust_decimal::Decimal;

use coffer_shared::types::{AccountNumber, format_amount};

/// Comment for a customer-initiated transfer.
///
/// A blank note is dropped.
#[must_use]
pub fn transfer_comment(amount: Decimal, to: AccountNumber, note: Option<&str>) -> String {
    let mut comment = format!("Transferred {} to A/C {to}", format_amount(amount));
    if let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) {
        comment.push_str(" | Note: ");
        comment.push_str(note);
    }
    comment
}

/// Comment for a transfer executed by the scheduler.
#[must_use]
pub fn scheduled_comment(from: AccountNumber, to: AccountNumber) -> String {
    format!("Scheduled transaction from {from} account to {to} account")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transfer_comment() {
        assert_eq!(
            transfer_comment(dec!(300.00), AccountNumber(1002), None),
            "Transferred ₹300 to A/C 1002"
        );
        assert_eq!(
            transfer_comment(dec!(300), AccountNumber(1002), Some("rent")),
            "Transferred ₹300 to A/C 1002 | Note: rent"
        );
        assert_eq!(
            transfer_comment(dec!(300), AccountNumber(1002), Some("   ")),
            "Transferred ₹300 to A/C 1002"
        );
    }

    #[test]
    fn test_scheduled_comment() {
        assert_eq!(
            scheduled_comment(AccountNumber(1001), AccountNumber(1002)),
            "Scheduled transaction from 1001 account to 1002 account"
        );
    }
}
