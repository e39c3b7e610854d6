//! Typed numeric IDs for type-safe entity references.
//!
//! Account numbers, record ids and scheduled transfer ids are all plain
//! integers in storage. Wrapping them prevents passing a `ScheduledTransferId`
//! where an `AccountNumber` is expected.

use serde::{Deserialize, Serialize};

/// Macro to generate typed numeric ID wrappers.
macro_rules! numeric_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Creates an ID from a raw storage value.
            #[must_use]
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw storage value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

numeric_id!(AccountNumber, "Bank account number.");
numeric_id!(UserId, "Identifier of the customer owning an account.");
numeric_id!(
    TransactionRecordId,
    "Identifier of an audit record. Valid ids start at 1 000 000 000."
);
numeric_id!(ScheduledTransferId, "Identifier of a scheduled transfer.");

impl TransactionRecordId {
    /// First identifier handed out for audit records.
    pub const FIRST: Self = Self(1_000_000_000);

    /// Returns true if the value lies in the range assigned to audit records.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST.0
    }
}
