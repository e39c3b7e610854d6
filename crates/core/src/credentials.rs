//! Credential verification collaborator.
//!
//! The core never hashes or compares passwords itself. A calling layer hands
//! in a verifier, and the credential-gated entry points consult it before
//! touching any balance.

use coffer_shared::types::AccountNumber;

use crate::store::StoreError;

/// Verifies a customer's transaction password for an account.
pub trait CredentialVerifier: Send + Sync {
    /// Returns `Ok(true)` if `password` matches the stored hash for the
    /// owner of `account`.
    fn verify(
        &self,
        account: AccountNumber,
        password: &str,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;
}
