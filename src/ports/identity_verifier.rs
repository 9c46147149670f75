//! Identity verification port for bearer credentials.
//!
//! This port defines the contract for validating the credential a client
//! presents when opening a tracking connection (or calling the HTTP publish
//! endpoints) and extracting its identity. It is issuer-agnostic: the JWT
//! adapter is used in production and a mock in tests.
//!
//! # Example Implementation
//!
//! ```ignore
//! pub struct JwtIdentityVerifier { ... }
//!
//! #[async_trait]
//! impl IdentityVerifier for JwtIdentityVerifier {
//!     async fn verify(&self, credential: &str) -> Result<AuthenticatedUser, AuthError> {
//!         // 1. Check signature and expiry
//!         // 2. Map `id` and `role` claims to AuthenticatedUser
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Validates bearer credentials and extracts `{subject, role}`.
///
/// # Contract
///
/// Implementations must:
/// - Return `AuthError::InvalidToken` for malformed, badly signed, or
///   role-less credentials
/// - Return `AuthError::TokenExpired` for expired credentials
/// - Return `AuthError::ServiceUnavailable` for transient errors
/// - Complete in bounded time; connection setup waits on this call
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify a raw credential (without any "Bearer " prefix).
    async fn verify(&self, credential: &str) -> Result<AuthenticatedUser, AuthError>;
}
