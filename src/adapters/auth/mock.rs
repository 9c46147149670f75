//! Mock identity verifier for testing.
//!
//! Implements the `IdentityVerifier` port without signing keys, so tests
//! can hand out opaque tokens mapped to fixed identities.
//!
//! # Example
//!
//! ```ignore
//! use bus_tracker::adapters::auth::MockIdentityVerifier;
//! use bus_tracker::domain::foundation::Role;
//!
//! let verifier = MockIdentityVerifier::new()
//!     .with_test_user("driver-token", "driver-1", Role::Driver);
//!
//! let user = verifier.verify("driver-token").await?;
//! assert_eq!(user.role, Role::Driver);
//! ```

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, Role, SubjectId};
use crate::ports::IdentityVerifier;

/// Stores a map of tokens to identities. Unknown tokens return `InvalidToken`.
#[derive(Debug, Default)]
pub struct MockIdentityVerifier {
    tokens: RwLock<HashMap<String, AuthenticatedUser>>,
    /// Optional error to return for all verifications (for error testing)
    force_error: RwLock<Option<AuthError>>,
}

impl MockIdentityVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a valid token that maps to `user`.
    pub fn with_user(self, token: impl Into<String>, user: AuthenticatedUser) -> Self {
        self.add_token(token, user);
        self
    }

    /// Adds a valid token for a subject with the given role.
    pub fn with_test_user(
        self,
        token: impl Into<String>,
        subject_id: impl Into<String>,
        role: Role,
    ) -> Self {
        let id = SubjectId::new(subject_id).unwrap();
        self.with_user(token, AuthenticatedUser::new(id, role))
    }

    /// Forces all verifications to return the specified error.
    pub fn with_error(self, error: AuthError) -> Self {
        *self.force_error.write().unwrap() = Some(error);
        self
    }

    /// Clears the forced error and returns to normal operation.
    pub fn clear_error(&self) {
        *self.force_error.write().unwrap() = None;
    }

    /// Registers a new valid token at runtime.
    pub fn add_token(&self, token: impl Into<String>, user: AuthenticatedUser) {
        self.tokens.write().unwrap().insert(token.into(), user);
    }

    /// Removes a token, making it invalid.
    pub fn remove_token(&self, token: &str) {
        self.tokens.write().unwrap().remove(token);
    }
}

#[async_trait]
impl IdentityVerifier for MockIdentityVerifier {
    async fn verify(&self, credential: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(error) = self.force_error.read().unwrap().clone() {
            return Err(error);
        }

        self.tokens
            .read()
            .unwrap()
            .get(credential)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_identity_for_registered_token() {
        let verifier = MockIdentityVerifier::new().with_test_user("t", "driver-1", Role::Driver);

        let user = verifier.verify("t").await.unwrap();

        assert_eq!(user.id.as_str(), "driver-1");
        assert_eq!(user.role, Role::Driver);
    }

    #[tokio::test]
    async fn returns_invalid_token_for_unknown() {
        let verifier = MockIdentityVerifier::new();
        assert!(matches!(
            verifier.verify("unknown").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn forced_error_wins_until_cleared() {
        let verifier = MockIdentityVerifier::new()
            .with_test_user("t", "admin-1", Role::Admin)
            .with_error(AuthError::TokenExpired);

        assert!(matches!(verifier.verify("t").await, Err(AuthError::TokenExpired)));

        verifier.clear_error();
        assert!(verifier.verify("t").await.is_ok());
    }

    #[tokio::test]
    async fn remove_token_invalidates() {
        let verifier = MockIdentityVerifier::new().with_test_user("t", "p", Role::Parent);

        verifier.remove_token("t");

        assert!(verifier.verify("t").await.is_err());
    }
}
