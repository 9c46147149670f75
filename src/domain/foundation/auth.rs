//! Authentication types for the domain layer.
//!
//! These types represent the identity extracted from a bearer credential.
//! They have **no external dependencies** - any token issuer can populate
//! them via the `IdentityVerifier` port.
//!
//! The role is taken from the credential once, at connect time, and trusted
//! for the lifetime of the session.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{SubjectId, ValidationError};

/// Account role carried in the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Parent,
    Driver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Parent => "parent",
            Role::Driver => "driver",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "parent" => Ok(Role::Parent),
            "driver" => Ok(Role::Driver),
            other => Err(ValidationError::invalid_format(
                "role",
                format!("unknown role '{}'", other),
            )),
        }
    }
}

/// Identity extracted from a validated credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The subject the credential was issued to.
    pub id: SubjectId,

    /// Role claim, immutable for the session's lifetime.
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn new(id: SubjectId, role: Role) -> Self {
        Self { id, role }
    }
}

/// Authentication errors that can occur during credential verification.
///
/// These errors are **domain-centric** - they describe what went wrong
/// from the application's perspective, not the token library's.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    /// No credential was presented.
    #[error("Authentication required")]
    MissingCredential,

    /// The token is malformed, has a bad signature, or carries unusable claims.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired (separate from InvalidToken for specific handling).
    #[error("Token expired")]
    TokenExpired,

    /// The verifier could not be reached or is misconfigured.
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Returns true if this is a transient error that may succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ServiceUnavailable(_))
    }
}
