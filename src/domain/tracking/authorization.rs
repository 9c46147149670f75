//! Publish-rights policy.
//!
//! Reading is unrestricted: any authenticated session may subscribe to any
//! topic. Publishing is gated by role only, and the same rule applies to
//! both update kinds.

use std::fmt;

use crate::domain::foundation::{AuthenticatedUser, Role};

use super::TrackingError;

/// The two kinds of update a publisher can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    Location,
    Status,
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateKind::Location => f.write_str("location"),
            UpdateKind::Status => f.write_str("status"),
        }
    }
}

/// Decides whether an identity may publish updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateAuthorizer;

impl UpdateAuthorizer {
    pub fn new() -> Self {
        Self
    }

    /// Allowed iff the role is `admin` or `driver`.
    pub fn authorize(&self, role: Role, _kind: UpdateKind) -> bool {
        matches!(role, Role::Admin | Role::Driver)
    }

    /// Like [`authorize`](Self::authorize), as a `Result` for `?` chains.
    pub fn ensure_can_publish(
        &self,
        user: &AuthenticatedUser,
        kind: UpdateKind,
    ) -> Result<(), TrackingError> {
        if self.authorize(user.role, kind) {
            Ok(())
        } else {
            tracing::debug!(
                subject_id = %user.id,
                role = %user.role,
                kind = %kind,
                "Publish denied"
            );
            Err(TrackingError::Forbidden(kind))
        }
    }
}
