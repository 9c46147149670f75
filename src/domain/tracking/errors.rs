//! Rejections of a single client request.
//!
//! Every variant is local to the session that triggered it: it is reported
//! back to that session and never touches other sessions' state.

use thiserror::Error;

use crate::domain::foundation::{BusId, ErrorCode, SessionId, ValidationError};

use super::UpdateKind;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackingError {
    /// The session's role may not publish updates.
    #[error("Not authorized to update {0}")]
    Forbidden(UpdateKind),

    /// Malformed coordinates, status, or identifiers.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The fleet store has no record of this bus.
    #[error("Bus not found: {0}")]
    BusNotFound(BusId),

    /// The current-state write failed; nothing was broadcast.
    #[error("Failed to update {kind}: {reason}")]
    Store { kind: UpdateKind, reason: String },

    /// The session was disconnected before the request was handled.
    #[error("Session not found: {0}")]
    SessionGone(SessionId),
}

impl TrackingError {
    pub fn store(kind: UpdateKind, reason: impl Into<String>) -> Self {
        Self::Store {
            kind,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            TrackingError::Forbidden(_) => ErrorCode::Forbidden,
            TrackingError::Validation(_) => ErrorCode::ValidationFailed,
            TrackingError::BusNotFound(_) => ErrorCode::BusNotFound,
            TrackingError::Store { .. } => ErrorCode::DatabaseError,
            TrackingError::SessionGone(_) => ErrorCode::SessionNotFound,
        }
    }

    /// Message safe to show the client. Store internals are not exposed.
    pub fn client_message(&self) -> String {
        match self {
            TrackingError::BusNotFound(_) => "Bus not found".to_string(),
            TrackingError::Store { kind, .. } => format!("Failed to update {}", kind),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_taxonomy() {
        let bus = BusId::new("B1").unwrap();
        assert_eq!(
            TrackingError::Forbidden(UpdateKind::Location).code(),
            ErrorCode::Forbidden
        );
        assert_eq!(
            TrackingError::from(ValidationError::empty_field("busId")).code(),
            ErrorCode::ValidationFailed
        );
        assert_eq!(TrackingError::BusNotFound(bus).code(), ErrorCode::BusNotFound);
        assert_eq!(
            TrackingError::store(UpdateKind::Status, "pool timed out").code(),
            ErrorCode::DatabaseError
        );
    }

    #[test]
    fn client_message_hides_store_details() {
        let err = TrackingError::store(UpdateKind::Location, "connection reset by peer");
        assert_eq!(err.client_message(), "Failed to update location");
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn client_message_for_forbidden_names_the_kind() {
        assert_eq!(
            TrackingError::Forbidden(UpdateKind::Location).client_message(),
            "Not authorized to update location"
        );
    }
}
