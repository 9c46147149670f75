//! Foundation module - Shared domain primitives.
//!
//! Identifiers, roles and error types that form the vocabulary of the
//! tracking domain.

mod auth;
mod errors;
mod ids;
mod timestamp;

pub use auth::{AuthError, AuthenticatedUser, Role};
pub use errors::{ErrorCode, ValidationError};
pub use ids::{BusId, SessionId, SubjectId};
pub use timestamp::Timestamp;
