//! Authentication adapters.
//!
//! Implementations of the `IdentityVerifier` port:
//!
//! - `jwt` - HS256 tokens issued by the account service
//! - `mock` - Test implementation that maps opaque tokens to identities

mod jwt;
mod mock;

pub use jwt::JwtIdentityVerifier;
pub use mock::MockIdentityVerifier;
