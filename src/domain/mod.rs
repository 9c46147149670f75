//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, roles, errors)
//! - `fleet` - Bus state and the updates that change it
//! - `tracking` - Topics, publish policy, and events delivered to sessions

pub mod fleet;
pub mod foundation;
pub mod tracking;
