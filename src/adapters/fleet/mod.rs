//! Fleet store adapters.
//!
//! - `InMemoryFleetStore` - process-local store, used when no database is configured
//! - `PostgresFleetStore` - `buses` and `bus_locations` tables via sqlx

mod in_memory;
mod postgres;

pub use in_memory::InMemoryFleetStore;
pub use postgres::PostgresFleetStore;
