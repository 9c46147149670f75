//! Fleet module - bus state and the updates that change it.

mod bus_status;
mod coordinates;
mod state;
mod update;

pub use bus_status::BusStatus;
pub use coordinates::Coordinates;
pub use state::{BusCurrentState, CurrentStateWrite, LocationRecord};
pub use update::{normalize_heading, normalize_speed, LocationUpdate, StatusUpdate};
