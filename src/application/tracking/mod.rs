//! Real-time tracking: session bookkeeping, connection lifecycle, and
//! update fan-out.

mod commands;
mod lifecycle;
mod registry;
mod router;

pub use commands::{ClientCommand, PublishLocation, PublishStatus};
pub use lifecycle::{Connection, ConnectionLifecycle};
pub use registry::{Inbox, Outbox, Session, SessionRegistry};
pub use router::{BroadcastRouter, DeliveryReport};
