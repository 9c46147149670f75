//! Broadcast topics a session can join.

use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{BusId, ValidationError};

const ALL_BUSES: &str = "all-buses";
const BUS_PREFIX: &str = "bus:";

/// A named broadcast channel: one bus, or the global feed.
///
/// Topics are derived, never persisted. The string form (`bus:<id>`,
/// `all-buses`) is only used for logging and monitoring.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    Bus(BusId),
    AllBuses,
}

impl Topic {
    pub fn bus(bus_id: BusId) -> Self {
        Topic::Bus(bus_id)
    }

    /// The topics whose subscribers receive an update for `bus_id`.
    pub fn audience_of(bus_id: &BusId) -> [Topic; 2] {
        [Topic::Bus(bus_id.clone()), Topic::AllBuses]
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Bus(id) => write!(f, "{}{}", BUS_PREFIX, id),
            Topic::AllBuses => f.write_str(ALL_BUSES),
        }
    }
}

impl FromStr for Topic {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == ALL_BUSES {
            return Ok(Topic::AllBuses);
        }
        match s.strip_prefix(BUS_PREFIX) {
            Some(id) => Ok(Topic::Bus(BusId::new(id)?)),
            None => Err(ValidationError::invalid_format(
                "topic",
                format!("expected 'bus:<id>' or 'all-buses', got '{}'", s),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_wire_names() {
        let bus = Topic::bus(BusId::new("B1").unwrap());
        assert_eq!(bus.to_string(), "bus:B1");
        assert_eq!(Topic::AllBuses.to_string(), "all-buses");
    }

    #[test]
    fn parses_wire_names() {
        assert_eq!("all-buses".parse::<Topic>().unwrap(), Topic::AllBuses);
        assert_eq!(
            "bus:B7".parse::<Topic>().unwrap(),
            Topic::Bus(BusId::new("B7").unwrap())
        );
    }

    #[test]
    fn rejects_unknown_or_empty_topics() {
        assert!("bus:".parse::<Topic>().is_err());
        assert!("route:R1".parse::<Topic>().is_err());
    }

    #[test]
    fn audience_covers_bus_and_global_feed() {
        let id = BusId::new("B1").unwrap();
        let audience = Topic::audience_of(&id);
        assert!(audience.contains(&Topic::Bus(id)));
        assert!(audience.contains(&Topic::AllBuses));
    }
}
