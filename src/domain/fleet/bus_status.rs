//! Operational status of a bus.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BusStatus {
    Active,
    #[default]
    Inactive,
    Maintenance,
    /// Set automatically whenever a location update is accepted.
    EnRoute,
    Stopped,
}

impl BusStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BusStatus::Active => "active",
            BusStatus::Inactive => "inactive",
            BusStatus::Maintenance => "maintenance",
            BusStatus::EnRoute => "en-route",
            BusStatus::Stopped => "stopped",
        }
    }
}

impl fmt::Display for BusStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BusStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BusStatus::Active),
            "inactive" => Ok(BusStatus::Inactive),
            "maintenance" => Ok(BusStatus::Maintenance),
            "en-route" => Ok(BusStatus::EnRoute),
            "stopped" => Ok(BusStatus::Stopped),
            other => Err(ValidationError::invalid_format(
                "status",
                format!("unknown bus status '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_wire_value() {
        for status in [
            BusStatus::Active,
            BusStatus::Inactive,
            BusStatus::Maintenance,
            BusStatus::EnRoute,
            BusStatus::Stopped,
        ] {
            assert_eq!(status.as_str().parse::<BusStatus>().unwrap(), status);
        }
    }

    #[test]
    fn rejects_unknown_status() {
        assert!("parked".parse::<BusStatus>().is_err());
        assert!("en_route".parse::<BusStatus>().is_err());
    }

    #[test]
    fn serde_matches_display() {
        let json = serde_json::to_string(&BusStatus::EnRoute).unwrap();
        assert_eq!(json, "\"en-route\"");
    }

    #[test]
    fn defaults_to_inactive() {
        assert_eq!(BusStatus::default(), BusStatus::Inactive);
    }
}
