//! Transient update records produced by publishers.
//!
//! Updates are validated and normalized on construction, so a value of
//! these types is always safe to write through and broadcast.

use crate::domain::foundation::{AuthenticatedUser, BusId, ValidationError};

use super::{BusStatus, Coordinates};

/// Clamps a reported speed to `>= 0`; a missing speed is `0`.
pub fn normalize_speed(speed: Option<f64>) -> f64 {
    match speed {
        Some(s) if s > 0.0 => s,
        _ => 0.0,
    }
}

/// Wraps a reported heading into `[0, 360)`; a missing heading is `0`.
pub fn normalize_heading(heading: Option<f64>) -> f64 {
    let wrapped = heading.unwrap_or(0.0).rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs,
    // and preserves the sign of -0.0.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped + 0.0
    }
}

fn ensure_finite(field: &str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.is_finite() => Err(ValidationError::invalid_format(
            field,
            "must be a finite number",
        )),
        _ => Ok(()),
    }
}

/// A validated GPS report for one bus.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationUpdate {
    pub bus_id: BusId,
    pub coordinates: Coordinates,
    /// Always `>= 0`.
    pub speed: f64,
    /// Always in `[0, 360)`.
    pub heading: f64,
    pub publisher: AuthenticatedUser,
}

impl LocationUpdate {
    /// Validates the raw report and normalizes speed and heading.
    pub fn new(
        bus_id: &str,
        coordinates: &[f64],
        speed: Option<f64>,
        heading: Option<f64>,
        publisher: AuthenticatedUser,
    ) -> Result<Self, ValidationError> {
        let bus_id = BusId::new(bus_id)?;
        let coordinates = Coordinates::from_slice(coordinates)?;
        ensure_finite("speed", speed)?;
        ensure_finite("heading", heading)?;

        Ok(Self {
            bus_id,
            coordinates,
            speed: normalize_speed(speed),
            heading: normalize_heading(heading),
            publisher,
        })
    }
}

/// A validated status change for one bus.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusUpdate {
    pub bus_id: BusId,
    pub status: BusStatus,
    pub publisher: AuthenticatedUser,
}

impl StatusUpdate {
    pub fn new(
        bus_id: &str,
        status: &str,
        publisher: AuthenticatedUser,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            bus_id: BusId::new(bus_id)?,
            status: status.parse()?,
            publisher,
        })
    }
}
