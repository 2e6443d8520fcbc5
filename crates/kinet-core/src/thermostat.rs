//! Replicated thermostat configuration: parameters, updates, validation.

use std::fmt;

use crate::axis::Axis;

/// Thermostat configuration, replicated across participating ranks.
///
/// One logical object exists per thermostat; each participating rank holds
/// a replica and the controller holds a mirror. Controller-initiated
/// writes are the only legal source of change — workers never originate
/// configuration mutations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThermostatParams {
    /// Friction coefficient. Finite, `>= 0`.
    pub friction: f64,
    /// Target temperature. Finite, `>= 0`.
    pub temperature: f64,
    /// Whether coupling is restricted to the adaptive-resolution region.
    pub coupling_region: bool,
    /// Which velocity components the thermostat touches.
    pub direction: Axis,
}

impl Default for ThermostatParams {
    fn default() -> Self {
        Self {
            friction: 1.0,
            temperature: 1.0,
            coupling_region: false,
            direction: Axis::All,
        }
    }
}

impl ThermostatParams {
    /// Check every field against its domain.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] for a negative or non-finite friction or
    /// temperature. `direction` is a closed enum and needs no check here.
    pub fn validate(&self) -> Result<(), ParamError> {
        validate_friction(self.friction)?;
        validate_temperature(self.temperature)?;
        Ok(())
    }

    /// Apply a single-field update in place.
    ///
    /// The value is assumed validated; replicas apply exactly what the
    /// controller broadcast.
    pub fn apply(&mut self, update: ParamUpdate) {
        match update {
            ParamUpdate::Friction(v) => self.friction = v,
            ParamUpdate::Temperature(v) => self.temperature = v,
            ParamUpdate::CouplingRegion(v) => self.coupling_region = v,
            ParamUpdate::Direction(axis) => self.direction = axis,
        }
    }
}

/// A single-field thermostat parameter update, broadcast from the
/// controller to every replica.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamUpdate {
    /// Set the friction coefficient.
    Friction(f64),
    /// Set the target temperature.
    Temperature(f64),
    /// Enable or disable region-restricted coupling.
    CouplingRegion(bool),
    /// Set the direction selector.
    Direction(Axis),
}

impl ParamUpdate {
    /// Validate the carried value against its field's domain.
    pub fn validate(&self) -> Result<(), ParamError> {
        match self {
            ParamUpdate::Friction(v) => validate_friction(*v),
            ParamUpdate::Temperature(v) => validate_temperature(*v),
            ParamUpdate::CouplingRegion(_) | ParamUpdate::Direction(_) => Ok(()),
        }
    }
}

fn validate_friction(value: f64) -> Result<(), ParamError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ParamError::InvalidFriction { value });
    }
    Ok(())
}

fn validate_temperature(value: f64) -> Result<(), ParamError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ParamError::InvalidTemperature { value });
    }
    Ok(())
}

/// A thermostat parameter value outside its domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamError {
    /// Friction must be finite and `>= 0`.
    InvalidFriction {
        /// The rejected value.
        value: f64,
    },
    /// Temperature must be finite and `>= 0`.
    InvalidTemperature {
        /// The rejected value.
        value: f64,
    },
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFriction { value } => {
                write!(f, "friction must be finite and >= 0, got {value}")
            }
            Self::InvalidTemperature { value } => {
                write!(f, "temperature must be finite and >= 0, got {value}")
            }
        }
    }
}

impl std::error::Error for ParamError {}
