//! Spatial axis selector for direction-restricted operations.

use std::fmt;
use std::str::FromStr;

/// Selects which spatial components an operation touches.
///
/// A thermostat configured with `Axis::X` perturbs only the x velocity
/// component (the 1D-thermostat behavior); `Axis::All` touches every
/// component.
///
/// `Axis` is a closed enum, so an out-of-range direction is representable
/// only at the parse boundary — [`FromStr`] and [`Axis::from_index`] are
/// the validation points and fail with [`AxisParseError`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The x component only.
    X,
    /// The y component only.
    Y,
    /// The z component only.
    Z,
    /// All three components.
    #[default]
    All,
}

impl Axis {
    /// The component index this axis selects, or `None` for [`Axis::All`].
    pub fn component(&self) -> Option<usize> {
        match self {
            Axis::X => Some(0),
            Axis::Y => Some(1),
            Axis::Z => Some(2),
            Axis::All => None,
        }
    }

    /// Whether this axis selects the given component index.
    pub fn selects(&self, component: usize) -> bool {
        match self.component() {
            Some(c) => c == component,
            None => component < 3,
        }
    }

    /// Build an axis from a component index: 0 = x, 1 = y, 2 = z.
    ///
    /// # Errors
    ///
    /// Returns [`AxisParseError`] for indices outside `0..=2`.
    pub fn from_index(index: usize) -> Result<Self, AxisParseError> {
        match index {
            0 => Ok(Axis::X),
            1 => Ok(Axis::Y),
            2 => Ok(Axis::Z),
            _ => Err(AxisParseError {
                input: index.to_string(),
            }),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
            Axis::All => write!(f, "all"),
        }
    }
}

impl FromStr for Axis {
    type Err = AxisParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x" | "X" => Ok(Axis::X),
            "y" | "Y" => Ok(Axis::Y),
            "z" | "Z" => Ok(Axis::Z),
            "all" | "ALL" => Ok(Axis::All),
            other => Err(AxisParseError {
                input: other.to_string(),
            }),
        }
    }
}

/// The input named no valid spatial axis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AxisParseError {
    /// The rejected input.
    pub input: String,
}

impl fmt::Display for AxisParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a spatial axis (x, y, z, all)", self.input)
    }
}

impl std::error::Error for AxisParseError {}
