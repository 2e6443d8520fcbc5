//! The controller/worker role model.

use std::fmt;

/// The role a process rank plays within a session.
///
/// Exactly one rank per session is the [`Controller`](Role::Controller);
/// it originates dispatch calls and collects final results. Every other
/// rank is a [`Worker`](Role::Worker) holding a partition of the
/// simulation state and executing dispatched operations locally.
///
/// The role is passed explicitly into every component at construction —
/// there is no ambient process-wide role flag to consult.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Originates dispatch calls and collects final results.
    Controller,
    /// Holds a state partition and executes dispatched operations.
    Worker,
}

impl Role {
    /// Whether this is the controller role.
    pub fn is_controller(&self) -> bool {
        matches!(self, Role::Controller)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Controller => write!(f, "controller"),
            Role::Worker => write!(f, "worker"),
        }
    }
}
