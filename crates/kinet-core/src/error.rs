//! Error types for the Kinet front-end, organized by subsystem:
//! dispatch (cross-rank transport), proxy (per-rank object resolution),
//! and computation (foreach contract).
//!
//! Exclusion of a rank from an active sub-group is deliberately **not**
//! an error: dispatched operations reply
//! [`Outcome::Skipped`](crate::call::Outcome::Skipped) and the controller
//! treats that as a no-op.

use std::error::Error;
use std::fmt;

use crate::computation::Stage;
use crate::id::{ProxyId, Rank, SetId};

// ── DispatchError ───────────────────────────────────────────────

/// Errors from the cross-rank dispatch transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchError {
    /// The session has shut down; no workers remain to dispatch to.
    Shutdown,
    /// A worker's channel disconnected mid-call (thread died or panicked).
    ///
    /// No partial result is returned and no recovery is attempted at this
    /// layer; the caller decides whether to continue with the surviving
    /// ranks.
    WorkerLost {
        /// The rank that vanished.
        rank: Rank,
    },
    /// A scatter was given the wrong number of per-worker payloads.
    ScatterArity {
        /// Worker count of the session.
        expected: usize,
        /// Payloads supplied.
        got: usize,
    },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shutdown => write!(f, "session has shut down"),
            Self::WorkerLost { rank } => write!(f, "worker rank {rank} lost mid-call"),
            Self::ScatterArity { expected, got } => {
                write!(f, "scatter expects {expected} payloads, got {got}")
            }
        }
    }
}

impl Error for DispatchError {}

// ── ProxyError ──────────────────────────────────────────────────

/// Per-rank object resolution failures.
///
/// Both variants are the "uninitialized collaborator" condition: the
/// native object a call targets was never constructed on the executing
/// rank. Accessing it fails loudly rather than returning a stale or
/// default value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProxyError {
    /// No thermostat replica with this ID exists on the rank.
    ThermostatUninitialized {
        /// The unresolved proxy ID.
        proxy: ProxyId,
    },
    /// No partition of this particle set exists on the rank.
    SetUninitialized {
        /// The unresolved set ID.
        set: SetId,
    },
}

impl fmt::Display for ProxyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThermostatUninitialized { proxy } => {
                write!(
                    f,
                    "uninitialized collaborator: thermostat {proxy} has no replica on this rank"
                )
            }
            Self::SetUninitialized { set } => {
                write!(
                    f,
                    "uninitialized collaborator: particle set {set} has no partition on this rank"
                )
            }
        }
    }
}

impl Error for ProxyError {}

// ── ComputationError ────────────────────────────────────────────

/// Violations of the two-stage computation contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComputationError {
    /// A required stage is not implemented (malformed computation).
    ///
    /// Detected before any particle is visited; a computation that fails
    /// this check has zero side effects.
    MissingStage {
        /// The absent stage.
        stage: Stage,
    },
    /// Partials of different kinds cannot be combined.
    MixedAggregates {
        /// Kind of the accumulated value.
        left: &'static str,
        /// Kind of the partial that did not match.
        right: &'static str,
    },
}

impl fmt::Display for ComputationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStage { stage } => {
                write!(f, "malformed computation: missing {stage} stage")
            }
            Self::MixedAggregates { left, right } => {
                write!(f, "cannot combine {left} and {right} aggregates")
            }
        }
    }
}

impl Error for ComputationError {}

// ── ForeachError ────────────────────────────────────────────────

/// Errors from a `foreach` dispatch over a particle set.
#[derive(Clone, Debug, PartialEq)]
pub enum ForeachError {
    /// The supplied computation is malformed or its partials are
    /// inconsistent.
    Computation(ComputationError),
    /// The dispatch transport failed.
    Dispatch(DispatchError),
    /// A rank failed to resolve the target set.
    Rank {
        /// The failing rank.
        rank: Rank,
        /// The per-rank failure.
        source: ProxyError,
    },
}

impl fmt::Display for ForeachError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Computation(e) => write!(f, "foreach: {e}"),
            Self::Dispatch(e) => write!(f, "foreach: {e}"),
            Self::Rank { rank, source } => write!(f, "foreach failed on rank {rank}: {source}"),
        }
    }
}

impl Error for ForeachError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Computation(e) => Some(e),
            Self::Dispatch(e) => Some(e),
            Self::Rank { source, .. } => Some(source),
        }
    }
}

impl From<ComputationError> for ForeachError {
    fn from(e: ComputationError) -> Self {
        Self::Computation(e)
    }
}

impl From<DispatchError> for ForeachError {
    fn from(e: DispatchError) -> Self {
        Self::Dispatch(e)
    }
}
