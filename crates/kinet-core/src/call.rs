//! The broadcastable call surface: payloads dispatched from the
//! controller to worker ranks, and per-rank replies.

use std::fmt;

use crate::computation::{Aggregate, NativeComputation, ParticleComputation};
use crate::error::ProxyError;
use crate::id::{ProxyId, Rank, SetId};
use crate::particle::Particle;
use crate::thermostat::{ParamUpdate, ThermostatParams};

/// A method call dispatched to worker ranks.
///
/// The controller builds one payload per worker via
/// [`replicate()`](CallPayload::replicate) (broadcast) or supplies one
/// payload per rank directly (scatter, used for partition loading where
/// each rank receives different particles).
pub enum CallPayload {
    /// Install this rank's partition of a new particle set.
    CreateSet {
        /// The set being created.
        set: SetId,
        /// The particles resident on the receiving rank.
        particles: Vec<Particle>,
    },
    /// Construct a thermostat replica bound to `set`.
    ///
    /// Ranks excluded by an active sub-group skip construction and reply
    /// [`Outcome::Skipped`].
    CreateThermostat {
        /// Identity of the replicated object.
        proxy: ProxyId,
        /// The particle set the thermostat couples to.
        set: SetId,
        /// Initial parameters, validated on the controller.
        params: ThermostatParams,
    },
    /// Apply a single parameter update to the replica.
    SetThermostatParam {
        /// Target replicated object.
        proxy: ProxyId,
        /// The update, validated on the controller.
        update: ParamUpdate,
    },
    /// Report the replica parameters held on this rank.
    ProbeThermostat {
        /// Target replicated object.
        proxy: ProxyId,
    },
    /// Apply one thermostat velocity update to the resident partition.
    ThermalKick {
        /// Target replicated object.
        proxy: ProxyId,
        /// Timestep of the update.
        dt: f64,
    },
    /// Visit every resident particle of `set` and collect a partial.
    Foreach {
        /// The target set.
        set: SetId,
        /// The computation to run, in either variant.
        computation: ComputationPayload,
    },
}

impl CallPayload {
    /// Per-worker copy for a broadcast.
    ///
    /// User computations are forked (fresh accumulator state per rank)
    /// rather than cloned; everything else is a plain copy. The caller's
    /// prototype stays on the controller for the reduce step.
    pub fn replicate(&self) -> CallPayload {
        match self {
            Self::CreateSet { set, particles } => Self::CreateSet {
                set: *set,
                particles: particles.clone(),
            },
            Self::CreateThermostat { proxy, set, params } => Self::CreateThermostat {
                proxy: *proxy,
                set: *set,
                params: *params,
            },
            Self::SetThermostatParam { proxy, update } => Self::SetThermostatParam {
                proxy: *proxy,
                update: *update,
            },
            Self::ProbeThermostat { proxy } => Self::ProbeThermostat { proxy: *proxy },
            Self::ThermalKick { proxy, dt } => Self::ThermalKick {
                proxy: *proxy,
                dt: *dt,
            },
            Self::Foreach { set, computation } => Self::Foreach {
                set: *set,
                computation: computation.replicate(),
            },
        }
    }
}

impl fmt::Debug for CallPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateSet { set, particles } => f
                .debug_struct("CreateSet")
                .field("set", set)
                .field("particles", &particles.len())
                .finish(),
            Self::CreateThermostat { proxy, set, params } => f
                .debug_struct("CreateThermostat")
                .field("proxy", proxy)
                .field("set", set)
                .field("params", params)
                .finish(),
            Self::SetThermostatParam { proxy, update } => f
                .debug_struct("SetThermostatParam")
                .field("proxy", proxy)
                .field("update", update)
                .finish(),
            Self::ProbeThermostat { proxy } => f
                .debug_struct("ProbeThermostat")
                .field("proxy", proxy)
                .finish(),
            Self::ThermalKick { proxy, dt } => f
                .debug_struct("ThermalKick")
                .field("proxy", proxy)
                .field("dt", dt)
                .finish(),
            Self::Foreach { set, computation } => f
                .debug_struct("Foreach")
                .field("set", set)
                .field("computation", computation)
                .finish(),
        }
    }
}

/// The computation carried by a foreach call: engine-internal or
/// front-end-defined.
///
/// This tag is the dispatch branch of the proxy layer: native kinds run
/// inside the engine with no per-particle callback; user computations are
/// driven through the [`ParticleComputation`] trait object.
pub enum ComputationPayload {
    /// Engine-implemented kind.
    Native(NativeComputation),
    /// Front-end-defined computation.
    User(Box<dyn ParticleComputation>),
}

impl ComputationPayload {
    /// Per-worker copy: native kinds copy, user computations fork.
    pub fn replicate(&self) -> ComputationPayload {
        match self {
            Self::Native(kind) => Self::Native(*kind),
            Self::User(computation) => Self::User(computation.fork()),
        }
    }

    /// Name for error reporting and metrics.
    pub fn name(&self) -> &str {
        match self {
            Self::Native(kind) => kind.name(),
            Self::User(computation) => computation.name(),
        }
    }
}

impl fmt::Debug for ComputationPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native(kind) => write!(f, "Native({})", kind.name()),
            Self::User(computation) => write!(f, "User({})", computation.name()),
        }
    }
}

/// Reply from one rank to one dispatched call.
#[derive(Clone, Debug, PartialEq)]
pub struct CallReply {
    /// The replying rank.
    pub rank: Rank,
    /// What happened on that rank.
    pub outcome: Outcome,
}

/// Per-rank outcome of a dispatched call.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The call was applied on this rank.
    Applied,
    /// The rank is excluded from the active group; deliberate no-op.
    Skipped,
    /// Per-rank partial from a foreach call. Never a final result — the
    /// controller consumes it in the reduce step.
    Collected(Aggregate),
    /// Replica parameters reported by a probe (`None` when the rank
    /// holds no replica).
    Replica(Option<ThermostatParams>),
    /// The call failed on this rank.
    Failed(ProxyError),
}
