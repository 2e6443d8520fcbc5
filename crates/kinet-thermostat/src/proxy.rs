//! The controller-side thermostat handle.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use kinet_core::axis::Axis;
use kinet_core::call::{CallPayload, CallReply, Outcome};
use kinet_core::error::{DispatchError, ProxyError};
use kinet_core::id::{ProxyId, Rank, SetId};
use kinet_core::thermostat::{ParamError, ParamUpdate, ThermostatParams};
use kinet_core::traits::Dispatcher;

// ── ThermostatError ─────────────────────────────────────────────

/// Errors from controller-side thermostat operations.
#[derive(Clone, Debug, PartialEq)]
pub enum ThermostatError {
    /// A parameter value failed validation; nothing was propagated.
    Param(ParamError),
    /// The kick timestep must be finite and positive.
    InvalidTimestep {
        /// The rejected value.
        value: f64,
    },
    /// The dispatch transport failed.
    Dispatch(DispatchError),
    /// A rank failed to apply the operation.
    ///
    /// Ranks that replied before the failure keep the new value; the
    /// controller mirror is only updated on full success, so re-issuing
    /// the setter converges the replicas. No rollback is attempted.
    PropagationFailed {
        /// The failing rank.
        rank: Rank,
        /// The per-rank failure.
        source: ProxyError,
    },
}

impl fmt::Display for ThermostatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Param(e) => write!(f, "thermostat: {e}"),
            Self::InvalidTimestep { value } => {
                write!(f, "timestep must be finite and positive, got {value}")
            }
            Self::Dispatch(e) => write!(f, "thermostat: {e}"),
            Self::PropagationFailed { rank, source } => {
                write!(f, "thermostat propagation failed on rank {rank}: {source}")
            }
        }
    }
}

impl Error for ThermostatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Param(e) => Some(e),
            Self::Dispatch(e) => Some(e),
            Self::PropagationFailed { source, .. } => Some(source),
            Self::InvalidTimestep { .. } => None,
        }
    }
}

impl From<ParamError> for ThermostatError {
    fn from(e: ParamError) -> Self {
        Self::Param(e)
    }
}

impl From<DispatchError> for ThermostatError {
    fn from(e: DispatchError) -> Self {
        Self::Dispatch(e)
    }
}

// ── Thermostat ──────────────────────────────────────────────────

/// Controller handle for a replicated thermostat.
///
/// Creation broadcasts replica construction to every worker rank;
/// participating ranks build a replica coupled to the target particle
/// set, ranks excluded by an active sub-group skip construction. Each
/// typed setter validates, broadcasts the update, and waits for every
/// rank's acknowledgment before updating the controller mirror and
/// returning — synchronous propagation end-to-end.
///
/// Getters read the mirror without a broadcast;
/// [`replicas()`](Thermostat::replicas) is the diagnostic that reports
/// actual per-rank state.
pub struct Thermostat {
    id: ProxyId,
    set: SetId,
    dispatcher: Arc<dyn Dispatcher>,
    mirror: ThermostatParams,
}

impl Thermostat {
    /// Create a thermostat coupled to `set`, replicated across the
    /// session's participating ranks.
    ///
    /// # Errors
    ///
    /// Fails with [`ThermostatError::Param`] on invalid parameters
    /// (nothing is broadcast), or
    /// [`ThermostatError::PropagationFailed`] if a participating rank
    /// does not hold a partition of `set` — the uninitialized
    /// collaborator condition.
    pub fn create(
        dispatcher: Arc<dyn Dispatcher>,
        set: SetId,
        params: ThermostatParams,
    ) -> Result<Self, ThermostatError> {
        params.validate()?;
        let id = ProxyId::next();
        let replies = dispatcher.broadcast(CallPayload::CreateThermostat {
            proxy: id,
            set,
            params,
        })?;
        Self::check(replies)?;
        Ok(Self {
            id,
            set,
            dispatcher,
            mirror: params,
        })
    }

    /// The replicated object's identity.
    pub fn id(&self) -> ProxyId {
        self.id
    }

    /// The particle set this thermostat couples to.
    pub fn set(&self) -> SetId {
        self.set
    }

    /// Friction coefficient (controller mirror).
    pub fn friction(&self) -> f64 {
        self.mirror.friction
    }

    /// Target temperature (controller mirror).
    pub fn temperature(&self) -> f64 {
        self.mirror.temperature
    }

    /// Whether region-restricted coupling is enabled (controller mirror).
    pub fn coupling_region(&self) -> bool {
        self.mirror.coupling_region
    }

    /// Direction selector (controller mirror).
    pub fn direction(&self) -> Axis {
        self.mirror.direction
    }

    /// Set the friction coefficient on every replica.
    pub fn set_friction(&mut self, value: f64) -> Result<(), ThermostatError> {
        self.propagate(ParamUpdate::Friction(value))
    }

    /// Set the target temperature on every replica.
    pub fn set_temperature(&mut self, value: f64) -> Result<(), ThermostatError> {
        self.propagate(ParamUpdate::Temperature(value))
    }

    /// Enable or disable region-restricted coupling on every replica.
    pub fn set_coupling_region(&mut self, enabled: bool) -> Result<(), ThermostatError> {
        self.propagate(ParamUpdate::CouplingRegion(enabled))
    }

    /// Set the direction selector on every replica.
    pub fn set_direction(&mut self, direction: Axis) -> Result<(), ThermostatError> {
        self.propagate(ParamUpdate::Direction(direction))
    }

    /// Apply one thermostat velocity update to the coupled set.
    ///
    /// Participating ranks kick their resident partition; excluded ranks
    /// skip. Blocks until every rank has finished its share.
    pub fn kick(&mut self, dt: f64) -> Result<(), ThermostatError> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ThermostatError::InvalidTimestep { value: dt });
        }
        let replies = self.dispatcher.broadcast(CallPayload::ThermalKick {
            proxy: self.id,
            dt,
        })?;
        Self::check(replies)
    }

    /// Report each rank's replica parameters (`None` for ranks excluded
    /// from the active sub-group).
    pub fn replicas(&self) -> Result<Vec<(Rank, Option<ThermostatParams>)>, ThermostatError> {
        let replies = self
            .dispatcher
            .broadcast(CallPayload::ProbeThermostat { proxy: self.id })?;
        let mut out = Vec::with_capacity(replies.len());
        for reply in replies {
            match reply.outcome {
                Outcome::Replica(params) => out.push((reply.rank, params)),
                Outcome::Skipped => out.push((reply.rank, None)),
                Outcome::Failed(source) => {
                    return Err(ThermostatError::PropagationFailed {
                        rank: reply.rank,
                        source,
                    })
                }
                _ => {}
            }
        }
        Ok(out)
    }

    /// Validate, broadcast, await every acknowledgment, then update the
    /// mirror. The caller never observes disagreeing replicas on success.
    fn propagate(&mut self, update: ParamUpdate) -> Result<(), ThermostatError> {
        update.validate()?;
        let replies = self.dispatcher.broadcast(CallPayload::SetThermostatParam {
            proxy: self.id,
            update,
        })?;
        Self::check(replies)?;
        self.mirror.apply(update);
        Ok(())
    }

    /// Surface the first per-rank failure, treating `Skipped` as the
    /// deliberate no-op it is.
    fn check(replies: Vec<CallReply>) -> Result<(), ThermostatError> {
        for reply in replies {
            if let Outcome::Failed(source) = reply.outcome {
                return Err(ThermostatError::PropagationFailed {
                    rank: reply.rank,
                    source,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Thermostat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thermostat")
            .field("id", &self.id)
            .field("set", &self.set)
            .field("mirror", &self.mirror)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinet_test_utils::MockDispatcher;

    fn new_thermostat(dispatcher: Arc<MockDispatcher>) -> Thermostat {
        Thermostat::create(dispatcher, SetId::next(), ThermostatParams::default()).unwrap()
    }

    #[test]
    fn setters_update_the_mirror_after_full_acknowledgment() {
        let dispatcher = Arc::new(MockDispatcher::applying(2));
        let mut thermostat = new_thermostat(dispatcher.clone());

        thermostat.set_friction(0.25).unwrap();
        thermostat.set_direction(Axis::Y).unwrap();
        assert_eq!(thermostat.friction(), 0.25);
        assert_eq!(thermostat.direction(), Axis::Y);
        // create (2 ranks) + two setters (2 ranks each)
        assert_eq!(dispatcher.call_count(), 6);
    }

    #[test]
    fn invalid_values_are_rejected_before_any_broadcast() {
        let dispatcher = Arc::new(MockDispatcher::applying(2));
        let mut thermostat = new_thermostat(dispatcher.clone());
        let dispatched_before = dispatcher.call_count();

        assert!(matches!(
            thermostat.set_friction(-1.0),
            Err(ThermostatError::Param(ParamError::InvalidFriction { .. }))
        ));
        assert!(matches!(
            thermostat.set_temperature(f64::NAN),
            Err(ThermostatError::Param(ParamError::InvalidTemperature { .. }))
        ));
        assert_eq!(
            dispatcher.call_count(),
            dispatched_before,
            "no propagation occurred"
        );
        assert_eq!(thermostat.friction(), 1.0, "mirror untouched");
    }

    #[test]
    fn a_failing_rank_surfaces_and_leaves_the_mirror_unchanged() {
        let dispatcher = Arc::new(MockDispatcher::with_handler(3, |rank, call| {
            match (rank, call) {
                (Rank(2), CallPayload::SetThermostatParam { proxy, .. }) => {
                    Outcome::Failed(ProxyError::ThermostatUninitialized { proxy })
                }
                _ => Outcome::Applied,
            }
        }));
        let mut thermostat = new_thermostat(dispatcher);

        let err = thermostat.set_temperature(3.0).unwrap_err();
        assert!(matches!(
            err,
            ThermostatError::PropagationFailed {
                rank: Rank(2),
                source: ProxyError::ThermostatUninitialized { .. },
            }
        ));
        assert_eq!(thermostat.temperature(), 1.0, "mirror only moves on full success");
    }

    #[test]
    fn skipped_ranks_do_not_fail_propagation() {
        let dispatcher = Arc::new(MockDispatcher::with_handler(2, |rank, _| {
            if rank == Rank(2) {
                Outcome::Skipped
            } else {
                Outcome::Applied
            }
        }));
        let mut thermostat = new_thermostat(dispatcher);
        thermostat.set_friction(0.5).unwrap();
        assert_eq!(thermostat.friction(), 0.5);
    }

    #[test]
    fn kick_rejects_bad_timesteps() {
        let dispatcher = Arc::new(MockDispatcher::applying(1));
        let mut thermostat = new_thermostat(dispatcher);
        assert!(matches!(
            thermostat.kick(0.0),
            Err(ThermostatError::InvalidTimestep { .. })
        ));
        assert!(matches!(
            thermostat.kick(f64::NAN),
            Err(ThermostatError::InvalidTimestep { .. })
        ));
        thermostat.kick(0.01).unwrap();
    }

    #[test]
    fn replicas_reports_per_rank_state() {
        let dispatcher = Arc::new(MockDispatcher::with_handler(2, |rank, call| {
            match (rank, call) {
                (Rank(1), CallPayload::ProbeThermostat { .. }) => {
                    Outcome::Replica(Some(ThermostatParams::default()))
                }
                (Rank(2), CallPayload::ProbeThermostat { .. }) => Outcome::Replica(None),
                _ => Outcome::Applied,
            }
        }));
        let thermostat = new_thermostat(dispatcher);
        let replicas = thermostat.replicas().unwrap();
        assert_eq!(replicas.len(), 2);
        assert!(replicas[0].1.is_some());
        assert!(replicas[1].1.is_none());
    }
}
