//! Worker rank thread: request loop and per-rank engine state.
//!
//! Each worker thread owns its [`RankEngine`] exclusively (moved in via
//! `thread::spawn`) — particle partitions and thermostat replicas never
//! cross rank boundaries. The loop blocks on the request channel between
//! dispatched calls and exits when the controller drops its senders.

use crossbeam_channel::{Receiver, Sender};
use indexmap::IndexMap;

use kinet_core::call::{CallPayload, CallReply, ComputationPayload, Outcome};
use kinet_core::error::ProxyError;
use kinet_core::group::WorkerGroup;
use kinet_core::id::{ProxyId, Rank, SetId};
use kinet_core::role::Role;
use kinet_core::thermostat::ThermostatParams;
use kinet_particles::ParticleStore;
use kinet_thermostat::ThermostatReplica;

/// A dispatched call paired with its reply channel.
pub(crate) struct WorkerRequest {
    pub call: CallPayload,
    pub reply: Sender<CallReply>,
}

/// One rank's engine state: the native collaborator the proxies bind to.
///
/// Thermostat entries are `Option`: `Some` on ranks that constructed the
/// replica, `None` on ranks excluded by an active sub-group at creation
/// time. An ID absent from the map was never created anywhere — accessing
/// it is the uninitialized-collaborator error, while a `None` entry is
/// the deliberate exclusion no-op.
pub(crate) struct RankEngine {
    seed: u64,
    replicas_created: u64,
    stores: IndexMap<SetId, ParticleStore>,
    thermostats: IndexMap<ProxyId, Option<ThermostatReplica>>,
}

impl RankEngine {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            replicas_created: 0,
            stores: IndexMap::new(),
            thermostats: IndexMap::new(),
        }
    }

    /// Access-site check for worker-local replica reads: excluded ranks
    /// fail loudly instead of yielding a stale or default value.
    #[cfg(test)]
    pub fn thermostat(&self, proxy: ProxyId) -> Result<&ThermostatReplica, ProxyError> {
        match self.thermostats.get(&proxy) {
            Some(Some(replica)) => Ok(replica),
            Some(None) | None => Err(ProxyError::ThermostatUninitialized { proxy }),
        }
    }
}

/// State held by one worker thread's request loop.
pub(crate) struct WorkerState {
    rank: Rank,
    group: WorkerGroup,
    engine: RankEngine,
    requests: Receiver<WorkerRequest>,
}

impl WorkerState {
    /// Build the state for one rank. The role is injected explicitly and
    /// must be [`Role::Worker`] — the controller never runs this loop.
    pub fn new(
        rank: Rank,
        role: Role,
        group: WorkerGroup,
        seed: u64,
        requests: Receiver<WorkerRequest>,
    ) -> Self {
        debug_assert!(!role.is_controller(), "worker loop spawned with {role} role");
        Self {
            rank,
            group,
            engine: RankEngine::new(seed),
            requests,
        }
    }

    /// Request loop. Blocks between calls; exits when every sender is
    /// dropped (session shutdown).
    pub fn run(mut self) {
        while let Ok(request) = self.requests.recv() {
            let outcome = self.handle(request.call);
            // The controller may have vanished mid-call; nothing to do.
            let _ = request.reply.send(CallReply {
                rank: self.rank,
                outcome,
            });
        }
    }

    /// Execute one dispatched call against this rank's engine state.
    fn handle(&mut self, call: CallPayload) -> Outcome {
        match call {
            CallPayload::CreateSet { set, particles } => {
                self.engine
                    .stores
                    .insert(set, ParticleStore::from_particles(particles));
                Outcome::Applied
            }
            CallPayload::CreateThermostat { proxy, set, params } => {
                self.create_thermostat(proxy, set, params)
            }
            CallPayload::SetThermostatParam { proxy, update } => {
                match self.engine.thermostats.get_mut(&proxy) {
                    None => Outcome::Failed(ProxyError::ThermostatUninitialized { proxy }),
                    Some(None) => Outcome::Skipped,
                    Some(Some(replica)) => {
                        replica.apply(update);
                        Outcome::Applied
                    }
                }
            }
            CallPayload::ProbeThermostat { proxy } => match self.engine.thermostats.get(&proxy) {
                None => Outcome::Failed(ProxyError::ThermostatUninitialized { proxy }),
                Some(None) => Outcome::Replica(None),
                Some(Some(replica)) => Outcome::Replica(Some(replica.params())),
            },
            CallPayload::ThermalKick { proxy, dt } => {
                match self.engine.thermostats.get_mut(&proxy) {
                    None => Outcome::Failed(ProxyError::ThermostatUninitialized { proxy }),
                    Some(None) => Outcome::Skipped,
                    Some(Some(replica)) => match self.engine.stores.get_mut(&replica.set()) {
                        None => Outcome::Failed(ProxyError::SetUninitialized {
                            set: replica.set(),
                        }),
                        Some(store) => {
                            replica.kick(store, dt);
                            Outcome::Applied
                        }
                    },
                }
            }
            CallPayload::Foreach { set, computation } => match self.engine.stores.get(&set) {
                None => Outcome::Failed(ProxyError::SetUninitialized { set }),
                Some(store) => match computation {
                    ComputationPayload::Native(kind) => Outcome::Collected(store.run_native(kind)),
                    ComputationPayload::User(mut computation) => {
                        Outcome::Collected(store.run_user(computation.as_mut()))
                    }
                },
            },
        }
    }

    fn create_thermostat(
        &mut self,
        proxy: ProxyId,
        set: SetId,
        params: ThermostatParams,
    ) -> Outcome {
        if !self.group.participates(self.rank) {
            // Excluded from the active sub-group: record the exclusion so
            // later access fails as uninitialized rather than unknown.
            self.engine.thermostats.insert(proxy, None);
            return Outcome::Skipped;
        }
        if !self.engine.stores.contains_key(&set) {
            return Outcome::Failed(ProxyError::SetUninitialized { set });
        }
        let seed = self.engine.seed.wrapping_add(self.engine.replicas_created);
        self.engine.replicas_created += 1;
        self.engine
            .thermostats
            .insert(proxy, Some(ThermostatReplica::new(set, params, seed)));
        Outcome::Applied
    }
}
