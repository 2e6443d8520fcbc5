//! Controller-side handle for a distributed particle set.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use kinet_core::call::{CallPayload, CallReply, ComputationPayload, Outcome};
use kinet_core::computation::Aggregate;
use kinet_core::error::{ComputationError, DispatchError, ForeachError, ProxyError};
use kinet_core::id::{Rank, SetId};
use kinet_core::particle::Particle;
use kinet_core::traits::Dispatcher;

/// Errors from distributing a particle set across worker ranks.
#[derive(Clone, Debug, PartialEq)]
pub enum SetError {
    /// The dispatch transport failed.
    Dispatch(DispatchError),
    /// A rank rejected its partition.
    Rank {
        /// The failing rank.
        rank: Rank,
        /// The per-rank failure.
        source: ProxyError,
    },
    /// An explicit partitioning did not supply one partition per worker.
    PartitionCount {
        /// Worker count of the session.
        expected: usize,
        /// Partitions supplied.
        got: usize,
    },
}

impl fmt::Display for SetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispatch(e) => write!(f, "set distribution: {e}"),
            Self::Rank { rank, source } => {
                write!(f, "set distribution failed on rank {rank}: {source}")
            }
            Self::PartitionCount { expected, got } => {
                write!(f, "expected {expected} partitions, got {got}")
            }
        }
    }
}

impl Error for SetError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Dispatch(e) => Some(e),
            Self::Rank { source, .. } => Some(source),
            Self::PartitionCount { .. } => None,
        }
    }
}

impl From<DispatchError> for SetError {
    fn from(e: DispatchError) -> Self {
        Self::Dispatch(e)
    }
}

/// A distributed particle set, addressed from the controller.
///
/// The set's particles are partitioned across worker ranks — each rank
/// owns its resident subset and the controller holds none. The handle
/// exposes the iteration contract: [`foreach`](ParticleSet::foreach)
/// dispatches a computation to every rank, and only this controller-side
/// call returns the reduced result.
pub struct ParticleSet {
    id: SetId,
    dispatcher: Arc<dyn Dispatcher>,
    total: usize,
}

impl ParticleSet {
    /// Distribute `particles` across the session's workers round-robin
    /// and return the controller handle.
    pub fn distribute(
        dispatcher: Arc<dyn Dispatcher>,
        particles: Vec<Particle>,
    ) -> Result<Self, SetError> {
        let workers = dispatcher.group().worker_count();
        let mut partitions: Vec<Vec<Particle>> = (0..workers).map(|_| Vec::new()).collect();
        for (i, particle) in particles.into_iter().enumerate() {
            partitions[i % workers].push(particle);
        }
        Self::distribute_partitioned(dispatcher, partitions)
    }

    /// Distribute an explicit partitioning: partition `i` lands on rank
    /// `i + 1`. Requires exactly one partition per worker.
    pub fn distribute_partitioned(
        dispatcher: Arc<dyn Dispatcher>,
        partitions: Vec<Vec<Particle>>,
    ) -> Result<Self, SetError> {
        let workers = dispatcher.group().worker_count();
        if partitions.len() != workers {
            return Err(SetError::PartitionCount {
                expected: workers,
                got: partitions.len(),
            });
        }

        let id = SetId::next();
        let total = partitions.iter().map(Vec::len).sum();
        let calls = partitions
            .into_iter()
            .map(|particles| CallPayload::CreateSet { set: id, particles })
            .collect();

        let replies = dispatcher.scatter(calls)?;
        for reply in replies {
            if let Outcome::Failed(source) = reply.outcome {
                return Err(SetError::Rank {
                    rank: reply.rank,
                    source,
                });
            }
        }

        Ok(Self {
            id,
            dispatcher,
            total,
        })
    }

    /// The set's identity.
    pub fn id(&self) -> SetId {
        self.id
    }

    /// Total particle count across all ranks, recorded at distribution.
    pub fn len(&self) -> usize {
        self.total
    }

    /// Whether the set was distributed empty.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Apply a computation to every particle in the set and return the
    /// reduced result.
    ///
    /// Every rank visits each of its resident particles exactly once, in
    /// unspecified order, then collects a partial; the partials are
    /// combined here by the computation's own reduce step. The variant
    /// tag picks the call path: native kinds execute entirely inside the
    /// engine, user computations are driven through the per-particle
    /// callback. The computation is consumed — its lifetime is this call.
    ///
    /// # Errors
    ///
    /// A user computation with a missing stage fails with
    /// [`ForeachError::Computation`] before any particle is visited.
    /// Transport failures and per-rank failures surface as
    /// [`ForeachError::Dispatch`] and [`ForeachError::Rank`].
    pub fn foreach(&self, computation: ComputationPayload) -> Result<Aggregate, ForeachError> {
        match computation {
            ComputationPayload::Native(kind) => {
                let replies = self.dispatcher.broadcast(CallPayload::Foreach {
                    set: self.id,
                    computation: ComputationPayload::Native(kind),
                })?;
                let partials = Self::partials(replies)?;
                kind.reduce(partials).map_err(ForeachError::from)
            }
            ComputationPayload::User(prototype) => {
                if let Some(stage) = prototype.stages().missing() {
                    return Err(ComputationError::MissingStage { stage }.into());
                }
                let replies = self.dispatcher.broadcast(CallPayload::Foreach {
                    set: self.id,
                    computation: ComputationPayload::User(prototype.fork()),
                })?;
                let partials = Self::partials(replies)?;
                prototype.reduce(partials).map_err(ForeachError::from)
            }
        }
    }

    /// Extract per-rank partials, surfacing the first rank failure.
    fn partials(replies: Vec<CallReply>) -> Result<Vec<Aggregate>, ForeachError> {
        let mut partials = Vec::with_capacity(replies.len());
        for reply in replies {
            match reply.outcome {
                Outcome::Collected(partial) => partials.push(partial),
                Outcome::Failed(source) => {
                    return Err(ForeachError::Rank {
                        rank: reply.rank,
                        source,
                    })
                }
                // Applied/Skipped/Replica carry no partial; foreach
                // replies never produce them in practice.
                _ => {}
            }
        }
        Ok(partials)
    }
}

impl fmt::Debug for ParticleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleSet")
            .field("id", &self.id)
            .field("total", &self.total)
            .finish()
    }
}
