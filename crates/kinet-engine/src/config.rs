//! Session configuration, validation, and error types.

use std::error::Error;
use std::fmt;

use kinet_core::group::WorkerGroup;
use kinet_core::id::Rank;

/// Configuration for a [`Session`](crate::session::Session).
///
/// `workers` ranks are spawned, numbered `1..=workers`; the calling
/// thread is the controller (rank 0). An optional `subgroup` restricts
/// replicated-object participation to its member ranks while active.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Number of worker ranks. Must be at least 1.
    pub workers: usize,
    /// Active sub-group members, or `None` for no sub-group.
    pub subgroup: Option<Vec<Rank>>,
    /// Capacity of each worker's request channel. Default: 64.
    pub channel_capacity: usize,
    /// Session seed; each rank derives its RNG stream from it.
    pub seed: u64,
}

impl SessionConfig {
    /// A configuration with the given worker count and defaults
    /// everywhere else.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            subgroup: None,
            channel_capacity: 64,
            seed: 0,
        }
    }

    /// Check structural invariants before any thread is spawned.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the worker count is zero, the
    /// channel capacity is zero, or the sub-group is empty, duplicated,
    /// or names a rank outside `1..=workers`.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.workers == 0 {
            return Err(SessionError::NoWorkers);
        }
        if self.channel_capacity == 0 {
            return Err(SessionError::ZeroChannelCapacity);
        }
        if let Some(members) = &self.subgroup {
            if members.is_empty() {
                return Err(SessionError::EmptySubgroup);
            }
            for (i, &rank) in members.iter().enumerate() {
                if rank.0 == 0 || rank.0 as usize > self.workers {
                    return Err(SessionError::SubgroupRankOutOfRange { rank });
                }
                if members[..i].contains(&rank) {
                    return Err(SessionError::SubgroupDuplicate { rank });
                }
            }
        }
        Ok(())
    }

    /// The worker group this configuration describes.
    pub fn group(&self) -> WorkerGroup {
        match &self.subgroup {
            None => WorkerGroup::new(self.workers),
            Some(members) => WorkerGroup::with_subgroup(self.workers, members.iter().copied()),
        }
    }
}

/// Errors detected during [`SessionConfig::validate()`] or session
/// startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// A session needs at least one worker rank.
    NoWorkers,
    /// Request channel capacity must be at least 1.
    ZeroChannelCapacity,
    /// An active sub-group must have at least one member.
    EmptySubgroup,
    /// A sub-group member is outside the worker rank range.
    SubgroupRankOutOfRange {
        /// The out-of-range rank.
        rank: Rank,
    },
    /// A rank appears twice in the sub-group.
    SubgroupDuplicate {
        /// The duplicated rank.
        rank: Rank,
    },
    /// A worker thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of the spawn failure.
        reason: String,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWorkers => write!(f, "session needs at least one worker rank"),
            Self::ZeroChannelCapacity => write!(f, "channel_capacity must be at least 1"),
            Self::EmptySubgroup => write!(f, "active sub-group must have at least one member"),
            Self::SubgroupRankOutOfRange { rank } => {
                write!(f, "sub-group rank {rank} is outside the worker range")
            }
            Self::SubgroupDuplicate { rank } => {
                write!(f, "sub-group rank {rank} appears more than once")
            }
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "worker thread spawn failed: {reason}")
            }
        }
    }
}

impl Error for SessionError {}
