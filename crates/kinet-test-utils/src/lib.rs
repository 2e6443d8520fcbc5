//! Test utilities and mock types for Kinet development.
//!
//! Provides a closure-driven [`MockDispatcher`] implementing the
//! [`Dispatcher`] boundary trait without threads, plus computation
//! fixtures with observable side effects for fail-fast tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use kinet_core::call::{CallPayload, CallReply, Outcome};
use kinet_core::computation::{Aggregate, ParticleComputation};
use kinet_core::error::DispatchError;
use kinet_core::group::WorkerGroup;
use kinet_core::id::Rank;
use kinet_core::particle::Particle;
use kinet_core::role::Role;
use kinet_core::traits::Dispatcher;

type Handler = Box<dyn Fn(Rank, CallPayload) -> Outcome + Send + Sync>;

/// Mock implementation of [`Dispatcher`].
///
/// Executes each per-rank payload through a caller-supplied handler
/// closure, synchronously and on the calling thread. Every dispatched
/// payload is logged (as its `Debug` rendering) so tests can assert that
/// a failing operation produced no propagation at all.
pub struct MockDispatcher {
    group: WorkerGroup,
    handler: Handler,
    calls: Mutex<Vec<String>>,
}

impl MockDispatcher {
    /// A dispatcher over `workers` ranks whose handler replies `Applied`
    /// to everything.
    pub fn applying(workers: usize) -> Self {
        Self::with_handler(workers, |_, _| Outcome::Applied)
    }

    /// A dispatcher over `workers` ranks with a custom per-rank handler.
    pub fn with_handler(
        workers: usize,
        handler: impl Fn(Rank, CallPayload) -> Outcome + Send + Sync + 'static,
    ) -> Self {
        Self {
            group: WorkerGroup::new(workers),
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replace the worker group (e.g. to activate a sub-group).
    pub fn with_group(mut self, group: WorkerGroup) -> Self {
        self.group = group;
        self
    }

    /// Debug renderings of every payload dispatched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of payloads dispatched so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Dispatcher for MockDispatcher {
    fn role(&self) -> Role {
        Role::Controller
    }

    fn group(&self) -> &WorkerGroup {
        &self.group
    }

    fn broadcast(&self, call: CallPayload) -> Result<Vec<CallReply>, DispatchError> {
        let calls = (0..self.group.worker_count())
            .map(|_| call.replicate())
            .collect();
        self.scatter(calls)
    }

    fn scatter(&self, calls: Vec<CallPayload>) -> Result<Vec<CallReply>, DispatchError> {
        if calls.len() != self.group.worker_count() {
            return Err(DispatchError::ScatterArity {
                expected: self.group.worker_count(),
                got: calls.len(),
            });
        }
        Ok(calls
            .into_iter()
            .enumerate()
            .map(|(i, call)| {
                let rank = Rank(i as u32 + 1);
                self.calls.lock().unwrap().push(format!("{call:?}"));
                CallReply {
                    rank,
                    outcome: (self.handler)(rank, call),
                }
            })
            .collect())
    }
}

/// A counting computation whose applies are observable across forks.
///
/// Every fork shares the same [`AtomicU64`], so a test can assert the
/// total number of `apply` calls that happened anywhere — in particular,
/// that a rejected computation produced exactly zero.
pub struct RecordingComputation {
    applied: Arc<AtomicU64>,
    local: u64,
}

impl RecordingComputation {
    /// Build a computation plus the shared apply counter.
    pub fn new() -> (Self, Arc<AtomicU64>) {
        let applied = Arc::new(AtomicU64::new(0));
        (
            Self {
                applied: Arc::clone(&applied),
                local: 0,
            },
            applied,
        )
    }
}

impl ParticleComputation for RecordingComputation {
    fn name(&self) -> &str {
        "recording"
    }

    fn fork(&self) -> Box<dyn ParticleComputation> {
        Box::new(Self {
            applied: Arc::clone(&self.applied),
            local: 0,
        })
    }

    fn apply(&mut self, _particle: &Particle) {
        self.applied.fetch_add(1, Ordering::Relaxed);
        self.local += 1;
    }

    fn collect(&mut self) -> Aggregate {
        Aggregate::Count(self.local)
    }
}
