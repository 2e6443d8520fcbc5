//! User-facing [`Session`] API: worker spawning, synchronous dispatch,
//! and shutdown.
//!
//! # Architecture
//!
//! ```text
//! Controller Thread              Worker Threads (one per rank)
//!     |                              |
//!     |--broadcast(call)------------>| requests.recv()
//!     |   [per-rank bounded(cap)]    | engine.handle(call)
//!     |   one reply channel per call |
//!     |<--CallReply via bounded(1)---|
//!     |   (collected in rank order)  | requests.recv()  (blocks)
//! ```
//!
//! Every dispatched call is blocking end-to-end: the controller sends one
//! payload per worker, then collects exactly one reply per rank before
//! returning. There is no timeout — a hung worker stalls the controller,
//! and a vanished worker surfaces as
//! [`DispatchError::WorkerLost`](kinet_core::error::DispatchError::WorkerLost).

use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::Sender;

use kinet_core::call::{CallPayload, CallReply, Outcome};
use kinet_core::error::DispatchError;
use kinet_core::group::WorkerGroup;
use kinet_core::id::Rank;
use kinet_core::role::Role;
use kinet_core::traits::Dispatcher;

use crate::config::{SessionConfig, SessionError};
use crate::metrics::DispatchMetrics;
use crate::worker::{WorkerRequest, WorkerState};

// ── ShutdownReport ──────────────────────────────────────────────

/// Report from session shutdown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Number of worker threads joined cleanly.
    pub workers_joined: usize,
}

// ── Session ─────────────────────────────────────────────────────

/// A simulation session: the controller rank plus its worker group.
///
/// Construction spawns one named thread per worker rank, each owning its
/// engine state exclusively. The session implements [`Dispatcher`], so
/// controller-side proxies ([`ParticleSet`], [`Thermostat`]) address the
/// workers through it. Shutdown — explicit or on drop — closes every
/// request channel and joins the workers.
///
/// Interior state is mutex-wrapped so the session can be shared behind
/// an `Arc` by multiple proxies; the locks are uncontended in the
/// single-controller model and are never held across a blocking reply
/// wait.
///
/// [`ParticleSet`]: https://docs.rs/kinet-particles
/// [`Thermostat`]: https://docs.rs/kinet-thermostat
pub struct Session {
    role: Role,
    group: WorkerGroup,
    senders: Mutex<Option<Vec<Sender<WorkerRequest>>>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
    metrics: Mutex<DispatchMetrics>,
}

impl Session {
    /// Validate `config` and spawn the worker ranks.
    ///
    /// Each worker thread is named `kinet-worker-<rank>` and derives its
    /// RNG stream from the session seed and its rank.
    pub fn new(config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        let group = config.group();

        let mut senders = Vec::with_capacity(config.workers);
        let mut threads = Vec::with_capacity(config.workers);
        for index in 0..config.workers {
            let rank = Rank(index as u32 + 1);
            let (tx, rx) = crossbeam_channel::bounded(config.channel_capacity);
            let state = WorkerState::new(
                rank,
                Role::Worker,
                group.clone(),
                config.seed ^ u64::from(rank.0),
                rx,
            );
            let handle = thread::Builder::new()
                .name(format!("kinet-worker-{rank}"))
                .spawn(move || state.run())
                .map_err(|e| SessionError::ThreadSpawnFailed {
                    reason: e.to_string(),
                })?;
            senders.push(tx);
            threads.push(handle);
        }

        Ok(Self {
            role: Role::Controller,
            group,
            senders: Mutex::new(Some(senders)),
            threads: Mutex::new(threads),
            metrics: Mutex::new(DispatchMetrics::default()),
        })
    }

    /// Metrics accumulated across this session's dispatched calls.
    pub fn metrics(&self) -> DispatchMetrics {
        self.metrics.lock().expect("metrics lock poisoned").clone()
    }

    /// Close every request channel and join the worker threads.
    ///
    /// Idempotent: a second call (or the implicit one on drop) joins
    /// nothing and reports zero workers.
    pub fn shutdown(&self) -> ShutdownReport {
        // Dropping the senders disconnects every request channel; worker
        // loops observe the disconnect and exit.
        drop(self.senders.lock().expect("senders lock poisoned").take());

        let mut joined = 0;
        let mut threads = self.threads.lock().expect("threads lock poisoned");
        for handle in threads.drain(..) {
            if handle.join().is_ok() {
                joined += 1;
            }
        }
        ShutdownReport {
            workers_joined: joined,
        }
    }

    /// Record reply statistics for one dispatched call.
    fn record(&self, replies: &[CallReply], elapsed_us: u64) {
        let mut metrics = self.metrics.lock().expect("metrics lock poisoned");
        metrics.calls += 1;
        metrics.replies += replies.len() as u64;
        metrics.last_call_us = elapsed_us;
        for reply in replies {
            match reply.outcome {
                Outcome::Skipped => metrics.skipped += 1,
                Outcome::Failed(_) => metrics.failures += 1,
                _ => {}
            }
        }
    }
}

impl Dispatcher for Session {
    fn role(&self) -> Role {
        self.role
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

        // Clone the senders out so the lock is not held while blocking on
        // worker replies.
        let senders = self
            .senders
            .lock()
            .expect("senders lock poisoned")
            .as_ref()
            .ok_or(DispatchError::Shutdown)?
            .clone();

        let start = Instant::now();

        // Send one payload per rank, each with its own reply channel.
        let mut pending = Vec::with_capacity(senders.len());
        for (index, (sender, call)) in senders.iter().zip(calls).enumerate() {
            let rank = Rank(index as u32 + 1);
            let (reply_tx, reply_rx) = crossbeam_channel::bounded(1);
            sender
                .send(WorkerRequest {
                    call,
                    reply: reply_tx,
                })
                .map_err(|_| DispatchError::WorkerLost { rank })?;
            pending.push((rank, reply_rx));
        }

        // Acknowledgment barrier: one reply per rank, in rank order.
        let mut replies = Vec::with_capacity(pending.len());
        for (rank, reply_rx) in pending {
            let reply = reply_rx
                .recv()
                .map_err(|_| DispatchError::WorkerLost { rank })?;
            replies.push(reply);
        }

        self.record(&replies, start.elapsed().as_micros() as u64);
        Ok(replies)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role)
            .field("workers", &self.group.worker_count())
            .field("subgroup_active", &self.group.subgroup_active())
            .finish()
    }
}
