//! The [`Dispatcher`] boundary trait.
//!
//! Controller-side proxies (thermostat handles, particle-set handles)
//! reach the runtime exclusively through this trait, decoupling them from
//! the session implementation. The surface mirrors what the original
//! front-end consumed from its distributed dispatch collaborator: role
//! query, group membership, and synchronous broadcast-and-collect.

use crate::call::{CallPayload, CallReply};
use crate::error::DispatchError;
use crate::group::WorkerGroup;
use crate::role::Role;

/// Synchronous cross-rank dispatch.
///
/// Every call is blocking end-to-end: the dispatcher returns only after
/// each worker rank has executed the payload and replied. Replies are
/// collected in rank order. There is no timeout — a hung worker stalls
/// the caller, and a vanished worker surfaces as
/// [`DispatchError::WorkerLost`].
pub trait Dispatcher: Send + Sync {
    /// The role of the calling rank.
    fn role(&self) -> Role;

    /// Worker group and sub-group membership.
    fn group(&self) -> &WorkerGroup;

    /// Send a replicated copy of `call` to every worker rank and collect
    /// one reply per rank, in rank order.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Shutdown`] after the session has shut
    /// down and [`DispatchError::WorkerLost`] if a worker disconnects
    /// mid-call.
    fn broadcast(&self, call: CallPayload) -> Result<Vec<CallReply>, DispatchError>;

    /// Send one distinct payload to each worker rank (payload `i` goes to
    /// rank `i + 1`) and collect one reply per rank, in rank order.
    ///
    /// Used where ranks must receive different data, e.g. partition
    /// loading.
    ///
    /// # Errors
    ///
    /// As [`broadcast`](Dispatcher::broadcast), plus
    /// [`DispatchError::ScatterArity`] when `calls.len()` differs from
    /// the worker count.
    fn scatter(&self, calls: Vec<CallPayload>) -> Result<Vec<CallReply>, DispatchError>;
}
