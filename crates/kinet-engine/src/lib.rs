//! Session runtime for the Kinet front-end.
//!
//! [`Session`] is the controller-side entry point: it spawns one named
//! thread per worker rank (each standing in for one simulation process),
//! implements the [`Dispatcher`](kinet_core::Dispatcher) boundary trait
//! with synchronous broadcast-and-collect over bounded channels, and
//! joins every worker on shutdown.
//!
//! Worker threads own their rank's engine state exclusively — particle
//! partitions and thermostat replicas — and block on the request channel
//! between dispatched calls.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod metrics;
pub mod session;
mod worker;

pub use config::{SessionConfig, SessionError};
pub use metrics::DispatchMetrics;
pub use session::{Session, ShutdownReport};
