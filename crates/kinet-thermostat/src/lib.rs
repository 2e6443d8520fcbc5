//! Replicated thermostat configuration for the Kinet front-end.
//!
//! One logical thermostat exists per [`Thermostat`] handle; each
//! participating worker rank holds a [`ThermostatReplica`] and the
//! controller holds a mirror. Controller setters propagate synchronously:
//! every replica has applied the update before the setter returns, so the
//! caller never observes disagreeing replicas.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod proxy;
pub mod replica;

pub use proxy::{Thermostat, ThermostatError};
pub use replica::ThermostatReplica;
