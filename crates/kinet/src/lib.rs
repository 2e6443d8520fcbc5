//! Kinet: a distributed-object front-end for particle simulations.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Kinet sub-crates. For most users, adding `kinet` as a single
//! dependency is sufficient.
//!
//! A session spawns one rank per worker; the calling thread is the
//! controller. Configuration objects (the thermostat) are replicated
//! across ranks with synchronous propagation, and particle sets are
//! partitioned across ranks and iterated with `foreach`.
//!
//! # Quick start
//!
//! ```rust
//! use kinet::prelude::*;
//! use std::sync::Arc;
//!
//! // One controller plus two worker ranks.
//! let session = Arc::new(Session::new(SessionConfig::new(2)).unwrap());
//!
//! // Partition ten particles across the workers.
//! let particles: Vec<Particle> = (0..10)
//!     .map(|i| Particle::at_rest(ParticleId(i)))
//!     .collect();
//! let set = ParticleSet::distribute(session.clone(), particles).unwrap();
//!
//! // Replicate a thermostat over the set and retune it; every replica
//! // has the new value before the setter returns.
//! let mut thermostat =
//!     Thermostat::create(session.clone(), set.id(), ThermostatParams::default()).unwrap();
//! thermostat.set_friction(0.5).unwrap();
//! thermostat.set_direction(Axis::X).unwrap();
//!
//! // Count particles across all ranks; only the controller sees the
//! // reduced result.
//! let result = set
//!     .foreach(ComputationPayload::Native(NativeComputation::Count))
//!     .unwrap();
//! assert_eq!(result, Aggregate::Count(10));
//!
//! session.shutdown();
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `kinet-core` | IDs, roles, call payloads, errors, core traits |
//! | [`particles`] | `kinet-particles` | Particle storage, computations, set handle |
//! | [`thermostat`] | `kinet-thermostat` | Replicated thermostat proxy and replica |
//! | [`engine`] | `kinet-engine` | Session runtime and worker threads |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`kinet-core`).
pub use kinet_core as types;

/// Particle storage, computations, and the set handle (`kinet-particles`).
pub use kinet_particles as particles;

/// Replicated thermostat proxy and per-rank replica (`kinet-thermostat`).
pub use kinet_thermostat as thermostat;

/// Session runtime: controller dispatch and worker ranks (`kinet-engine`).
pub use kinet_engine as engine;

/// The most commonly used types, re-exported in one place.
pub mod prelude {
    pub use kinet_core::axis::Axis;
    pub use kinet_core::call::ComputationPayload;
    pub use kinet_core::computation::{
        Aggregate, NativeComputation, ParticleComputation, StageSet,
    };
    pub use kinet_core::group::WorkerGroup;
    pub use kinet_core::id::{ParticleId, ProxyId, Rank, SetId};
    pub use kinet_core::particle::Particle;
    pub use kinet_core::role::Role;
    pub use kinet_core::thermostat::ThermostatParams;
    pub use kinet_core::traits::Dispatcher;
    pub use kinet_engine::{DispatchMetrics, Session, SessionConfig, ShutdownReport};
    pub use kinet_particles::{ParticleSet, ScriptedComputation};
    pub use kinet_thermostat::{Thermostat, ThermostatReplica};
}
