//! Per-rank particle storage and local computation execution.

use indexmap::IndexMap;

use kinet_core::computation::{Aggregate, NativeComputation, ParticleComputation};
use kinet_core::id::ParticleId;
use kinet_core::particle::Particle;

/// The particles resident on one rank: a partition of a distributed set.
///
/// Backed by an [`IndexMap`] so iteration follows insertion order
/// deterministically — but callers must not rely on it: per-particle
/// visitation order is unspecified by contract, and partitioning places
/// particles on ranks in arrangement-dependent ways.
#[derive(Debug, Default)]
pub struct ParticleStore {
    particles: IndexMap<ParticleId, Particle>,
}

impl ParticleStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the given particles.
    ///
    /// A particle with a duplicate ID replaces the earlier one, matching
    /// map semantics; partition construction never produces duplicates.
    pub fn from_particles(particles: Vec<Particle>) -> Self {
        let mut store = Self::new();
        for particle in particles {
            store.insert(particle);
        }
        store
    }

    /// Insert one particle, replacing any particle with the same ID.
    pub fn insert(&mut self, particle: Particle) {
        self.particles.insert(particle.id, particle);
    }

    /// Number of resident particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Whether the partition is empty.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Look up a resident particle by ID.
    pub fn get(&self, id: ParticleId) -> Option<&Particle> {
        self.particles.get(&id)
    }

    /// Iterate over resident particles.
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.values()
    }

    /// Iterate mutably over resident particles.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Particle> {
        self.particles.values_mut()
    }

    /// Execute a native computation kind over the partition.
    ///
    /// Both stages run inside this call as a direct loop — no per-particle
    /// dynamic dispatch. Returns this rank's partial.
    pub fn run_native(&self, kind: NativeComputation) -> Aggregate {
        match kind {
            NativeComputation::Count => Aggregate::Count(self.particles.len() as u64),
            NativeComputation::KineticEnergy => {
                let mut total = 0.0;
                for particle in self.particles.values() {
                    total += particle.kinetic_energy();
                }
                Aggregate::Scalar(total)
            }
            NativeComputation::MaxSpeed => {
                let mut max = 0.0f64;
                for particle in self.particles.values() {
                    max = max.max(particle.speed());
                }
                Aggregate::Scalar(max)
            }
        }
    }

    /// Drive a user computation over the partition: `apply` once per
    /// resident particle, then `collect` the rank's partial.
    pub fn run_user(&self, computation: &mut dyn ParticleComputation) -> Aggregate {
        for particle in self.particles.values() {
            computation.apply(particle);
        }
        computation.collect()
    }
}
