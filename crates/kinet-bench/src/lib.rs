//! Benchmark profiles and utilities for the Kinet front-end.
//!
//! Provides deterministic particle populations and pre-built session
//! configurations shared by the benchmark targets.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use kinet_core::id::ParticleId;
use kinet_core::particle::Particle;
use kinet_engine::SessionConfig;

/// Build `n` particles with deterministic pseudo-random velocities.
///
/// Velocities are derived from a multiplicative hash of the index, so a
/// profile is identical across runs without an RNG dependency.
pub fn particle_population(n: u64) -> Vec<Particle> {
    (0..n)
        .map(|i| {
            let h = i.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let component = |shift: u32| ((h >> shift) % 2000) as f64 / 1000.0 - 1.0;
            Particle {
                id: ParticleId(i),
                position: [component(0), component(16), component(32)],
                velocity: [component(8), component(24), component(40)],
                mass: 1.0,
            }
        })
        .collect()
}

/// Reference session profile: 4 worker ranks, default channel capacity.
pub fn reference_config(seed: u64) -> SessionConfig {
    let mut config = SessionConfig::new(4);
    config.seed = seed;
    config
}
