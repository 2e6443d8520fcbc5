//! The worker-side thermostat replica.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use kinet_core::id::SetId;
use kinet_core::thermostat::{ParamUpdate, ThermostatParams};
use kinet_particles::ParticleStore;

/// One rank's replica of a replicated thermostat configuration.
///
/// Constructed only on participating ranks; ranks excluded by an active
/// sub-group never build one. The replica applies exactly the updates the
/// controller broadcast — workers never originate configuration changes.
///
/// The velocity kick uses a `ChaCha8` RNG seeded per rank at
/// construction, so identical session seeds produce identical noise
/// sequences on every rank.
#[derive(Debug)]
pub struct ThermostatReplica {
    set: SetId,
    params: ThermostatParams,
    rng: ChaCha8Rng,
}

impl ThermostatReplica {
    /// Construct a replica coupled to `set`, with a rank-derived seed.
    pub fn new(set: SetId, params: ThermostatParams, seed: u64) -> Self {
        Self {
            set,
            params,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// The particle set this thermostat couples to.
    pub fn set(&self) -> SetId {
        self.set
    }

    /// The replica's current parameters.
    pub fn params(&self) -> ThermostatParams {
        self.params
    }

    /// Apply a controller-broadcast parameter update.
    pub fn apply(&mut self, update: ParamUpdate) {
        self.params.apply(update);
    }

    /// Apply one Langevin-style velocity update to the resident partition:
    ///
    /// `v += -friction * v * dt + sqrt(2 * friction * temperature * dt) * N(0,1)`
    ///
    /// component-wise, restricted to the components the configured
    /// direction selects. Zero temperature degenerates to pure damping;
    /// zero friction leaves velocities untouched.
    pub fn kick(&mut self, store: &mut ParticleStore, dt: f64) {
        let friction = self.params.friction;
        let temperature = self.params.temperature;
        let direction = self.params.direction;
        let noise_scale = (2.0 * friction * temperature * dt).sqrt();

        for particle in store.iter_mut() {
            for component in 0..3 {
                if !direction.selects(component) {
                    continue;
                }
                let v = particle.velocity[component];
                let noise = if noise_scale > 0.0 {
                    noise_scale * box_muller(&mut self.rng)
                } else {
                    0.0
                };
                particle.velocity[component] = v - friction * v * dt + noise;
            }
        }
    }
}

/// Gaussian sample via the Box-Muller transform.
/// Avoids the `rand_distr` dependency.
fn box_muller(rng: &mut ChaCha8Rng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(1e-300); // avoid ln(0)
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
