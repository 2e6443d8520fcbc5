//! End-to-end replicated thermostat behavior over a live session.

use std::sync::Arc;

use kinet_core::axis::Axis;
use kinet_core::call::ComputationPayload;
use kinet_core::computation::{Aggregate, NativeComputation};
use kinet_core::error::ProxyError;
use kinet_core::id::{ParticleId, Rank, SetId};
use kinet_core::particle::Particle;
use kinet_core::thermostat::ThermostatParams;
use kinet_engine::{Session, SessionConfig};
use kinet_particles::{ParticleSet, ScriptedComputation};
use kinet_thermostat::{Thermostat, ThermostatError};

fn particles(n: u64) -> Vec<Particle> {
    (0..n).map(|i| Particle::at_rest(ParticleId(i))).collect()
}

fn session_with(config: SessionConfig) -> Arc<Session> {
    Arc::new(Session::new(config).unwrap())
}

/// Counts particles that have picked up any velocity.
fn moving_counter() -> ScriptedComputation<u64> {
    ScriptedComputation::<u64>::builder("moving")
        .apply(|count, particle| {
            if particle.speed() > 0.0 {
                *count += 1;
            }
        })
        .collect(|count| Aggregate::Count(*count))
        .build()
}

#[test]
fn setter_propagates_to_every_replica_before_returning() {
    let session = session_with(SessionConfig::new(3));
    let set = ParticleSet::distribute(session.clone(), particles(6)).unwrap();
    let mut thermostat =
        Thermostat::create(session.clone(), set.id(), ThermostatParams::default()).unwrap();

    thermostat.set_friction(0.25).unwrap();
    thermostat.set_direction(Axis::Y).unwrap();

    let replicas = thermostat.replicas().unwrap();
    assert_eq!(replicas.len(), 3);
    for (rank, params) in replicas {
        let params = params.unwrap_or_else(|| panic!("rank {rank} missing replica"));
        assert_eq!(params.friction, 0.25);
        assert_eq!(params.direction, Axis::Y);
    }
}

#[test]
fn excluded_rank_constructs_no_replica_but_still_iterates() {
    let mut config = SessionConfig::new(2);
    config.subgroup = Some(vec![Rank(1)]);
    let session = session_with(config);

    let set =
        ParticleSet::distribute_partitioned(session.clone(), vec![particles(3), particles(4)])
            .unwrap();
    let mut thermostat =
        Thermostat::create(session.clone(), set.id(), ThermostatParams::default()).unwrap();

    // Replica exists only on the sub-group member.
    let replicas = thermostat.replicas().unwrap();
    assert_eq!(replicas[0], (Rank(1), Some(ThermostatParams::default())));
    assert_eq!(replicas[1], (Rank(2), None));

    // Mutation skips the excluded rank without error.
    thermostat.set_temperature(2.0).unwrap();
    let replicas = thermostat.replicas().unwrap();
    assert_eq!(replicas[0].1.unwrap().temperature, 2.0);
    assert!(replicas[1].1.is_none());

    // Iteration is not gated by the sub-group: all 7 particles count.
    let result = set
        .foreach(ComputationPayload::Native(NativeComputation::Count))
        .unwrap();
    assert_eq!(result, Aggregate::Count(7));

    // The kick touches only the participating rank's partition.
    thermostat.kick(0.01).unwrap();
    let moving = set
        .foreach(ComputationPayload::User(Box::new(moving_counter())))
        .unwrap();
    assert_eq!(moving, Aggregate::Count(3), "only rank 1's particles move");
}

#[test]
fn creation_without_a_distributed_set_is_uninitialized() {
    let session = session_with(SessionConfig::new(2));
    let err =
        Thermostat::create(session.clone(), SetId::next(), ThermostatParams::default())
            .unwrap_err();
    assert!(matches!(
        err,
        ThermostatError::PropagationFailed {
            rank: Rank(1),
            source: ProxyError::SetUninitialized { .. },
        }
    ));
}

#[test]
fn invalid_direction_never_reaches_the_workers() {
    // The typed API only admits parsed axes; the parse boundary is where
    // an out-of-enum direction fails, before any broadcast exists.
    let err = "sideways".parse::<Axis>().unwrap_err();
    assert_eq!(err.input, "sideways");

    let session = session_with(SessionConfig::new(1));
    let set = ParticleSet::distribute(session.clone(), particles(2)).unwrap();
    let thermostat =
        Thermostat::create(session.clone(), set.id(), ThermostatParams::default()).unwrap();
    let calls_before = session.metrics().calls;

    // A parse failure means there is no value to set; replica state is
    // exactly what it was.
    assert_eq!(session.metrics().calls, calls_before);
    assert_eq!(thermostat.direction(), Axis::All);
}

#[test]
fn kick_respects_the_direction_selector() {
    let session = session_with(SessionConfig::new(2));
    let set = ParticleSet::distribute(session.clone(), particles(8)).unwrap();
    let mut thermostat = Thermostat::create(
        session.clone(),
        set.id(),
        ThermostatParams {
            direction: Axis::X,
            ..ThermostatParams::default()
        },
    )
    .unwrap();

    thermostat.kick(0.05).unwrap();

    // Off-axis components stay exactly zero.
    let off_axis = ScriptedComputation::<f64>::builder("off_axis_magnitude")
        .apply(|max, particle| {
            *max = max.max(particle.velocity[1].abs()).max(particle.velocity[2].abs());
        })
        .collect(|max| Aggregate::Scalar(*max))
        .reduce(|partials| {
            let mut max = 0.0f64;
            for partial in partials {
                if let Aggregate::Scalar(v) = partial {
                    max = max.max(v);
                }
            }
            Ok(Aggregate::Scalar(max))
        })
        .build();
    let result = set
        .foreach(ComputationPayload::User(Box::new(off_axis)))
        .unwrap();
    assert_eq!(result, Aggregate::Scalar(0.0));

    // The selected component did pick up thermal noise.
    let energy = set
        .foreach(ComputationPayload::Native(NativeComputation::KineticEnergy))
        .unwrap();
    let Aggregate::Scalar(energy) = energy else {
        panic!("kinetic energy must be scalar");
    };
    assert!(energy > 0.0);
}

#[test]
fn identical_session_seeds_give_identical_kicks() {
    let run = |seed: u64| {
        let mut config = SessionConfig::new(2);
        config.seed = seed;
        let session = session_with(config);
        let set = ParticleSet::distribute(session.clone(), particles(10)).unwrap();
        let mut thermostat =
            Thermostat::create(session.clone(), set.id(), ThermostatParams::default()).unwrap();
        thermostat.kick(0.01).unwrap();
        match set
            .foreach(ComputationPayload::Native(NativeComputation::KineticEnergy))
            .unwrap()
        {
            Aggregate::Scalar(e) => e,
            other => panic!("unexpected aggregate: {other:?}"),
        }
    };

    assert_eq!(run(7).to_bits(), run(7).to_bits());
    assert_ne!(run(7).to_bits(), run(8).to_bits());
}

#[test]
fn validation_failure_leaves_replicas_untouched() {
    let session = session_with(SessionConfig::new(2));
    let set = ParticleSet::distribute(session.clone(), particles(2)).unwrap();
    let mut thermostat =
        Thermostat::create(session.clone(), set.id(), ThermostatParams::default()).unwrap();
    let calls_before = session.metrics().calls;

    assert!(thermostat.set_friction(-2.0).is_err());
    assert_eq!(
        session.metrics().calls,
        calls_before,
        "rejected before any broadcast"
    );

    for (_, params) in thermostat.replicas().unwrap() {
        assert_eq!(params.unwrap().friction, 1.0);
    }
}
