//! End-to-end foreach dispatch over a live session.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use kinet_core::call::ComputationPayload;
use kinet_core::computation::{Aggregate, NativeComputation};
use kinet_core::error::{ComputationError, DispatchError, ForeachError};
use kinet_core::id::ParticleId;
use kinet_core::particle::Particle;
use kinet_engine::{Session, SessionConfig};
use kinet_particles::{ParticleSet, ScriptedComputation};
use kinet_test_utils::RecordingComputation;

fn particles(n: u64) -> Vec<Particle> {
    (0..n).map(|i| Particle::at_rest(ParticleId(i))).collect()
}

fn session(workers: usize) -> Arc<Session> {
    Arc::new(Session::new(SessionConfig::new(workers)).unwrap())
}

#[test]
fn one_controller_two_workers_split_3_4_counts_7() {
    let session = session(2);
    let set = ParticleSet::distribute_partitioned(
        session.clone(),
        vec![particles(3), {
            (10..14).map(ParticleId).map(Particle::at_rest).collect()
        }],
    )
    .unwrap();

    let result = set
        .foreach(ComputationPayload::Native(NativeComputation::Count))
        .unwrap();
    assert_eq!(result, Aggregate::Count(7));
}

#[test]
fn count_is_independent_of_partition_arrangement() {
    let all = particles(9);

    let lopsided = {
        let session = session(2);
        let set = ParticleSet::distribute_partitioned(
            session.clone(),
            vec![all[..1].to_vec(), all[1..].to_vec()],
        )
        .unwrap();
        set.foreach(ComputationPayload::Native(NativeComputation::Count))
            .unwrap()
    };

    let balanced = {
        let session = session(3);
        let set = ParticleSet::distribute(session.clone(), all).unwrap();
        set.foreach(ComputationPayload::Native(NativeComputation::Count))
            .unwrap()
    };

    assert_eq!(lopsided, balanced);
    assert_eq!(balanced, Aggregate::Count(9));
}

#[test]
fn user_computation_visits_every_particle_exactly_once() {
    let session = session(3);
    let set = ParticleSet::distribute(session.clone(), particles(11)).unwrap();

    let (computation, applied) = RecordingComputation::new();
    let result = set
        .foreach(ComputationPayload::User(Box::new(computation)))
        .unwrap();

    assert_eq!(result, Aggregate::Count(11));
    assert_eq!(applied.load(Ordering::Relaxed), 11, "once per particle");
}

#[test]
fn malformed_computation_fails_fast_with_zero_side_effects() {
    let session = session(2);
    let set = ParticleSet::distribute(session.clone(), particles(6)).unwrap();

    let visits = Arc::new(std::sync::atomic::AtomicU64::new(0));
    let observed = Arc::clone(&visits);
    let no_collect = ScriptedComputation::<u64>::builder("no_collect")
        .apply(move |_, _| {
            observed.fetch_add(1, Ordering::Relaxed);
        })
        .build();

    let err = set
        .foreach(ComputationPayload::User(Box::new(no_collect)))
        .unwrap_err();
    assert!(matches!(
        err,
        ForeachError::Computation(ComputationError::MissingStage { .. })
    ));
    assert_eq!(visits.load(Ordering::Relaxed), 0, "no particle was visited");
}

#[test]
fn native_kinetic_energy_sums_across_ranks() {
    let session = session(2);
    let moving: Vec<Particle> = (0..4)
        .map(|i| Particle {
            id: ParticleId(i),
            position: [0.0; 3],
            velocity: [1.0 + i as f64, 0.0, 0.0],
            mass: 1.0,
        })
        .collect();
    // KE = 0.5 * (1 + 4 + 9 + 16)
    let set = ParticleSet::distribute(session.clone(), moving).unwrap();
    let result = set
        .foreach(ComputationPayload::Native(NativeComputation::KineticEnergy))
        .unwrap();
    let Aggregate::Scalar(energy) = result else {
        panic!("kinetic energy must be scalar");
    };
    assert!((energy - 15.0).abs() < 1e-12);
}

#[test]
fn empty_set_counts_zero() {
    let session = session(2);
    let set = ParticleSet::distribute(session.clone(), vec![]).unwrap();
    assert!(set.is_empty());
    let result = set
        .foreach(ComputationPayload::Native(NativeComputation::Count))
        .unwrap();
    assert_eq!(result, Aggregate::Count(0));
}

#[test]
fn foreach_after_shutdown_surfaces_dispatch_error() {
    let session = session(1);
    let set = ParticleSet::distribute(session.clone(), particles(2)).unwrap();
    session.shutdown();

    let err = set
        .foreach(ComputationPayload::Native(NativeComputation::Count))
        .unwrap_err();
    assert_eq!(err, ForeachError::Dispatch(DispatchError::Shutdown));
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        /// A commutative/associative computation yields the same result
        /// no matter how the set is split across ranks.
        #[test]
        fn kinetic_energy_is_partition_independent(
            velocities in proptest::collection::vec(
                [-5.0f64..5.0, -5.0f64..5.0, -5.0f64..5.0],
                1..24,
            ),
            split in 0usize..25,
        ) {
            let all: Vec<Particle> = velocities
                .iter()
                .enumerate()
                .map(|(i, v)| Particle {
                    id: ParticleId(i as u64),
                    position: [0.0; 3],
                    velocity: *v,
                    mass: 1.0,
                })
                .collect();
            let split = split.min(all.len());

            let energy = |partitions: Vec<Vec<Particle>>| {
                let session = session(partitions.len());
                let set = ParticleSet::distribute_partitioned(session.clone(), partitions).unwrap();
                match set
                    .foreach(ComputationPayload::Native(NativeComputation::KineticEnergy))
                    .unwrap()
                {
                    Aggregate::Scalar(e) => e,
                    other => panic!("unexpected aggregate: {other:?}"),
                }
            };

            let a = energy(vec![all[..split].to_vec(), all[split..].to_vec()]);
            let b = energy(vec![all[split..].to_vec(), all[..split].to_vec()]);
            prop_assert!((a - b).abs() <= 1e-9 * a.abs().max(1.0));
        }
    }
}
