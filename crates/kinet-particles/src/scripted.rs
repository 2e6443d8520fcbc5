//! Front-end-assembled computations built from closures.
//!
//! [`ScriptedComputation`] mirrors the dynamic front-end variant of the
//! computation contract: the apply and collect stages are wired at run
//! time, so a half-assembled computation is representable. `foreach`
//! checks [`stages()`](kinet_core::ParticleComputation::stages) and
//! rejects an incomplete computation as malformed before any particle is
//! visited — construction itself never fails.
//!
//! Constructed via the builder: [`ScriptedComputation::builder`].

use std::sync::Arc;

use kinet_core::computation::{Aggregate, ParticleComputation, Stage, StageSet};
use kinet_core::error::ComputationError;
use kinet_core::particle::Particle;

type ApplyFn<S> = Arc<dyn Fn(&mut S, &Particle) + Send + Sync>;
type CollectFn<S> = Arc<dyn Fn(&mut S) -> Aggregate + Send + Sync>;
type ReduceFn = Arc<dyn Fn(Vec<Aggregate>) -> Result<Aggregate, ComputationError> + Send + Sync>;

/// A computation assembled from closures over a caller-chosen
/// accumulator state `S`.
///
/// Forking produces a fresh instance with `S::default()` state and shared
/// stage closures, so each rank accumulates independently.
///
/// # Examples
///
/// ```
/// use kinet_core::computation::Aggregate;
/// use kinet_particles::ScriptedComputation;
///
/// // Count particles heavier than one mass unit.
/// let heavy = ScriptedComputation::<u64>::builder("heavy_count")
///     .apply(|count, particle| {
///         if particle.mass > 1.0 {
///             *count += 1;
///         }
///     })
///     .collect(|count| Aggregate::Count(*count))
///     .build();
/// ```
pub struct ScriptedComputation<S = f64> {
    name: String,
    state: S,
    apply: Option<ApplyFn<S>>,
    collect: Option<CollectFn<S>>,
    reduce: Option<ReduceFn>,
}

impl<S: Default + Send + 'static> ScriptedComputation<S> {
    /// Start assembling a computation with the given name.
    pub fn builder(name: impl Into<String>) -> ScriptedBuilder<S> {
        ScriptedBuilder {
            name: name.into(),
            apply: None,
            collect: None,
            reduce: None,
        }
    }
}

impl<S: Default + Send + 'static> ParticleComputation for ScriptedComputation<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn stages(&self) -> StageSet {
        let mut stages = StageSet::EMPTY;
        if self.apply.is_some() {
            stages = stages.with(Stage::Apply);
        }
        if self.collect.is_some() {
            stages = stages.with(Stage::Collect);
        }
        stages
    }

    fn fork(&self) -> Box<dyn ParticleComputation> {
        Box::new(ScriptedComputation {
            name: self.name.clone(),
            state: S::default(),
            apply: self.apply.clone(),
            collect: self.collect.clone(),
            reduce: self.reduce.clone(),
        })
    }

    fn apply(&mut self, particle: &Particle) {
        if let Some(apply) = &self.apply {
            apply(&mut self.state, particle);
        }
    }

    fn collect(&mut self) -> Aggregate {
        match &self.collect {
            Some(collect) => collect(&mut self.state),
            // Unreachable through foreach: an absent collect stage is
            // rejected as malformed before dispatch.
            None => Aggregate::Count(0),
        }
    }

    fn reduce(&self, partials: Vec<Aggregate>) -> Result<Aggregate, ComputationError> {
        match &self.reduce {
            Some(reduce) => reduce(partials),
            None => {
                let mut iter = partials.into_iter();
                let first = match iter.next() {
                    Some(first) => first,
                    None => return Ok(Aggregate::Count(0)),
                };
                iter.try_fold(first, Aggregate::sum)
            }
        }
    }
}

/// Builder for [`ScriptedComputation`].
///
/// `build()` always succeeds, even with stages missing — malformedness is
/// a dispatch-time error, not a construction-time one, so tests and
/// callers can observe the fail-fast contract.
pub struct ScriptedBuilder<S> {
    name: String,
    apply: Option<ApplyFn<S>>,
    collect: Option<CollectFn<S>>,
    reduce: Option<ReduceFn>,
}

impl<S: Default + Send + 'static> ScriptedBuilder<S> {
    /// Wire the per-particle apply stage.
    pub fn apply(mut self, f: impl Fn(&mut S, &Particle) + Send + Sync + 'static) -> Self {
        self.apply = Some(Arc::new(f));
        self
    }

    /// Wire the per-rank collect stage.
    pub fn collect(mut self, f: impl Fn(&mut S) -> Aggregate + Send + Sync + 'static) -> Self {
        self.collect = Some(Arc::new(f));
        self
    }

    /// Wire a custom reduce step (default: element-wise sum of partials).
    pub fn reduce(
        mut self,
        f: impl Fn(Vec<Aggregate>) -> Result<Aggregate, ComputationError> + Send + Sync + 'static,
    ) -> Self {
        self.reduce = Some(Arc::new(f));
        self
    }

    /// Finish assembly.
    pub fn build(self) -> ScriptedComputation<S> {
        ScriptedComputation {
            name: self.name,
            state: S::default(),
            apply: self.apply,
            collect: self.collect,
            reduce: self.reduce,
        }
    }
}
