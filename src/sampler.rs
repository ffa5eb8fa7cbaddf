//! Draws kinematically-reachable candidate states, biased towards uncovered
//! ribbons/points (`SPEC_FULL.md` section 4.4). Deterministic given a seed --
//! reproducibility is a hard requirement, so this never reaches for
//! thread-local or OS randomness.

use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::PlannerConfig;
use crate::state::State;
use crate::vertex::Coverage;

/// Default child-sample count per expansion, used as `PlannerConfig`'s
/// `initial_samples` default.
pub const DEFAULT_INITIAL_SAMPLES: usize = 100;

pub struct Sampler {
    rng: StdRng,
}

impl Sampler {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// Draws up to `count` candidate states reachable from `from`, favouring
    /// poses near whatever remains uncovered. Samples that could not possibly
    /// be reached within `time_remaining` at `config.max_speed` are filtered
    /// out by a coarse straight-line-distance heuristic, but the filter never
    /// empties the result outright: the search's anytime guarantee requires
    /// at least one child out of the root's expansion even when the deadline
    /// has already passed, so an all-unreachable draw falls back to the
    /// unfiltered candidates.
    pub fn sample_children(
        &mut self,
        from: &State,
        coverage: &Coverage,
        config: &PlannerConfig,
        count: usize,
        time_remaining: f64,
    ) -> Vec<State> {
        let targets = self.target_points(coverage);
        let mut drawn = Vec::with_capacity(count);
        let mut reachable = Vec::with_capacity(count);

        for _ in 0..count {
            let (tx, ty) = if targets.is_empty() {
                // no coverage left to bias towards: sample a step forward at a
                // randomly perturbed heading
                let jitter = self.rng.gen_range(-1.0..1.0);
                let heading = from.heading() + jitter;
                let step = config.max_speed * self.rng.gen_range(1.0..10.0);
                (from.x + heading.sin() * step, from.y + heading.cos() * step)
            } else {
                let idx = self.rng.gen_range(0..targets.len());
                let (px, py) = targets[idx];
                let spread = config.max_turning_radius.max(1.0);
                (px + self.rng.gen_range(-spread..spread), py + self.rng.gen_range(-spread..spread))
            };

            let heading = from.heading_to(tx, ty);
            let straight_line = from.distance_to(tx, ty);
            if straight_line <= 0.0 {
                continue;
            }

            let state = State::new(tx, ty, heading, config.max_speed, from.time);
            // coarse reachability filter: can't possibly get there within
            // what's left of the budget at top speed
            if straight_line / config.max_speed <= time_remaining {
                reachable.push(state);
            }
            drawn.push(state);
        }

        if reachable.is_empty() {
            drawn
        } else {
            reachable
        }
    }

    fn target_points(&self, coverage: &Coverage) -> Vec<(f64, f64)> {
        match coverage {
            // ribbons share endpoints often enough (adjacent mowing lanes)
            // that deduping keeps the bias from over-weighting one point
            Coverage::Ribbons(r) => r
                .uncovered()
                .iter()
                .flat_map(|ribbon| [ribbon.start, ribbon.end])
                .unique_by(|&(x, y)| (ordered_float::OrderedFloat(x), ordered_float::OrderedFloat(y)))
                .collect(),
            Coverage::Points(p) => p.as_ref().clone(),
        }
    }
}
