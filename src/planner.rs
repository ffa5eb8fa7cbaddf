//! The planner facade (`SPEC_FULL.md` section 4.5/4.6, component C10): the
//! single entry point external callers use, wiring a `Search`, a `Sampler`
//! and plan extraction together behind a deadline.

use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::config::PlannerConfig;
use crate::map::Map;
use crate::obstacles::DynamicObstaclesManager;
use crate::plan::{sample_edge, Plan};
use crate::ribbon::RibbonManager;
use crate::sampler::Sampler;
use crate::search::Search;
use crate::state::State;
use crate::vertex::Coverage;

/// Stateless apart from its configuration: every call to `plan_ribbons` or
/// `plan_points` builds a fresh `Search` over its own vertex/edge arena.
/// Warm-starting from a previous plan is left to the caller (pass the
/// previous plan's last state as the new `start`), matching the source's
/// per-tick replanning loop rather than persisting search state across calls.
pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans from `start` towards covering `ribbons`, consulting `map` for
    /// static obstacles and `obstacles` for moving ones, within
    /// `time_remaining`. Always returns a `Plan`, never `None`
    /// (`SPEC_FULL.md` section 6).
    pub fn plan_ribbons(
        &self,
        start: State,
        ribbons: RibbonManager,
        obstacles: &DynamicObstaclesManager,
        map: &dyn Map,
        time_remaining: Duration,
    ) -> Plan {
        self.plan(start, Coverage::Ribbons(Rc::new(ribbons)), obstacles, map, time_remaining)
    }

    /// As `plan_ribbons`, but covering a bare set of points rather than
    /// directed ribbons.
    pub fn plan_points(
        &self,
        start: State,
        points: Vec<(f64, f64)>,
        obstacles: &DynamicObstaclesManager,
        map: &dyn Map,
        time_remaining: Duration,
    ) -> Plan {
        self.plan(start, Coverage::Points(Rc::new(points)), obstacles, map, time_remaining)
    }

    fn plan(
        &self,
        start: State,
        coverage: Coverage,
        obstacles: &DynamicObstaclesManager,
        map: &dyn Map,
        time_remaining: Duration,
    ) -> Plan {
        let deadline = Instant::now() + time_remaining;
        let mut search = Search::new(start, coverage, self.config);
        let mut sampler = Sampler::new(self.config.seed);
        let outcome = search.run(map, obstacles, &mut sampler, deadline);

        let path = search.path_to(outcome.vertex_id);
        log::debug!(
            "plan call finished: reached_goal={}, hops={}, budget={:?}",
            outcome.reached_goal,
            path.len(),
            time_remaining
        );

        // The root already satisfying coverage is the one case with a
        // genuinely empty plan (`SPEC_FULL.md` section 6); any other
        // returned vertex has at least one edge, and concatenating the
        // per-edge samples starting from `start` yields a non-empty,
        // time-monotonic plan (`SPEC_FULL.md` section 8, scenario S6).
        if path.is_empty() {
            return Plan::new();
        }

        let mut plan = Plan::new();
        let mut cursor = start;
        for edge_id in path {
            let edge = search.edge(edge_id);
            let edge_plan = sample_edge(edge, &cursor, &self.config);
            if let Some(last) = edge_plan.last().copied() {
                cursor = last;
            }
            plan.extend(edge_plan);
        }
        plan
    }
}
