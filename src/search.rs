//! Best-first search over sampled configurations (`SPEC_FULL.md` section
//! 4.5), grounded on the source's incremental planning loop. Vertices and
//! edges live in arenas owned by `Search` rather than behind `Rc`/`Weak`
//! links (`SPEC_FULL.md` section 9): a `VertexId`/`EdgeId` is a plain index,
//! so splicing a smoothing shortcut never needs the source's in-place
//! vertex-content swap.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::rc::Rc;
use std::time::Instant;

use ordered_float::OrderedFloat;

use crate::config::PlannerConfig;
use crate::edge::Edge;
use crate::map::Map;
use crate::obstacles::DynamicObstaclesManager;
use crate::ribbon::RibbonManager;
use crate::sampler::Sampler;
use crate::state::State;
use crate::vertex::{Coverage, EdgeId, Vertex, VertexId};

/// What a single curve-walk produced: the accumulated cost, whether a static
/// collision made it infeasible, and the coverage/time the end vertex
/// inherits. `end_time` is `start.time + dubins_length / max_speed`, not the
/// last sampled arc length -- the walk's step size need not evenly divide the
/// curve's length.
struct WalkResult {
    true_cost: f64,
    infeasible: bool,
    end_coverage: Coverage,
    end_time: f64,
}

/// Walks `dubins`'s curve at `config.dubins_increment` arc-length steps from
/// `start` (whose coverage is `start_coverage`), accounting static collision,
/// dynamic collision and coverage credit exactly as `SPEC_FULL.md` section
/// 4.2 describes. `obstacles` is consumed as a scratch copy: its
/// `project_all` mutation is cumulative and only valid for this one walk.
/// After the walk, `end.time` is set from the curve's true length rather than
/// the last sampled step, matching the source's `Edge.cpp`.
fn walk_edge_cost(
    start: &State,
    start_coverage: &Coverage,
    dubins: &dubins_core::DubinsPath,
    map: &dyn Map,
    mut obstacles: DynamicObstaclesManager,
    config: &PlannerConfig,
) -> WalkResult {
    let increment = config.dubins_increment;
    let length = dubins.length();

    let mut static_credit = 0.0;
    let mut dynamic_credit = 0.0;
    let mut to_cover_credit = 0.0;
    let mut collision_penalty_total = 0.0;
    let mut infeasible = false;
    let mut previous_heading: Option<f64> = None;
    let mut newly_covered: Vec<(f64, f64)> = Vec::new();

    let mut ribbons_snapshot: Rc<RibbonManager> = match start_coverage {
        Coverage::Ribbons(r) => Rc::clone(r),
        Coverage::Points(_) => Rc::new(RibbonManager::default()),
    };

    obstacles.project_all(start.time);
    let mut s = 0.0;

    while s <= length {
        let q = dubins.sample(s);
        let heading = std::f64::consts::FRAC_PI_2 - q[2];
        let t = start.time + s / config.max_speed;
        obstacles.project_all(t);

        if static_credit > increment {
            static_credit -= increment;
        } else {
            static_credit = map.unblocked_distance(q[0], q[1]);
            if static_credit <= increment {
                collision_penalty_total += config.collision_penalty;
                infeasible = true;
                break;
            }
        }

        if dynamic_credit > increment {
            dynamic_credit -= increment;
        } else {
            dynamic_credit = obstacles.nearest_distance_at_current_pose(q[0], q[1], start.speed);
            if dynamic_credit <= increment {
                let count = obstacles.collision_count_at_current_pose(q[0], q[1], false);
                collision_penalty_total += count as f64 * config.collision_penalty;
            }
        }

        match start_coverage {
            Coverage::Ribbons(_) => {
                if to_cover_credit > increment {
                    to_cover_credit -= increment;
                } else {
                    to_cover_credit = ribbons_snapshot.min_distance_from(q[0], q[1]);
                    let is_straight = previous_heading.is_some_and(|prev| (prev - heading).abs() < 1e-9);
                    if is_straight {
                        Rc::make_mut(&mut ribbons_snapshot).cover(q[0], q[1], heading);
                    }
                }
            }
            Coverage::Points(points) => {
                if to_cover_credit > increment {
                    to_cover_credit -= increment;
                } else {
                    let mut nearest = f64::MAX;
                    let mut nearest_point = None;
                    for &(px, py) in points.iter() {
                        if newly_covered.contains(&(px, py)) {
                            continue;
                        }
                        let d = (px - q[0]).hypot(py - q[1]);
                        if d < nearest {
                            nearest = d;
                            nearest_point = Some((px, py));
                        }
                    }
                    to_cover_credit = (nearest - config.coverage_threshold).max(0.0);
                    if nearest <= config.coverage_threshold {
                        if let Some(p) = nearest_point {
                            newly_covered.push(p);
                        }
                    }
                }
            }
        }

        previous_heading = Some(heading);
        s += increment;
    }

    let end_coverage = match start_coverage {
        Coverage::Ribbons(_) => Coverage::Ribbons(ribbons_snapshot),
        Coverage::Points(points) => {
            let remaining: Vec<(f64, f64)> = points.iter().copied().filter(|p| !newly_covered.contains(p)).collect();
            Coverage::Points(Rc::new(remaining))
        }
    };

    let end_time = start.time + length / config.max_speed;
    let true_cost = (end_time - start.time) * config.time_penalty + collision_penalty_total;
    WalkResult { true_cost, infeasible, end_coverage, end_time }
}

/// Coarse quantisation bucket used for the closed-set domination check: two
/// children landing in the same bucket are treated as "the same place" for
/// the purpose of discarding the more expensive one.
fn pose_bucket(x: f64, y: f64, heading: f64) -> (i64, i64, i64) {
    const CELL: f64 = 1.0;
    const HEADING_CELL: f64 = 0.2;
    ((x / CELL).round() as i64, (y / CELL).round() as i64, (heading / HEADING_CELL).round() as i64)
}

type OpenKey = (Reverse<OrderedFloat<f64>>, OrderedFloat<f64>, VertexId);

/// Outcome of a single `Search::run` call.
pub struct SearchOutcome {
    pub vertex_id: VertexId,
    pub reached_goal: bool,
}

/// Owns the vertex/edge arenas for one planning call and runs the A* loop
/// over them (`SPEC_FULL.md` section 4.5 and 9).
pub struct Search {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    config: PlannerConfig,
}

impl Search {
    pub fn new(root_state: State, root_coverage: Coverage, config: PlannerConfig) -> Self {
        let h = heuristic(&root_coverage, root_state.x, root_state.y, &config);
        let mut root = Vertex::root(root_state, root_coverage);
        root.h = h;
        Self { vertices: vec![root], edges: Vec::new(), config }
    }

    pub fn root_id(&self) -> VertexId {
        VertexId(0)
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.0]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    /// Reconstructs the root-to-`vertex_id` chain of edges, oldest first.
    pub fn path_to(&self, vertex_id: VertexId) -> Vec<EdgeId> {
        let mut edges = Vec::new();
        let mut cursor = vertex_id;
        while let Some(edge_id) = self.vertices[cursor.0].parent_edge {
            edges.push(edge_id);
            cursor = self.edges[edge_id.0].start;
        }
        edges.reverse();
        edges
    }

    fn push_vertex(&mut self, vertex: Vertex) -> VertexId {
        self.vertices.push(vertex);
        VertexId(self.vertices.len() - 1)
    }

    fn push_edge(&mut self, edge: Edge) -> EdgeId {
        self.edges.push(edge);
        EdgeId(self.edges.len() - 1)
    }

    fn open_key(&self, id: VertexId) -> OpenKey {
        let v = &self.vertices[id.0];
        (Reverse(OrderedFloat(v.f())), OrderedFloat(v.g), id)
    }

    /// Runs A* to completion: goal found, deadline reached, or open set
    /// exhausted, in that priority order (`SPEC_FULL.md` section 4.5).
    pub fn run(
        &mut self,
        map: &dyn Map,
        obstacles: &DynamicObstaclesManager,
        sampler: &mut Sampler,
        deadline: Instant,
    ) -> SearchOutcome {
        let root_id = self.root_id();
        if self.vertices[root_id.0].coverage.is_done() {
            return SearchOutcome { vertex_id: root_id, reached_goal: true };
        }

        let mut open: BinaryHeap<OpenKey> = BinaryHeap::new();
        let mut closed: HashSet<VertexId> = HashSet::new();
        let mut best_bucket_g: HashMap<(i64, i64, i64), f64> = HashMap::new();
        let mut best_known_complete_cost = f64::INFINITY;
        let mut best_partial = root_id;
        let mut best_partial_h = self.vertices[root_id.0].h;

        open.push(self.open_key(root_id));

        loop {
            let Some((_, _, vertex_id)) = open.pop() else {
                log::debug!("search exhausted the open set, returning the best partial plan");
                return SearchOutcome { vertex_id: best_partial, reached_goal: false };
            };
            if !closed.insert(vertex_id) {
                continue;
            }

            if self.vertices[vertex_id.0].h < best_partial_h {
                best_partial_h = self.vertices[vertex_id.0].h;
                best_partial = vertex_id;
            }

            if self.vertices[vertex_id.0].coverage.is_done() {
                return SearchOutcome { vertex_id, reached_goal: true };
            }

            let time_remaining = deadline.saturating_duration_since(Instant::now()).as_secs_f64();
            let children = self.expand(vertex_id, map, obstacles, sampler, &mut best_known_complete_cost, time_remaining);

            for child_id in children {
                let v = &self.vertices[child_id.0];
                let bucket = pose_bucket(v.state.x, v.state.y, v.state.heading());
                let dominated = best_bucket_g.get(&bucket).is_some_and(|&g| g <= v.g);
                if dominated {
                    continue;
                }
                best_bucket_g.insert(bucket, v.g);
                open.push(self.open_key(child_id));
            }

            self.attempt_smoothing(vertex_id, map, obstacles);

            if Instant::now() >= deadline {
                // Prefer the best child just created over the vertex we were
                // expanding: the anytime guarantee is that a plan exists once
                // the root has been expanded once, not that the root itself
                // is a usable plan.
                let candidate = open.peek().map(|(_, _, id)| *id).unwrap_or(vertex_id);
                log::debug!("search reached its deadline while expanding vertex {vertex_id:?}");
                return SearchOutcome { vertex_id: candidate, reached_goal: false };
            }
        }
    }

    /// Samples children of `vertex_id`, builds an edge to each, computes its
    /// cost, and returns the newly created vertex ids (`SPEC_FULL.md` section
    /// 4.5 steps 1-3).
    fn expand(
        &mut self,
        vertex_id: VertexId,
        map: &dyn Map,
        obstacles: &DynamicObstaclesManager,
        sampler: &mut Sampler,
        best_known_complete_cost: &mut f64,
        time_remaining: f64,
    ) -> Vec<VertexId> {
        let (start_state, start_coverage, start_g, use_ribbons) = {
            let v = &self.vertices[vertex_id.0];
            (v.state, v.coverage.clone(), v.g, matches!(v.coverage, Coverage::Ribbons(_)))
        };

        let samples =
            sampler.sample_children(&start_state, &start_coverage, &self.config, self.config.initial_samples, time_remaining);
        let mut created = Vec::with_capacity(samples.len());

        for child_state in samples {
            let dubins = match dubins_core::DubinsPath::shortest(
                [start_state.x, start_state.y, start_state.yaw()],
                [child_state.x, child_state.y, child_state.yaw()],
                self.config.max_turning_radius,
            ) {
                Ok(p) => p,
                Err(e) => {
                    log::warn!("dubins geometry failed for a sampled child: {e}");
                    continue;
                }
            };

            let approx_cost = dubins.length() / self.config.max_speed * self.config.time_penalty;
            if start_g + approx_cost > *best_known_complete_cost {
                continue;
            }

            let mut edge = Edge::new(vertex_id, VertexId(self.vertices.len()), dubins, use_ribbons);
            edge.set_approx_cost(approx_cost);

            let walk = walk_edge_cost(&start_state, &start_coverage, &edge.dubins_path, map, obstacles.clone(), &self.config);
            edge.set_true_cost(walk.true_cost);
            edge.infeasible = walk.infeasible;

            let g = start_g + walk.true_cost;
            let end_state = State::new(child_state.x, child_state.y, child_state.heading(), self.config.max_speed, walk.end_time);
            let h = heuristic(&walk.end_coverage, end_state.x, end_state.y, &self.config);

            if walk.end_coverage.is_done() {
                *best_known_complete_cost = best_known_complete_cost.min(g);
            }

            let edge_id = self.push_edge(edge);
            let child = Vertex::child(end_state, edge_id, walk.end_coverage, g, h);
            created.push(self.push_vertex(child));
        }

        created
    }

    /// Shortens `vertex_id`'s parent chain by one hop when a direct Dubins
    /// curve from its grandparent is both cheaper and no worse a position to
    /// search onward from (`SPEC_FULL.md` section 4.5 step 5 and section 9).
    /// Splices the shortcut in by appending a new edge and repointing
    /// `vertex_id`'s own parent edge at it -- `vertex_id` keeps its identity,
    /// so any already-sampled children referencing it as their edge's start
    /// stay valid.
    fn attempt_smoothing(&mut self, vertex_id: VertexId, map: &dyn Map, obstacles: &DynamicObstaclesManager) {
        let Some(parent_edge_id) = self.vertices[vertex_id.0].parent_edge else { return };
        let parent_id = self.edges[parent_edge_id.0].start;
        let Some(grandparent_edge_id) = self.vertices[parent_id.0].parent_edge else { return };
        let grandparent_id = self.edges[grandparent_edge_id.0].start;

        let grandparent_state = self.vertices[grandparent_id.0].state;
        let grandparent_coverage = self.vertices[grandparent_id.0].coverage.clone();
        let grandparent_g = self.vertices[grandparent_id.0].g;
        let v_state = self.vertices[vertex_id.0].state;
        let v_h = self.vertices[vertex_id.0].h;
        let use_ribbons = matches!(grandparent_coverage, Coverage::Ribbons(_));

        let dubins = match dubins_core::DubinsPath::shortest(
            [grandparent_state.x, grandparent_state.y, grandparent_state.yaw()],
            [v_state.x, v_state.y, v_state.yaw()],
            self.config.max_turning_radius,
        ) {
            Ok(p) => p,
            Err(_) => return,
        };

        let walk = walk_edge_cost(&grandparent_state, &grandparent_coverage, &dubins, map, obstacles.clone(), &self.config);
        let new_h = heuristic(&walk.end_coverage, v_state.x, v_state.y, &self.config);
        let old_total = self.edges[grandparent_edge_id.0].true_cost() + self.edges[parent_edge_id.0].true_cost();

        if walk.true_cost < old_total && new_h <= v_h {
            let approx_cost = dubins.length() / self.config.max_speed * self.config.time_penalty;
            let mut shortcut = Edge::new(grandparent_id, vertex_id, dubins, use_ribbons);
            shortcut.set_approx_cost(approx_cost);
            shortcut.set_true_cost(walk.true_cost);
            shortcut.infeasible = walk.infeasible;
            let shortcut_id = self.push_edge(shortcut);

            let vertex = &mut self.vertices[vertex_id.0];
            vertex.parent_edge = Some(shortcut_id);
            vertex.g = grandparent_g + walk.true_cost;
            vertex.h = new_h;
            vertex.coverage = walk.end_coverage;
            vertex.state.time = walk.end_time;
            log::debug!("smoothed vertex {vertex_id:?} directly onto its grandparent");
        }
    }
}

/// Admissible cost-to-go estimate: Dubins length can never be less than the
/// straight-line distance to the nearest uncovered entity.
fn heuristic(coverage: &Coverage, x: f64, y: f64, config: &PlannerConfig) -> f64 {
    let d = coverage.min_distance_from(x, y);
    if d == f64::MAX {
        0.0
    } else {
        d / config.max_speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::map::OpenMap;
    use crate::ribbon::Ribbon;

    fn ribbon_coverage(ribbons: Vec<Ribbon>) -> Coverage {
        Coverage::Ribbons(Rc::new(RibbonManager::new(ribbons)))
    }

    #[test]
    fn root_already_covering_returns_immediately() {
        let config = PlannerConfig::default();
        let root_state = State::new(0.0, 0.0, 0.0, config.max_speed, 0.0);
        let mut search = Search::new(root_state, ribbon_coverage(vec![]), config);
        let mut sampler = Sampler::new(config.seed);
        let outcome = search.run(&OpenMap, &DynamicObstaclesManager::new(), &mut sampler, Instant::now());
        assert!(outcome.reached_goal);
        assert_eq!(outcome.vertex_id, search.root_id());
        assert!(search.path_to(outcome.vertex_id).is_empty());
    }

    #[test]
    fn search_reaches_goal_on_a_single_short_ribbon() {
        let config = PlannerConfig::default();
        let root_state = State::new(0.0, 0.0, 0.0, config.max_speed, 0.0);
        let coverage = ribbon_coverage(vec![Ribbon::new((0.0, 0.0), (0.0, 5.0))]);
        let mut search = Search::new(root_state, coverage, config);
        let mut sampler = Sampler::new(config.seed);
        let deadline = Instant::now() + std::time::Duration::from_secs(5);
        let outcome = search.run(&OpenMap, &DynamicObstaclesManager::new(), &mut sampler, deadline);

        let path = search.path_to(outcome.vertex_id);
        assert!(!path.is_empty());
        let final_vertex = search.vertex(outcome.vertex_id);
        assert!(final_vertex.coverage.is_done() || !outcome.reached_goal);
    }

    #[test]
    fn a_too_short_deadline_still_returns_a_partial_vertex() {
        let config = PlannerConfig::default();
        let root_state = State::new(0.0, 0.0, 0.0, config.max_speed, 0.0);
        let coverage = ribbon_coverage(vec![Ribbon::new((0.0, 0.0), (0.0, 1000.0))]);
        let mut search = Search::new(root_state, coverage, config);
        let mut sampler = Sampler::new(config.seed);
        // already elapsed: forces an immediate deadline return right after
        // the root's one guaranteed expansion
        let deadline = Instant::now();
        let outcome = search.run(&OpenMap, &DynamicObstaclesManager::new(), &mut sampler, deadline);
        assert!(!outcome.reached_goal);
        assert!(!search.path_to(outcome.vertex_id).is_empty(), "anytime guarantee: root's expansion must yield a usable partial path");
    }
}
