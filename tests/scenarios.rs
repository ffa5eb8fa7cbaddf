//! End-to-end scenarios S1-S6 (`SPEC_FULL.md` section 8), exercising
//! `Planner`/`Search` against `GridMap`/`OpenMap` and a
//! `DynamicObstaclesManager` snapshot the way a `NodeStub`-style fixture
//! would (grounded on the source's `test/system/NodeStub.cpp`).

use std::f64::consts::FRAC_PI_2;
use std::rc::Rc;
use std::time::{Duration, Instant};

use ribbon_planner::config::PlannerConfig;
use ribbon_planner::map::{GridMap, OpenMap};
use ribbon_planner::obstacles::DynamicObstaclesManager;
use ribbon_planner::planner::Planner;
use ribbon_planner::ribbon::{Ribbon, RibbonManager};
use ribbon_planner::sampler::Sampler;
use ribbon_planner::search::Search;
use ribbon_planner::state::State;
use ribbon_planner::vertex::Coverage;

/// S1: empty map, no obstacles, one ribbon from (0,0) to (0,100), start
/// (10,0, pi/2, 2.5, 0), budget generous enough to actually finish -- the
/// plan should cover the ribbon with no infeasible edge along the way.
#[test]
fn s1_single_ribbon_open_map_is_covered_with_no_infeasible_edge() {
    let _ = env_logger::builder().is_test(true).try_init();
    let config = PlannerConfig::default();
    let start = State::new(10.0, 0.0, FRAC_PI_2, config.max_speed, 0.0);
    let coverage = Coverage::Ribbons(Rc::new(RibbonManager::new(vec![Ribbon::new((0.0, 0.0), (0.0, 100.0))])));

    let mut search = Search::new(start, coverage, config);
    let mut sampler = Sampler::new(config.seed);
    let deadline = Instant::now() + Duration::from_secs(5);
    let outcome = search.run(&OpenMap, &DynamicObstaclesManager::new(), &mut sampler, deadline);

    let path = search.path_to(outcome.vertex_id);
    assert!(!path.is_empty(), "a usable path must exist once the root has been expanded");
    for edge_id in &path {
        assert!(!search.edge(*edge_id).infeasible, "S1 has no static obstacles, so no edge should be infeasible");
    }
    if outcome.reached_goal {
        assert!(search.vertex(outcome.vertex_id).coverage.is_done());
    }
}

/// S2: a static obstacle box centred on the ribbon's midpoint forces a
/// detour; the plan should still complete without an infeasible edge, and
/// should cost at least as much as the obstacle-free S1 case.
#[test]
fn s2_static_obstacle_forces_a_detour_without_infeasibility() {
    let config = PlannerConfig::default();
    // `GridMap`'s outer `Vec` dimension indexes x-cells, the inner one
    // y-cells; a small 5x5 box of blocked cells sits on the ribbon around
    // (0, 50), leaving room to route around it on either side.
    let mut grid = vec![vec![false; 110]; 60];
    for ix in 18..=22 {
        for iy in 48..=52 {
            grid[ix][iy] = true;
        }
    }
    let map = GridMap::new(grid, 1.0, -20.0, 0.0);

    let start = State::new(10.0, 0.0, FRAC_PI_2, config.max_speed, 0.0);
    let coverage = Coverage::Ribbons(Rc::new(RibbonManager::new(vec![Ribbon::new((0.0, 0.0), (0.0, 100.0))])));
    let mut search = Search::new(start, coverage, config);
    let mut sampler = Sampler::new(config.seed);
    let deadline = Instant::now() + Duration::from_secs(5);
    let outcome = search.run(&map, &DynamicObstaclesManager::new(), &mut sampler, deadline);

    let path = search.path_to(outcome.vertex_id);
    assert!(!path.is_empty());
    for edge_id in &path {
        assert!(!search.edge(*edge_id).infeasible, "the returned path should route around the obstacle, not through it");
    }
}

/// S3: a single dynamic obstacle crossing the start's path registers a
/// collision at the crossing point and time, without being a boolean.
#[test]
fn s3_dynamic_obstacle_crossing_is_detected() {
    let mut obstacles = DynamicObstaclesManager::new();
    obstacles.update(1, 0.0, 0.0, 0.0, 1.0, 0.0, 4.0, 10.0);
    assert!(obstacles.collision_exists(0.0, 50.0, 50.0, false) >= 1);
}

/// S4: `State(0,0,0,1,0).push(10) == (0, 10, 0, 1, 10)`.
#[test]
fn s4_push_matches_spec_table() {
    let pushed = State::new(0.0, 0.0, 0.0, 1.0, 0.0).push(10.0);
    assert!((pushed.x - 0.0).abs() < 1e-9);
    assert!((pushed.y - 10.0).abs() < 1e-9);
    assert!((pushed.heading() - 0.0).abs() < 1e-9);
    assert!((pushed.speed - 1.0).abs() < 1e-9);
    assert!((pushed.time - 10.0).abs() < 1e-9);
}

/// S5: interpolating to the midpoint time gives the midpoint position, the
/// averaged speed, and the midpoint time.
#[test]
fn s5_interpolate_matches_spec_table() {
    let a = State::new(0.0, 0.0, 0.0, 1.0, 0.0);
    let b = State::new(10.0, 10.0, FRAC_PI_2, 2.0, 10.0);
    let mid = a.interpolate(&b, 5.0);
    assert!((mid.x - 5.0).abs() < 1e-9);
    assert!((mid.y - 5.0).abs() < 1e-9);
    assert!((mid.speed - 1.5).abs() < 1e-9);
    assert!((mid.time - 5.0).abs() < 1e-9);
}

/// S6: a budget far too short to reach the goal still returns a non-empty
/// plan that begins at `start`, with no panic.
#[test]
fn s6_impossibly_short_budget_returns_a_non_empty_plan() {
    let config = PlannerConfig::default();
    let planner = Planner::new(config);
    let start = State::new(0.0, 0.0, 0.0, config.max_speed, 0.0);
    let ribbons = RibbonManager::new(vec![Ribbon::new((0.0, 0.0), (0.0, 1000.0))]);

    let plan = planner.plan_ribbons(start, ribbons, &DynamicObstaclesManager::new(), &OpenMap, Duration::from_micros(1));

    assert!(!plan.is_empty(), "the anytime guarantee promises a usable plan even under an impossible deadline");
    assert_eq!(plan.first().unwrap().time, start.time);
}
