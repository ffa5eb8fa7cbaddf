//! Time-projected moving bounding boxes (`SPEC_FULL.md` section 4.7),
//! grounded on the source's `BinaryDynamicObstaclesManager`.

use std::collections::{HashMap, HashSet};

use nalgebra::{Point2, Rotation2};

/// A moving, oriented bounding box tracked by AIS mmsi.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    pub mmsi: u32,
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub speed: f64,
    pub time: f64,
    pub width: f64,
    pub length: f64,
}

impl Obstacle {
    /// Advances the centre along `heading` at `speed` to `t`, updating the
    /// stored timestamp. Only ever called on a scratch clone during a single
    /// edge walk (`SPEC_FULL.md` section 9) -- never on the planner's shared
    /// snapshot.
    pub fn project(&mut self, t: f64) {
        let dt = t - self.time;
        self.x += self.heading.sin() * self.speed * dt;
        self.y += self.heading.cos() * self.speed * dt;
        self.time = t;
    }

    /// Whether `(x, y)` falls inside this obstacle's box once projected to
    /// `t`. `strict` inflates width/length by 2 on a local copy only.
    fn contains(&self, x: f64, y: f64, t: f64, strict: bool) -> bool {
        let mut projected = *self;
        projected.project(t);
        projected.contains_at_current_pose(x, y, strict)
    }

    /// Whether `(x, y)` falls inside this obstacle's box at its *currently
    /// stored* pose, with no projection. Used by the edge-cost walk, which
    /// keeps a scratch manager's obstacles projected cumulatively instead of
    /// re-projecting from scratch on every sample.
    fn contains_at_current_pose(&self, x: f64, y: f64, strict: bool) -> bool {
        let (width, length) = if strict { (self.width + 2.0, self.length + 2.0) } else { (self.width, self.length) };

        let centred = Point2::new(x - self.x, y - self.y);
        // rotate the query point into the obstacle's body frame
        let body_frame = Rotation2::new(self.heading) * centred;
        body_frame.x.abs() < length / 2.0 && body_frame.y.abs() < width / 2.0
    }
}

/// The shared, time-varying set of moving obstacles for a single plan call.
#[derive(Clone, Debug, Default)]
pub struct DynamicObstaclesManager {
    obstacles: HashMap<u32, Obstacle>,
    ignored: HashSet<u32>,
}

impl DynamicObstaclesManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore(&mut self, mmsi: u32) {
        self.ignored.insert(mmsi);
        self.obstacles.remove(&mmsi);
    }

    fn is_ignored(&self, mmsi: u32) -> bool {
        self.ignored.contains(&mmsi)
    }

    /// Inserts or replaces the obstacle keyed by `mmsi`. A no-op if `mmsi` is
    /// on the ignore set.
    pub fn update(&mut self, mmsi: u32, x: f64, y: f64, heading: f64, speed: f64, time: f64, width: f64, length: f64) {
        if self.is_ignored(mmsi) {
            log::debug!("ignoring update for mmsi {mmsi}, it is on the ignore set");
            return;
        }
        self.obstacles.insert(mmsi, Obstacle { mmsi, x, y, heading, speed, time, width, length });
    }

    pub fn forget(&mut self, mmsi: u32) {
        self.obstacles.remove(&mmsi);
    }

    pub fn get(&self) -> &HashMap<u32, Obstacle> {
        &self.obstacles
    }

    /// Count of obstacles whose projected box contains `(x, y)` at time `t`.
    /// Not a boolean: overlapping obstacles stack.
    pub fn collision_exists(&self, x: f64, y: f64, t: f64, strict: bool) -> u32 {
        self.obstacles.values().filter(|o| o.contains(x, y, t, strict)).count() as u32
    }

    /// Conservative distance below which a collision check becomes worth
    /// paying for: the nearest obstacle's centre distance at `t`, minus a
    /// margin proportional to the querying vehicle's speed, floored at 0.
    pub fn distance_to_nearest_possible_collision(&self, x: f64, y: f64, query_speed: f64, t: f64) -> f64 {
        let margin = query_speed.max(1.0);
        self.obstacles
            .values()
            .map(|o| {
                let mut projected = *o;
                projected.project(t);
                let half_extent = (projected.width.max(projected.length)) / 2.0;
                (projected.x - x).hypot(projected.y - y) - half_extent - margin
            })
            .fold(f64::MAX, f64::min)
            .max(0.0)
    }

    /// Advances every stored obstacle to `t` in place (`SPEC_FULL.md` section
    /// 4.7). Only ever called on a per-walk scratch clone of the manager --
    /// never on the planner's shared snapshot -- and only safe because a
    /// single edge walk visits samples in strictly increasing time.
    pub(crate) fn project_all(&mut self, t: f64) {
        for obstacle in self.obstacles.values_mut() {
            obstacle.project(t);
        }
    }

    /// Like [`Self::collision_exists`], but assumes the obstacles are already
    /// projected to the query time (see [`Self::project_all`]).
    pub(crate) fn collision_count_at_current_pose(&self, x: f64, y: f64, strict: bool) -> u32 {
        self.obstacles.values().filter(|o| o.contains_at_current_pose(x, y, strict)).count() as u32
    }

    /// Like [`Self::distance_to_nearest_possible_collision`], but assumes the
    /// obstacles are already projected to the query time.
    pub(crate) fn nearest_distance_at_current_pose(&self, x: f64, y: f64, query_speed: f64) -> f64 {
        let margin = query_speed.max(1.0);
        self.obstacles
            .values()
            .map(|o| {
                let half_extent = o.width.max(o.length) / 2.0;
                (o.x - x).hypot(o.y - y) - half_extent - margin
            })
            .fold(f64::MAX, f64::min)
            .max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_then_get_reflects_latest_values() {
        let mut mgr = DynamicObstaclesManager::new();
        mgr.update(1, 10.0, 20.0, 0.0, 1.0, 0.0, 4.0, 10.0);
        let o = mgr.get()[&1];
        assert_eq!(o.x, 10.0);
        assert_eq!(o.y, 20.0);

        mgr.update(1, 11.0, 21.0, 0.0, 1.0, 0.0, 4.0, 10.0);
        assert_eq!(mgr.get()[&1].x, 11.0);
    }

    #[test]
    fn forget_removes_the_obstacle() {
        let mut mgr = DynamicObstaclesManager::new();
        mgr.update(1, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0);
        mgr.forget(1);
        assert!(!mgr.get().contains_key(&1));
    }

    #[test]
    fn update_on_ignored_mmsi_is_noop() {
        let mut mgr = DynamicObstaclesManager::new();
        mgr.ignore(7);
        mgr.update(7, 1.0, 2.0, 0.0, 0.0, 0.0, 1.0, 1.0);
        assert!(!mgr.get().contains_key(&7));
    }

    #[test]
    fn collision_exists_counts_overlapping_obstacles() {
        let mut mgr = DynamicObstaclesManager::new();
        mgr.update(1, 0.0, 0.0, 0.0, 0.0, 0.0, 4.0, 4.0);
        mgr.update(2, 0.0, 0.0, 0.0, 0.0, 0.0, 4.0, 4.0);
        assert_eq!(mgr.collision_exists(0.0, 0.0, 0.0, false), 2);
    }

    #[test]
    fn strict_inflation_never_shrinks_the_collision_count() {
        let mut mgr = DynamicObstaclesManager::new();
        mgr.update(1, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 2.0);
        let loose = mgr.collision_exists(1.2, 1.2, 0.0, false);
        let strict = mgr.collision_exists(1.2, 1.2, 0.0, true);
        assert!(strict >= loose);
    }

    #[test]
    fn strict_inflation_does_not_mutate_stored_obstacle() {
        let mut mgr = DynamicObstaclesManager::new();
        mgr.update(1, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 2.0);
        let before = mgr.get()[&1];
        let _ = mgr.collision_exists(1.2, 1.2, 0.0, true);
        let _ = mgr.collision_exists(1.2, 1.2, 0.0, true);
        assert_eq!(mgr.get()[&1], before);
    }

    #[test]
    fn obstacle_crossing_path_is_detected_per_spec_scenario() {
        let mut mgr = DynamicObstaclesManager::new();
        // crosses (0, 50) at t=50 moving along heading 0 (+y) at speed 1,
        // starting far down-track at t=0
        mgr.update(1, 0.0, 0.0, 0.0, 1.0, 0.0, 4.0, 10.0);
        assert!(mgr.collision_exists(0.0, 50.0, 50.0, false) >= 1);
    }
}
