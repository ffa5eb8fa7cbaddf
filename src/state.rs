//! Pose, speed and time tuple, plus the kinematic operations the search and
//! cost-computation layers build on.
//!
//! Headings follow the maritime convention (`0 = +y axis`, clockwise-positive),
//! matching the trajectories this planner hands off to the vehicle's
//! trajectory follower. `yaw()` exposes the mathematical convention
//! (counter-clockwise from `+x`) only where an external primitive (the Dubins
//! curve construction) needs it.

use std::f64::consts::PI;

const TWO_PI: f64 = 2.0 * PI;

fn normalize_heading(h: f64) -> f64 {
    let h = h % TWO_PI;
    if h < 0.0 {
        h + TWO_PI
    } else {
        h
    }
}

/// A timestamped pose and speed along the vehicle's trajectory.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct State {
    pub x: f64,
    pub y: f64,
    heading: f64,
    pub speed: f64,
    pub time: f64,
}

impl State {
    pub fn new(x: f64, y: f64, heading: f64, speed: f64, time: f64) -> Self {
        assert!(speed >= 0.0, "State speed must be non-negative, got {speed}");
        Self { x, y, heading: normalize_heading(heading), speed, time }
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn set_heading(&mut self, heading: f64) {
        self.heading = normalize_heading(heading);
    }

    /// The mathematical-convention heading (`0` along `+x`, counter-clockwise),
    /// as consumed by `dubins_core`.
    pub fn yaw(&self) -> f64 {
        PI / 2.0 - self.heading
    }

    /// Linear extrapolation forward (or backward, for negative `dt`) by `dt`
    /// seconds at constant heading and speed.
    pub fn push(&self, dt: f64) -> State {
        let displacement = dt * self.speed;
        State {
            x: self.x + self.heading.sin() * displacement,
            y: self.y + self.heading.cos() * displacement,
            heading: self.heading,
            speed: self.speed,
            time: self.time + dt,
        }
    }

    pub fn heading_to(&self, x1: f64, y1: f64) -> f64 {
        let dx = x1 - self.x;
        let dy = y1 - self.y;
        normalize_heading(PI / 2.0 - dy.atan2(dx))
    }

    /// Shortest signed arc from this state's heading to `other_heading`, in
    /// `(-pi, pi]`.
    pub fn heading_difference(&self, other_heading: f64) -> f64 {
        (((other_heading - self.heading) % TWO_PI) + 3.0 * PI) % TWO_PI - PI
    }

    pub fn heading_difference_to(&self, other: &State) -> f64 {
        self.heading_difference(other.heading)
    }

    pub fn distance_to(&self, x1: f64, y1: f64) -> f64 {
        ((self.x - x1).powi(2) + (self.y - y1).powi(2)).sqrt()
    }

    pub fn distance_to_state(&self, other: &State) -> f64 {
        self.distance_to(other.x, other.y)
    }

    pub fn time_until(&self, other: &State) -> f64 {
        other.time - self.time
    }

    /// Compares `(x, y, heading)` only, ignoring speed and time.
    pub fn is_co_located(&self, other: &State) -> bool {
        self.x == other.x && self.y == other.y && self.heading == other.heading
    }

    /// Linearly interpolates position, speed and the shortest-arc heading
    /// change between `self` (at `self.time`) and `other` (at `other.time`)
    /// to the given `desired_time`.
    pub fn interpolate(&self, other: &State, desired_time: f64) -> State {
        let dt_total = other.time - self.time;
        let dx = (other.x - self.x) / dt_total;
        let dy = (other.y - self.y) / dt_total;
        let dh = self.heading_difference_to(other) / dt_total;
        let ds = (other.speed - self.speed) / dt_total;

        let dt = desired_time - self.time;
        State {
            x: self.x + dx * dt,
            y: self.y + dy * dt,
            heading: normalize_heading(self.heading + dh * dt),
            speed: self.speed + ds * dt,
            time: desired_time,
        }
    }

    /// Wire format consumed by trajectory publishers: heading in degrees.
    pub fn to_string_deg(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.x,
            self.y,
            self.heading.to_degrees(),
            self.speed,
            self.time
        )
    }

    /// Same wire format, but heading stays in radians.
    pub fn to_string_rad(&self) -> String {
        format!("{} {} {} {} {}", self.x, self.y, self.heading, self.speed, self.time)
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_deg())
    }
}
