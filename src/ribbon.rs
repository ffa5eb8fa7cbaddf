//! Line-segment coverage accounting ("ribbons" to be mowed). A `RibbonManager`
//! holds the set of ribbons still uncovered from some vertex; `cover` and
//! `min_distance_from` are the two operations the edge-cost walk calls while
//! sampling along a Dubins curve (`SPEC_FULL.md` section 4.2).

/// A directed line segment: `start` to `end`, covered when the vehicle
/// traverses it from `start` towards `end`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ribbon {
    pub start: (f64, f64),
    pub end: (f64, f64),
}

impl Ribbon {
    pub fn new(start: (f64, f64), end: (f64, f64)) -> Self {
        Self { start, end }
    }

    fn length(&self) -> f64 {
        ((self.end.0 - self.start.0).powi(2) + (self.end.1 - self.start.1).powi(2)).sqrt()
    }

    fn heading(&self) -> f64 {
        // maritime convention, matching State::heading_to
        let dx = self.end.0 - self.start.0;
        let dy = self.end.1 - self.start.1;
        let h = std::f64::consts::FRAC_PI_2 - dy.atan2(dx);
        if h < 0.0 {
            h + std::f64::consts::TAU
        } else {
            h
        }
    }

    /// Fraction along the segment `[0, 1]` of the closest point to `(x, y)`,
    /// clamped to the segment's extent.
    fn projection_fraction(&self, x: f64, y: f64) -> f64 {
        let len_sq = (self.end.0 - self.start.0).powi(2) + (self.end.1 - self.start.1).powi(2);
        if len_sq == 0.0 {
            return 0.0;
        }
        let t = ((x - self.start.0) * (self.end.0 - self.start.0)
            + (y - self.start.1) * (self.end.1 - self.start.1))
            / len_sq;
        t.clamp(0.0, 1.0)
    }

    fn distance_from(&self, x: f64, y: f64) -> f64 {
        let t = self.projection_fraction(x, y);
        let px = self.start.0 + t * (self.end.0 - self.start.0);
        let py = self.start.1 + t * (self.end.1 - self.start.1);
        ((px - x).powi(2) + (py - y).powi(2)).sqrt()
    }

    fn point_at(&self, t: f64) -> (f64, f64) {
        (self.start.0 + t * (self.end.0 - self.start.0), self.start.1 + t * (self.end.1 - self.start.1))
    }
}

/// How close a point must fall to a ribbon, and match its heading, to count
/// as "on" it for splitting purposes.
pub const ON_RIBBON_DISTANCE_THRESHOLD: f64 = 0.5;
pub const ON_RIBBON_HEADING_THRESHOLD: f64 = 0.1;

/// The set of ribbons still uncovered. Cloned per-vertex (`SPEC_FULL.md`
/// section 9): clones are cheap `Vec` copies, which is acceptable for the
/// small ribbon counts this planner targets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RibbonManager {
    uncovered: Vec<Ribbon>,
}

impl RibbonManager {
    pub fn new(ribbons: Vec<Ribbon>) -> Self {
        Self { uncovered: ribbons }
    }

    pub fn uncovered(&self) -> &[Ribbon] {
        &self.uncovered
    }

    pub fn is_done(&self) -> bool {
        self.uncovered.is_empty()
    }

    /// Closest distance from `(x, y)` to any remaining ribbon, or `f64::MAX`
    /// if none remain.
    pub fn min_distance_from(&self, x: f64, y: f64) -> f64 {
        self.uncovered
            .iter()
            .map(|r| r.distance_from(x, y))
            .fold(f64::MAX, f64::min)
    }

    /// If `(x, y)` lies on the nearest ribbon within tolerance and the
    /// travelling heading matches that ribbon's direction, splits the covered
    /// prefix off and removes it, leaving only the remaining tail uncovered.
    /// A no-op if no ribbon is close enough or the heading does not match.
    pub fn cover(&mut self, x: f64, y: f64, heading: f64) {
        let Some((idx, t)) = self
            .uncovered
            .iter()
            .enumerate()
            .map(|(i, r)| (i, r.projection_fraction(x, y)))
            .filter(|(i, t)| {
                let r = &self.uncovered[*i];
                r.distance_from(x, y) <= ON_RIBBON_DISTANCE_THRESHOLD
                    && heading_close(r.heading(), heading)
                    && *t > 0.0
            })
            .min_by(|(i1, _), (i2, _)| {
                let d1 = self.uncovered[*i1].distance_from(x, y);
                let d2 = self.uncovered[*i2].distance_from(x, y);
                d1.partial_cmp(&d2).unwrap_or(std::cmp::Ordering::Equal)
            })
        else {
            return;
        };

        let ribbon = self.uncovered[idx];
        if t >= 1.0 {
            self.uncovered.remove(idx);
        } else {
            let split_point = ribbon.point_at(t);
            self.uncovered[idx] = Ribbon::new(split_point, ribbon.end);
        }
    }
}

fn heading_close(a: f64, b: f64) -> bool {
    let diff = (((b - a) % std::f64::consts::TAU) + 3.0 * std::f64::consts::PI) % std::f64::consts::TAU
        - std::f64::consts::PI;
    diff.abs() <= ON_RIBBON_HEADING_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_up() -> Ribbon {
        Ribbon::new((0.0, 0.0), (0.0, 100.0))
    }

    #[test]
    fn min_distance_is_zero_on_the_segment() {
        let rm = RibbonManager::new(vec![straight_up()]);
        assert!(rm.min_distance_from(0.0, 50.0) < 1e-9);
    }

    #[test]
    fn min_distance_is_positive_off_the_segment() {
        let rm = RibbonManager::new(vec![straight_up()]);
        assert!(rm.min_distance_from(10.0, 50.0) > 9.0);
    }

    #[test]
    fn cover_splits_off_the_travelled_prefix() {
        let mut rm = RibbonManager::new(vec![straight_up()]);
        let heading = straight_up().heading();
        rm.cover(0.0, 40.0, heading);
        assert_eq!(rm.uncovered().len(), 1);
        assert_eq!(rm.uncovered()[0].start, (0.0, 40.0));
    }

    #[test]
    fn cover_removes_ribbon_entirely_at_its_end() {
        let mut rm = RibbonManager::new(vec![straight_up()]);
        let heading = straight_up().heading();
        rm.cover(0.0, 100.0, heading);
        assert!(rm.is_done());
    }

    #[test]
    fn cover_is_noop_when_heading_does_not_match() {
        let mut rm = RibbonManager::new(vec![straight_up()]);
        rm.cover(0.0, 40.0, 0.0);
        assert_eq!(rm.uncovered()[0], straight_up());
    }

    #[test]
    fn cover_is_noop_off_segment() {
        let mut rm = RibbonManager::new(vec![straight_up()]);
        let heading = straight_up().heading();
        rm.cover(50.0, 50.0, heading);
        assert_eq!(rm.uncovered()[0], straight_up());
    }
}
