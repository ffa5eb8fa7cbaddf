//! Shortest Dubins path between two oriented poses under a bounded turning radius.
//!
//! Poses use the ordinary mathematical convention (`theta` measured
//! counter-clockwise from the `+x` axis, `atan2` compatible). Callers working in
//! the maritime heading convention (see `ribbon_planner::state`) convert at the
//! boundary via `yaw = PI / 2 - heading`.
//!
//! This mirrors the classic six-path-family construction (`LSL`, `LSR`, `RSL`,
//! `RSR`, `RLR`, `LRL`) used by the reference C `dubins.h`/`dubins_shortest_path`
//! API: a `DubinsPath` is built once and then sampled repeatedly by arc length.

use std::f64::consts::PI;

const TAU: f64 = 2.0 * PI;

#[derive(Debug, thiserror::Error)]
pub enum DubinsError {
    #[error("no feasible Dubins path exists between the given poses for this turning radius")]
    NoPathFound,
    #[error("turning radius must be positive, got {0}")]
    InvalidRadius(f64),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SegmentType {
    Left,
    Straight,
    Right,
}

use SegmentType::{Left, Right, Straight};

#[derive(Copy, Clone, Debug)]
struct PathWord {
    types: [SegmentType; 3],
    params: [f64; 3],
}

fn mod2pi(angle: f64) -> f64 {
    let v = angle % TAU;
    if v < 0.0 {
        v + TAU
    } else {
        v
    }
}

struct Intermediates {
    alpha: f64,
    beta: f64,
    d: f64,
    sa: f64,
    sb: f64,
    ca: f64,
    cb: f64,
    c_ab: f64,
}

fn lsl(im: &Intermediates) -> Option<PathWord> {
    let p_sq = 2.0 + im.d * im.d - 2.0 * im.c_ab + 2.0 * im.d * (im.sa - im.sb);
    if p_sq < 0.0 {
        return None;
    }
    let tmp = (im.cb - im.ca).atan2(im.d + im.sa - im.sb);
    let t = mod2pi(tmp - im.alpha);
    let p = p_sq.sqrt();
    let q = mod2pi(im.beta - tmp);
    Some(PathWord { types: [Left, Straight, Left], params: [t, p, q] })
}

fn rsr(im: &Intermediates) -> Option<PathWord> {
    let p_sq = 2.0 + im.d * im.d - 2.0 * im.c_ab + 2.0 * im.d * (im.sb - im.sa);
    if p_sq < 0.0 {
        return None;
    }
    let tmp = (im.ca - im.cb).atan2(im.d - im.sa + im.sb);
    let t = mod2pi(im.alpha - tmp);
    let p = p_sq.sqrt();
    let q = mod2pi(tmp - im.beta);
    Some(PathWord { types: [Right, Straight, Right], params: [t, p, q] })
}

fn lsr(im: &Intermediates) -> Option<PathWord> {
    let p_sq = -2.0 + im.d * im.d + 2.0 * im.c_ab + 2.0 * im.d * (im.sa + im.sb);
    if p_sq < 0.0 {
        return None;
    }
    let p = p_sq.sqrt();
    let tmp = (-im.ca - im.cb).atan2(im.d + im.sa + im.sb) - (-2.0f64).atan2(p);
    let t = mod2pi(tmp - im.alpha);
    let q = mod2pi(tmp - mod2pi(im.beta));
    Some(PathWord { types: [Left, Straight, Right], params: [t, p, q] })
}

fn rsl(im: &Intermediates) -> Option<PathWord> {
    let p_sq = im.d * im.d - 2.0 + 2.0 * im.c_ab - 2.0 * im.d * (im.sa + im.sb);
    if p_sq < 0.0 {
        return None;
    }
    let p = p_sq.sqrt();
    let tmp = (im.ca + im.cb).atan2(im.d - im.sa - im.sb) - 2.0f64.atan2(p);
    let t = mod2pi(im.alpha - tmp);
    let q = mod2pi(im.beta - tmp);
    Some(PathWord { types: [Right, Straight, Left], params: [t, p, q] })
}

fn rlr(im: &Intermediates) -> Option<PathWord> {
    let tmp = (6.0 - im.d * im.d + 2.0 * im.c_ab + 2.0 * im.d * (im.sa - im.sb)) / 8.0;
    if tmp.abs() > 1.0 {
        return None;
    }
    let p = mod2pi(TAU - tmp.acos());
    let t = mod2pi(im.alpha - (im.ca - im.cb).atan2(im.d - im.sa + im.sb) + p / 2.0);
    let q = mod2pi(im.alpha - im.beta - t + p);
    Some(PathWord { types: [Right, Left, Right], params: [t, p, q] })
}

fn lrl(im: &Intermediates) -> Option<PathWord> {
    let tmp = (6.0 - im.d * im.d + 2.0 * im.c_ab + 2.0 * im.d * (im.sb - im.sa)) / 8.0;
    if tmp.abs() > 1.0 {
        return None;
    }
    let p = mod2pi(TAU - tmp.acos());
    let t = mod2pi(-im.alpha - (im.ca - im.cb).atan2(im.d + im.sa - im.sb) + p / 2.0);
    let q = mod2pi(mod2pi(im.beta) - im.alpha - t + p);
    Some(PathWord { types: [Left, Right, Left], params: [t, p, q] })
}

/// The shortest curve between two oriented poses under a minimum turning radius.
///
/// Construction picks the cheapest of the six canonical path words (`LSL`,
/// `RSR`, `LSR`, `RSL`, `RLR`, `LRL`); not all six are feasible for every pair
/// of poses, but at least one always is.
#[derive(Clone, Debug)]
pub struct DubinsPath {
    qi: [f64; 3],
    rho: f64,
    word: PathWord,
}

impl DubinsPath {
    /// `q0`/`q1` are `[x, y, theta]`; `theta` follows the mathematical
    /// convention (counter-clockwise from `+x`). `rho` is the minimum turning
    /// radius and must be positive.
    pub fn shortest(q0: [f64; 3], q1: [f64; 3], rho: f64) -> Result<Self, DubinsError> {
        if !(rho > 0.0) {
            return Err(DubinsError::InvalidRadius(rho));
        }
        let dx = q1[0] - q0[0];
        let dy = q1[1] - q0[1];
        let d = (dx * dx + dy * dy).sqrt() / rho;
        let theta = mod2pi(dy.atan2(dx));
        let alpha = mod2pi(q0[2] - theta);
        let beta = mod2pi(q1[2] - theta);
        let (sa, ca) = (alpha.sin(), alpha.cos());
        let (sb, cb) = (beta.sin(), beta.cos());
        let c_ab = (alpha - beta).cos();
        let im = Intermediates { alpha, beta, d, sa, sb, ca, cb, c_ab };

        let word = [lsl(&im), rsr(&im), lsr(&im), rsl(&im), rlr(&im), lrl(&im)]
            .into_iter()
            .flatten()
            .min_by(|a, b| {
                let la = a.params.iter().sum::<f64>();
                let lb = b.params.iter().sum::<f64>();
                la.partial_cmp(&lb).unwrap_or(std::cmp::Ordering::Equal)
            })
            .ok_or(DubinsError::NoPathFound)?;

        Ok(Self { qi: q0, rho, word })
    }

    /// Total arc length of the path, in the same units as `q0`/`q1`.
    pub fn length(&self) -> f64 {
        self.word.params.iter().sum::<f64>() * self.rho
    }

    /// Sample the pose `[x, y, theta]` at arc length `s` along the path.
    /// `s` is clamped to `[0, length()]`.
    pub fn sample(&self, s: f64) -> [f64; 3] {
        let s = s.clamp(0.0, self.length());
        let t_norm = s / self.rho;
        let p1 = self.word.params[0];
        let p2 = self.word.params[1];

        if t_norm < p1 {
            Self::segment_end(self.qi, t_norm, self.word.types[0], self.rho)
        } else {
            let qi1 = Self::segment_end(self.qi, p1, self.word.types[0], self.rho);
            if t_norm < p1 + p2 {
                Self::segment_end(qi1, t_norm - p1, self.word.types[1], self.rho)
            } else {
                let qi2 = Self::segment_end(qi1, p2, self.word.types[1], self.rho);
                Self::segment_end(qi2, t_norm - p1 - p2, self.word.types[2], self.rho)
            }
        }
    }

    fn segment_end(qi: [f64; 3], t: f64, seg_type: SegmentType, rho: f64) -> [f64; 3] {
        match seg_type {
            Left => [
                qi[0] + rho * ((qi[2] + t).sin() - qi[2].sin()),
                qi[1] + rho * (-(qi[2] + t).cos() + qi[2].cos()),
                qi[2] + t,
            ],
            Right => [
                qi[0] + rho * (-(qi[2] - t).sin() + qi[2].sin()),
                qi[1] + rho * ((qi[2] - t).cos() - qi[2].cos()),
                qi[2] - t,
            ],
            Straight => [qi[0] + rho * qi[2].cos() * t, qi[1] + rho * qi[2].sin() * t, qi[2]],
        }
    }
}
