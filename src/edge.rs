//! Connects two vertices by a Dubins curve and caches its approx/true cost
//! (`SPEC_FULL.md` section 4.2). The curve-walking cost computation itself
//! lives on `Search` (`search.rs`), since it needs mutable access to the end
//! vertex's coverage snapshot held in the search's vertex arena; this struct
//! holds the data the source's `Edge` class holds.

use dubins_core::DubinsPath;

use crate::error::fatal_logic_error;
use crate::vertex::VertexId;

#[derive(Clone, Debug)]
pub struct Edge {
    pub start: VertexId,
    pub end: VertexId,
    pub dubins_path: DubinsPath,
    approx_cost: Option<f64>,
    true_cost: Option<f64>,
    pub infeasible: bool,
    pub use_ribbons: bool,
}

impl Edge {
    pub fn new(start: VertexId, end: VertexId, dubins_path: DubinsPath, use_ribbons: bool) -> Self {
        Self { start, end, dubins_path, approx_cost: None, true_cost: None, infeasible: false, use_ribbons }
    }

    pub fn set_approx_cost(&mut self, cost: f64) {
        self.approx_cost = Some(cost);
    }

    pub fn set_true_cost(&mut self, cost: f64) {
        self.true_cost = Some(cost);
    }

    /// Panics if the approximate cost has not yet been computed -- reading an
    /// unset cached cost is a programming error (`SPEC_FULL.md` section 7).
    pub fn approx_cost(&self) -> f64 {
        self.approx_cost
            .unwrap_or_else(|| fatal_logic_error("fetching unset cached approximate edge cost"))
    }

    pub fn approx_cost_if_computed(&self) -> Option<f64> {
        self.approx_cost
    }

    /// Panics if the true cost has not yet been computed.
    pub fn true_cost(&self) -> f64 {
        self.true_cost.unwrap_or_else(|| fatal_logic_error("fetching unset cached true edge cost"))
    }

    pub fn true_cost_if_computed(&self) -> Option<f64> {
        self.true_cost
    }
}
