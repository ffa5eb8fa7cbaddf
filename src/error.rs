//! Error kinds surfaced by the core (see `SPEC_FULL.md` section 7).
//!
//! Geometric failures and configuration-loading failures are recoverable and
//! returned as `PlannerError`; reading an uncomputed cached cost or computing
//! cost between co-located endpoints are programming errors and panic
//! instead, matching the source's `std::logic_error`/`std::runtime_error`.

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("Dubins geometry failure: {0}")]
    Geometric(#[from] dubins_core::DubinsError),

    #[error("failed to load planner configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("visualizer sink I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PlannerError>;

/// Panics with a message identifying this as an upstream programming error
/// rather than a recoverable failure -- mirrors the source's
/// `std::logic_error` for "fetching unset cached edge cost".
#[track_caller]
pub fn fatal_logic_error(message: &str) -> ! {
    panic!("programming error: {message}");
}
