//! `PlannerConfig` and the layered defaults/file/environment loader built on
//! the `config` crate, the way the teacher's scenario runner treats
//! `Parameters::new()` as the lowest-priority layer with overrides stacked on
//! top (just re-grounded on a file+env source here instead of argv).

use serde::{Deserialize, Serialize};

use crate::sampler::DEFAULT_INITIAL_SAMPLES;

/// Tunable planner parameters. Defaults match the constants named in
/// `SPEC_FULL.md` section 4.2.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlannerConfig {
    pub max_speed: f64,
    pub max_turning_radius: f64,
    pub use_ribbons: bool,
    pub seed: u64,
    pub coverage_threshold: f64,
    pub initial_samples: usize,
    pub collision_penalty: f64,
    pub time_penalty: f64,
    pub dubins_increment: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_speed: 2.5,
            max_turning_radius: 8.0,
            use_ribbons: true,
            seed: 0,
            coverage_threshold: 1.0,
            initial_samples: DEFAULT_INITIAL_SAMPLES,
            collision_penalty: 600.0,
            time_penalty: 1.0,
            dubins_increment: 0.1,
        }
    }
}

/// Loads a `PlannerConfig`, layering compiled-in defaults under an optional
/// `planner.toml` file and `PLANNER_*` environment variable overrides.
pub fn load_settings(config_path: Option<&str>) -> crate::error::Result<PlannerConfig> {
    let defaults = PlannerConfig::default();

    let mut builder = config::Config::builder().add_source(config::Config::try_from(&defaults)?);

    if let Some(path) = config_path {
        builder = builder.add_source(config::File::with_name(path).required(false));
    }
    builder = builder.add_source(config::Environment::with_prefix("PLANNER"));

    let merged = builder.build()?;
    Ok(merged.try_deserialize()?)
}
