//! Start-up configuration.
//!
//! Values come from defaults, then an optional YAML file, then command-line
//! flags. An example file matching [`SimulationConfig`]:
//!
//! ```yaml
//! initial_condition: two_cubes   # file | cube | two_cubes | vertical_square_spiral | horizontal_spinning_square_spiral
//! num_bodies: 49152              # rounded up to a multiple of 256 for generated conditions
//! spacing_scale: 1000.0          # lattice spacing in units of softening_squared
//! velocity_scaling: 1.0
//! z_offset: -60.0
//! paused: false
//! softening_squared: 0.0001
//! max_color_speed: 11.0
//! default_mass: 0.001
//! data_dir: data                 # searched for *.csv particle files
//! integrator: gpu                # gpu | cpu
//! seed: 42                       # optional, fixes the random scatter
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;

use crate::error::SimError;
use crate::simulation::params::{MAX_COLOR_SPEED, MIN_COLOR_SPEED, SimulationParams};
use crate::simulation::types::{InitialCondition, IntegratorKind};

#[derive(Parser, Debug, Default)]
#[command(about = "Interactive gravitational N-body simulation")]
pub struct Args {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory searched for *.csv particle data
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Initial condition to start with
    #[arg(short, long, value_enum)]
    pub initial_condition: Option<InitialCondition>,

    /// Body count for generated initial conditions
    #[arg(short, long)]
    pub num_bodies: Option<usize>,

    /// Start paused
    #[arg(long)]
    pub paused: bool,

    /// Where the integration step runs
    #[arg(long, value_enum)]
    pub integrator: Option<IntegratorKind>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    pub initial_condition: InitialCondition,
    pub num_bodies: usize,
    pub spacing_scale: f32,
    pub velocity_scaling: f32,
    pub z_offset: f32,
    pub paused: bool,
    pub softening_squared: f32,
    pub max_color_speed: f32,
    pub default_mass: f32,
    pub data_dir: PathBuf,
    pub integrator: IntegratorKind,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let params = SimulationParams::default();
        Self {
            initial_condition: InitialCondition::TwoCubes,
            num_bodies: params.num_bodies,
            spacing_scale: params.spacing_scale,
            velocity_scaling: params.velocity_scaling,
            z_offset: params.z_offset,
            paused: params.paused,
            softening_squared: params.softening_squared,
            max_color_speed: params.max_color_speed,
            default_mass: params.default_mass,
            data_dir: PathBuf::from("data"),
            integrator: IntegratorKind::default(),
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, SimError> {
        serde_yaml::from_str(text).map_err(|err| SimError::ConfigSyntax {
            message: err.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self, SimError> {
        let text = fs::read_to_string(path).map_err(|err| SimError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_yaml_str(&text)
    }

    /// Defaults, overlaid with the file named by `--config`, then the flags.
    pub fn from_args(args: &Args) -> Result<Self, SimError> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(dir) = &args.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(condition) = args.initial_condition {
            config.initial_condition = condition;
        }
        if let Some(num_bodies) = args.num_bodies {
            config.num_bodies = num_bodies;
        }
        if let Some(integrator) = args.integrator {
            config.integrator = integrator;
        }
        config.paused |= args.paused;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        let positive = |value: f32| value.is_finite() && value > 0.0;
        let invalid = |reason| Err(SimError::InvalidConfiguration { reason });

        if self.num_bodies == 0 {
            return invalid("num_bodies must be positive");
        }
        if !positive(self.softening_squared) {
            return invalid("softening_squared must be positive");
        }
        if !positive(self.velocity_scaling) {
            return invalid("velocity_scaling must be positive");
        }
        if !positive(self.spacing_scale) {
            return invalid("spacing_scale must be positive");
        }
        if !(MIN_COLOR_SPEED..=MAX_COLOR_SPEED).contains(&self.max_color_speed) {
            return invalid("max_color_speed must lie within the colour scale bounds");
        }
        Ok(())
    }

    pub fn params(&self) -> SimulationParams {
        SimulationParams {
            num_bodies: self.num_bodies,
            spacing_scale: self.spacing_scale,
            velocity_scaling: self.velocity_scaling,
            z_offset: self.z_offset,
            softening_squared: self.softening_squared,
            max_color_speed: self.max_color_speed,
            default_mass: self.default_mass,
            paused: self.paused,
        }
    }

    /// Random source for the scattered bodies; seeded runs are reproducible.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = SimulationConfig::from_yaml_str(
            "initial_condition: horizontal_spinning_square_spiral\nnum_bodies: 1000\nseed: 42\n",
        )
        .unwrap();
        assert_eq!(
            config.initial_condition,
            InitialCondition::HorizontalSpinningSquareSpiral
        );
        assert_eq!(config.num_bodies, 1000);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.softening_squared, 0.0001);
        assert_eq!(config.z_offset, -60.0);
        assert_eq!(config.integrator, IntegratorKind::Gpu);
    }

    #[test]
    fn shipped_config_matches_the_defaults() {
        let config =
            SimulationConfig::from_yaml_str(include_str!("../config/default.yaml")).unwrap();
        assert_eq!(
            config,
            SimulationConfig {
                seed: Some(42),
                ..Default::default()
            }
        );
    }

    #[test]
    fn integrator_is_read_from_yaml() {
        let config = SimulationConfig::from_yaml_str("integrator: cpu\n").unwrap();
        assert_eq!(config.integrator, IntegratorKind::Cpu);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = SimulationConfig::from_yaml_str("num_bodys: 5\n").unwrap_err();
        assert!(matches!(err, SimError::ConfigSyntax { .. }));
    }

    #[test]
    fn validation_rejects_degenerate_values() {
        let mut config = SimulationConfig::default();
        assert!(config.validate().is_ok());

        config.softening_squared = 0.0;
        assert!(config.validate().is_err());

        config = SimulationConfig {
            velocity_scaling: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn colour_speed_outside_the_adjustable_range_is_rejected() {
        for max_color_speed in [500.0, 0.0, f32::NAN, MIN_COLOR_SPEED / 2.0] {
            let config = SimulationConfig {
                max_color_speed,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "{max_color_speed}");
        }
        for max_color_speed in [MIN_COLOR_SPEED, MAX_COLOR_SPEED] {
            let config = SimulationConfig {
                max_color_speed,
                ..Default::default()
            };
            assert!(config.validate().is_ok(), "{max_color_speed}");
        }
    }

    #[test]
    fn flags_override_the_defaults() {
        let args = Args {
            initial_condition: Some(InitialCondition::Cube),
            num_bodies: Some(300),
            paused: true,
            integrator: Some(IntegratorKind::Cpu),
            ..Default::default()
        };
        let config = SimulationConfig::from_args(&args).unwrap();
        assert_eq!(config.initial_condition, InitialCondition::Cube);
        assert_eq!(config.integrator, IntegratorKind::Cpu);
        assert_eq!(config.params().num_bodies, 300);
        assert!(config.params().paused);
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        use rand::Rng;

        let config = SimulationConfig {
            seed: Some(7),
            ..Default::default()
        };
        let a: u64 = config.rng().r#gen();
        let b: u64 = config.rng().r#gen();
        assert_eq!(a, b);
    }
}
