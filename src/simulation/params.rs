//! Runtime simulation parameters.
//!
//! `SimulationParams` is owned by the controller. Everything except
//! `paused` and `max_color_speed` is fixed for the lifetime of one
//! configuration.

pub const MIN_COLOR_SPEED: f32 = 0.001;
pub const MAX_COLOR_SPEED: f32 = 100.0;
pub const COLOR_SCALE_STEP: f32 = 1.1;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub num_bodies: usize,      // requested count for generated conditions
    pub spacing_scale: f32,     // lattice spacing in units of softening_squared
    pub velocity_scaling: f32,  // pre-scales velocities, undone on the time axis
    pub z_offset: f32,          // shift applied to every z coordinate
    pub softening_squared: f32, // keeps the force finite at zero separation
    pub max_color_speed: f32,   // top of the colour scale
    pub default_mass: f32,      // mass of every generated body
    pub paused: bool,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            num_bodies: 49152,
            spacing_scale: 1000.0,
            velocity_scaling: 1.0,
            z_offset: -60.0,
            softening_squared: 0.0001,
            max_color_speed: 11.0,
            default_mass: 0.001,
            paused: false,
        }
    }
}

impl SimulationParams {
    /// Multiplies frame time so trajectories do not depend on `velocity_scaling`.
    pub fn time_scaling(&self) -> f32 {
        1.0 / self.velocity_scaling
    }

    /// Folded gravitational constant applied to every acceleration.
    pub fn acceleration_scaling(&self) -> f32 {
        self.velocity_scaling * self.velocity_scaling
    }

    /// Lattice spacing shared by the cube generators.
    pub fn spacing(&self) -> f32 {
        self.softening_squared * self.spacing_scale
    }

    pub fn increase_color_scale(&mut self) -> bool {
        if self.max_color_speed >= MAX_COLOR_SPEED {
            return false;
        }
        self.max_color_speed = (self.max_color_speed * COLOR_SCALE_STEP).min(MAX_COLOR_SPEED);
        true
    }

    pub fn decrease_color_scale(&mut self) -> bool {
        if self.max_color_speed <= MIN_COLOR_SPEED {
            return false;
        }
        self.max_color_speed = (self.max_color_speed / COLOR_SCALE_STEP).max(MIN_COLOR_SPEED);
        true
    }
}
