use glam::Vec3;
use log::debug;
use rand::RngCore;

use crate::error::SimError;
use crate::simulation::initial_conditions::cube::LatticeCube;
use crate::simulation::initial_conditions::{
    InitialConditionGenerator, InitialState, generated_body_count,
};
use crate::simulation::params::SimulationParams;
use crate::simulation::types::InitialCondition;

// Spin rate in units of 1/spacing
const SPIN_RATE: f32 = 0.01;

/// Two separated cubes spinning about the z axis, which fall together into
/// a decaying binary.
pub struct TwoCubesGenerator;

impl TwoCubesGenerator {
    /// Initial velocity of a body at `position` (before the z offset).
    pub fn spin_velocity(position: Vec3, params: &SimulationParams) -> Vec3 {
        position.cross(Vec3::Z) * (SPIN_RATE / params.spacing()) * params.velocity_scaling
    }
}

impl InitialConditionGenerator for TwoCubesGenerator {
    fn condition(&self) -> InitialCondition {
        InitialCondition::TwoCubes
    }

    fn description(&self) -> &str {
        "Two spinning lattice cubes separated along x"
    }

    fn generate(
        &self,
        params: &SimulationParams,
        rng: &mut dyn RngCore,
    ) -> Result<InitialState, SimError> {
        let num_bodies = generated_body_count(params.num_bodies);
        let half = num_bodies / 2;
        let mut state = InitialState::zeroed(num_bodies);

        let cube = LatticeCube::new(half, params.spacing());
        let separation = 5.0 * cube.side_length();
        debug!("Two cubes: side {} separation {separation}", cube.side);

        // The first cube takes the lower half of the indices at +x
        for (start, x_offset) in [(0, separation / 2.0), (half, -separation / 2.0)] {
            cube.fill(
                &mut state,
                start,
                Vec3::new(x_offset, 0.0, 0.0),
                params,
                rng,
                |pos| Self::spin_velocity(pos, params),
            );
        }

        Ok(state)
    }
}
