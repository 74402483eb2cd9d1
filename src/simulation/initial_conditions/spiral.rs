use glam::{Vec3, Vec4};
use rand::RngCore;

use crate::error::SimError;
use crate::simulation::initial_conditions::{
    InitialConditionGenerator, InitialState, generated_body_count,
};
use crate::simulation::params::SimulationParams;
use crate::simulation::types::InitialCondition;

// Angular rate of the horizontal spiral, not scaled by velocity_scaling
const HORIZONTAL_SPIN: f32 = 0.15;

/// Grid points of a square spiral starting at the origin.
///
/// Walks `k` steps along the first axis, then `k` along the second, then
/// grows `k` by one and reverses direction, forever.
#[derive(Debug, Clone)]
pub struct SquareSpiral {
    position: (i32, i32),
    run: i32,
    taken: i32,
    direction: i32,
    second_axis: bool,
}

impl SquareSpiral {
    pub fn new() -> Self {
        Self {
            position: (0, 0),
            run: 1,
            taken: 0,
            direction: 1,
            second_axis: false,
        }
    }
}

impl Default for SquareSpiral {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for SquareSpiral {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        let point = self.position;

        if self.second_axis {
            self.position.1 += self.direction;
        } else {
            self.position.0 += self.direction;
        }
        self.taken += 1;

        if self.taken == self.run {
            self.taken = 0;
            if self.second_axis {
                self.run += 1;
                self.direction = -self.direction;
            }
            self.second_axis = !self.second_axis;
        }

        Some(point)
    }
}

/// A flat square in the x-y plane at rest.
pub struct VerticalSquareSpiralGenerator;

impl InitialConditionGenerator for VerticalSquareSpiralGenerator {
    fn condition(&self) -> InitialCondition {
        InitialCondition::VerticalSquareSpiral
    }

    fn description(&self) -> &str {
        "A square spiral in the x-y plane with no initial velocity"
    }

    fn generate(
        &self,
        params: &SimulationParams,
        _rng: &mut dyn RngCore,
    ) -> Result<InitialState, SimError> {
        let num_bodies = generated_body_count(params.num_bodies);
        // Doubled to match the cube lattice pitch
        let spacing = params.spacing() * 2.0;

        let (positions, velocities) = SquareSpiral::new()
            .take(num_bodies)
            .map(|(gx, gy)| {
                let position = Vec4::new(
                    gx as f32 * spacing,
                    gy as f32 * spacing,
                    params.z_offset,
                    params.default_mass,
                );
                (position, Vec4::new(0.0, 0.0, 0.0, 1.0))
            })
            .unzip();

        Ok(InitialState {
            positions,
            velocities,
        })
    }
}

/// A flat square in the x-z plane spinning about the y axis.
pub struct HorizontalSpinningSquareSpiralGenerator;

impl HorizontalSpinningSquareSpiralGenerator {
    pub fn spin_velocity(position: Vec3) -> Vec3 {
        position.cross(Vec3::Y) * HORIZONTAL_SPIN
    }
}

impl InitialConditionGenerator for HorizontalSpinningSquareSpiralGenerator {
    fn condition(&self) -> InitialCondition {
        InitialCondition::HorizontalSpinningSquareSpiral
    }

    fn description(&self) -> &str {
        "A square spiral in the x-z plane spinning into a flat disk"
    }

    fn generate(
        &self,
        params: &SimulationParams,
        _rng: &mut dyn RngCore,
    ) -> Result<InitialState, SimError> {
        let num_bodies = generated_body_count(params.num_bodies);
        let spacing = params.spacing();

        let (positions, velocities) = SquareSpiral::new()
            .take(num_bodies)
            .map(|(gx, gz)| {
                let pos = Vec3::new(gx as f32 * spacing, 0.0, gz as f32 * spacing);
                let position =
                    Vec4::new(pos.x, pos.y, pos.z + params.z_offset, params.default_mass);
                (position, Self::spin_velocity(pos).extend(1.0))
            })
            .unzip();

        Ok(InitialState {
            positions,
            velocities,
        })
    }
}
