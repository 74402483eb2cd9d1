use glam::{Vec3, Vec4};
use log::debug;
use rand::{Rng, RngCore};

use crate::error::SimError;
use crate::simulation::initial_conditions::{
    InitialConditionGenerator, InitialState, generated_body_count, integer_cube_root,
};
use crate::simulation::params::SimulationParams;
use crate::simulation::types::InitialCondition;

/// A single cube of bodies at rest.
pub struct CubeGenerator;

impl InitialConditionGenerator for CubeGenerator {
    fn condition(&self) -> InitialCondition {
        InitialCondition::Cube
    }

    fn description(&self) -> &str {
        "A lattice cube of equal masses with no initial velocity"
    }

    fn generate(
        &self,
        params: &SimulationParams,
        rng: &mut dyn RngCore,
    ) -> Result<InitialState, SimError> {
        let num_bodies = generated_body_count(params.num_bodies);
        let mut state = InitialState::zeroed(num_bodies);

        let cube = LatticeCube::new(num_bodies, params.spacing());
        cube.fill(&mut state, 0, Vec3::ZERO, params, rng, |_| Vec3::ZERO);

        Ok(state)
    }
}

/// Lattice layout shared by the cube conditions.
///
/// `side^3` bodies sit on lattice points `(2c - side) * spacing` for 1-based
/// counters `c`; the remaining `count - side^3` bodies are scattered
/// uniformly inside `[-side_length, side_length)` on every axis.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LatticeCube {
    pub(crate) count: usize,
    pub(crate) side: usize,
    pub(crate) spacing: f32,
}

impl LatticeCube {
    pub(crate) fn new(count: usize, spacing: f32) -> Self {
        let side = integer_cube_root(count);
        debug!("N = {count}");
        debug!("Cbrt of N = {}", (count as f64).cbrt());
        debug!("Int Cbrt of N = {side}");
        Self {
            count,
            side,
            spacing,
        }
    }

    pub(crate) fn side_length(&self) -> f32 {
        self.side as f32 * self.spacing
    }

    pub(crate) fn lattice_len(&self) -> usize {
        self.side.pow(3)
    }

    /// Coordinate of the 1-based lattice counter `c` along one axis.
    pub(crate) fn coordinate(&self, c: usize) -> f32 {
        (2 * c as i64 - self.side as i64) as f32 * self.spacing
    }

    /// Position of lattice point `index` (0-based, `i` slowest, `k` fastest).
    pub(crate) fn lattice_point(&self, index: usize) -> Vec3 {
        let side = self.side;
        let i = index / (side * side) + 1;
        let j = (index / side) % side + 1;
        let k = index % side + 1;
        Vec3::new(self.coordinate(i), self.coordinate(j), self.coordinate(k))
    }

    /// Write the cube into `state[start..start + count]`.
    ///
    /// `offset` is added before `velocity_of` is evaluated; `z_offset` is
    /// added to the stored position only.
    pub(crate) fn fill(
        &self,
        state: &mut InitialState,
        start: usize,
        offset: Vec3,
        params: &SimulationParams,
        rng: &mut dyn RngCore,
        velocity_of: impl Fn(Vec3) -> Vec3,
    ) {
        let positions = &mut state.positions[start..start + self.count];
        let velocities = &mut state.velocities[start..start + self.count];
        let lattice_len = self.lattice_len().min(self.count);
        let half_extent = self.side_length();

        for (index, (position, velocity)) in positions.iter_mut().zip(velocities).enumerate() {
            let local = if index < lattice_len {
                self.lattice_point(index)
            } else {
                Vec3::new(
                    scatter(rng, half_extent),
                    scatter(rng, half_extent),
                    scatter(rng, half_extent),
                )
            };
            let pos = local + offset;
            *position = Vec4::new(pos.x, pos.y, pos.z + params.z_offset, params.default_mass);
            *velocity = velocity_of(pos).extend(1.0);
        }
    }
}

fn scatter(rng: &mut dyn RngCore, half_extent: f32) -> f32 {
    if half_extent > 0.0 {
        rng.gen_range(-half_extent..half_extent)
    } else {
        0.0
    }
}
