use glam::Vec4;
use log::info;
use rand::RngCore;

use crate::error::SimError;
use crate::simulation::initial_conditions::{InitialConditionGenerator, InitialState};
use crate::simulation::params::SimulationParams;
use crate::simulation::types::{
    BODY_GRANULARITY, InitialCondition, ParticleRecord, truncate_to_granularity,
};

// Display convention for file masses, carried in position.w
const FILE_MASS_SCALE: f32 = 3.0;

/// Bodies taken from parsed particle records.
///
/// The record count is truncated down to a multiple of
/// [`BODY_GRANULARITY`] by dropping records from the END of the list, so
/// the kept bodies are always the leading records in input order.
pub struct ParticleFileGenerator<'a> {
    records: &'a [ParticleRecord],
}

impl<'a> ParticleFileGenerator<'a> {
    pub fn new(records: &'a [ParticleRecord]) -> Self {
        Self { records }
    }
}

impl InitialConditionGenerator for ParticleFileGenerator<'_> {
    fn condition(&self) -> InitialCondition {
        InitialCondition::File
    }

    fn description(&self) -> &str {
        "Bodies loaded from a particle data file"
    }

    fn generate(
        &self,
        params: &SimulationParams,
        _rng: &mut dyn RngCore,
    ) -> Result<InitialState, SimError> {
        let count = self.records.len();
        let num_bodies = truncate_to_granularity(count);
        if num_bodies == 0 {
            return Err(SimError::InsufficientParticles { count });
        }
        if num_bodies != count {
            info!(
                "numBodies must be a multiple of {BODY_GRANULARITY}. Changing numBodies to {num_bodies}"
            );
        }

        let scale = params.velocity_scaling;
        let (positions, velocities) = self.records[..num_bodies]
            .iter()
            .map(|&[x, y, z, vx, vy, vz, mass]| {
                (
                    Vec4::new(x, y, z, mass * FILE_MASS_SCALE),
                    Vec4::new(vx * scale, vy * scale, vz * scale, 0.0),
                )
            })
            .unzip();

        Ok(InitialState {
            positions,
            velocities,
        })
    }
}
