//! Initial-condition generators.
//!
//! Every generator produces a complete [`InitialState`]: one position+mass
//! and one velocity entry per body, with the body count already normalized
//! to [`BODY_GRANULARITY`]. Generated conditions round the requested count
//! up; the file condition truncates the record list down.

mod cube;
mod file;
mod spiral;
mod two_cubes;

use glam::Vec4;
use log::info;
use rand::RngCore;

use crate::error::SimError;
use crate::simulation::params::SimulationParams;
use crate::simulation::types::{
    BODY_GRANULARITY, InitialCondition, ParticleRecord, round_up_to_granularity,
};

pub use cube::CubeGenerator;
pub use file::ParticleFileGenerator;
pub use spiral::{HorizontalSpinningSquareSpiralGenerator, SquareSpiral, VerticalSquareSpiralGenerator};
pub use two_cubes::TwoCubesGenerator;

/// Starting state for one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialState {
    pub positions: Vec<Vec4>,  // xyz = position, w = mass
    pub velocities: Vec<Vec4>, // xyz = velocity, w = reserved
}

impl InitialState {
    pub(crate) fn zeroed(num_bodies: usize) -> Self {
        Self {
            positions: vec![Vec4::ZERO; num_bodies],
            velocities: vec![Vec4::ZERO; num_bodies],
        }
    }

    pub fn num_bodies(&self) -> usize {
        self.positions.len()
    }
}

/// A named procedure producing a complete starting state
pub trait InitialConditionGenerator {
    fn condition(&self) -> InitialCondition;

    fn description(&self) -> &str;

    fn generate(
        &self,
        params: &SimulationParams,
        rng: &mut dyn RngCore,
    ) -> Result<InitialState, SimError>;
}

/// Generator for `condition`.
///
/// `particles` is only consulted for [`InitialCondition::File`], which fails
/// with [`SimError::MissingParticleData`] when it is absent.
pub fn generator<'a>(
    condition: InitialCondition,
    particles: Option<&'a [ParticleRecord]>,
) -> Result<Box<dyn InitialConditionGenerator + 'a>, SimError> {
    Ok(match condition {
        InitialCondition::File => {
            let records = particles.ok_or(SimError::MissingParticleData)?;
            Box::new(ParticleFileGenerator::new(records))
        }
        InitialCondition::Cube => Box::new(CubeGenerator),
        InitialCondition::TwoCubes => Box::new(TwoCubesGenerator),
        InitialCondition::VerticalSquareSpiral => Box::new(VerticalSquareSpiralGenerator),
        InitialCondition::HorizontalSpinningSquareSpiral => {
            Box::new(HorizontalSpinningSquareSpiralGenerator)
        }
    })
}

/// Generate the starting state for `condition`.
///
/// Choosing a replacement condition when this fails is left to the caller.
pub fn generate(
    condition: InitialCondition,
    particles: Option<&[ParticleRecord]>,
    params: &SimulationParams,
    rng: &mut dyn RngCore,
) -> Result<InitialState, SimError> {
    let generator = generator(condition, particles)?;
    info!("{}: {}", generator.condition(), generator.description());
    generator.generate(params, rng)
}

/// Body count for generated conditions, rounded up to the work group width.
pub(crate) fn generated_body_count(requested: usize) -> usize {
    let count = round_up_to_granularity(requested.max(1));
    if count != requested {
        info!(
            "numBodies must be a multiple of {BODY_GRANULARITY}. Changing numBodies to {count}"
        );
    }
    count
}

/// Largest integer whose cube does not exceed `n`.
pub(crate) fn integer_cube_root(n: usize) -> usize {
    let mut root = (n as f64).cbrt().floor() as usize;
    while root.pow(3) > n {
        root -= 1;
    }
    while (root + 1).pow(3) <= n {
        root += 1;
    }
    root
}
