pub mod buffers;
pub mod controller;
pub mod cycler;
pub mod gpu_integrator;
pub mod initial_conditions;
pub mod integrator;
pub mod params;
pub mod particle_data;
pub mod types;

pub use buffers::{BodyStateBuffers, StepBuffers};
pub use controller::SimulationController;
pub use cycler::InitialConditionCycler;
pub use gpu_integrator::GpuIntegrator;
pub use initial_conditions::{InitialConditionGenerator, InitialState};
pub use integrator::{CpuIntegrator, ForceIntegrator, StepParams};
pub use params::SimulationParams;
pub use types::{BODY_GRANULARITY, InitialCondition, IntegratorKind, ParticleRecord};
