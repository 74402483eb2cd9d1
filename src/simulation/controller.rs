use glam::Vec4;
use log::info;
use rand::rngs::StdRng;

use crate::error::SimError;
use crate::simulation::buffers::BodyStateBuffers;
use crate::simulation::initial_conditions;
use crate::simulation::integrator::{CpuIntegrator, ForceIntegrator, StepParams};
use crate::simulation::params::SimulationParams;
use crate::simulation::types::{InitialCondition, ParticleRecord};

/// Drives configuration, stepping and the buffer swap.
///
/// The controller is the only writer of its parameters and buffers. Input
/// collaborators call the control methods between frames; the renderer
/// reads [`active_positions`](Self::active_positions) and
/// [`active_velocities`](Self::active_velocities), which always hold the
/// last completed step.
pub struct SimulationController<I = CpuIntegrator> {
    params: SimulationParams,
    integrator: I,
    buffers: BodyStateBuffers,
    condition: Option<InitialCondition>,
    pause_multiplier: f32,
    rng: StdRng,
}

impl<I: ForceIntegrator> SimulationController<I> {
    pub fn with_integrator(params: SimulationParams, integrator: I, rng: StdRng) -> Self {
        let pause_multiplier = pause_multiplier(params.paused);
        Self {
            params,
            integrator,
            buffers: BodyStateBuffers::new(),
            condition: None,
            pause_multiplier,
            rng,
        }
    }

    /// Replace the running configuration with `condition`.
    ///
    /// The previous buffers are released before the new state is generated.
    /// On error the controller is left disabled.
    pub fn configure(
        &mut self,
        condition: InitialCondition,
        particles: Option<&[ParticleRecord]>,
    ) -> Result<(), SimError> {
        self.disable();

        let state = initial_conditions::generate(condition, particles, &self.params, &mut self.rng)?;

        self.buffers.allocate(state.num_bodies());
        self.buffers.fill(&state);
        self.condition = Some(condition);
        self.pause_multiplier = pause_multiplier(self.params.paused);

        info!(
            "Configured {condition} with {} bodies{}",
            state.num_bodies(),
            if self.params.paused { " (paused)" } else { "" }
        );
        Ok(())
    }

    /// Release the buffers and stop stepping.
    pub fn disable(&mut self) {
        self.buffers.release();
        self.condition = None;
    }

    /// Constants for a step of `frame_delta_time` seconds.
    pub fn step_params(&self, frame_delta_time: f32) -> StepParams {
        StepParams {
            dt: frame_delta_time * self.params.time_scaling() * self.pause_multiplier,
            softening_squared: self.params.softening_squared,
            acceleration_scaling: self.params.acceleration_scaling(),
        }
    }

    /// Advance one frame and swap READ and WRITE.
    ///
    /// A paused simulation still runs the step with `dt = 0`.
    ///
    /// # Panics
    /// If the controller has not been configured.
    pub fn step(&mut self, frame_delta_time: f32) {
        self.pause_multiplier = pause_multiplier(self.params.paused);
        let params = self.step_params(frame_delta_time);

        let buffers = self
            .buffers
            .step_buffers()
            .expect("step called on an unconfigured simulation");
        self.integrator.integrate(params, buffers);
        self.buffers.swap();
    }

    pub fn toggle_pause(&mut self) {
        self.params.paused = !self.params.paused;
        info!(
            "Simulation {}",
            if self.params.paused { "paused" } else { "resumed" }
        );
    }

    pub fn increase_color_scale(&mut self) {
        if self.params.increase_color_scale() {
            info!("Set max color speed to {}", self.params.max_color_speed);
        }
    }

    pub fn decrease_color_scale(&mut self) {
        if self.params.decrease_color_scale() {
            info!("Set max color speed to {}", self.params.max_color_speed);
        }
    }

    /// READ positions; `w` holds the mass. Empty when disabled.
    pub fn active_positions(&self) -> &[Vec4] {
        self.buffers.read_positions().unwrap_or(&[])
    }

    /// READ velocities. Empty when disabled.
    pub fn active_velocities(&self) -> &[Vec4] {
        self.buffers.read_velocities().unwrap_or(&[])
    }

    pub fn max_color_speed(&self) -> f32 {
        self.params.max_color_speed
    }

    /// Top of the colour scale in the units of the stored velocities.
    pub fn color_speed_scale(&self) -> f32 {
        self.params.max_color_speed * self.params.acceleration_scaling()
    }

    pub fn num_bodies(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_configured(&self) -> bool {
        self.condition.is_some()
    }

    pub fn condition(&self) -> Option<InitialCondition> {
        self.condition
    }

    pub fn paused(&self) -> bool {
        self.params.paused
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// The integrator can be swapped between steps without touching the bodies.
    pub fn integrator_mut(&mut self) -> &mut I {
        &mut self.integrator
    }
}

fn pause_multiplier(paused: bool) -> f32 {
    if paused { 0.0 } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn controller(params: SimulationParams) -> SimulationController {
        SimulationController::with_integrator(
            params,
            CpuIntegrator::default(),
            StdRng::seed_from_u64(11),
        )
    }

    #[test]
    fn dt_combines_time_scaling_and_pause() {
        let mut sim = controller(SimulationParams {
            num_bodies: 256,
            velocity_scaling: 2.0,
            ..Default::default()
        });
        assert_eq!(sim.step_params(0.02).dt, 0.01);
        assert_eq!(sim.step_params(0.02).acceleration_scaling, 4.0);

        sim.toggle_pause();
        sim.configure(InitialCondition::Cube, None).unwrap();
        assert_eq!(sim.step_params(0.02).dt, 0.0);
    }

    #[test]
    fn reconfigure_replaces_the_body_count() {
        let mut sim = controller(SimulationParams {
            num_bodies: 512,
            ..Default::default()
        });
        sim.configure(InitialCondition::TwoCubes, None).unwrap();
        assert_eq!(sim.num_bodies(), 512);

        let records = vec![[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]; 300];
        sim.configure(InitialCondition::File, Some(records.as_slice())).unwrap();
        assert_eq!(sim.num_bodies(), 256);
        assert_eq!(sim.condition(), Some(InitialCondition::File));

        // The requested count survives a file configuration
        sim.configure(InitialCondition::Cube, None).unwrap();
        assert_eq!(sim.num_bodies(), 512);
    }

    #[test]
    fn failed_configure_leaves_the_controller_disabled() {
        let mut sim = controller(SimulationParams {
            num_bodies: 256,
            ..Default::default()
        });
        sim.configure(InitialCondition::VerticalSquareSpiral, None)
            .unwrap();
        assert!(sim.is_configured());

        let err = sim.configure(InitialCondition::File, None).unwrap_err();
        assert_eq!(err, SimError::MissingParticleData);
        assert!(!sim.is_configured());
        assert!(sim.active_positions().is_empty());
    }

    #[test]
    #[should_panic(expected = "unconfigured simulation")]
    fn stepping_before_configure_panics() {
        let mut sim = controller(SimulationParams::default());
        sim.step(0.016);
    }

    #[test]
    fn swapping_the_integrator_keeps_the_bodies() {
        let mut sim = controller(SimulationParams {
            num_bodies: 512,
            paused: true,
            ..Default::default()
        });
        sim.configure(InitialCondition::Cube, None).unwrap();
        let before = sim.active_positions().to_vec();

        *sim.integrator_mut() = CpuIntegrator::new(64);
        assert_eq!(sim.integrator_mut().group_width(), 64);
        sim.step(0.016);
        assert_eq!(sim.active_positions(), before.as_slice());
    }

    #[test]
    fn color_speed_scale_uses_squared_velocity_scaling() {
        let sim = controller(SimulationParams {
            velocity_scaling: 3.0,
            max_color_speed: 2.0,
            ..Default::default()
        });
        assert_eq!(sim.color_speed_scale(), 18.0);
    }
}
