use glam::{Vec3, Vec4};
use rand::SeedableRng;
use rand::rngs::StdRng;

use nbody_playground::simulation::initial_conditions::{self, TwoCubesGenerator};
use nbody_playground::simulation::integrator::integrate_in_order;
use nbody_playground::simulation::params::{MAX_COLOR_SPEED, MIN_COLOR_SPEED};
use nbody_playground::simulation::{
    BodyStateBuffers, CpuIntegrator, ForceIntegrator, InitialCondition, InitialConditionCycler,
    InitialState, ParticleRecord, SimulationController, SimulationParams, StepParams,
};
use nbody_playground::SimError;

/// Small parameter set so tests stay fast
pub fn test_params(num_bodies: usize) -> SimulationParams {
    SimulationParams {
        num_bodies,
        ..Default::default()
    }
}

pub fn seeded_controller(params: SimulationParams) -> SimulationController {
    SimulationController::with_integrator(params, CpuIntegrator::default(), StdRng::seed_from_u64(42))
}

/// Two bodies separated along x at rest
pub fn two_body_state(dist: f32, m1: f32, m2: f32) -> InitialState {
    InitialState {
        positions: vec![
            Vec4::new(-dist / 2.0, 0.0, 0.0, m1),
            Vec4::new(dist / 2.0, 0.0, 0.0, m2),
        ],
        velocities: vec![Vec4::ZERO; 2],
    }
}

pub fn buffers_with(state: &InitialState) -> BodyStateBuffers {
    let mut buffers = BodyStateBuffers::new();
    buffers.allocate(state.num_bodies());
    buffers.fill(state);
    buffers
}

/// Records laid out so each one is identifiable by its index
pub fn numbered_records(count: usize) -> Vec<ParticleRecord> {
    (0..count)
        .map(|i| {
            let x = i as f32;
            [x, -x, 0.5 * x, 0.01, 0.02, 0.03, 0.25]
        })
        .collect()
}

fn bits(values: &[Vec4]) -> Vec<[u32; 4]> {
    values
        .iter()
        .map(|v| v.to_array().map(f32::to_bits))
        .collect()
}

// ==================================================================================
// Integrator
// ==================================================================================

#[test]
fn two_body_step_matches_closed_form() {
    let state = two_body_state(2.0, 2.0, 3.0);
    let mut buffers = buffers_with(&state);
    let params = StepParams {
        dt: 0.1,
        softening_squared: 0.01,
        acceleration_scaling: 1.0,
    };

    CpuIntegrator::default().integrate(params, buffers.step_buffers().unwrap());
    buffers.swap();

    // Body 0 sits at x = -1 with the other body at +2 along x, body 1 the reverse
    let inv_dist_cube = 4.01_f64.powf(-1.5);
    let positions = buffers.read_positions().unwrap();
    let velocities = buffers.read_velocities().unwrap();
    for (i, (x0, r_x)) in [(-1.0, 2.0), (1.0, -2.0)].into_iter().enumerate() {
        let other_mass = f64::from(state.positions[1 - i].w);
        let v = other_mass * r_x * inv_dist_cube * 0.1;
        let x = x0 + v * 0.1;

        assert!((f64::from(velocities[i].x) - v).abs() < 1e-6, "body {i} velocity");
        assert!((f64::from(positions[i].x) - x).abs() < 1e-6, "body {i} position");
        assert_eq!(positions[i].y, 0.0);
        assert_eq!(positions[i].w, state.positions[i].w, "mass must be preserved");
    }
}

#[test]
fn update_order_does_not_change_the_result() {
    let params = test_params(512);
    let state = initial_conditions::generate(
        InitialCondition::Cube,
        None,
        &params,
        &mut StdRng::seed_from_u64(3),
    )
    .unwrap();
    let step = StepParams {
        dt: 0.05,
        softening_squared: params.softening_squared,
        acceleration_scaling: params.acceleration_scaling(),
    };

    let mut parallel = buffers_with(&state);
    CpuIntegrator::new(64).integrate(step, parallel.step_buffers().unwrap());
    parallel.swap();

    let mut reversed = buffers_with(&state);
    integrate_in_order((0..state.num_bodies()).rev(), step, reversed.step_buffers().unwrap());
    reversed.swap();

    assert_eq!(
        bits(parallel.read_positions().unwrap()),
        bits(reversed.read_positions().unwrap())
    );
    assert_eq!(
        bits(parallel.read_velocities().unwrap()),
        bits(reversed.read_velocities().unwrap())
    );
}

// ==================================================================================
// Controller
// ==================================================================================

#[test]
fn paused_steps_leave_state_bit_identical() {
    let mut controller = seeded_controller(SimulationParams {
        paused: true,
        ..test_params(256)
    });
    controller.configure(InitialCondition::TwoCubes, None).unwrap();

    let positions = bits(controller.active_positions());
    let velocities = bits(controller.active_velocities());
    for _ in 0..3 {
        controller.step(0.016);
    }
    assert_eq!(bits(controller.active_positions()), positions);
    assert_eq!(bits(controller.active_velocities()), velocities);

    controller.toggle_pause();
    controller.step(0.016);
    assert_ne!(bits(controller.active_positions()), positions);
}

#[test]
fn toggling_pause_twice_restores_the_flag() {
    let mut controller = seeded_controller(test_params(256));
    assert!(!controller.paused());
    controller.toggle_pause();
    assert!(controller.paused());
    controller.toggle_pause();
    assert!(!controller.paused());
}

#[test]
fn generated_conditions_round_up_to_whole_work_groups() {
    for condition in InitialCondition::ALL.into_iter().filter(|c| c.is_generated()) {
        let mut controller = seeded_controller(test_params(300));
        controller.configure(condition, None).unwrap();

        assert_eq!(controller.num_bodies(), 512, "{condition}");
        assert_eq!(controller.active_positions().len(), 512);
        assert_eq!(controller.active_velocities().len(), 512);

        // The WRITE generation has the same length; it becomes READ after a step
        controller.step(0.01);
        assert_eq!(controller.active_positions().len(), 512);
        assert_eq!(controller.active_velocities().len(), 512);
        assert_eq!(controller.params().num_bodies, 300);
    }
}

#[test]
fn file_condition_drops_trailing_records() {
    let records = numbered_records(300);
    let mut controller = seeded_controller(test_params(256));
    controller
        .configure(InitialCondition::File, Some(records.as_slice()))
        .unwrap();

    assert_eq!(controller.num_bodies(), 256);
    let positions = controller.active_positions();
    for (i, record) in records.iter().take(256).enumerate() {
        assert_eq!(positions[i].x, record[0]);
        assert_eq!(positions[i].y, record[1]);
        assert_eq!(positions[i].w, record[6] * 3.0);
    }
}

#[test]
fn file_condition_without_enough_records_fails() {
    let records = numbered_records(100);
    let mut controller = seeded_controller(test_params(256));

    assert_eq!(
        controller.configure(InitialCondition::File, Some(records.as_slice())),
        Err(SimError::InsufficientParticles { count: 100 })
    );
    assert!(!controller.is_configured());
    assert!(controller.active_positions().is_empty());

    assert_eq!(
        controller.configure(InitialCondition::File, None),
        Err(SimError::MissingParticleData)
    );
}

#[test]
fn color_scale_saturates_at_its_bounds() {
    let mut controller = seeded_controller(SimulationParams {
        max_color_speed: 95.0,
        ..test_params(256)
    });
    for _ in 0..5 {
        controller.increase_color_scale();
    }
    assert_eq!(controller.max_color_speed(), MAX_COLOR_SPEED);

    let mut controller = seeded_controller(SimulationParams {
        max_color_speed: 0.0012,
        ..test_params(256)
    });
    for _ in 0..5 {
        controller.decrease_color_scale();
    }
    assert_eq!(controller.max_color_speed(), MIN_COLOR_SPEED);
}

// ==================================================================================
// Initial conditions
// ==================================================================================

#[test]
fn two_cubes_velocities_follow_the_spin_formula() {
    let params = SimulationParams {
        velocity_scaling: 0.5,
        ..test_params(512)
    };
    let mut controller = seeded_controller(params.clone());
    controller.configure(InitialCondition::TwoCubes, None).unwrap();

    for (p, v) in controller
        .active_positions()
        .iter()
        .zip(controller.active_velocities())
    {
        let position = Vec3::new(p.x, p.y, p.z - params.z_offset);
        let expected = TwoCubesGenerator::spin_velocity(position, &params);
        assert!((v.truncate() - expected).length() < 1e-5);
        assert_eq!(p.w, params.default_mass);
    }
}

#[test]
fn cycler_visits_conditions_in_order() {
    let mut cycler = InitialConditionCycler::new(InitialCondition::Cube, Vec::new());
    let visited: Vec<_> = (0..4).map(|_| cycler.next().0).collect();
    assert_eq!(
        visited,
        vec![
            InitialCondition::TwoCubes,
            InitialCondition::VerticalSquareSpiral,
            InitialCondition::HorizontalSpinningSquareSpiral,
            InitialCondition::Cube,
        ]
    );
}
