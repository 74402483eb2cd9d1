use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use log::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::SimulationConfig;
use crate::rendering::{Camera, Frame, MoveInput, Renderer};
use crate::simulation::particle_data;
use crate::simulation::{
    CpuIntegrator, ForceIntegrator, GpuIntegrator, InitialCondition, InitialConditionCycler,
    IntegratorKind, SimulationController, StepBuffers, StepParams,
};

// Longest frame the simulation advances by, so a stall does not blow up the step
const MAX_FRAME_DT: f32 = 1.0 / 30.0;

/// The integrator the app steps with. Starts on the CPU; the GPU one needs
/// the renderer's device.
enum Integrator {
    Cpu(CpuIntegrator),
    Gpu(GpuIntegrator),
}

impl ForceIntegrator for Integrator {
    fn integrate(&mut self, params: StepParams, buffers: StepBuffers<'_>) {
        match self {
            Integrator::Cpu(cpu) => cpu.integrate(params, buffers),
            Integrator::Gpu(gpu) => gpu.integrate(params, buffers),
        }
    }
}

pub struct App {
    controller: SimulationController<Integrator>,
    integrator_kind: IntegratorKind,
    cycler: InitialConditionCycler,
    renderer: Option<Renderer>,
    camera: Camera,
    movement: MoveInput,
    last_frame: Instant,
    last_cursor: [f32; 2],
}

/// Configure `controller` for `condition`, loading `file` for the file condition.
///
/// Falls back to [`InitialConditionCycler::FALLBACK`] when the data cannot
/// be used, so the window never shows an empty simulation.
fn configure_simulation(
    controller: &mut SimulationController<Integrator>,
    condition: InitialCondition,
    file: Option<&Path>,
) {
    let result = match file {
        Some(path) => particle_data::load_file(path)
            .and_then(|records| controller.configure(condition, Some(records.as_slice()))),
        None => controller.configure(condition, None),
    };

    if let Err(err) = result {
        error!("Could not start {condition}: {err}");
        warn!("Falling back to {}", InitialConditionCycler::FALLBACK);
        if let Err(err) = controller.configure(InitialConditionCycler::FALLBACK, None) {
            error!("Fallback configuration failed: {err}");
        }
    }
}

impl App {
    pub fn new(config: &SimulationConfig) -> Self {
        let cpu = CpuIntegrator::default();
        info!("Integrating on the CPU in groups of {}", cpu.group_width());
        let mut controller =
            SimulationController::with_integrator(config.params(), Integrator::Cpu(cpu), config.rng());

        let files = particle_data::discover(&config.data_dir);
        let cycler = InitialConditionCycler::new(config.initial_condition, files);
        info!(
            "Found {} particle data files in {}",
            cycler.files().len(),
            config.data_dir.display()
        );
        let (condition, file) = cycler.current();
        configure_simulation(&mut controller, condition, file);

        Self {
            controller,
            integrator_kind: config.integrator,
            cycler,
            renderer: None,
            camera: Camera::new(),
            movement: MoveInput::default(),
            last_frame: Instant::now(),
            last_cursor: [0.0, 0.0],
        }
    }

    fn title(&self) -> String {
        match self.controller.condition() {
            Some(condition) => format!(
                "N-body: {condition} ({} bodies)",
                self.controller.num_bodies()
            ),
            None => "N-body".to_string(),
        }
    }

    fn cycle(&mut self, forward: bool) {
        let (condition, file) = if forward {
            self.cycler.next()
        } else {
            self.cycler.previous()
        };
        configure_simulation(&mut self.controller, condition, file);

        let title = self.title();
        if let Some(renderer) = &self.renderer {
            renderer.window().set_title(&title);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();
        let dt = now
            .duration_since(self.last_frame)
            .as_secs_f32()
            .min(MAX_FRAME_DT);
        self.last_frame = now;

        if self.controller.is_configured() {
            self.controller.step(dt);
        }
        self.camera.advance(&self.movement, dt);

        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        let frame = Frame {
            positions: self.controller.active_positions(),
            velocities: self.controller.active_velocities(),
            max_speed: self.controller.color_speed_scale(),
        };
        match renderer.render(&self.camera, frame) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                renderer.configure_surface();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory; stopping");
                event_loop.exit();
            }
            Err(err) => warn!("Skipped frame: {err}"),
        }
        renderer.window().request_redraw();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key_code: KeyCode, key_state: ElementState) {
        let pressed = key_state == ElementState::Pressed;

        // Held keys
        match key_code {
            KeyCode::KeyW => self.movement.forward = pressed,
            KeyCode::KeyS => self.movement.back = pressed,
            KeyCode::KeyA => self.movement.left = pressed,
            KeyCode::KeyD => self.movement.right = pressed,
            KeyCode::Space => self.movement.up = pressed,
            KeyCode::KeyZ => self.movement.down = pressed,
            KeyCode::KeyQ => self.movement.turn_left = pressed,
            KeyCode::KeyE => self.movement.turn_right = pressed,
            _ => (),
        }

        if !pressed {
            return;
        }
        match key_code {
            KeyCode::KeyP => self.controller.toggle_pause(),
            KeyCode::ArrowUp => self.controller.increase_color_scale(),
            KeyCode::ArrowDown => self.controller.decrease_color_scale(),
            KeyCode::ArrowRight => self.cycle(true),
            KeyCode::ArrowLeft => self.cycle(false),
            KeyCode::KeyR => {
                self.camera.reset();
                debug!("Camera reset to {}", self.camera.position());
            }
            KeyCode::Escape => {
                info!("Escape pressed; stopping");
                event_loop.exit();
            }
            _ => (),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        let attributes = Window::default_attributes().with_title(self.title());
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                error!("Could not create window: {err}");
                event_loop.exit();
                return;
            }
        };

        let renderer = match pollster::block_on(Renderer::new(window.clone())) {
            Ok(renderer) => renderer,
            Err(err) => {
                error!("Could not initialise rendering: {err:#}");
                event_loop.exit();
                return;
            }
        };
        if self.integrator_kind == IntegratorKind::Gpu {
            info!("Integrating on the GPU");
            *self.controller.integrator_mut() =
                Integrator::Gpu(GpuIntegrator::new(renderer.device(), renderer.queue()));
        }
        self.renderer = Some(renderer);

        self.last_frame = Instant::now();
        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("The close button was pressed; stopping");
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            WindowEvent::Resized(size) => {
                // Always followed by a redraw request
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(size);
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.movement.fast = modifiers.state().shift_key();
            }
            WindowEvent::MouseWheel { delta, .. } => match delta {
                MouseScrollDelta::LineDelta(_, y) => self.camera.handle_mouse_wheel(y),
                // Touchpad gesture - needs smaller scaling factor to feel natural
                MouseScrollDelta::PixelDelta(position) => {
                    self.camera.handle_mouse_wheel(position.y as f32 * 0.003);
                }
            },
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => match button_state {
                ElementState::Pressed => self.camera.handle_mouse_press(self.last_cursor),
                ElementState::Released => self.camera.handle_mouse_release(),
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.last_cursor = [position.x as f32, position.y as f32];
                self.camera.handle_mouse_move(self.last_cursor);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: key_state,
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, key_code, key_state),
            _ => (),
        }
    }
}

pub fn run(config: &SimulationConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}
