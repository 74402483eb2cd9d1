use std::sync::Arc;

use anyhow::Context;
use glam::Vec4;
use log::{debug, info};
use winit::window::Window;

use crate::simulation::types::BODY_GRANULARITY;

use super::camera::Camera;
use super::particle_resources::{ParticleResources, ViewUniform};
use super::render_config::RenderConfig;
use super::render_pass::create_background_render_pass;

const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.03,
    a: 1.0,
};
const POINT_SIZE: f32 = 0.004;

/// What the renderer draws each frame.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub positions: &'a [Vec4],
    pub velocities: &'a [Vec4],
    pub max_speed: f32,
}

pub struct Renderer {
    window: Arc<Window>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    size: winit::dpi::PhysicalSize<u32>,
    surface: wgpu::Surface<'static>,
    render_config: RenderConfig,
    particles: ParticleResources,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("creating window surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible GPU adapter")?;
        info!("Rendering with {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("requesting GPU device")?;

        let size = window.inner_size();
        let surface_format = surface
            .get_capabilities(&adapter)
            .formats
            .first()
            .copied()
            .context("surface reports no texture formats")?;

        let render_config = RenderConfig::new(&device, surface_format);
        let particles = ParticleResources::new(&device, &render_config, 0);

        let renderer = Self {
            window,
            device,
            queue,
            size,
            surface,
            render_config,
            particles,
        };
        renderer.configure_surface();
        Ok(renderer)
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn configure_surface(&self) {
        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: self.render_config.surface_format,
            // Request compatibility with the sRGB-format texture view we're going to create later.
            view_formats: vec![self.render_config.surface_format.add_srgb_suffix()],
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            width: self.size.width,
            height: self.size.height,
            desired_maximum_frame_latency: 2,
            present_mode: wgpu::PresentMode::AutoVsync,
        };
        self.surface.configure(&self.device, &surface_config);
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.configure_surface();
        }
    }

    fn aspect(&self) -> f32 {
        self.size.width.max(1) as f32 / self.size.height.max(1) as f32
    }

    // Body count changes with every reconfiguration
    fn ensure_capacity(&mut self, num_bodies: usize) {
        if num_bodies.max(BODY_GRANULARITY) != self.particles.capacity() {
            debug!("Resizing GPU particle buffers for {num_bodies} bodies");
            self.particles = ParticleResources::new(&self.device, &self.render_config, num_bodies);
        }
    }

    pub fn render(&mut self, camera: &Camera, frame: Frame<'_>) -> Result<(), wgpu::SurfaceError> {
        let num_bodies = frame.positions.len();
        self.ensure_capacity(num_bodies);

        let aspect = self.aspect();
        let view = ViewUniform {
            view: camera.view_matrix().to_cols_array(),
            projection: camera.projection_matrix(aspect).to_cols_array(),
            max_speed: frame.max_speed,
            point_size: POINT_SIZE,
            aspect,
            _padding: 0.0,
        };
        self.particles.update_view(&self.queue, &view);
        self.particles
            .update_bodies(&self.queue, frame.positions, frame.velocities);

        let surface_texture = self.surface.get_current_texture()?;
        let texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor {
                format: Some(self.render_config.surface_format.add_srgb_suffix()),
                ..Default::default()
            });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("N-Body Command Encoder"),
            });

        {
            let mut render_pass =
                create_background_render_pass(&mut encoder, &texture_view, BACKGROUND);
            if num_bodies > 0 {
                render_pass.set_pipeline(&self.render_config.render_pipeline);
                render_pass.set_bind_group(0, self.particles.bind_group(), &[]);
                // 6 vertices (2 triangles) per body instance
                render_pass.draw(0..6, 0..num_bodies as u32);
            }
        }

        self.queue.submit([encoder.finish()]);
        self.window.pre_present_notify();
        surface_texture.present();
        Ok(())
    }
}
