//! wgpu compute implementation of [`ForceIntegrator`].
//!
//! READ is uploaded, one compute pass writes WRITE on the device, and WRITE
//! is read back before `integrate` returns, so the host buffers stay the
//! single source of truth for rendering and reconfiguration.

use std::sync::mpsc;

use anyhow::Context;
use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use log::{debug, info, warn};

use crate::simulation::buffers::StepBuffers;
use crate::simulation::integrator::{CpuIntegrator, ForceIntegrator, StepParams};
use crate::simulation::types::BODY_GRANULARITY;

const VEC4_SIZE: wgpu::BufferAddress = std::mem::size_of::<Vec4>() as wgpu::BufferAddress;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct StepUniform {
    dt: f32,
    softening_squared: f32,
    acceleration_scaling: f32,
    num_bodies: u32,
}

// Device buffers sized for one body count
struct DeviceBodies {
    len: usize,
    read_positions: wgpu::Buffer,
    read_velocities: wgpu::Buffer,
    write_positions: wgpu::Buffer,
    write_velocities: wgpu::Buffer,
    staging: wgpu::Buffer, // positions then velocities
    bind_group: wgpu::BindGroup,
}

impl DeviceBodies {
    fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        params_buffer: &wgpu::Buffer,
        len: usize,
    ) -> Self {
        debug!("Allocating compute buffers for {len} bodies");

        let size = len as wgpu::BufferAddress * VEC4_SIZE;
        let buffer = |label, size, usage| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage,
                mapped_at_creation: false,
            })
        };
        let input = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST;
        let output = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC;
        let read_positions = buffer("Read Positions", size, input);
        let read_velocities = buffer("Read Velocities", size, input);
        let write_positions = buffer("Write Positions", size, output);
        let write_velocities = buffer("Write Velocities", size, output);
        let staging = buffer(
            "Readback Buffer",
            2 * size,
            wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        );

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("N-Body Compute Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: read_positions.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: read_velocities.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: write_positions.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: write_velocities.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            len,
            read_positions,
            read_velocities,
            write_positions,
            write_velocities,
            staging,
            bind_group,
        }
    }
}

pub struct GpuIntegrator {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
    bodies: Option<DeviceBodies>,
}

impl GpuIntegrator {
    /// Build the compute pipeline on an existing device, usually the renderer's.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("N-Body Compute Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../compute.wgsl").into()),
        });

        let storage = |binding, read_only| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only },
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("N-Body Compute Bind Group Layout"),
            entries: &[
                storage(0, true),
                storage(1, true),
                storage(2, false),
                storage(3, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("N-Body Compute Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("N-Body Compute Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader_module,
            entry_point: Some("integrate"),
            compilation_options: Default::default(),
            cache: None,
        });

        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Step Params Buffer"),
            size: std::mem::size_of::<StepUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            device: device.clone(),
            queue: queue.clone(),
            pipeline,
            bind_group_layout,
            params_buffer,
            bodies: None,
        }
    }

    /// Open a headless device of its own.
    pub async fn request() -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .context("no GPU adapter")?;
        info!("Integrating with {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("N-Body Compute Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("requesting GPU device")?;
        Ok(Self::new(&device, &queue))
    }

    /// Run the step on the device and read WRITE back.
    fn dispatch(&mut self, params: StepParams, buffers: &mut StepBuffers<'_>) -> anyhow::Result<()> {
        let len = buffers.read_positions.len();
        let uniform = StepUniform {
            dt: params.dt,
            softening_squared: params.softening_squared,
            acceleration_scaling: params.acceleration_scaling,
            num_bodies: u32::try_from(len).context("body count exceeds u32")?,
        };
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&uniform));

        // Device buffers are recreated when the body count changes
        let bodies = match self.bodies.take() {
            Some(bodies) if bodies.len == len => bodies,
            _ => DeviceBodies::new(&self.device, &self.bind_group_layout, &self.params_buffer, len),
        };
        let bodies = self.bodies.insert(bodies);
        let size = len as wgpu::BufferAddress * VEC4_SIZE;
        self.queue.write_buffer(
            &bodies.read_positions,
            0,
            bytemuck::cast_slice(buffers.read_positions),
        );
        self.queue.write_buffer(
            &bodies.read_velocities,
            0,
            bytemuck::cast_slice(buffers.read_velocities),
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("N-Body Compute Encoder"),
            });
        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("N-Body Compute Pass"),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&self.pipeline);
            compute_pass.set_bind_group(0, &bodies.bind_group, &[]);

            let workgroup_count = len.div_ceil(BODY_GRANULARITY) as u32;
            compute_pass.dispatch_workgroups(workgroup_count, 1, 1);
        }
        encoder.copy_buffer_to_buffer(&bodies.write_positions, 0, &bodies.staging, 0, size);
        encoder.copy_buffer_to_buffer(&bodies.write_velocities, 0, &bodies.staging, size, size);
        self.queue.submit(Some(encoder.finish()));

        let slice = bodies.staging.slice(..);
        let (sender, receiver) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        if let Err(err) = wait_for_readback(&self.device, &receiver) {
            // Cancels a map that is still pending
            bodies.staging.unmap();
            return Err(err);
        }

        {
            let data = slice.get_mapped_range();
            let floats: &[f32] = bytemuck::cast_slice(&data);
            let (positions, velocities) = floats.split_at(len * 4);
            bytemuck::cast_slice_mut::<Vec4, f32>(&mut *buffers.write_positions)
                .copy_from_slice(positions);
            bytemuck::cast_slice_mut::<Vec4, f32>(&mut *buffers.write_velocities)
                .copy_from_slice(velocities);
        }
        bodies.staging.unmap();
        Ok(())
    }
}

fn wait_for_readback(
    device: &wgpu::Device,
    receiver: &mpsc::Receiver<Result<(), wgpu::BufferAsyncError>>,
) -> anyhow::Result<()> {
    device
        .poll(wgpu::PollType::Wait)
        .context("waiting for the compute pass")?;
    receiver
        .recv()
        .context("readback callback dropped")?
        .context("mapping the readback buffer")
}

impl ForceIntegrator for GpuIntegrator {
    fn integrate(&mut self, params: StepParams, mut buffers: StepBuffers<'_>) {
        if buffers.read_positions.is_empty() {
            return;
        }
        if let Err(err) = self.dispatch(params, &mut buffers) {
            warn!("GPU step failed, running it on the CPU: {err:#}");
            CpuIntegrator::default().integrate(params, buffers);
        }
    }
}
