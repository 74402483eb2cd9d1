use bytemuck::{Pod, Zeroable};
use glam::Vec4;

use crate::simulation::types::BODY_GRANULARITY;

use super::render_config::RenderConfig;

// View state shared with the shader; layout must match `ViewState` in shader.wgsl
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(crate) struct ViewUniform {
    pub(crate) view: [f32; 16],
    pub(crate) projection: [f32; 16],
    pub(crate) max_speed: f32,
    pub(crate) point_size: f32,
    pub(crate) aspect: f32,
    pub(crate) _padding: f32,
}

/// GPU copies of the active position and velocity arrays.
///
/// Storage buffers are sized for whole work groups and recreated when the
/// body count changes.
pub(crate) struct ParticleResources {
    position_buffer: wgpu::Buffer,
    velocity_buffer: wgpu::Buffer,
    view_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    capacity: usize,
}

fn storage_buffer(device: &wgpu::Device, label: &str, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (capacity * size_of::<Vec4>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl ParticleResources {
    pub(crate) fn new(device: &wgpu::Device, render_config: &RenderConfig, num_bodies: usize) -> Self {
        let capacity = num_bodies.max(BODY_GRANULARITY);
        let position_buffer = storage_buffer(device, "Position Buffer", capacity);
        let velocity_buffer = storage_buffer(device, "Velocity Buffer", capacity);
        let view_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("View State Buffer"),
            size: size_of::<ViewUniform>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group =
            render_config.create_bind_group(device, &position_buffer, &velocity_buffer, &view_buffer);

        Self {
            position_buffer,
            velocity_buffer,
            view_buffer,
            bind_group,
            capacity,
        }
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub(crate) fn update_bodies(&self, queue: &wgpu::Queue, positions: &[Vec4], velocities: &[Vec4]) {
        debug_assert!(positions.len() <= self.capacity);
        if positions.is_empty() {
            return;
        }
        queue.write_buffer(&self.position_buffer, 0, bytemuck::cast_slice(positions));
        queue.write_buffer(&self.velocity_buffer, 0, bytemuck::cast_slice(velocities));
    }

    pub(crate) fn update_view(&self, queue: &wgpu::Queue, view: &ViewUniform) {
        queue.write_buffer(&self.view_buffer, 0, bytemuck::bytes_of(view));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_uniform_is_sixteen_byte_aligned() {
        assert_eq!(size_of::<ViewUniform>(), 144);
        assert_eq!(size_of::<ViewUniform>() % 16, 0);
    }
}
