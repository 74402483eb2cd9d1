//! All-pairs softened gravity with a semi-implicit Euler update.
//!
//! For every body `i`:
//!
//! ```text
//! a_i     = g * sum_{j != i} m_j (p_j - p_i) / (|p_j - p_i|^2 + eps2)^1.5
//! v_i'    = v_i + a_i dt
//! p_i'    = p_i + v_i' dt
//! ```
//!
//! `g` is the folded acceleration scaling (`velocity_scaling^2`) and `m_j`
//! the `w` component of the READ position. Each body reads the whole READ
//! generation and writes only its own WRITE slot, so bodies can be updated
//! in any order and on any number of threads.

use glam::{Vec3, Vec4};
use rayon::prelude::*;

use crate::simulation::buffers::StepBuffers;
use crate::simulation::types::BODY_GRANULARITY;

/// Per-step constants handed to the integrator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    pub dt: f32,
    pub softening_squared: f32,
    pub acceleration_scaling: f32,
}

/// Executes one integration step from READ into WRITE.
///
/// Implementations must have finished every write when `integrate` returns.
pub trait ForceIntegrator {
    fn integrate(&mut self, params: StepParams, buffers: StepBuffers<'_>);
}

/// Data-parallel integrator on the rayon thread pool.
///
/// Bodies are processed in work groups of `group_width`, each group on one
/// task. Returning from `integrate` is the barrier between the last write
/// and the buffer swap.
#[derive(Debug, Clone, Copy)]
pub struct CpuIntegrator {
    group_width: usize,
}

impl CpuIntegrator {
    pub fn new(group_width: usize) -> Self {
        Self {
            group_width: group_width.max(1),
        }
    }

    pub fn group_width(&self) -> usize {
        self.group_width
    }
}

impl Default for CpuIntegrator {
    fn default() -> Self {
        Self::new(BODY_GRANULARITY)
    }
}

impl ForceIntegrator for CpuIntegrator {
    fn integrate(&mut self, params: StepParams, buffers: StepBuffers<'_>) {
        let StepBuffers {
            read_positions,
            read_velocities,
            write_positions,
            write_velocities,
        } = buffers;
        debug_assert_eq!(read_positions.len(), write_positions.len());
        debug_assert_eq!(read_velocities.len(), write_velocities.len());

        let width = self.group_width;
        write_positions
            .par_chunks_mut(width)
            .zip(write_velocities.par_chunks_mut(width))
            .enumerate()
            .for_each(|(group, (positions, velocities))| {
                let first = group * width;
                for (offset, (position, velocity)) in
                    positions.iter_mut().zip(velocities.iter_mut()).enumerate()
                {
                    (*position, *velocity) =
                        integrate_body(first + offset, read_positions, read_velocities, params);
                }
            });
    }
}

/// Runs the step on the calling thread, visiting bodies in `order`.
///
/// Produces the same result as [`CpuIntegrator`] for any permutation.
pub fn integrate_in_order(
    order: impl IntoIterator<Item = usize>,
    params: StepParams,
    buffers: StepBuffers<'_>,
) {
    for i in order {
        let (position, velocity) =
            integrate_body(i, buffers.read_positions, buffers.read_velocities, params);
        buffers.write_positions[i] = position;
        buffers.write_velocities[i] = velocity;
    }
}

/// Softened acceleration on body `i` from every other body.
pub fn acceleration(i: usize, positions: &[Vec4], softening_squared: f32) -> Vec3 {
    let here = positions[i].truncate();
    positions
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != i)
        .fold(Vec3::ZERO, |acc, (_, other)| {
            acc + body_body_interaction(here, *other, softening_squared)
        })
}

fn body_body_interaction(here: Vec3, other: Vec4, softening_squared: f32) -> Vec3 {
    let r = other.truncate() - here;
    let dist_sqr = r.length_squared() + softening_squared;
    let inv_dist = dist_sqr.sqrt().recip();
    let inv_dist_cube = inv_dist * inv_dist * inv_dist;
    r * (other.w * inv_dist_cube)
}

/// New position and velocity of body `i`.
///
/// The acceleration sum is evaluated even when `dt == 0`, so a paused step
/// costs the same as a running one. A zero `dt` then returns the READ values
/// bit for bit.
pub fn integrate_body(
    i: usize,
    positions: &[Vec4],
    velocities: &[Vec4],
    params: StepParams,
) -> (Vec4, Vec4) {
    let position = positions[i];
    let velocity = velocities[i];
    let accel = acceleration(i, positions, params.softening_squared) * params.acceleration_scaling;

    if params.dt == 0.0 {
        // v + 0 would turn -0.0 into +0.0
        return (position, velocity);
    }

    let new_velocity = velocity.truncate() + accel * params.dt;
    let new_position = position.truncate() + new_velocity * params.dt;
    (
        new_position.extend(position.w),
        new_velocity.extend(velocity.w),
    )
}
