use glam::Vec4;

use crate::simulation::initial_conditions::InitialState;

// Ping-pong generations of body state
struct Generations {
    positions: [Vec<Vec4>; 2],  // xyz = position, w = mass
    velocities: [Vec<Vec4>; 2], // xyz = velocity, w = reserved
    current_buffer: usize,      // index of the READ generation
}

/// Borrowed view of one integration step: the READ generation as input and
/// the WRITE generation as output.
pub struct StepBuffers<'a> {
    pub read_positions: &'a [Vec4],
    pub read_velocities: &'a [Vec4],
    pub write_positions: &'a mut [Vec4],
    pub write_velocities: &'a mut [Vec4],
}

/// Double-buffered position and velocity storage.
///
/// Both arrays exist twice. Readers only ever see the READ generation; the
/// WRITE generation is filled by one step and becomes READ on [`swap`].
/// Sizes are fixed between [`allocate`] and [`release`].
///
/// [`swap`]: BodyStateBuffers::swap
/// [`allocate`]: BodyStateBuffers::allocate
/// [`release`]: BodyStateBuffers::release
#[derive(Default)]
pub struct BodyStateBuffers {
    generations: Option<Generations>,
}

impl BodyStateBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create four zeroed arrays of `num_bodies` entries.
    ///
    /// # Panics
    /// If the buffers are already allocated; a new body count needs a
    /// [`release`](Self::release) first.
    pub fn allocate(&mut self, num_bodies: usize) {
        assert!(
            self.generations.is_none(),
            "body state buffers must be released before reallocating"
        );
        let zeroed = || vec![Vec4::ZERO; num_bodies];
        self.generations = Some(Generations {
            positions: [zeroed(), zeroed()],
            velocities: [zeroed(), zeroed()],
            current_buffer: 0,
        });
    }

    /// Copy a starting state into both generations.
    ///
    /// # Panics
    /// If unallocated or if `state` does not match the allocated length.
    pub fn fill(&mut self, state: &InitialState) {
        let generations = self
            .generations
            .as_mut()
            .expect("body state buffers filled before allocation");
        for buffer in &mut generations.positions {
            buffer.copy_from_slice(&state.positions);
        }
        for buffer in &mut generations.velocities {
            buffer.copy_from_slice(&state.velocities);
        }
    }

    /// Free all four arrays. Safe to call on unallocated buffers.
    pub fn release(&mut self) {
        self.generations = None;
    }

    pub fn is_allocated(&self) -> bool {
        self.generations.is_some()
    }

    pub fn len(&self) -> usize {
        self.generations
            .as_ref()
            .map_or(0, |g| g.positions[g.current_buffer].len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exchange READ and WRITE for both arrays at once.
    pub fn swap(&mut self) {
        if let Some(generations) = self.generations.as_mut() {
            generations.current_buffer = 1 - generations.current_buffer;
        }
    }

    pub fn read_positions(&self) -> Option<&[Vec4]> {
        self.generations
            .as_ref()
            .map(|g| g.positions[g.current_buffer].as_slice())
    }

    pub fn read_velocities(&self) -> Option<&[Vec4]> {
        self.generations
            .as_ref()
            .map(|g| g.velocities[g.current_buffer].as_slice())
    }

    /// Split into READ inputs and WRITE outputs for one step.
    pub fn step_buffers(&mut self) -> Option<StepBuffers<'_>> {
        let generations = self.generations.as_mut()?;
        let read = generations.current_buffer;
        let (read_positions, write_positions) = split_pair(&mut generations.positions, read);
        let (read_velocities, write_velocities) = split_pair(&mut generations.velocities, read);
        Some(StepBuffers {
            read_positions,
            read_velocities,
            write_positions,
            write_velocities,
        })
    }
}

fn split_pair(pair: &mut [Vec<Vec4>; 2], read: usize) -> (&[Vec4], &mut [Vec4]) {
    let [first, second] = pair;
    if read == 0 {
        (first.as_slice(), second.as_mut_slice())
    } else {
        (second.as_slice(), first.as_mut_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(n: usize) -> InitialState {
        InitialState {
            positions: (0..n).map(|i| Vec4::splat(i as f32)).collect(),
            velocities: vec![Vec4::ONE; n],
        }
    }

    #[test]
    fn allocate_creates_equal_length_generations() {
        let mut buffers = BodyStateBuffers::new();
        assert!(!buffers.is_allocated());
        assert_eq!(buffers.len(), 0);

        buffers.allocate(512);
        let step = buffers.step_buffers().unwrap();
        assert_eq!(step.read_positions.len(), 512);
        assert_eq!(step.read_velocities.len(), 512);
        assert_eq!(step.write_positions.len(), 512);
        assert_eq!(step.write_velocities.len(), 512);
    }

    #[test]
    fn swap_exposes_the_written_generation() {
        let mut buffers = BodyStateBuffers::new();
        buffers.allocate(4);
        buffers.fill(&state(4));

        {
            let step = buffers.step_buffers().unwrap();
            step.write_positions[2] = Vec4::splat(42.0);
            step.write_velocities[2] = Vec4::splat(-1.0);
        }
        // Nothing visible until the swap
        assert_eq!(buffers.read_positions().unwrap()[2], Vec4::splat(2.0));

        buffers.swap();
        assert_eq!(buffers.read_positions().unwrap()[2], Vec4::splat(42.0));
        assert_eq!(buffers.read_velocities().unwrap()[2], Vec4::splat(-1.0));

        buffers.swap();
        assert_eq!(buffers.read_positions().unwrap()[2], Vec4::splat(2.0));
    }

    #[test]
    fn release_is_idempotent() {
        let mut buffers = BodyStateBuffers::new();
        buffers.release();
        buffers.allocate(256);
        buffers.release();
        buffers.release();
        assert!(!buffers.is_allocated());
        assert!(buffers.read_positions().is_none());
        assert!(buffers.step_buffers().is_none());

        buffers.allocate(512);
        assert_eq!(buffers.len(), 512);
    }

    #[test]
    #[should_panic(expected = "released before reallocating")]
    fn reallocating_in_place_is_refused() {
        let mut buffers = BodyStateBuffers::new();
        buffers.allocate(256);
        buffers.allocate(512);
    }
}
