use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;

// Body counts must be a multiple of the work group width
pub const BODY_GRANULARITY: usize = 256;

// xyz = position, vx vy vz = velocity, last field = mass
pub type ParticleRecord = [f32; 7];

/// Named procedures producing a complete starting state, in cycling order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum InitialCondition {
    File,
    Cube,
    TwoCubes,
    VerticalSquareSpiral,
    HorizontalSpinningSquareSpiral,
}

impl InitialCondition {
    pub const ALL: [InitialCondition; 5] = [
        InitialCondition::File,
        InitialCondition::Cube,
        InitialCondition::TwoCubes,
        InitialCondition::VerticalSquareSpiral,
        InitialCondition::HorizontalSpinningSquareSpiral,
    ];

    pub fn index(self) -> usize {
        match self {
            InitialCondition::File => 0,
            InitialCondition::Cube => 1,
            InitialCondition::TwoCubes => 2,
            InitialCondition::VerticalSquareSpiral => 3,
            InitialCondition::HorizontalSpinningSquareSpiral => 4,
        }
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn name(self) -> &'static str {
        match self {
            InitialCondition::File => "Particle data file",
            InitialCondition::Cube => "Cube",
            InitialCondition::TwoCubes => "Two cubes",
            InitialCondition::VerticalSquareSpiral => "Vertical square spiral",
            InitialCondition::HorizontalSpinningSquareSpiral => {
                "Horizontal spinning square spiral"
            }
        }
    }

    pub fn is_generated(self) -> bool {
        self != InitialCondition::File
    }
}

impl fmt::Display for InitialCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the per-frame integration step runs.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    /// rayon thread pool
    Cpu,
    /// wgpu compute pass on the rendering device
    #[default]
    Gpu,
}

impl fmt::Display for IntegratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IntegratorKind::Cpu => "CPU",
            IntegratorKind::Gpu => "GPU",
        })
    }
}

/// Round up to the next multiple of [`BODY_GRANULARITY`].
pub fn round_up_to_granularity(count: usize) -> usize {
    count.div_ceil(BODY_GRANULARITY) * BODY_GRANULARITY
}

/// Round down to a multiple of [`BODY_GRANULARITY`], possibly to zero.
pub fn truncate_to_granularity(count: usize) -> usize {
    count - count % BODY_GRANULARITY
}
