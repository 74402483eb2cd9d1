pub mod app;
pub mod config;
pub mod error;
pub mod rendering;
pub mod simulation;

pub use config::{Args, SimulationConfig};
pub use error::SimError;
