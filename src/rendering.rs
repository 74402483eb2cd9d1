pub mod camera;
mod particle_resources;
mod render_config;
mod render_pass;
pub mod renderer;

pub use camera::{Camera, MoveInput};
pub use renderer::{Frame, Renderer};
