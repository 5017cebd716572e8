pub mod renderer;
pub mod surface;
