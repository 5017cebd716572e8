//! File loaders feeding widget `prepare` hooks.

pub mod image;
pub mod mesh;

pub use image::{PixelBuffer, PixelLayout};
pub use mesh::{Face, Mesh, Vertex};
