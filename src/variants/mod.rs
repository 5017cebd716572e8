//! Reference widgets built on the render loop.

mod mesh_viewer;
mod textured_quad;
mod triangle;

pub use mesh_viewer::MeshViewer;
pub use textured_quad::TexturedQuad;
pub use triangle::Triangle;

use glow::HasContext;

use crate::error::{AppError, Result};

/// Creates a buffer bound to `target` and fills it with static data.
fn upload_buffer(gl: &glow::Context, target: u32, bytes: &[u8]) -> Result<glow::Buffer> {
    unsafe {
        let buffer = gl.create_buffer().map_err(|message| AppError::GpuResource {
            what: "buffer",
            message,
        })?;
        gl.bind_buffer(target, Some(buffer));
        gl.buffer_data_u8_slice(target, bytes, glow::STATIC_DRAW);
        Ok(buffer)
    }
}

/// Points float attribute `location` at `size` components every `stride`
/// bytes, starting `offset` bytes into the bound array buffer.
fn float_attribute(gl: &glow::Context, location: u32, size: i32, stride: i32, offset: i32) {
    unsafe {
        gl.enable_vertex_attrib_array(location);
        gl.vertex_attrib_pointer_f32(location, size, glow::FLOAT, false, stride, offset);
    }
}
