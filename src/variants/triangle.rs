use std::path::{Path, PathBuf};

use glow::HasContext;
use nalgebra::{Matrix4, Vector3};

use super::{float_attribute, upload_buffer};
use crate::config::{Geometry, WidgetConfig};
use crate::core::renderer::api::{FrameCtx, PrepareCtx, Widget};
use crate::error::Result;

/// x, y, r, g, b per corner.
const VERTICES: [f32; 15] = [
    -1.0, -1.0, 1.0, 0.0, 0.0, //
    1.0, -1.0, 0.0, 1.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 1.0, //
];
const STRIDE: i32 = 5 * size_of::<f32>() as i32;

/// Degrees per frame.
const SPIN: f32 = 5.0;
const SCALE: f32 = 0.6;

/// A colored triangle spinning around the z axis.
pub struct Triangle {
    shaders: [PathBuf; 2],
    buffer: Option<glow::Buffer>,
    angle: f32,
}

impl Triangle {
    pub fn new(shader_dir: &Path) -> Self {
        Self {
            shaders: [
                shader_dir.join("triangle_vertex.shader"),
                shader_dir.join("triangle_fragment.shader"),
            ],
            buffer: None,
            angle: 0.0,
        }
    }

    pub fn config() -> WidgetConfig {
        WidgetConfig::new(Geometry::new(100, 100, 400, 400)).with_fps(15)
    }
}

impl Widget<glow::Context> for Triangle {
    fn vertex_shader(&self) -> &Path {
        &self.shaders[0]
    }

    fn fragment_shader(&self) -> &Path {
        &self.shaders[1]
    }

    fn prepare(&mut self, ctx: &mut PrepareCtx<'_, glow::Context>) -> Result<()> {
        let pos = ctx.require_attribute("pos")?;
        let color = ctx.require_attribute("color")?;
        let gl = ctx.gpu();

        self.buffer = Some(upload_buffer(
            gl,
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(&VERTICES),
        )?);
        float_attribute(gl, pos, 2, STRIDE, 0);
        float_attribute(gl, color, 3, STRIDE, 2 * size_of::<f32>() as i32);
        Ok(())
    }

    fn draw(&mut self, frame: &mut FrameCtx<'_, glow::Context>) {
        let rotation = Matrix4::new_rotation(Vector3::z() * self.angle.to_radians());
        frame.set_mvp(&(rotation * Matrix4::new_scaling(SCALE)));

        unsafe { frame.gpu().draw_arrays(glow::TRIANGLES, 0, 3) };

        self.angle = (self.angle + SPIN) % 360.0;
    }

    fn release(&mut self, gl: &glow::Context) {
        if let Some(buffer) = self.buffer.take() {
            unsafe { gl.delete_buffer(buffer) };
        }
    }
}
