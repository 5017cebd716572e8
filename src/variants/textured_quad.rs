use std::path::{Path, PathBuf};

use glow::HasContext;
use log::info;
use nalgebra::{Matrix4, Vector3};

use super::{float_attribute, upload_buffer};
use crate::assets::PixelBuffer;
use crate::config::{Geometry, WidgetConfig};
use crate::core::renderer::api::{FrameCtx, PrepareCtx, Widget};
use crate::error::{AppError, Result};

/*
  B +----------+ A
    |         /|
    |       /  |
    |     /    |
    |   /      |
    | /        |
  C +----------+ D
*/
/// x, y, z, s, t per corner.
const VERTICES: [f32; 20] = [
    1.0, 1.0, 0.0, 1.0, 1.0, // A
    -1.0, 1.0, 0.0, 0.0, 1.0, // B
    -1.0, -1.0, 0.0, 0.0, 0.0, // C
    1.0, -1.0, 0.0, 1.0, 0.0, // D
];
const INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];
const STRIDE: i32 = 5 * size_of::<f32>() as i32;

/// Radians per frame.
const SPIN: f32 = 0.01;
const SCALE: f32 = 0.75;

/// A blended, textured plane slowly rotating in the screen plane.
pub struct TexturedQuad {
    shaders: [PathBuf; 2],
    pixels: PixelBuffer,
    buffers: Vec<glow::Buffer>,
    texture: Option<glow::Texture>,
    angle: f32,
}

impl TexturedQuad {
    /// Decodes the texture up front so a bad file fails before any GPU work.
    pub fn new(shader_dir: &Path, texture: &Path) -> Result<Self> {
        Ok(Self {
            shaders: [
                shader_dir.join("texture_vertex.shader"),
                shader_dir.join("texture_fragment.shader"),
            ],
            pixels: PixelBuffer::load(texture)?,
            buffers: Vec::new(),
            texture: None,
            angle: 0.0,
        })
    }

    pub fn config() -> WidgetConfig {
        WidgetConfig::new(Geometry::new(0, 900, 180, 180)).with_fps(20)
    }

    fn upload_texture(&self, gl: &glow::Context) -> Result<glow::Texture> {
        let format = self.pixels.layout.gl_format();
        unsafe {
            let texture = gl.create_texture().map_err(|message| AppError::GpuResource {
                what: "texture",
                message,
            })?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, self.pixels.unpack_alignment());
            for (parameter, value) in [
                (glow::TEXTURE_MIN_FILTER, glow::LINEAR),
                (glow::TEXTURE_MAG_FILTER, glow::LINEAR),
                (glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE),
                (glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE),
            ] {
                gl.tex_parameter_i32(glow::TEXTURE_2D, parameter, value as i32);
            }
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                format as i32,
                self.pixels.width as i32,
                self.pixels.height as i32,
                0,
                format,
                glow::UNSIGNED_BYTE,
                Some(self.pixels.data.as_slice()),
            );
            Ok(texture)
        }
    }
}

impl Widget<glow::Context> for TexturedQuad {
    fn vertex_shader(&self) -> &Path {
        &self.shaders[0]
    }

    fn fragment_shader(&self) -> &Path {
        &self.shaders[1]
    }

    fn prepare(&mut self, ctx: &mut PrepareCtx<'_, glow::Context>) -> Result<()> {
        let xyz = ctx.require_attribute("vertex_xyz")?;
        let st = ctx.require_attribute("vertex_st")?;
        let sampler = ctx.uniform("u_texture");
        let gl = ctx.gpu();

        unsafe {
            gl.enable(glow::BLEND);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
        }

        self.buffers.push(upload_buffer(
            gl,
            glow::ARRAY_BUFFER,
            bytemuck::cast_slice(&VERTICES),
        )?);
        float_attribute(gl, xyz, 3, STRIDE, 0);
        float_attribute(gl, st, 2, STRIDE, 3 * size_of::<f32>() as i32);

        self.buffers.push(upload_buffer(
            gl,
            glow::ELEMENT_ARRAY_BUFFER,
            bytemuck::cast_slice(&INDICES),
        )?);

        let texture = self.upload_texture(gl)?;
        self.texture = Some(texture);
        if let Some(sampler) = &sampler {
            unsafe { gl.uniform_1_i32(Some(sampler), 0) };
        }
        info!("Texture: {texture:?}, u_texture: {sampler:?}");
        Ok(())
    }

    fn draw(&mut self, frame: &mut FrameCtx<'_, glow::Context>) {
        self.angle += SPIN;

        let rotation = Matrix4::new_rotation(-Vector3::z() * self.angle);
        frame.set_mvp(&(rotation * Matrix4::new_scaling(SCALE)));

        unsafe {
            frame
                .gpu()
                .draw_elements(glow::TRIANGLES, INDICES.len() as i32, glow::UNSIGNED_SHORT, 0)
        };
    }

    fn release(&mut self, gl: &glow::Context) {
        unsafe {
            if let Some(texture) = self.texture.take() {
                gl.delete_texture(texture);
            }
            for buffer in self.buffers.drain(..) {
                gl.delete_buffer(buffer);
            }
        }
    }
}
