use std::path::{Path, PathBuf};

use glow::HasContext;
use log::info;
use nalgebra::{Matrix4, Unit, Vector3};

use super::{float_attribute, upload_buffer};
use crate::assets::Mesh;
use crate::config::{Geometry, WidgetConfig};
use crate::core::renderer::api::{FrameCtx, PrepareCtx, Widget};
use crate::error::{AppError, Result};

/// Radians per frame.
const SPIN: f32 = 0.01;

/// An OBJ mesh tumbling around the (1, 1, 1) axis.
pub struct MeshViewer {
    shaders: [PathBuf; 2],
    mesh: Mesh,
    scale: f32,
    buffers: Vec<glow::Buffer>,
    angle: f32,
}

impl MeshViewer {
    /// Parses the mesh up front so a bad file fails before any GPU work.
    pub fn new(shader_dir: &Path, mesh: &Path, scale: f32) -> Result<Self> {
        let mesh_data = Mesh::load(mesh)?;
        let count = mesh_data.vertices.len();
        let reason = if count > usize::from(u16::MAX) + 1 {
            Some(format!("{count} vertices do not fit 16-bit indices"))
        } else {
            mesh_data
                .faces
                .iter()
                .flat_map(|face| [face.a, face.b, face.c])
                .find(|&index| usize::from(index) >= count)
                .map(|index| format!("face refers to vertex {} of {count}", index + 1))
        };
        if let Some(reason) = reason {
            return Err(AppError::MalformedFile {
                path: mesh.to_path_buf(),
                line: None,
                reason,
            });
        }

        Ok(Self {
            shaders: [
                shader_dir.join("logo_vertex.shader"),
                shader_dir.join("logo_fragment.shader"),
            ],
            mesh: mesh_data,
            scale,
            buffers: Vec::new(),
            angle: 0.0,
        })
    }

    pub fn config() -> WidgetConfig {
        WidgetConfig::new(Geometry::new(0, 0, 400, 400)).with_fps(30)
    }
}

impl Widget<glow::Context> for MeshViewer {
    fn vertex_shader(&self) -> &Path {
        &self.shaders[0]
    }

    fn fragment_shader(&self) -> &Path {
        &self.shaders[1]
    }

    fn prepare(&mut self, ctx: &mut PrepareCtx<'_, glow::Context>) -> Result<()> {
        let pos = ctx.require_attribute("pos")?;
        let gl = ctx.gpu();

        let vertices = upload_buffer(gl, glow::ARRAY_BUFFER, self.mesh.vertex_bytes())?;
        self.buffers.push(vertices);
        float_attribute(gl, pos, 3, 3 * size_of::<f32>() as i32, 0);

        let indices = upload_buffer(gl, glow::ELEMENT_ARRAY_BUFFER, self.mesh.index_bytes())?;
        self.buffers.push(indices);

        info!(
            "vertex buf: {vertices:?}, triangles buf: {indices:?}, \
             vertex num: {}, triangles num: {}",
            self.mesh.vertices.len(),
            self.mesh.faces.len()
        );
        Ok(())
    }

    fn draw(&mut self, frame: &mut FrameCtx<'_, glow::Context>) {
        let axis = Unit::new_normalize(Vector3::new(1.0, 1.0, 1.0));
        let rotation = Matrix4::from_axis_angle(&axis, self.angle);
        frame.set_mvp(&(rotation * Matrix4::new_scaling(self.scale)));
        self.angle += SPIN;

        let count = self.mesh.index_count() as i32;
        unsafe {
            frame
                .gpu()
                .draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_SHORT, 0)
        };
    }

    fn release(&mut self, gl: &glow::Context) {
        for buffer in self.buffers.drain(..) {
            unsafe { gl.delete_buffer(buffer) };
        }
    }
}
