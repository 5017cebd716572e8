use std::path::Path;

use nalgebra::Matrix4;

use super::frame_clock::FrameTime;
use super::gpu::Gpu;
use super::shader::ShaderProgram;
use crate::error::{AppError, Result};

/// Contract every visual variant implements to plug into the render loop.
///
/// The loop always runs the shared base step first: on `prepare` it sets the
/// viewport, on every frame it clears color + depth and uploads the frame
/// counter to the optional `frames` uniform. Implementations only add their
/// own work on top.
pub trait Widget<G: Gpu> {
    /// Path to the vertex stage source. Queried once, before compilation.
    fn vertex_shader(&self) -> &Path;

    /// Path to the fragment stage source. Queried once, before compilation.
    fn fragment_shader(&self) -> &Path;

    /// Called once with the program linked and active, before the first frame.
    /// Upload buffers/textures and describe vertex layouts here.
    fn prepare(&mut self, ctx: &mut PrepareCtx<'_, G>) -> Result<()>;

    /// Called once per frame. Must not block.
    fn draw(&mut self, frame: &mut FrameCtx<'_, G>);

    /// Called once after the loop stops, while the context is still current.
    fn release(&mut self, gpu: &G) {
        let _ = gpu;
    }
}

/// Context handed to [`Widget::prepare`].
pub struct PrepareCtx<'a, G: Gpu> {
    gpu: &'a G,
    program: &'a mut ShaderProgram<G>,
    size: (u32, u32),
}

impl<'a, G: Gpu> PrepareCtx<'a, G> {
    pub(crate) fn new(gpu: &'a G, program: &'a mut ShaderProgram<G>, size: (u32, u32)) -> Self {
        Self { gpu, program, size }
    }

    pub fn gpu(&self) -> &'a G {
        self.gpu
    }

    pub fn program(&self) -> G::Program {
        self.program.handle()
    }

    /// Surface size in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn uniform(&mut self, name: &str) -> Option<G::UniformLocation> {
        self.program.uniform(self.gpu, name)
    }

    pub fn attribute(&mut self, name: &str) -> Option<u32> {
        self.program.attribute(self.gpu, name)
    }

    /// Like [`attribute`](Self::attribute), but a missing name is a link error.
    pub fn require_attribute(&mut self, name: &str) -> Result<u32> {
        self.attribute(name).ok_or_else(|| AppError::ShaderLink {
            log: format!("required attribute `{name}` not found in linked program"),
        })
    }
}

/// Context handed to [`Widget::draw`].
pub struct FrameCtx<'a, G: Gpu> {
    gpu: &'a G,
    program: &'a mut ShaderProgram<G>,
    time: FrameTime,
    size: (u32, u32),
}

impl<'a, G: Gpu> FrameCtx<'a, G> {
    pub(crate) fn new(
        gpu: &'a G,
        program: &'a mut ShaderProgram<G>,
        time: FrameTime,
        size: (u32, u32),
    ) -> Self {
        Self {
            gpu,
            program,
            time,
            size,
        }
    }

    pub fn gpu(&self) -> &'a G {
        self.gpu
    }

    pub fn time(&self) -> FrameTime {
        self.time
    }

    /// Value uploaded to the `frames` uniform for this frame.
    pub fn frame_index(&self) -> u64 {
        self.time.frame_index
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Uploads the model-view-projection transform.
    pub fn set_mvp(&self, mvp: &Matrix4<f32>) {
        if let Some(location) = self.program.mvp_location() {
            self.gpu.uniform_mat4(location, mvp.as_slice());
        }
    }

    pub fn uniform(&mut self, name: &str) -> Option<G::UniformLocation> {
        self.program.uniform(self.gpu, name)
    }
}
