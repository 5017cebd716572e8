use std::fmt::Debug;

use glow::HasContext;

use super::shader::ShaderStage;

/// The slice of OpenGL ES 2 the harness itself drives.
///
/// Widgets are free to use the full context they are handed; this trait only
/// covers what the shader pipeline and the render loop need, so both can be
/// exercised without a driver.
pub trait Gpu {
    type Shader: Copy + Debug;
    type Program: Copy + Debug;
    type UniformLocation: Clone + Debug;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String>;
    /// Uploads `source` and compiles it. On failure returns the driver's info log.
    fn compile_shader(&self, shader: Self::Shader, source: &str) -> Result<(), String>;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    /// Attaches `shaders`, links, then detaches them again. On failure returns
    /// the driver's info log.
    fn link_program(&self, program: Self::Program, shaders: &[Self::Shader])
    -> Result<(), String>;
    fn delete_program(&self, program: Self::Program);
    fn use_program(&self, program: Option<Self::Program>);

    fn uniform_location(&self, program: Self::Program, name: &str)
    -> Option<Self::UniformLocation>;
    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32>;

    fn viewport(&self, width: u32, height: u32);
    /// Clears the color buffer, and the depth buffer as well when `depth` is set.
    fn clear(&self, depth: bool);
    fn uniform_f32(&self, location: &Self::UniformLocation, value: f32);
    /// Uploads a column-major 4x4 matrix.
    fn uniform_mat4(&self, location: &Self::UniformLocation, value: &[f32]);

    /// Pops the oldest pending driver error, if any.
    fn take_error(&self) -> Option<u32>;
}

// SAFETY (all methods): a `glow::Context` is only reachable through a live
// `Surface`, whose EGL context is current on the owning thread.
impl Gpu for glow::Context {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type UniformLocation = glow::UniformLocation;

    fn create_shader(&self, stage: ShaderStage) -> Result<Self::Shader, String> {
        unsafe { HasContext::create_shader(self, stage.gl_kind()) }
    }

    fn compile_shader(&self, shader: Self::Shader, source: &str) -> Result<(), String> {
        unsafe {
            HasContext::shader_source(self, shader, source);
            HasContext::compile_shader(self, shader);
            if HasContext::get_shader_compile_status(self, shader) {
                Ok(())
            } else {
                Err(HasContext::get_shader_info_log(self, shader))
            }
        }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn link_program(
        &self,
        program: Self::Program,
        shaders: &[Self::Shader],
    ) -> Result<(), String> {
        unsafe {
            for &shader in shaders {
                HasContext::attach_shader(self, program, shader);
            }
            HasContext::link_program(self, program);
            let linked = HasContext::get_program_link_status(self, program);
            for &shader in shaders {
                HasContext::detach_shader(self, program, shader);
            }
            if linked {
                Ok(())
            } else {
                Err(HasContext::get_program_info_log(self, program))
            }
        }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { HasContext::get_uniform_location(self, program, name) }
    }

    fn attrib_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { HasContext::get_attrib_location(self, program, name) }
    }

    fn viewport(&self, width: u32, height: u32) {
        unsafe { HasContext::viewport(self, 0, 0, width as i32, height as i32) }
    }

    fn clear(&self, depth: bool) {
        let mut mask = glow::COLOR_BUFFER_BIT;
        if depth {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        unsafe { HasContext::clear(self, mask) }
    }

    fn uniform_f32(&self, location: &Self::UniformLocation, value: f32) {
        unsafe { HasContext::uniform_1_f32(self, Some(location), value) }
    }

    fn uniform_mat4(&self, location: &Self::UniformLocation, value: &[f32]) {
        unsafe { HasContext::uniform_matrix_4_f32_slice(self, Some(location), false, value) }
    }

    fn take_error(&self) -> Option<u32> {
        match unsafe { HasContext::get_error(self) } {
            glow::NO_ERROR => None,
            code => Some(code),
        }
    }
}
