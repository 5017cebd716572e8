//! In-memory `Gpu` used by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use super::gpu::Gpu;
use super::shader::ShaderStage;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Viewport(u32, u32),
    Clear { depth: bool },
    UniformF32(i32, f32),
    UniformMat4(i32),
}

#[derive(Default)]
pub struct MockGpu {
    uniforms: Vec<&'static str>,
    attributes: Vec<&'static str>,
    fail_link: bool,
    next_id: Cell<u32>,
    shaders: RefCell<HashSet<u32>>,
    programs: RefCell<HashSet<u32>>,
    active: Cell<Option<u32>>,
    errors: RefCell<Vec<u32>>,
    pub calls: RefCell<Vec<Call>>,
}

impl MockGpu {
    pub fn with_uniforms(uniforms: &[&'static str]) -> Self {
        Self {
            uniforms: uniforms.to_vec(),
            ..Self::default()
        }
    }

    pub fn with_attributes(mut self, attributes: &[&'static str]) -> Self {
        self.attributes = attributes.to_vec();
        self
    }

    pub fn failing_link(mut self) -> Self {
        self.fail_link = true;
        self
    }

    pub fn push_error(&self, code: u32) {
        self.errors.borrow_mut().push(code);
    }

    pub fn live_shaders(&self) -> usize {
        self.shaders.borrow().len()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.borrow().len()
    }

    pub fn active_program(&self) -> Option<u32> {
        self.active.get()
    }

    fn next(&self) -> u32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }
}

impl Gpu for MockGpu {
    type Shader = u32;
    type Program = u32;
    type UniformLocation = i32;

    fn create_shader(&self, _stage: ShaderStage) -> Result<u32, String> {
        let id = self.next();
        self.shaders.borrow_mut().insert(id);
        Ok(id)
    }

    fn compile_shader(&self, _shader: u32, source: &str) -> Result<(), String> {
        if source.contains("oops") {
            Err("ERROR: 0:1: 'oops' : syntax error".to_owned())
        } else {
            Ok(())
        }
    }

    fn delete_shader(&self, shader: u32) {
        assert!(self.shaders.borrow_mut().remove(&shader), "double delete of shader {shader}");
    }

    fn create_program(&self) -> Result<u32, String> {
        let id = self.next();
        self.programs.borrow_mut().insert(id);
        Ok(id)
    }

    fn link_program(&self, _program: u32, shaders: &[u32]) -> Result<(), String> {
        assert!(shaders.iter().all(|s| self.shaders.borrow().contains(s)));
        if self.fail_link {
            Err("error: vertex output `v_color` not read by fragment shader".to_owned())
        } else {
            Ok(())
        }
    }

    fn delete_program(&self, program: u32) {
        assert!(self.programs.borrow_mut().remove(&program), "double delete of program {program}");
    }

    fn use_program(&self, program: Option<u32>) {
        self.active.set(program);
    }

    fn uniform_location(&self, _program: u32, name: &str) -> Option<i32> {
        self.uniforms.iter().position(|u| *u == name).map(|i| i as i32)
    }

    fn attrib_location(&self, _program: u32, name: &str) -> Option<u32> {
        self.attributes.iter().position(|a| *a == name).map(|i| i as u32)
    }

    fn viewport(&self, width: u32, height: u32) {
        self.calls.borrow_mut().push(Call::Viewport(width, height));
    }

    fn clear(&self, depth: bool) {
        self.calls.borrow_mut().push(Call::Clear { depth });
    }

    fn uniform_f32(&self, location: &i32, value: f32) {
        self.calls.borrow_mut().push(Call::UniformF32(*location, value));
    }

    fn uniform_mat4(&self, location: &i32, value: &[f32]) {
        assert_eq!(value.len(), 16);
        self.calls.borrow_mut().push(Call::UniformMat4(*location));
    }

    fn take_error(&self) -> Option<u32> {
        let mut errors = self.errors.borrow_mut();
        if errors.is_empty() { None } else { Some(errors.remove(0)) }
    }
}
