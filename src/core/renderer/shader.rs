use std::{collections::HashMap, fmt, fs, path::Path};

use log::info;

use super::gpu::Gpu;
use crate::error::{AppError, Result};

/// Transform uniform every program must expose.
pub const MVP_UNIFORM: &str = "mvp";
/// Optional per-frame counter uniform.
pub const FRAMES_UNIFORM: &str = "frames";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_kind(self) -> u32 {
        match self {
            Self::Vertex => glow::VERTEX_SHADER,
            Self::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// Reads one stage's source verbatim.
pub fn load_stage_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| AppError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })
}

/// A compiled stage. The driver object is deleted when this is dropped, which
/// happens right after linking or on any failure path.
pub struct CompiledStage<'g, G: Gpu> {
    gpu: &'g G,
    handle: G::Shader,
    stage: ShaderStage,
}

impl<G: Gpu> CompiledStage<'_, G> {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl<G: Gpu> Drop for CompiledStage<'_, G> {
    fn drop(&mut self) {
        self.gpu.delete_shader(self.handle);
    }
}

pub fn compile_stage<'g, G: Gpu>(
    gpu: &'g G,
    stage: ShaderStage,
    path: &Path,
    source: &str,
) -> Result<CompiledStage<'g, G>> {
    info!("Compiling {stage} shader file: {}", path.display());

    let compile_error = |log: String| AppError::ShaderCompile {
        stage,
        path: path.to_path_buf(),
        log,
    };

    let handle = gpu.create_shader(stage).map_err(compile_error)?;
    let compiled = CompiledStage { gpu, handle, stage };
    gpu.compile_shader(handle, source).map_err(compile_error)?;

    Ok(compiled)
}

/// Links both stages into a new program. The stages are released whether or
/// not linking succeeds, and a failed program is deleted.
pub fn link<G: Gpu>(
    gpu: &G,
    vertex: CompiledStage<'_, G>,
    fragment: CompiledStage<'_, G>,
) -> Result<ShaderProgram<G>> {
    debug_assert_eq!(vertex.stage(), ShaderStage::Vertex);
    debug_assert_eq!(fragment.stage(), ShaderStage::Fragment);

    let handle = gpu
        .create_program()
        .map_err(|log| AppError::ShaderLink { log })?;

    if let Err(log) = gpu.link_program(handle, &[vertex.handle, fragment.handle]) {
        gpu.delete_program(handle);
        return Err(AppError::ShaderLink { log });
    }

    Ok(ShaderProgram {
        handle,
        mvp: None,
        frames: None,
        uniforms: HashMap::new(),
        attributes: HashMap::new(),
    })
}

/// A linked, active program together with every location resolved on it.
///
/// Lookups are cached, so a name resolves to the same location for the whole run.
pub struct ShaderProgram<G: Gpu> {
    handle: G::Program,
    mvp: Option<G::UniformLocation>,
    frames: Option<G::UniformLocation>,
    uniforms: HashMap<String, Option<G::UniformLocation>>,
    attributes: HashMap<String, Option<u32>>,
}

impl<G: Gpu> ShaderProgram<G> {
    /// Loads, compiles and links both stages, activates the program and
    /// resolves the harness uniforms. A missing `mvp` uniform is a link error.
    pub fn build(gpu: &G, vertex_path: &Path, fragment_path: &Path) -> Result<Self> {
        info!("Loading shaders");

        let vertex_source = load_stage_source(vertex_path)?;
        let fragment_source = load_stage_source(fragment_path)?;

        let vertex = compile_stage(gpu, ShaderStage::Vertex, vertex_path, &vertex_source)?;
        let fragment = compile_stage(gpu, ShaderStage::Fragment, fragment_path, &fragment_source)?;
        let mut program = link(gpu, vertex, fragment)?;

        gpu.use_program(Some(program.handle));

        let Some(mvp) = program.uniform(gpu, MVP_UNIFORM) else {
            gpu.use_program(None);
            gpu.delete_program(program.handle);
            return Err(AppError::ShaderLink {
                log: format!(
                    "required uniform `{MVP_UNIFORM}` not found in program linked from {} and {}",
                    vertex_path.display(),
                    fragment_path.display()
                ),
            });
        };
        let frames = program.uniform(gpu, FRAMES_UNIFORM);

        info!("Shader uniforms: {MVP_UNIFORM}={mvp:?}, {FRAMES_UNIFORM}={frames:?}");

        program.mvp = Some(mvp);
        program.frames = frames;
        Ok(program)
    }

    pub fn handle(&self) -> G::Program {
        self.handle
    }

    pub fn mvp_location(&self) -> Option<&G::UniformLocation> {
        self.mvp.as_ref()
    }

    pub fn frames_location(&self) -> Option<&G::UniformLocation> {
        self.frames.as_ref()
    }

    /// Resolves a uniform; `None` means the linked program has no such name.
    pub fn uniform(&mut self, gpu: &G, name: &str) -> Option<G::UniformLocation> {
        let handle = self.handle;
        self.uniforms
            .entry(name.to_owned())
            .or_insert_with(|| gpu.uniform_location(handle, name))
            .clone()
    }

    /// Resolves a vertex attribute; `None` means the linked program has no such name.
    pub fn attribute(&mut self, gpu: &G, name: &str) -> Option<u32> {
        let handle = self.handle;
        *self
            .attributes
            .entry(name.to_owned())
            .or_insert_with(|| gpu.attrib_location(handle, name))
    }

    /// Deactivates and deletes the program.
    pub fn delete(self, gpu: &G) {
        gpu.use_program(None);
        gpu.delete_program(self.handle);
    }
}
