use std::{error::Error as StdError, fmt, io, path::PathBuf};

use crate::core::renderer::shader::ShaderStage;

#[derive(Debug)]
pub enum AppError {
    /// Native display/context/surface negotiation failed at `step`.
    SurfaceCreation { step: &'static str, cause: String },
    ShaderCompile {
        stage: ShaderStage,
        path: PathBuf,
        log: String,
    },
    ShaderLink { log: String },
    FileNotFound { path: PathBuf, source: io::Error },
    /// `line` is 1-based; `None` when the whole file is rejected (e.g. image decoding).
    MalformedFile {
        path: PathBuf,
        line: Option<usize>,
        reason: String,
    },
    GpuResource { what: &'static str, message: String },
    Gl { code: u32, context: &'static str }, // glGetError code, strict mode only
}

impl AppError {
    pub fn surface(step: &'static str, cause: impl fmt::Display) -> Self {
        Self::SurfaceCreation {
            step,
            cause: cause.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceCreation { step, cause } => write!(f, "{step}: {cause}"),
            Self::ShaderCompile { stage, path, log } => write!(
                f,
                "Cannot compile {stage} shader from file: {}:\n{log}",
                path.display()
            ),
            Self::ShaderLink { log } => write!(f, "Cannot link program:\n{log}"),
            Self::FileNotFound { path, source } => {
                write!(f, "Cannot open file: {} ({source})", path.display())
            }
            Self::MalformedFile {
                path,
                line: Some(line),
                reason,
            } => write!(f, "{}:{line}: {reason}", path.display()),
            Self::MalformedFile {
                path,
                line: None,
                reason,
            } => write!(f, "{}: {reason}", path.display()),
            Self::GpuResource { what, message } => write!(f, "Cannot create {what}: {message}"),
            Self::Gl { code, context } => write!(f, "GL error 0x{code:04X} (context: {context})"),
        }
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::FileNotFound { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Tags a failed EGL call with the surface-creation step it belongs to.
pub trait EglResultExt<T> {
    fn or_step(self, step: &'static str) -> Result<T>;
}

impl<T> EglResultExt<T> for std::result::Result<T, khronos_egl::Error> {
    fn or_step(self, step: &'static str) -> Result<T> {
        self.map_err(|e| AppError::surface(step, e))
    }
}
