use std::time::Duration;

use log::warn;

/// Screen placement of a widget, in physical pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// What the render loop does with graphics-driver errors once it is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GlErrorPolicy {
    /// Never query the driver; failed draws and presents are tolerated.
    #[default]
    Ignore,
    /// Query `glGetError` after every frame and stop the loop on the first error.
    Fail,
}

/// Construction-time parameters of a widget.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub geometry: Geometry,
    pub fps: u32,
    pub gl_errors: GlErrorPolicy,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            geometry: Geometry::new(0, 0, 400, 400),
            fps: 30,
            gl_errors: GlErrorPolicy::Ignore,
        }
    }
}

impl WidgetConfig {
    pub const FPS_VAR: &'static str = "EGL_WIDGET_FPS";
    pub const STRICT_GL_VAR: &'static str = "EGL_WIDGET_STRICT_GL";

    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            ..Self::default()
        }
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    pub fn with_gl_errors(mut self, policy: GlErrorPolicy) -> Self {
        self.gl_errors = policy;
        self
    }

    /// Wall-clock time allotted to one frame: `1_000_000 / fps` microseconds.
    ///
    /// An fps of 0 is treated as 1.
    pub fn frame_budget(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.fps.max(1)))
    }

    /// Applies `EGL_WIDGET_FPS` / `EGL_WIDGET_STRICT_GL` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup. Unparsable values are
    /// ignored with a warning.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(Self::FPS_VAR) {
            match raw.trim().parse::<u32>() {
                Ok(fps) if fps > 0 => self.fps = fps,
                _ => warn!("ignoring {}={raw:?}: expected a positive integer", Self::FPS_VAR),
            }
        }

        if let Some(raw) = lookup(Self::STRICT_GL_VAR) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.gl_errors = GlErrorPolicy::Fail,
                "0" | "false" | "no" | "off" => self.gl_errors = GlErrorPolicy::Ignore,
                _ => warn!("ignoring {}={raw:?}: expected a boolean", Self::STRICT_GL_VAR),
            }
        }

        self
    }
}
