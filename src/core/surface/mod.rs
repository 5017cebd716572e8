//! Native window + EGL display/context/surface lifecycle.

pub mod backend;
pub mod egl;

use khronos_egl::{NativeDisplayType, NativeWindowType};

use crate::config::Geometry;
use crate::core::renderer::gpu::Gpu;
use crate::error::Result;

pub use egl::{EglHandles, Surface};

/// A host window EGL can render into.
pub trait NativeWindow {
    /// Display connection handed to `eglGetDisplay`.
    fn native_display(&self) -> Result<NativeDisplayType>;

    /// Window handle handed to `eglCreateWindowSurface`.
    fn native_window(&self) -> Result<NativeWindowType>;
}

/// Creates native windows for one host windowing environment.
///
/// Exactly one implementation is compiled in, see [`backend::SelectedPlatform`].
pub trait Platform {
    type Window: NativeWindow;

    /// Creates a window of the requested size at the requested offset.
    fn create_window(geometry: Geometry) -> Result<Self::Window>;
}

/// What the render loop needs from a live surface.
pub trait DrawSurface {
    type Gpu: Gpu;

    fn gpu(&self) -> &Self::Gpu;

    /// Drawable size in pixels.
    fn size(&self) -> (u32, u32);

    /// Presents the back buffer.
    fn present(&mut self) -> Result<()>;

    fn is_live(&self) -> bool;

    /// Clears, presents and releases the surface. Calling it again is a no-op.
    fn destroy(&mut self);
}
