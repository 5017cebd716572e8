use std::{ffi::c_void, ptr};

use glow::HasContext;
use khronos_egl as egl;
use log::{debug, info};

use super::{DrawSurface, NativeWindow};
use crate::config::Geometry;
use crate::error::{AppError, EglResultExt, Result};

type Egl = egl::DynamicInstance<egl::EGL1_4>;

/// Framebuffer configuration: 8-bit color + alpha channel, window-renderable.
const CONFIG_ATTRIBUTES: [egl::Int; 11] = [
    egl::RED_SIZE,
    8,
    egl::GREEN_SIZE,
    8,
    egl::BLUE_SIZE,
    8,
    egl::ALPHA_SIZE,
    8,
    egl::SURFACE_TYPE,
    egl::WINDOW_BIT,
    egl::NONE,
];

/// OpenGL ES 2 context.
const CONTEXT_ATTRIBUTES: [egl::Int; 3] = [egl::CONTEXT_CLIENT_VERSION, 2, egl::NONE];

/// The EGL half of a surface: library, display, context and window surface.
///
/// Filled in step by step while opening; whatever was acquired is released in
/// reverse order by [`release`](Self::release), which is safe to call any
/// number of times and runs on drop.
#[derive(Default)]
pub struct EglHandles {
    egl: Option<Egl>,
    display: Option<egl::Display>,
    context: Option<egl::Context>,
    surface: Option<egl::Surface>,
}

impl EglHandles {
    pub fn is_live(&self) -> bool {
        self.egl.is_some()
            && self.display.is_some()
            && self.context.is_some()
            && self.surface.is_some()
    }

    /// Negotiates display, config, context and surface for `native`, makes the
    /// context current and returns the GLES entry points bound to it.
    fn open(&mut self, native: &impl NativeWindow) -> Result<glow::Context> {
        let api = unsafe { Egl::load_required() }
            .map_err(|e| AppError::surface("Cannot load libEGL", e))?;
        let api = &*self.egl.insert(api);

        let display = unsafe { api.get_display(native.native_display()?) }
            .ok_or_else(|| AppError::surface("Cannot get display", "EGL_NO_DISPLAY"))?;
        self.display = Some(display);

        let (major, minor) = api
            .initialize(display)
            .or_step("Cannot initialize display")?;
        info!("EGL {major}.{minor} initialized");

        let config = api
            .choose_first_config(display, &CONFIG_ATTRIBUTES)
            .or_step("Cannot choose config")?
            .ok_or_else(|| {
                AppError::surface("Cannot choose config", "no 8-bit RGBA window config")
            })?;

        api.bind_api(egl::OPENGL_ES_API)
            .or_step("Cannot bind API")?;

        let context = api
            .create_context(display, config, None, &CONTEXT_ATTRIBUTES)
            .or_step("Cannot create context")?;
        self.context = Some(context);

        let window = native.native_window()?;
        let surface = unsafe { api.create_window_surface(display, config, window, None) }
            .or_step("Cannot create surface")?;
        self.surface = Some(surface);

        api.make_current(display, Some(surface), Some(surface), Some(context))
            .or_step("Cannot connect context to surface")?;

        let gl = unsafe {
            glow::Context::from_loader_function(|name| {
                api.get_proc_address(name)
                    .map_or(ptr::null(), |f| f as *const c_void)
            })
        };
        Ok(gl)
    }

    fn swap(&self) -> Result<()> {
        match (&self.egl, self.display, self.surface) {
            (Some(api), Some(display), Some(surface)) => api
                .swap_buffers(display, surface)
                .map_err(|e| AppError::surface("Cannot swap buffers", e)),
            _ => Ok(()),
        }
    }

    /// Unbinds the context and releases surface, context and display, in
    /// that order.
    pub fn release(&mut self) {
        if let (Some(api), Some(display)) = (&self.egl, self.display) {
            if let Err(e) = api.make_current(display, None, None, None) {
                debug!("eglMakeCurrent(NONE) failed during teardown: {e}");
            }
            if let Some(surface) = self.surface.take() {
                if let Err(e) = api.destroy_surface(display, surface) {
                    debug!("eglDestroySurface failed: {e}");
                }
            }
            if let Some(context) = self.context.take() {
                if let Err(e) = api.destroy_context(display, context) {
                    debug!("eglDestroyContext failed: {e}");
                }
            }
            if let Err(e) = api.terminate(display) {
                debug!("eglTerminate failed: {e}");
            }
        }

        self.surface = None;
        self.context = None;
        self.display = None;
        self.egl = None;
    }
}

impl Drop for EglHandles {
    fn drop(&mut self) {
        self.release();
    }
}

/// A native window with a current GLES 2 context bound to it.
///
/// Either fully live or fully torn down; construction that fails partway
/// releases everything it acquired before returning the error.
pub struct Surface<W: NativeWindow> {
    handles: EglHandles,
    gl: glow::Context,
    geometry: Geometry,
    // Dropped after `handles` so EGL lets go of the window first.
    window: W,
}

impl<W: NativeWindow> Surface<W> {
    pub fn create(window: W, geometry: Geometry) -> Result<Self> {
        info!(
            "Creating surface {}x{} at ({}, {})",
            geometry.width, geometry.height, geometry.x, geometry.y
        );

        let mut handles = EglHandles::default();
        let gl = handles.open(&window)?;

        Ok(Self {
            handles,
            gl,
            geometry,
            window,
        })
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn window(&self) -> &W {
        &self.window
    }
}

impl<W: NativeWindow> DrawSurface for Surface<W> {
    type Gpu = glow::Context;

    fn gpu(&self) -> &glow::Context {
        &self.gl
    }

    fn size(&self) -> (u32, u32) {
        (self.geometry.width, self.geometry.height)
    }

    fn present(&mut self) -> Result<()> {
        self.handles.swap()
    }

    fn is_live(&self) -> bool {
        self.handles.is_live()
    }

    fn destroy(&mut self) {
        if self.handles.is_live() {
            // Leave an empty frame on screen rather than the last one.
            unsafe { self.gl.clear(glow::COLOR_BUFFER_BIT) };
            if let Err(e) = self.handles.swap() {
                debug!("final present failed: {e}");
            }
            info!("Destroying surface");
        }
        self.handles.release();
    }
}

impl<W: NativeWindow> Drop for Surface<W> {
    fn drop(&mut self) {
        self.destroy();
    }
}
