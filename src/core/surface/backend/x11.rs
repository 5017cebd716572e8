//! Borderless, always-on-top X11 window created through winit.

use std::time::Duration;

use khronos_egl::{NativeDisplayType, NativeWindowType};
use log::info;
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    error::OsError,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    platform::{
        pump_events::EventLoopExtPumpEvents,
        x11::{EventLoopBuilderExtX11, WindowAttributesExtX11},
    },
    raw_window_handle::{HasDisplayHandle, HasWindowHandle, RawDisplayHandle, RawWindowHandle},
    window::{Window, WindowAttributes, WindowId, WindowLevel},
};

use crate::config::Geometry;
use crate::core::surface::{NativeWindow, Platform};
use crate::error::{AppError, Result};

/// winit hands out the first `ActiveEventLoop` on `resumed`; give up after this
/// many pumps without one.
const MAX_PUMPS: usize = 16;

pub struct X11Platform;

impl Platform for X11Platform {
    type Window = X11Window;

    fn create_window(geometry: Geometry) -> Result<X11Window> {
        let mut event_loop = EventLoop::builder()
            .with_x11()
            .build()
            .map_err(|e| AppError::surface("Cannot open X11 display", e))?;

        let attributes = Window::default_attributes()
            .with_title("EGLWidget")
            .with_decorations(false)
            .with_transparent(true)
            .with_resizable(false)
            .with_window_level(WindowLevel::AlwaysOnTop)
            .with_override_redirect(true)
            .with_position(PhysicalPosition::new(geometry.x, geometry.y))
            .with_inner_size(PhysicalSize::new(geometry.width, geometry.height));

        let mut request = WindowRequest {
            attributes: Some(attributes),
            window: None,
        };

        for _ in 0..MAX_PUMPS {
            event_loop.pump_app_events(Some(Duration::ZERO), &mut request);
            if request.window.is_some() {
                break;
            }
        }

        let window = match request.window {
            Some(Ok(window)) => window,
            Some(Err(e)) => return Err(AppError::surface("Cannot create X11 window", e)),
            None => {
                return Err(AppError::surface(
                    "Cannot create X11 window",
                    "event loop never resumed",
                ));
            }
        };
        info!("X11 window {:?} created", window.id());

        Ok(X11Window {
            window,
            _event_loop: event_loop,
        })
    }
}

/// Creates the window from inside the event loop, the way winit expects.
struct WindowRequest {
    attributes: Option<WindowAttributes>,
    window: Option<std::result::Result<Window, OsError>>,
}

impl ApplicationHandler for WindowRequest {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(attributes) = self.attributes.take() {
            self.window = Some(event_loop.create_window(attributes));
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, _event: WindowEvent) {}
}

pub struct X11Window {
    window: Window,
    // keep the X connection open for as long as the window lives
    _event_loop: EventLoop<()>,
}

impl NativeWindow for X11Window {
    fn native_display(&self) -> Result<NativeDisplayType> {
        let handle = self
            .window
            .display_handle()
            .map_err(|e| AppError::surface("Cannot open X11 display", e))?;

        match handle.as_raw() {
            RawDisplayHandle::Xlib(xlib) => Ok(xlib
                .display
                .map_or(std::ptr::null_mut(), |display| display.as_ptr())),
            other => Err(AppError::surface(
                "Cannot open X11 display",
                format!("unsupported display handle {other:?}"),
            )),
        }
    }

    fn native_window(&self) -> Result<NativeWindowType> {
        let handle = self
            .window
            .window_handle()
            .map_err(|e| AppError::surface("Cannot create surface", e))?;

        match handle.as_raw() {
            RawWindowHandle::Xlib(xlib) => Ok(xlib.window as NativeWindowType),
            other => Err(AppError::surface(
                "Cannot create surface",
                format!("unsupported window handle {other:?}"),
            )),
        }
    }
}
