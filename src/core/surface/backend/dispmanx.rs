//! Raspberry Pi DispmanX layer, driven through `libbcm_host.so` loaded at runtime.

use std::ffi::c_void;

use khronos_egl::{DEFAULT_DISPLAY, NativeDisplayType, NativeWindowType};
use libloading::Library;
use log::{debug, info};

use crate::config::Geometry;
use crate::core::surface::{NativeWindow, Platform};
use crate::error::{AppError, Result};

const LIBRARY: &str = "libbcm_host.so";

/// Main LCD.
const LCD: u32 = 0;
/// Z-order of the widget element; high enough to sit above the console.
const LAYER: i32 = 100;
const PROTECTION_NONE: u32 = 0;
const NO_ROTATE: u32 = 0;

#[repr(C)]
struct VcRect {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

/// `EGL_DISPMANX_WINDOW_T`
#[repr(C)]
struct DispmanxWindow {
    element: u32,
    width: i32,
    height: i32,
}

type BcmHostInit = unsafe extern "C" fn();
type DisplayOpen = unsafe extern "C" fn(device: u32) -> u32;
type DisplayClose = unsafe extern "C" fn(display: u32) -> i32;
type UpdateStart = unsafe extern "C" fn(priority: i32) -> u32;
type UpdateSubmitSync = unsafe extern "C" fn(update: u32) -> i32;
type ElementAdd = unsafe extern "C" fn(
    update: u32,
    display: u32,
    layer: i32,
    dest_rect: *const VcRect,
    src: u32,
    src_rect: *const VcRect,
    protection: u32,
    alpha: *const c_void,
    clamp: *const c_void,
    transform: u32,
) -> u32;
type ElementRemove = unsafe extern "C" fn(update: u32, element: u32) -> i32;

/// Entry points resolved from `libbcm_host.so`. The library stays loaded for
/// as long as any window created through it.
struct BcmHost {
    display_open: DisplayOpen,
    display_close: DisplayClose,
    update_start: UpdateStart,
    update_submit_sync: UpdateSubmitSync,
    element_add: ElementAdd,
    element_remove: ElementRemove,
    _library: Library,
}

impl BcmHost {
    fn load() -> Result<Self> {
        Self::open(LIBRARY)
    }

    fn open(name: &str) -> Result<Self> {
        let missing = |e: libloading::Error| AppError::surface("Cannot load libbcm_host", e);
        unsafe {
            let library = Library::new(name).map_err(missing)?;
            let init = *library.get::<BcmHostInit>(b"bcm_host_init\0").map_err(missing)?;
            let host = Self {
                display_open: *library
                    .get::<DisplayOpen>(b"vc_dispmanx_display_open\0")
                    .map_err(missing)?,
                display_close: *library
                    .get::<DisplayClose>(b"vc_dispmanx_display_close\0")
                    .map_err(missing)?,
                update_start: *library
                    .get::<UpdateStart>(b"vc_dispmanx_update_start\0")
                    .map_err(missing)?,
                update_submit_sync: *library
                    .get::<UpdateSubmitSync>(b"vc_dispmanx_update_submit_sync\0")
                    .map_err(missing)?,
                element_add: *library
                    .get::<ElementAdd>(b"vc_dispmanx_element_add\0")
                    .map_err(missing)?,
                element_remove: *library
                    .get::<ElementRemove>(b"vc_dispmanx_element_remove\0")
                    .map_err(missing)?,
                _library: library,
            };
            init();
            Ok(host)
        }
    }
}

pub struct DispmanxPlatform;

impl Platform for DispmanxPlatform {
    type Window = DispmanxElement;

    fn create_window(geometry: Geometry) -> Result<DispmanxElement> {
        let host = BcmHost::load()?;

        let width = geometry.width as i32;
        let height = geometry.height as i32;
        let dest = VcRect {
            x: geometry.x,
            y: geometry.y,
            width,
            height,
        };
        // Source rectangle is in 16.16 fixed point.
        let src = VcRect {
            x: 0,
            y: 0,
            width: width << 16,
            height: height << 16,
        };

        let display = unsafe { (host.display_open)(LCD) };
        if display == 0 {
            return Err(AppError::surface(
                "Cannot open DispmanX display",
                "vc_dispmanx_display_open returned 0",
            ));
        }

        let element = unsafe {
            let update = (host.update_start)(0);
            let element = (host.element_add)(
                update,
                display,
                LAYER,
                &dest,
                0,
                &src,
                PROTECTION_NONE,
                std::ptr::null(),
                std::ptr::null(),
                NO_ROTATE,
            );
            (host.update_submit_sync)(update);
            element
        };
        if element == 0 {
            unsafe { (host.display_close)(display) };
            return Err(AppError::surface(
                "Cannot create DispmanX element",
                "vc_dispmanx_element_add returned 0",
            ));
        }
        info!("DispmanX element {element} on layer {LAYER}");

        Ok(DispmanxElement {
            // EGL keeps the pointer, so the window lives on the heap.
            window: Box::new(DispmanxWindow {
                element,
                width,
                height,
            }),
            display,
            host,
        })
    }
}

pub struct DispmanxElement {
    window: Box<DispmanxWindow>,
    display: u32,
    host: BcmHost,
}

impl NativeWindow for DispmanxElement {
    fn native_display(&self) -> Result<NativeDisplayType> {
        Ok(DEFAULT_DISPLAY)
    }

    fn native_window(&self) -> Result<NativeWindowType> {
        Ok(&*self.window as *const DispmanxWindow as NativeWindowType)
    }
}

impl Drop for DispmanxElement {
    fn drop(&mut self) {
        unsafe {
            let update = (self.host.update_start)(0);
            (self.host.element_remove)(update, self.window.element);
            (self.host.update_submit_sync)(update);
            (self.host.display_close)(self.display);
        }
        debug!("DispmanX element {} removed", self.window.element);
    }
}
