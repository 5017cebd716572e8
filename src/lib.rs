//! Small always-on-top EGL/GLES 2 widgets.
//!
//! A [`Widget`](core::renderer::api::Widget) names its shader files, uploads
//! its geometry once in `prepare` and issues its draw calls every frame. The
//! [`RenderLoop`](core::renderer::render_loop::RenderLoop) owns everything
//! else: shader compilation and linking, viewport, clearing, the `frames`
//! counter, pacing and teardown. [`App`](app::App) wires a loop to a native
//! window chosen at build time (`x11` or `dispmanx` feature).

pub mod app;
pub mod assets;
pub mod config;
pub mod core;
pub mod error;
pub mod variants;
