// src/app.rs

use std::marker::PhantomData;

use log::info;

use crate::config::WidgetConfig;
use crate::core::renderer::api::Widget;
use crate::core::renderer::render_loop::RenderLoop;
use crate::core::surface::backend::SelectedPlatform;
use crate::core::surface::{Platform, Surface};
use crate::error::Result;

/// Puts a widget on screen through the platform `P`.
pub struct App<P: Platform = SelectedPlatform> {
    _platform: PhantomData<P>,
}

impl<P: Platform> App<P> {
    /// Creates the window and surface, then renders `widget` until the loop
    /// stops. Everything is torn down before this returns.
    pub fn run<W>(config: &WidgetConfig, widget: W) -> Result<()>
    where
        W: Widget<glow::Context>,
    {
        info!("Starting widget with {config:?}");

        let window = P::create_window(config.geometry)?;
        let surface = Surface::create(window, config.geometry)?;

        let mut render_loop = RenderLoop::new(surface, widget, config);
        let result = render_loop.run();
        render_loop.teardown();
        result
    }
}
