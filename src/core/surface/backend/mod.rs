// src/core/surface/backend/mod.rs
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "dispmanx")]
pub mod dispmanx;

#[cfg(all(feature = "x11", feature = "dispmanx"))]
compile_error!("features `x11` and `dispmanx` are mutually exclusive");

#[cfg(not(any(feature = "x11", feature = "dispmanx")))]
compile_error!("enable one native window backend: `x11` or `dispmanx`");

// Re-export the selected backend under a common name:
#[cfg(all(feature = "x11", not(feature = "dispmanx")))]
pub use x11::X11Platform as SelectedPlatform;

#[cfg(all(feature = "dispmanx", not(feature = "x11")))]
pub use dispmanx::DispmanxPlatform as SelectedPlatform;
