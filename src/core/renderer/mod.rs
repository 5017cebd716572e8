pub mod api;
pub mod frame_clock;
pub mod gpu;
pub mod render_loop;
pub mod shader;

#[cfg(test)]
pub(crate) mod mock;
