use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;

use log::{debug, info};

use super::api::{FrameCtx, PrepareCtx, Widget};
use super::frame_clock::FrameClock;
use super::gpu::Gpu;
use super::shader::ShaderProgram;
use crate::config::{GlErrorPolicy, WidgetConfig};
use crate::core::surface::DrawSurface;
use crate::error::{AppError, Result};

/// Lifecycle of a [`RenderLoop`]. A loop is born with a live surface.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    SurfaceLive,
    PipelineLinked,
    Running,
    /// Left the loop after a stop request or a strict-mode error; the surface is still live.
    Stopped,
    TornDown,
}

/// Cooperative stop request, checked at the top of every iteration.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Builds the shader pipeline, prepares the widget and then draws it at a
/// fixed rate until stopped.
pub struct RenderLoop<S, W>
where
    S: DrawSurface,
    W: Widget<S::Gpu>,
{
    surface: S,
    widget: W,
    clock: FrameClock,
    gl_errors: GlErrorPolicy,
    state: LoopState,
    stop: StopHandle,
}

impl<S, W> RenderLoop<S, W>
where
    S: DrawSurface,
    W: Widget<S::Gpu>,
{
    pub fn new(surface: S, widget: W, config: &WidgetConfig) -> Self {
        let state = if surface.is_live() {
            LoopState::SurfaceLive
        } else {
            LoopState::TornDown
        };

        Self {
            surface,
            widget,
            clock: FrameClock::new(config.frame_budget()),
            gl_errors: config.gl_errors,
            state,
            stop: StopHandle::default(),
        }
    }

    /// Shares an existing stop flag, e.g. one already handed to the widget.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Frames presented so far.
    pub fn frames(&self) -> u64 {
        self.clock.frame_index()
    }

    /// Runs until [`StopHandle::stop`] is called.
    ///
    /// Startup failures tear the surface down before returning. After a
    /// regular stop the surface stays live until [`teardown`](Self::teardown)
    /// or drop.
    pub fn run(&mut self) -> Result<()> {
        if self.state != LoopState::SurfaceLive {
            return Err(AppError::surface(
                "Cannot start render loop",
                format!("surface is not live (state {:?})", self.state),
            ));
        }

        let mut program = match self.start() {
            Ok(program) => program,
            Err(e) => {
                debug!("startup failed, tearing down: {e}");
                self.teardown();
                return Err(e);
            }
        };

        info!(
            "Entering main loop at {} us per frame",
            self.clock.budget().as_micros()
        );
        self.state = LoopState::Running;
        let result = self.run_frames(&mut program);

        let gpu = self.surface.gpu();
        self.widget.release(gpu);
        program.delete(gpu);
        self.state = LoopState::Stopped;

        result
    }

    /// `SurfaceLive -> PipelineLinked`: build the program, run the base
    /// prepare step, then the widget's.
    fn start(&mut self) -> Result<ShaderProgram<S::Gpu>> {
        let gpu = self.surface.gpu();
        let mut program =
            ShaderProgram::build(gpu, self.widget.vertex_shader(), self.widget.fragment_shader())?;

        let (width, height) = self.surface.size();
        gpu.viewport(width, height);

        let mut ctx = PrepareCtx::new(gpu, &mut program, (width, height));
        if let Err(e) = self.widget.prepare(&mut ctx) {
            program.delete(gpu);
            return Err(e);
        }

        self.state = LoopState::PipelineLinked;
        Ok(program)
    }

    fn run_frames(&mut self, program: &mut ShaderProgram<S::Gpu>) -> Result<()> {
        let size = self.surface.size();

        while !self.stop.is_stopped() {
            let time = self.clock.begin();

            {
                let gpu = self.surface.gpu();

                // Base step, exactly once per frame, before the widget draws.
                gpu.clear(true);
                if let Some(frames) = program.frames_location() {
                    gpu.uniform_f32(frames, time.frame_index as f32);
                }

                let mut frame = FrameCtx::new(gpu, program, time, size);
                self.widget.draw(&mut frame);

                if self.gl_errors == GlErrorPolicy::Fail {
                    if let Some(code) = gpu.take_error() {
                        return Err(AppError::Gl {
                            code,
                            context: "draw",
                        });
                    }
                }
            }

            self.clock.advance();

            let presented = self.surface.present();
            if self.gl_errors == GlErrorPolicy::Fail {
                presented?;
            }

            let remaining = self.clock.remaining();
            if !remaining.is_zero() {
                thread::sleep(remaining);
            }
        }

        Ok(())
    }

    /// Destroys the surface. Safe to call in any state, any number of times.
    pub fn teardown(&mut self) {
        self.surface.destroy();
        self.state = LoopState::TornDown;
    }
}

impl<S, W> Drop for RenderLoop<S, W>
where
    S: DrawSurface,
    W: Widget<S::Gpu>,
{
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::thread::ThreadId;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::core::renderer::mock::{Call, MockGpu};

    /// Levels logged per thread, so parallel tests do not see each other.
    static RECORDS: Mutex<Vec<(ThreadId, log::Level)>> = Mutex::new(Vec::new());

    struct RecordingLogger;

    impl log::Log for RecordingLogger {
        fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            RECORDS
                .lock()
                .unwrap()
                .push((thread::current().id(), record.level()));
        }

        fn flush(&self) {}
    }

    fn record_logs() {
        static LOGGER: RecordingLogger = RecordingLogger;
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(log::LevelFilter::Trace);
    }

    fn levels_logged_here() -> Vec<log::Level> {
        let me = thread::current().id();
        RECORDS
            .lock()
            .unwrap()
            .iter()
            .filter(|(thread, _)| *thread == me)
            .map(|(_, level)| *level)
            .collect()
    }

    struct MockSurface {
        gpu: MockGpu,
        live: bool,
        presents: u64,
        destroys: u32,
        failing_present: bool,
    }

    impl MockSurface {
        fn new(gpu: MockGpu) -> Self {
            Self {
                gpu,
                live: true,
                presents: 0,
                destroys: 0,
                failing_present: false,
            }
        }

        fn failing_present(mut self) -> Self {
            self.failing_present = true;
            self
        }
    }

    impl DrawSurface for MockSurface {
        type Gpu = MockGpu;

        fn gpu(&self) -> &MockGpu {
            &self.gpu
        }

        fn size(&self) -> (u32, u32) {
            (64, 32)
        }

        fn present(&mut self) -> Result<()> {
            self.presents += 1;
            if self.failing_present {
                return Err(AppError::surface("Cannot swap buffers", "EGL_BAD_SURFACE"));
            }
            Ok(())
        }

        fn is_live(&self) -> bool {
            self.live
        }

        fn destroy(&mut self) {
            if self.live {
                self.live = false;
                self.destroys += 1;
            }
        }
    }

    /// Stops the loop after `limit` draws and records what it saw.
    struct Counting {
        vertex: PathBuf,
        fragment: PathBuf,
        limit: u64,
        stop: Option<StopHandle>,
        prepared: bool,
        seen: Vec<u64>,
        released: bool,
    }

    impl Counting {
        fn new(shaders: &Shaders, limit: u64) -> Self {
            Self {
                vertex: shaders.vertex.clone(),
                fragment: shaders.fragment.clone(),
                limit,
                stop: None,
                prepared: false,
                seen: Vec::new(),
                released: false,
            }
        }
    }

    impl Widget<MockGpu> for Counting {
        fn vertex_shader(&self) -> &Path {
            &self.vertex
        }

        fn fragment_shader(&self) -> &Path {
            &self.fragment
        }

        fn prepare(&mut self, ctx: &mut PrepareCtx<'_, MockGpu>) -> Result<()> {
            ctx.require_attribute("pos")?;
            self.prepared = true;
            Ok(())
        }

        fn draw(&mut self, frame: &mut FrameCtx<'_, MockGpu>) {
            assert!(self.prepared, "draw before prepare");
            self.seen.push(frame.frame_index());
            frame.set_mvp(&nalgebra::Matrix4::identity());
            if self.seen.len() as u64 >= self.limit {
                if let Some(stop) = &self.stop {
                    stop.stop();
                }
            }
        }

        fn release(&mut self, _gpu: &MockGpu) {
            self.released = true;
        }
    }

    struct Shaders {
        dir: PathBuf,
        vertex: PathBuf,
        fragment: PathBuf,
    }

    impl Shaders {
        fn new(tag: &str) -> Self {
            let dir = std::env::temp_dir()
                .join(format!("egl-widget-loop-{tag}-{}", std::process::id()));
            fs::create_dir_all(&dir).unwrap();
            let vertex = dir.join("v.shader");
            let fragment = dir.join("f.shader");
            fs::write(&vertex, "void main() {}").unwrap();
            fs::write(&fragment, "void main() {}").unwrap();
            Self {
                dir,
                vertex,
                fragment,
            }
        }
    }

    impl Drop for Shaders {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.dir);
        }
    }

    fn gpu() -> MockGpu {
        MockGpu::with_uniforms(&["mvp", "frames"]).with_attributes(&["pos"])
    }

    fn run_frames(tag: &str, fps: u32, frames: u64) -> RenderLoop<MockSurface, Counting> {
        let shaders = Shaders::new(tag);
        let config = WidgetConfig::default().with_fps(fps);
        let mut render_loop =
            RenderLoop::new(MockSurface::new(gpu()), Counting::new(&shaders, frames), &config);
        render_loop.widget.stop = Some(render_loop.stop_handle());
        render_loop.run().unwrap();
        render_loop
    }

    #[test]
    fn frame_counter_steps_by_one_from_zero() {
        let render_loop = run_frames("counter", 1000, 5);

        assert_eq!(render_loop.widget().seen, vec![0, 1, 2, 3, 4]);
        assert_eq!(render_loop.frames(), 5);
        assert_eq!(render_loop.surface().presents, 5);
        assert_eq!(render_loop.state(), LoopState::Stopped);
        assert!(render_loop.widget().released);
    }

    #[test]
    fn base_step_runs_once_per_frame_before_widget() {
        let render_loop = run_frames("base", 1000, 3);
        let calls = render_loop.surface().gpu.calls.borrow().clone();

        // frames uniform is at location 1, mvp at 0
        let expected: Vec<Call> = (0..3)
            .flat_map(|i| {
                [
                    Call::Clear { depth: true },
                    Call::UniformF32(1, i as f32),
                    Call::UniformMat4(0),
                ]
            })
            .collect();
        assert_eq!(calls[0], Call::Viewport(64, 32));
        assert_eq!(&calls[1..], expected.as_slice());
    }

    #[test]
    fn frames_are_paced_to_the_budget() {
        let started = Instant::now();
        let _ = run_frames("pacing", 100, 5);
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(50), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(50 + 500), "{elapsed:?}");
    }

    #[test]
    fn stop_before_run_draws_nothing() {
        let shaders = Shaders::new("prestop");
        let mut render_loop = RenderLoop::new(
            MockSurface::new(gpu()),
            Counting::new(&shaders, 1),
            &WidgetConfig::default(),
        );
        render_loop.stop_handle().stop();
        render_loop.run().unwrap();

        assert!(render_loop.widget().prepared);
        assert!(render_loop.widget().seen.is_empty());
        assert_eq!(render_loop.surface().gpu.live_programs(), 0);
    }

    #[test]
    fn missing_shader_aborts_startup_and_tears_down() {
        let shaders = Shaders::new("missing");
        let mut widget = Counting::new(&shaders, 1);
        widget.vertex = shaders.dir.join("absent_vertex.shader");

        let mut render_loop =
            RenderLoop::new(MockSurface::new(gpu()), widget, &WidgetConfig::default());
        let err = render_loop.run().unwrap_err();

        assert!(err.to_string().contains("absent_vertex.shader"), "{err}");
        assert!(!render_loop.widget().prepared);
        assert!(render_loop.widget().seen.is_empty());
        assert_eq!(render_loop.state(), LoopState::TornDown);
        assert_eq!(render_loop.surface().destroys, 1);

        render_loop.teardown();
        assert_eq!(render_loop.surface().destroys, 1);
    }

    #[test]
    fn failed_prepare_releases_program() {
        let shaders = Shaders::new("prepare");
        let gpu = MockGpu::with_uniforms(&["mvp"]);
        let mut render_loop = RenderLoop::new(
            MockSurface::new(gpu),
            Counting::new(&shaders, 1),
            &WidgetConfig::default(),
        );

        let err = render_loop.run().unwrap_err();

        assert!(matches!(err, AppError::ShaderLink { .. }));
        assert_eq!(render_loop.surface().gpu.live_programs(), 0);
        assert_eq!(render_loop.state(), LoopState::TornDown);
    }

    #[test]
    fn strict_mode_surfaces_driver_errors() {
        let shaders = Shaders::new("strict");
        let config = WidgetConfig::default()
            .with_fps(1000)
            .with_gl_errors(GlErrorPolicy::Fail);
        let surface = MockSurface::new(gpu());
        surface.gpu.push_error(glow::INVALID_OPERATION);
        let mut render_loop = RenderLoop::new(surface, Counting::new(&shaders, 10), &config);

        let err = render_loop.run().unwrap_err();

        assert!(matches!(err, AppError::Gl { code: glow::INVALID_OPERATION, .. }));
        assert_eq!(render_loop.widget().seen, vec![0]);
        assert_eq!(render_loop.state(), LoopState::Stopped);
    }

    #[test]
    fn lenient_mode_never_queries_the_driver() {
        let shaders = Shaders::new("lenient");
        let surface = MockSurface::new(gpu());
        surface.gpu.push_error(glow::INVALID_OPERATION);
        let mut render_loop = RenderLoop::new(
            surface,
            Counting::new(&shaders, 3),
            &WidgetConfig::default().with_fps(1000),
        );
        render_loop.widget.stop = Some(render_loop.stop_handle());

        render_loop.run().unwrap();

        assert_eq!(render_loop.widget().seen.len(), 3);
        assert_eq!(render_loop.surface().gpu.take_error(), Some(glow::INVALID_OPERATION));
    }

    #[test]
    fn torn_down_surface_cannot_run() {
        let shaders = Shaders::new("dead");
        let mut surface = MockSurface::new(gpu());
        surface.destroy();
        let mut render_loop =
            RenderLoop::new(surface, Counting::new(&shaders, 1), &WidgetConfig::default());

        assert_eq!(render_loop.state(), LoopState::TornDown);
        assert!(render_loop.run().is_err());
    }

    #[test]
    fn startup_failure_is_left_for_the_caller_to_report() {
        record_logs();
        let shaders = Shaders::new("quiet");
        let mut widget = Counting::new(&shaders, 1);
        widget.fragment = shaders.dir.join("absent_fragment.shader");

        let mut render_loop =
            RenderLoop::new(MockSurface::new(gpu()), widget, &WidgetConfig::default());
        assert!(render_loop.run().is_err());

        let levels = levels_logged_here();
        assert!(!levels.is_empty(), "logger saw nothing");
        assert!(levels.iter().all(|level| *level > log::Level::Warn), "{levels:?}");
    }

    #[test]
    fn strict_mode_stops_on_failed_present() {
        let shaders = Shaders::new("strict-present");
        let config = WidgetConfig::default()
            .with_fps(1000)
            .with_gl_errors(GlErrorPolicy::Fail);
        let surface = MockSurface::new(gpu()).failing_present();
        let mut render_loop = RenderLoop::new(surface, Counting::new(&shaders, 10), &config);

        let err = render_loop.run().unwrap_err();

        assert!(
            matches!(err, AppError::SurfaceCreation { step: "Cannot swap buffers", .. }),
            "{err:?}"
        );
        assert_eq!(render_loop.widget().seen, vec![0]);
        assert_eq!(render_loop.surface().presents, 1);
        assert_eq!(render_loop.state(), LoopState::Stopped);
        assert!(render_loop.widget().released);
    }

    #[test]
    fn lenient_mode_draws_through_failed_presents() {
        let shaders = Shaders::new("lenient-present");
        let surface = MockSurface::new(gpu()).failing_present();
        let mut render_loop = RenderLoop::new(
            surface,
            Counting::new(&shaders, 3),
            &WidgetConfig::default().with_fps(1000),
        );
        render_loop.widget.stop = Some(render_loop.stop_handle());

        render_loop.run().unwrap();

        assert_eq!(render_loop.widget().seen, vec![0, 1, 2]);
        assert_eq!(render_loop.surface().presents, 3);
        assert_eq!(render_loop.state(), LoopState::Stopped);
    }
}
