use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::camera::{Camera, OrbitCamera};
use crate::error::FuzzyError;
use crate::fur_pass::{FurPass, Lighting};
use crate::gpu::{GpuContext, GpuError};
use crate::material::Color;
use crate::scene::FuzzyScene;

/// Failures that stop the windowed runner.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    /// The setup closure could not build its meshes.
    #[error("setup failed: {0}")]
    Setup(#[from] FuzzyError),
}

/// Context provided during app setup.
pub struct SetupContext<'a> {
    pub gpu: &'a GpuContext,
    /// Meshes spawned here are uploaded on the first frame.
    pub scene: &'a mut FuzzyScene,
    pub orbit: &'a mut OrbitCamera,
    pub lighting: &'a mut Lighting,
}

/// Context provided each frame, before the scene ticks.
///
/// Move meshes and set their angles here. After the closure returns, the
/// runner ticks the scene once and draws it.
pub struct Frame<'a> {
    pub gpu: &'a GpuContext,
    pub scene: &'a mut FuzzyScene,
    pub orbit: &'a mut OrbitCamera,
    pub lighting: &'a mut Lighting,
    /// Total elapsed time in seconds.
    pub time: f32,
    /// Delta time since last frame in seconds.
    pub dt: f32,
}

impl Frame<'_> {
    /// Current frames per second.
    pub fn fps(&self) -> f32 {
        if self.dt > 0.0 { 1.0 / self.dt } else { 0.0 }
    }

    /// The camera this frame is drawn with.
    pub fn camera(&self) -> Camera {
        self.orbit.camera()
    }
}

/// Configuration for the app window.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: Color,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Fuzzy Mesh".to_string(),
            width: 800,
            height: 600,
            clear_color: Color::BLACK,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }
}

/// Runs a fuzzy mesh application with setup and frame closures.
///
/// # Example
/// ```no_run
/// use fuzzy_mesh::{primitives, FuzzyConfig, FuzzyMesh};
///
/// fuzzy_mesh::run(|ctx| {
///     let ball = ctx.scene.spawn(FuzzyMesh::new(primitives::sphere(2.0, 24, 16), FuzzyConfig::default())?);
///
///     Ok(move |frame: &mut fuzzy_mesh::Frame| {
///         if let Some(fuzzy) = frame.scene.fuzzy_mut(ball) {
///             fuzzy.set_rotation_angle(frame.time);
///         }
///     })
/// })
/// .unwrap();
/// ```
pub fn run<S, F>(setup: S) -> Result<(), AppError>
where
    S: FnOnce(&mut SetupContext) -> Result<F, FuzzyError> + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    run_with_config(AppConfig::default(), setup)
}

/// Runs a fuzzy mesh application with custom configuration.
pub fn run_with_config<S, F>(config: AppConfig, setup: S) -> Result<(), AppError>
where
    S: FnOnce(&mut SetupContext) -> Result<F, FuzzyError> + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let setup: SetupFn = Box::new(move |ctx: &mut SetupContext<'_>| {
        let frame_fn = setup(ctx)?;
        Ok(Box::new(frame_fn) as Box<dyn FnMut(&mut Frame)>)
    });
    let mut app = FuzzyApp::Pending {
        config,
        setup: Some(setup),
    };

    event_loop.run_app(&mut app)?;

    match app {
        FuzzyApp::Failed(err) => Err(err),
        _ => Ok(()),
    }
}

type SetupFn = Box<dyn FnOnce(&mut SetupContext) -> Result<Box<dyn FnMut(&mut Frame)>, FuzzyError>>;

enum FuzzyApp {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn>,
    },
    Running(Box<Running>),
    Failed(AppError),
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    fur_pass: FurPass,
    scene: FuzzyScene,
    orbit: OrbitCamera,
    lighting: Lighting,
    clear_color: Color,
    frame_fn: Box<dyn FnMut(&mut Frame)>,
    start_time: Instant,
    last_frame: Instant,
}

impl Running {
    fn start(event_loop: &ActiveEventLoop, config: AppConfig, setup: SetupFn) -> Result<Self, AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;
        let fur_pass = FurPass::new(&gpu);

        let mut scene = FuzzyScene::new();
        let mut orbit = OrbitCamera::new();
        let mut lighting = Lighting::default();

        let frame_fn = setup(&mut SetupContext {
            gpu: &gpu,
            scene: &mut scene,
            orbit: &mut orbit,
            lighting: &mut lighting,
        })?;
        log::info!("setup spawned {} fuzzy meshes", scene.len());

        Ok(Self {
            window,
            gpu,
            fur_pass,
            scene,
            orbit,
            lighting,
            clear_color: config.clear_color,
            frame_fn,
            start_time: Instant::now(),
            last_frame: Instant::now(),
        })
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let time = self.start_time.elapsed().as_secs_f32();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let mut frame = Frame {
            gpu: &self.gpu,
            scene: &mut self.scene,
            orbit: &mut self.orbit,
            lighting: &mut self.lighting,
            time,
            dt,
        };
        (self.frame_fn)(&mut frame);

        self.orbit.update(dt);
        self.scene.tick();

        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let (width, height) = (self.gpu.width(), self.gpu.height());
                self.gpu.resize(width, height);
                return;
            }
            Err(err) => {
                log::warn!("skipping frame: {err}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.fur_pass.ensure_depth_size(&self.gpu);
        self.fur_pass
            .prepare(&self.gpu, &self.orbit.camera(), &self.lighting);
        self.scene.prepare(&self.gpu, &self.fur_pass);

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Fur Encoder"),
            });

        {
            let clear = self.clear_color;
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Fur Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear.r as f64,
                            g: clear.g as f64,
                            b: clear.b as f64,
                            a: clear.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.fur_pass.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.scene.draw(&self.fur_pass, &mut render_pass);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

impl ApplicationHandler for FuzzyApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let FuzzyApp::Pending { config, setup } = self else {
            return;
        };
        let Some(setup) = setup.take() else {
            return;
        };

        match Running::start(event_loop, config.clone(), setup) {
            Ok(running) => *self = FuzzyApp::Running(Box::new(running)),
            Err(err) => {
                log::error!("{err}");
                *self = FuzzyApp::Failed(err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let FuzzyApp::Running(running) = self else {
            return;
        };

        running.orbit.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                running.gpu.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                running.redraw();
                running.window.request_redraw();
            }
            _ => {}
        }
    }
}
