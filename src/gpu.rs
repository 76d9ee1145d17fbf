//! GPU device and window surface.
//!
//! [`GpuContext`] holds the wgpu objects every render pass needs: the surface
//! presenting to the window, the device, the queue, and the surface
//! configuration. It is created once by the windowed runner and passed by
//! reference to [`FurPass`](crate::FurPass) and the scene.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # fn demo(window: Arc<winit::window::Window>) -> Result<(), fuzzy_mesh::GpuError> {
//! use fuzzy_mesh::GpuContext;
//!
//! let mut gpu = GpuContext::new(window)?;
//! gpu.resize(1280, 720);
//! println!("{}x{} (aspect {})", gpu.width(), gpu.height(), gpu.aspect());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use thiserror::Error;
use winit::window::Window;

/// Failures while bringing up the GPU.
#[derive(Debug, Error)]
pub enum GpuError {
    /// The window could not be turned into a presentable surface.
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    /// No adapter can present to the surface.
    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    /// The adapter refused to create a device.
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    /// The surface reports no usable texture format.
    #[error("surface supports no texture formats")]
    NoSurfaceFormat,
}

/// wgpu resources shared by all rendering.
///
/// Fields are public so callers can reach the raw wgpu API when needed.
pub struct GpuContext {
    /// The surface for presenting rendered frames to the window.
    pub surface: wgpu::Surface<'static>,
    /// The logical GPU device for creating resources and pipelines.
    pub device: wgpu::Device,
    /// The command queue for submitting work to the GPU.
    pub queue: wgpu::Queue,
    /// Current surface configuration (format, size, present mode).
    pub config: wgpu::SurfaceConfiguration,
}

impl GpuContext {
    /// Creates a GPU context for `window`.
    ///
    /// Picks an sRGB surface format when available and presents with vsync.
    pub fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("Fuzzy Mesh Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: Default::default(),
            trace: Default::default(),
            experimental_features: Default::default(),
        }))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            surface,
            device,
            queue,
            config,
        })
    }

    /// Resizes the surface. Zero sizes (minimized windows) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn width(&self) -> u32 {
        self.config.width
    }

    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// Width over height.
    pub fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }
}
