//! Render context that owns the wgpu device and presentation surface.
//!
//! Implements [`GraphicsApi`] for the viewer. Each frame records into one
//! command encoder: the offscreen pass first, then the UI pass onto the
//! surface image.

use std::sync::Arc;

use meshview_core::{CameraUniform, GraphicsApi, LightUniform, RenderError, ShaderSource, Vertex};

use crate::config::RendererConfig;
use crate::mesh::{GpuMesh, index_range};
use crate::program::WgpuProgram;
use crate::target::WgpuTarget;

/// Surface image and encoder of the frame in flight
struct Frame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
    extra: Vec<wgpu::CommandBuffer>,
}

/// Borrowed parts of the current frame, for recording UI draws.
pub struct FrameContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub view: &'a wgpu::TextureView,
    /// Command buffers submitted ahead of the frame encoder
    pub extra: &'a mut Vec<wgpu::CommandBuffer>,
}

/// GPU device, queue and window surface.
pub struct RenderContext {
    pass: Option<wgpu::RenderPass<'static>>,
    frame: Option<Frame>,
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    surface_config: wgpu::SurfaceConfiguration,
    config: RendererConfig,
    next_target_id: u64,
}

impl RenderContext {
    /// Creates the surface for `window` and requests a device for it.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        config: RendererConfig,
    ) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| RenderError::Resource("No suitable GPU adapter".to_string()))?;

        let info = adapter.get_info();
        tracing::info!("Using adapter {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Mesh Viewer Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(|e| RenderError::Resource(e.to_string()))?;

        let capabilities = surface.get_capabilities(&adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or_else(|| RenderError::Surface("Surface has no supported formats".to_string()))?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: config.present_mode(),
            desired_maximum_frame_latency: 2,
            alpha_mode: capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };

        Ok(Self {
            pass: None,
            frame: None,
            surface,
            device: Arc::new(device),
            queue: Arc::new(queue),
            surface_config,
            config,
            next_target_id: 1,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_config.format
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_config.width, self.surface_config.height)
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Parts of the frame in flight. Fails between frames or while the
    /// offscreen pass is open.
    pub fn frame_context(&mut self) -> Result<FrameContext<'_>, RenderError> {
        if self.pass.is_some() {
            return Err(RenderError::Surface("Offscreen pass still open".to_string()));
        }
        let frame = self.frame.as_mut().ok_or(RenderError::NoActiveFrame)?;
        Ok(FrameContext {
            device: &self.device,
            queue: &self.queue,
            encoder: &mut frame.encoder,
            view: &frame.view,
            extra: &mut frame.extra,
        })
    }

    fn acquire(&mut self) -> Result<wgpu::SurfaceTexture, RenderError> {
        match self.surface.get_current_texture() {
            Ok(texture) => Ok(texture),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("Surface lost, reconfiguring");
                self.surface.configure(&self.device, &self.surface_config);
                self.surface
                    .get_current_texture()
                    .map_err(|e| RenderError::Surface(e.to_string()))
            }
            Err(e) => Err(RenderError::Surface(e.to_string())),
        }
    }

    /// Runs `f` inside an error scope and turns a captured error into
    /// a [`RenderError`] via `wrap`.
    fn scoped<T>(
        &self,
        filter: wgpu::ErrorFilter,
        wrap: fn(String) -> RenderError,
        f: impl FnOnce(&wgpu::Device) -> T,
    ) -> Result<T, RenderError> {
        self.device.push_error_scope(filter);
        let value = f(self.device.as_ref());
        match pollster::block_on(self.device.pop_error_scope()) {
            Some(error) => Err(wrap(error.to_string())),
            None => Ok(value),
        }
    }
}

impl GraphicsApi for RenderContext {
    type Target = WgpuTarget;
    type Mesh = GpuMesh;
    type Program = WgpuProgram;
    type TextureHandle = u64;

    fn configure_surface(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTargetSize { width, height });
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.pass = None;
        if self.frame.take().is_some() {
            tracing::warn!("Discarding unfinished frame");
        }

        let surface_texture = self.acquire()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        self.frame = Some(Frame {
            surface_texture,
            view,
            encoder,
            extra: Vec::new(),
        });
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.pass = None;
        let frame = self.frame.take().ok_or(RenderError::NoActiveFrame)?;

        let buffers = frame
            .extra
            .into_iter()
            .chain(std::iter::once(frame.encoder.finish()));
        self.queue.submit(buffers);
        frame.surface_texture.present();
        Ok(())
    }

    fn create_target(&mut self, width: u32, height: u32) -> Result<WgpuTarget, RenderError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(RenderError::Resource(format!(
                "{}x{} exceeds the {} texel texture limit",
                width, height, max
            )));
        }

        let id = self.next_target_id;
        let target = self.scoped(wgpu::ErrorFilter::OutOfMemory, RenderError::Resource, |device| {
            WgpuTarget::new(device, id, width, height)
        })?;
        self.next_target_id += 1;
        Ok(target)
    }

    fn target_texture(target: &WgpuTarget) -> u64 {
        target.id()
    }

    fn target_size(target: &WgpuTarget) -> (u32, u32) {
        target.size()
    }

    fn begin_target_pass(&mut self, target: &WgpuTarget) -> Result<(), RenderError> {
        let frame = self.frame.as_mut().ok_or(RenderError::NoActiveFrame)?;

        let pass = frame
            .encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Viewport Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.color_view(),
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.config.clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: target.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            })
            .forget_lifetime();

        self.pass = Some(pass);
        Ok(())
    }

    fn end_target_pass(&mut self) {
        self.pass = None;
    }

    fn upload_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> Result<GpuMesh, RenderError> {
        self.scoped(wgpu::ErrorFilter::OutOfMemory, RenderError::Resource, |device| {
            GpuMesh::new(device, vertices, indices)
        })
    }

    fn compile_program(&mut self, source: &ShaderSource<'_>) -> Result<WgpuProgram, RenderError> {
        let program = self.scoped(wgpu::ErrorFilter::Validation, RenderError::ShaderCompile, |device| {
            WgpuProgram::new(device, source)
        })?;
        tracing::debug!("Compiled shader program '{}'", source.label);
        Ok(program)
    }

    fn write_camera(&mut self, program: &WgpuProgram, uniform: &CameraUniform) {
        program.write_camera(&self.queue, uniform);
    }

    fn write_light(&mut self, program: &WgpuProgram, uniform: &LightUniform) {
        program.write_light(&self.queue, uniform);
    }

    fn draw_indexed(
        &mut self,
        program: &WgpuProgram,
        mesh: &GpuMesh,
        index_count: u32,
    ) -> Result<(), RenderError> {
        let range = index_range(index_count, mesh.index_count)?;
        let pass = self.pass.as_mut().ok_or(RenderError::NoActiveFrame)?;

        program.bind(pass);
        pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(range, 0, 0..1);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.pass = None;
        self.frame = None;
        tracing::info!("Render context shut down");
    }
}
