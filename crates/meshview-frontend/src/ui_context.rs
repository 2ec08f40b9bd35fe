//! egui integration
//!
//! Bridges winit input into egui, draws the panels and records the UI pass
//! onto the surface image after the offscreen viewport pass.

use std::sync::Arc;

use meshview_core::{
    CONTENT_PANEL, CONTENT_UV_MAX, CONTENT_UV_MIN, FrameBuffer, PanelAction, PropertyPanel,
    RegionSize, RenderError, UiBackend,
};
use meshview_renderer::{RenderContext, WgpuTarget};
use winit::event::{ElementState, WindowEvent};
use winit::window::Window;

use crate::panels::PropertiesPanel;

/// Viewport texture currently registered with egui
struct ViewportTexture {
    target_id: u64,
    texture_id: egui::TextureId,
}

/// Screen area of the rendered image inside the "Content" window, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportRegion {
    pub rect: egui::Rect,
    pub layer: egui::LayerId,
}

impl ViewportRegion {
    /// Whether `pos` lands on the image and not on another area drawn over it.
    pub fn hit(&self, ctx: &egui::Context, pos: egui::Pos2) -> bool {
        self.rect.contains(pos) && ctx.layer_id_at(pos).map_or(true, |layer| layer == self.layer)
    }
}

/// A press egui claimed still reaches the camera when it lands on the image.
pub fn press_consumed(
    ctx: &egui::Context,
    ui_consumed: bool,
    pointer: Option<egui::Pos2>,
    viewport: Option<ViewportRegion>,
) -> bool {
    let on_viewport = match (pointer, viewport) {
        (Some(pos), Some(region)) => region.hit(ctx, pos),
        _ => false,
    };
    ui_consumed && !on_viewport
}

/// Draws the "Content" window showing `texture_id` over the whole region.
///
/// `on_region` runs with the region size before the image is added. Returns
/// `None` when the window is collapsed.
pub fn content_window<R>(
    ctx: &egui::Context,
    texture_id: egui::TextureId,
    on_region: impl FnOnce(RegionSize) -> R,
) -> Option<(R, ViewportRegion)> {
    let uv = egui::Rect::from_min_max(
        egui::pos2(CONTENT_UV_MIN[0], CONTENT_UV_MIN[1]),
        egui::pos2(CONTENT_UV_MAX[0], CONTENT_UV_MAX[1]),
    );

    egui::Window::new(CONTENT_PANEL)
        .default_size([800.0, 600.0])
        .show(ctx, |ui| {
            let size = ui.available_size();
            let result = on_region(RegionSize {
                width: size.x,
                height: size.y,
            });
            let response = ui.add(
                egui::Image::new(egui::load::SizedTexture::new(texture_id, size))
                    .uv(uv)
                    .sense(egui::Sense::click_and_drag()),
            );
            let region = ViewportRegion {
                rect: response.rect,
                layer: ui.layer_id(),
            };
            (result, region)
        })
        .and_then(|response| response.inner)
}

/// egui context, winit bridge and wgpu painter.
pub struct UiContext {
    window: Arc<Window>,
    egui_ctx: egui::Context,
    state: egui_winit::State,
    renderer: Option<egui_wgpu::Renderer>,
    screen_descriptor: egui_wgpu::ScreenDescriptor,
    viewport: Option<ViewportTexture>,
    viewport_region: Option<ViewportRegion>,
    pointer: Option<egui::Pos2>,
    properties: PropertiesPanel,
}

impl UiContext {
    pub fn new(window: Arc<Window>) -> Self {
        let egui_ctx = egui::Context::default();
        let id = egui_ctx.viewport_id();
        let state = egui_winit::State::new(egui_ctx.clone(), id, window.as_ref(), None, None, None);
        let size = window.inner_size();
        let pixels_per_point = window.scale_factor() as f32;

        Self {
            window,
            egui_ctx,
            state,
            renderer: None,
            screen_descriptor: egui_wgpu::ScreenDescriptor {
                size_in_pixels: [size.width, size.height],
                pixels_per_point,
            },
            viewport: None,
            viewport_region: None,
            pointer: None,
            properties: PropertiesPanel::new(),
        }
    }

    /// Forwards a window event to egui. Returns whether egui consumed it.
    ///
    /// Button releases are never reported as consumed so camera drags
    /// always end. Presses on the viewport image belong to the camera.
    pub fn on_window_event(&mut self, event: &WindowEvent) -> bool {
        let response = self.state.on_window_event(&self.window, event);

        match event {
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.screen_descriptor.pixels_per_point = *scale_factor as f32;
                response.consumed
            }
            WindowEvent::CursorMoved { position, .. } => {
                let pixels_per_point = egui_winit::pixels_per_point(&self.egui_ctx, &self.window);
                self.pointer = Some(egui::pos2(
                    position.x as f32 / pixels_per_point,
                    position.y as f32 / pixels_per_point,
                ));
                response.consumed
            }
            WindowEvent::CursorLeft { .. } => {
                self.pointer = None;
                response.consumed
            }
            WindowEvent::MouseInput {
                state: ElementState::Released,
                ..
            } => false,
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                ..
            } => press_consumed(
                &self.egui_ctx,
                response.consumed,
                self.pointer,
                self.viewport_region,
            ),
            _ => response.consumed,
        }
    }

    pub fn context(&self) -> &egui::Context {
        &self.egui_ctx
    }

    fn renderer_mut(&mut self) -> Result<&mut egui_wgpu::Renderer, RenderError> {
        self.renderer
            .as_mut()
            .ok_or_else(|| RenderError::Resource("UI renderer is not initialized".to_string()))
    }

    /// egui id of the target's color view, re-registered when the frame
    /// buffer has been recreated.
    fn viewport_texture(
        &mut self,
        gfx: &RenderContext,
        target: &WgpuTarget,
    ) -> Result<egui::TextureId, RenderError> {
        if let Some(viewport) = &self.viewport {
            if viewport.target_id == target.id() {
                return Ok(viewport.texture_id);
            }
        }

        let previous = self.viewport.take();
        let renderer = self.renderer_mut()?;
        if let Some(previous) = previous {
            renderer.free_texture(&previous.texture_id);
        }

        let texture_id =
            renderer.register_native_texture(gfx.device(), target.color_view(), wgpu::FilterMode::Linear);
        tracing::debug!("Registered viewport texture for target {}", target.id());

        self.viewport = Some(ViewportTexture {
            target_id: target.id(),
            texture_id,
        });
        Ok(texture_id)
    }
}

impl UiBackend<RenderContext> for UiContext {
    fn init(&mut self, gfx: &mut RenderContext, width: u32, height: u32) -> Result<(), RenderError> {
        self.renderer = Some(egui_wgpu::Renderer::new(
            gfx.device(),
            gfx.surface_format(),
            None,
            1,
            false,
        ));
        self.resize(width, height);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.screen_descriptor.size_in_pixels = [width, height];
        self.screen_descriptor.pixels_per_point = self.window.scale_factor() as f32;
    }

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        let raw_input = self.state.take_egui_input(&self.window);
        self.egui_ctx.begin_pass(raw_input);
        Ok(())
    }

    fn property_panel(&mut self, panel: PropertyPanel<'_>) -> Option<PanelAction> {
        let properties = &mut self.properties;
        egui::SidePanel::right("properties_panel")
            .resizable(true)
            .default_width(260.0)
            .show(&self.egui_ctx, |ui| {
                egui::ScrollArea::vertical()
                    .show(ui, |ui| properties.ui(ui, panel))
                    .inner
            })
            .inner
    }

    fn content_region<F>(
        &mut self,
        gfx: &mut RenderContext,
        frame_buffer: &FrameBuffer<RenderContext>,
        on_region: F,
    ) -> Result<bool, RenderError>
    where
        F: FnOnce(&mut RenderContext, RegionSize) -> Result<(), RenderError>,
    {
        let target = frame_buffer.target().ok_or(RenderError::TargetMissing)?;
        let texture_id = self.viewport_texture(gfx, target)?;

        let shown = content_window(&self.egui_ctx, texture_id, |size| on_region(gfx, size));
        self.viewport_region = shown.as_ref().map(|(_, region)| *region);

        match shown {
            Some((result, _)) => result.map(|()| true),
            None => Ok(false),
        }
    }

    fn end_frame(&mut self, gfx: &mut RenderContext) -> Result<(), RenderError> {
        let egui::FullOutput {
            shapes,
            textures_delta,
            platform_output,
            pixels_per_point,
            ..
        } = self.egui_ctx.end_pass();

        self.state.handle_platform_output(&self.window, platform_output);
        let primitives = self.egui_ctx.tessellate(shapes, pixels_per_point);
        self.screen_descriptor.pixels_per_point = pixels_per_point;

        let renderer = self
            .renderer
            .as_mut()
            .ok_or_else(|| RenderError::Resource("UI renderer is not initialized".to_string()))?;
        let frame = gfx.frame_context()?;

        for (id, delta) in &textures_delta.set {
            renderer.update_texture(frame.device, frame.queue, *id, delta);
        }

        let buffers = renderer.update_buffers(
            frame.device,
            frame.queue,
            frame.encoder,
            &primitives,
            &self.screen_descriptor,
        );
        frame.extra.extend(buffers);

        {
            let mut pass = frame
                .encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("UI Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: frame.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();

            renderer.render(&mut pass, &primitives, &self.screen_descriptor);
        }

        for id in &textures_delta.free {
            renderer.free_texture(id);
        }

        Ok(())
    }

    fn shutdown(&mut self, _gfx: &mut RenderContext) {
        if let (Some(renderer), Some(viewport)) = (self.renderer.as_mut(), self.viewport.take()) {
            renderer.free_texture(&viewport.texture_id);
        }
        self.renderer = None;
        self.viewport_region = None;
        tracing::debug!("UI context shut down");
    }
}
