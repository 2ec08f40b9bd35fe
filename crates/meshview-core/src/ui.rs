//! UI service abstraction
//!
//! The immediate-mode UI is driven through [`UiBackend`]; the egui
//! implementation lives in `meshview-frontend`.

use std::path::{Path, PathBuf};

use crate::frame_buffer::FrameBuffer;
use crate::gfx::{GraphicsApi, RenderError};
use crate::light::Light;
use crate::mesh::MeshSummary;

/// Title of the panel that shows the rendered viewport
pub const CONTENT_PANEL: &str = "Content";

/// UV of the viewport image's top-left corner.
///
/// The offscreen target stores rows bottom-up, so the image is sampled
/// vertically flipped.
pub const CONTENT_UV_MIN: [f32; 2] = [0.0, 1.0];
/// UV of the viewport image's bottom-right corner
pub const CONTENT_UV_MAX: [f32; 2] = [1.0, 0.0];

/// Available size of the content region, in UI points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSize {
    pub width: f32,
    pub height: f32,
}

impl RegionSize {
    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }
}

/// Counters for the last rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub draw_calls: u32,
    pub indices: u32,
}

/// Data the property panel displays and edits.
pub struct PropertyPanel<'a> {
    pub light: &'a mut Light,
    pub mesh: Option<MeshSummary>,
    pub mesh_path: &'a Path,
    pub camera_distance: f32,
    pub stats: FrameStats,
}

/// Requests raised from the property panel, applied after the frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelAction {
    /// Replace the resident mesh with the first mesh of this file
    LoadMesh(PathBuf),
    /// Restore the configured camera placement
    ResetCamera,
}

/// Immediate-mode UI context with begin/end-frame hooks.
pub trait UiBackend<G: GraphicsApi> {
    /// Prepares the backend for a window of `width` x `height` pixels.
    fn init(&mut self, gfx: &mut G, width: u32, height: u32) -> Result<(), RenderError>;

    fn resize(&mut self, width: u32, height: u32);

    fn begin_frame(&mut self) -> Result<(), RenderError>;

    /// Draws the light controls and info panel.
    fn property_panel(&mut self, panel: PropertyPanel<'_>) -> Option<PanelAction>;

    /// Opens the [`CONTENT_PANEL`] region.
    ///
    /// Calls `on_region` with the available content size, then shows the
    /// frame buffer's color texture filling that size with UVs
    /// [`CONTENT_UV_MIN`] to [`CONTENT_UV_MAX`]. Returns whether the region
    /// was visible (`on_region` is not called when it is collapsed).
    fn content_region<F>(
        &mut self,
        gfx: &mut G,
        frame_buffer: &FrameBuffer<G>,
        on_region: F,
    ) -> Result<bool, RenderError>
    where
        F: FnOnce(&mut G, RegionSize) -> Result<(), RenderError>;

    /// Finishes the UI frame and records its draw commands.
    fn end_frame(&mut self, gfx: &mut G) -> Result<(), RenderError>;

    /// Releases UI resources. Called before the render context goes away.
    fn shutdown(&mut self, gfx: &mut G);
}
