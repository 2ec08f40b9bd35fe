//! Recording graphics and UI backends for unit tests

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use crate::camera::CameraUniform;
use crate::frame_buffer::FrameBuffer;
use crate::gfx::{GraphicsApi, RenderError, ShaderSource};
use crate::light::LightUniform;
use crate::mesh::Vertex;
use crate::settings::{AssetSettings, ViewerSettings};
use crate::shader::ShaderProgram;
use crate::ui::{PanelAction, PropertyPanel, RegionSize, UiBackend};

/// Recorded backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ConfigureSurface(u32, u32),
    BeginFrame,
    EndFrame,
    CreateTarget { handle: u64, width: u32, height: u32 },
    ReleaseTarget(u64),
    BeginTargetPass(u64),
    EndTargetPass,
    UploadMesh { vertices: usize, indices: usize },
    ReleaseMesh(u64),
    CompileProgram,
    ReleaseProgram,
    WriteCamera,
    WriteLight,
    DrawIndexed { index_count: u32 },
    Shutdown,
    UiInit(u32, u32),
    UiResize(u32, u32),
    UiBegin,
    PropertyPanel,
    ContentRegion,
    ContentImage(u64),
    UiEnd,
    UiShutdown,
}

/// Call log shared between the graphics and UI recorders
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| predicate(c)).count()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

#[derive(Debug)]
pub struct RecordingTarget {
    id: u64,
    width: u32,
    height: u32,
}

/// Graphics backend that records calls instead of touching a device
#[derive(Debug, Default)]
pub struct RecordingGraphics {
    log: CallLog,
    next_id: u64,
    live_targets: usize,
    fail_targets: bool,
    fail_draws: bool,
}

impl RecordingGraphics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    /// Compiled but inactive program
    pub fn test_program(&mut self) -> ShaderProgram<Self> {
        let source = ShaderSource {
            label: "test",
            vertex: "",
            fragment: "",
        };
        ShaderProgram::from_source(self, &source).unwrap()
    }

    pub fn live_targets(&self) -> usize {
        self.live_targets
    }

    pub fn fail_target_allocation(&mut self, fail: bool) {
        self.fail_targets = fail;
    }

    pub fn fail_draws(&mut self, fail: bool) {
        self.fail_draws = fail;
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl GraphicsApi for RecordingGraphics {
    type Target = RecordingTarget;
    type Mesh = u64;
    type Program = u64;
    type TextureHandle = u64;

    fn configure_surface(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.log.push(Call::ConfigureSurface(width, height));
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.log.push(Call::BeginFrame);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), RenderError> {
        self.log.push(Call::EndFrame);
        Ok(())
    }

    fn create_target(&mut self, width: u32, height: u32) -> Result<RecordingTarget, RenderError> {
        if self.fail_targets {
            return Err(RenderError::Resource("out of memory".to_string()));
        }
        let id = self.next_id();
        self.live_targets += 1;
        self.log.push(Call::CreateTarget {
            handle: id,
            width,
            height,
        });
        Ok(RecordingTarget { id, width, height })
    }

    fn release_target(&mut self, target: RecordingTarget) {
        self.live_targets -= 1;
        self.log.push(Call::ReleaseTarget(target.id));
    }

    fn target_texture(target: &RecordingTarget) -> u64 {
        target.id
    }

    fn target_size(target: &RecordingTarget) -> (u32, u32) {
        (target.width, target.height)
    }

    fn begin_target_pass(&mut self, target: &RecordingTarget) -> Result<(), RenderError> {
        self.log.push(Call::BeginTargetPass(target.id));
        Ok(())
    }

    fn end_target_pass(&mut self) {
        self.log.push(Call::EndTargetPass);
    }

    fn upload_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> Result<u64, RenderError> {
        self.log.push(Call::UploadMesh {
            vertices: vertices.len(),
            indices: indices.len(),
        });
        Ok(self.next_id())
    }

    fn release_mesh(&mut self, mesh: u64) {
        self.log.push(Call::ReleaseMesh(mesh));
    }

    fn compile_program(&mut self, _source: &ShaderSource<'_>) -> Result<u64, RenderError> {
        self.log.push(Call::CompileProgram);
        Ok(self.next_id())
    }

    fn release_program(&mut self, _program: u64) {
        self.log.push(Call::ReleaseProgram);
    }

    fn write_camera(&mut self, _program: &u64, _uniform: &CameraUniform) {
        self.log.push(Call::WriteCamera);
    }

    fn write_light(&mut self, _program: &u64, _uniform: &LightUniform) {
        self.log.push(Call::WriteLight);
    }

    fn draw_indexed(&mut self, _program: &u64, _mesh: &u64, index_count: u32) -> Result<(), RenderError> {
        if self.fail_draws {
            return Err(RenderError::Resource("draw rejected".to_string()));
        }
        self.log.push(Call::DrawIndexed { index_count });
        Ok(())
    }

    fn shutdown(&mut self) {
        self.log.push(Call::Shutdown);
    }
}

/// UI backend with a scripted content region and panel actions
pub struct RecordingUi {
    log: CallLog,
    region: RegionSize,
    visible: bool,
    action: Option<PanelAction>,
}

impl RecordingUi {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            region: RegionSize {
                width: 800.0,
                height: 600.0,
            },
            visible: true,
            action: None,
        }
    }

    pub fn set_region_size(&mut self, width: f32, height: f32) {
        self.region = RegionSize { width, height };
    }

    pub fn set_region_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Action returned by the next property panel
    pub fn queue_action(&mut self, action: PanelAction) {
        self.action = Some(action);
    }
}

impl UiBackend<RecordingGraphics> for RecordingUi {
    fn init(&mut self, _gfx: &mut RecordingGraphics, width: u32, height: u32) -> Result<(), RenderError> {
        self.log.push(Call::UiInit(width, height));
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.log.push(Call::UiResize(width, height));
    }

    fn begin_frame(&mut self) -> Result<(), RenderError> {
        self.log.push(Call::UiBegin);
        Ok(())
    }

    fn property_panel(&mut self, _panel: PropertyPanel<'_>) -> Option<PanelAction> {
        self.log.push(Call::PropertyPanel);
        self.action.take()
    }

    fn content_region<F>(
        &mut self,
        gfx: &mut RecordingGraphics,
        frame_buffer: &FrameBuffer<RecordingGraphics>,
        on_region: F,
    ) -> Result<bool, RenderError>
    where
        F: FnOnce(&mut RecordingGraphics, RegionSize) -> Result<(), RenderError>,
    {
        self.log.push(Call::ContentRegion);
        if !self.visible {
            return Ok(false);
        }

        on_region(gfx, self.region)?;

        let texture = frame_buffer.get_texture().ok_or(RenderError::TargetMissing)?;
        self.log.push(Call::ContentImage(texture.handle));
        Ok(true)
    }

    fn end_frame(&mut self, _gfx: &mut RecordingGraphics) -> Result<(), RenderError> {
        self.log.push(Call::UiEnd);
        Ok(())
    }

    fn shutdown(&mut self, _gfx: &mut RecordingGraphics) {
        self.log.push(Call::UiShutdown);
    }
}

/// Settings pointing at the bundled triangle and shaders
pub fn test_settings() -> ViewerSettings {
    let assets = PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets"));
    ViewerSettings {
        assets: AssetSettings {
            mesh: assets.join("models/triangle.obj"),
            vertex_shader: assets.join("shaders/mesh.vert.wgsl"),
            fragment_shader: assets.join("shaders/mesh.frag.wgsl"),
        },
        ..ViewerSettings::default()
    }
}
