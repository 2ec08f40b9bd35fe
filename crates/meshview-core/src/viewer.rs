//! Viewer controller
//!
//! Owns every pipeline resource and runs the per-frame sequence:
//!
//! ```text
//!  1. light uniforms           7. property panel
//!  2. render context begin     8. "Content": aspect, camera uniforms, image
//!  3. bind frame buffer        9. UI end
//!  4. draw mesh               10. poll input -> camera
//!  5. unbind frame buffer     11. render context end (present)
//!  6. UI begin
//! ```

use std::path::{Path, PathBuf};

use crate::camera::Camera;
use crate::frame_buffer::FrameBuffer;
use crate::gfx::{GraphicsApi, RenderError};
use crate::import::{ImportError, import};
use crate::input::{CameraKey, InputState};
use crate::light::Light;
use crate::mesh::MeshResource;
use crate::settings::ViewerSettings;
use crate::shader::ShaderProgram;
use crate::ui::{FrameStats, PanelAction, PropertyPanel, UiBackend};

/// Lifecycle of the viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerState {
    Uninitialized,
    Running,
    Closed,
}

/// Errors surfaced by the viewer
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewerError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Viewer is already initialized")]
    AlreadyInitialized,

    #[error("Viewer is not running")]
    NotRunning,
}

/// Window controller: owns the render context, UI context and all
/// pipeline resources.
pub struct Viewer<G: GraphicsApi, U: UiBackend<G>> {
    gfx: G,
    ui: U,
    settings: ViewerSettings,
    state: ViewerState,
    running: bool,
    width: u32,
    height: u32,
    title: String,
    frame_buffer: FrameBuffer<G>,
    program: Option<ShaderProgram<G>>,
    camera: Camera,
    light: Light,
    mesh: Option<MeshResource<G>>,
    mesh_path: PathBuf,
    input: InputState,
    last_stats: FrameStats,
}

impl<G: GraphicsApi, U: UiBackend<G>> Viewer<G, U> {
    pub fn new(gfx: G, ui: U, settings: ViewerSettings) -> Self {
        let camera = Camera::from_settings(&settings.camera, 1.0);
        let light = Light::from_settings(&settings.light);
        let mesh_path = settings.assets.mesh.clone();

        Self {
            gfx,
            ui,
            settings,
            state: ViewerState::Uninitialized,
            running: false,
            width: 0,
            height: 0,
            title: String::new(),
            frame_buffer: FrameBuffer::new(),
            program: None,
            camera,
            light,
            mesh: None,
            mesh_path,
            input: InputState::new(),
            last_stats: FrameStats::default(),
        }
    }

    /// Brings up every resource and enters the running state.
    ///
    /// Any failure (shader, target allocation, mesh import) is fatal and
    /// leaves the viewer uninitialized.
    pub fn init(&mut self, width: u32, height: u32, title: &str) -> Result<bool, ViewerError> {
        if self.state != ViewerState::Uninitialized {
            return Err(ViewerError::AlreadyInitialized);
        }

        self.width = width;
        self.height = height;
        self.title = title.to_string();

        self.gfx.configure_surface(width, height)?;
        self.frame_buffer.create_buffers(&mut self.gfx, width, height)?;
        self.ui.init(&mut self.gfx, width, height)?;

        let assets = &self.settings.assets;
        let program = ShaderProgram::load(&mut self.gfx, &assets.vertex_shader, &assets.fragment_shader)?;
        self.program = Some(program);

        let aspect = width as f32 / height as f32;
        self.camera = Camera::from_settings(&self.settings.camera, aspect);
        self.light = Light::from_settings(&self.settings.light);

        let mesh_path = self.settings.assets.mesh.clone();
        self.load_mesh(&mesh_path)?;

        if let Some(program) = self.program.as_mut() {
            program.use_program();
        }

        self.state = ViewerState::Running;
        self.running = true;

        tracing::info!("Viewer '{}' running at {}x{}", self.title, width, height);
        Ok(self.running)
    }

    /// Imports the first mesh of `path` and makes it the resident mesh.
    ///
    /// The previous mesh is released only after the new one is uploaded,
    /// so a failed load keeps it.
    pub fn load_mesh(&mut self, path: &Path) -> Result<(), ViewerError> {
        let data = import(path)?;

        let mut mesh = MeshResource::new();
        for vertex in data.vertices {
            mesh.add_vertex(vertex)?;
        }
        for index in data.indices {
            mesh.add_vertex_index(index)?;
        }
        mesh.init(&mut self.gfx)?;

        if let Some(old) = self.mesh.replace(mesh) {
            old.release(&mut self.gfx);
        }
        self.mesh_path = path.to_path_buf();

        tracing::info!("Loaded mesh {:?}", path);
        Ok(())
    }

    /// Handles a new window size: recreates the frame buffer and renders
    /// one frame at the new size.
    pub fn on_resize(&mut self, width: u32, height: u32) -> Result<(), ViewerError> {
        match self.state {
            ViewerState::Uninitialized => {
                self.width = width;
                self.height = height;
                return Ok(());
            }
            ViewerState::Closed => {
                tracing::debug!("Ignoring resize after close");
                return Ok(());
            }
            ViewerState::Running => {}
        }

        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTargetSize { width, height }.into());
        }

        self.width = width;
        self.height = height;

        self.gfx.configure_surface(width, height)?;
        self.ui.resize(width, height);
        self.frame_buffer.create_buffers(&mut self.gfx, width, height)?;

        tracing::debug!("Resized to {}x{}", width, height);

        self.render()?;
        Ok(())
    }

    /// Renders one frame.
    pub fn render(&mut self) -> Result<FrameStats, ViewerError> {
        if self.state != ViewerState::Running {
            return Err(ViewerError::NotRunning);
        }

        let (stats, action) = self.draw_frame()?;
        self.last_stats = stats;

        if let Some(action) = action {
            self.apply_panel_action(action);
        }

        Ok(stats)
    }

    fn draw_frame(&mut self) -> Result<(FrameStats, Option<PanelAction>), ViewerError> {
        let Self {
            gfx,
            ui,
            settings,
            frame_buffer,
            program,
            camera,
            light,
            mesh,
            mesh_path,
            input,
            last_stats,
            ..
        } = self;

        let program = program.as_ref().ok_or(RenderError::ProgramInactive)?;
        let mut stats = FrameStats::default();

        light.update(&mut program.uniforms(gfx)?);

        gfx.begin_frame()?;

        {
            let mut pass = frame_buffer.bind(gfx)?;
            if let Some(mesh) = mesh.as_ref() {
                let draw = mesh.render(&mut pass, program)?;
                stats.draw_calls += 1;
                stats.indices += draw.index_count;
            }
        }

        ui.begin_frame()?;

        let action = ui.property_panel(PropertyPanel {
            light: &mut *light,
            mesh: mesh.as_ref().map(MeshResource::summary),
            mesh_path: mesh_path.as_path(),
            camera_distance: camera.distance(),
            stats: *last_stats,
        });

        let mut camera_pushed = false;
        ui.content_region(gfx, frame_buffer, |gfx, region| {
            camera.set_aspect(region.aspect());
            camera.update(&mut program.uniforms(gfx)?);
            camera_pushed = true;
            Ok(())
        })?;
        if !camera_pushed {
            camera.update(&mut program.uniforms(gfx)?);
        }

        ui.end_frame(gfx)?;

        apply_input(camera, input, settings.camera.distance_step);

        gfx.end_frame()?;

        Ok((stats, action))
    }

    fn apply_panel_action(&mut self, action: PanelAction) {
        match action {
            PanelAction::LoadMesh(path) => {
                if let Err(e) = self.load_mesh(&path) {
                    tracing::warn!("Failed to load {:?}: {}", path, e);
                }
            }
            PanelAction::ResetCamera => {
                let aspect = self.camera.aspect();
                self.camera = Camera::from_settings(&self.settings.camera, aspect);
            }
        }
    }

    /// Marks the viewer closed. Resources are released on drop.
    pub fn on_close(&mut self) {
        self.state = ViewerState::Closed;
        self.running = false;
        tracing::info!("Viewer closed");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> ViewerState {
        self.state
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn light(&self) -> &Light {
        &self.light
    }

    pub fn mesh(&self) -> Option<&MeshResource<G>> {
        self.mesh.as_ref()
    }

    pub fn mesh_path(&self) -> &Path {
        &self.mesh_path
    }

    pub fn frame_buffer(&self) -> &FrameBuffer<G> {
        &self.frame_buffer
    }

    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Input snapshot the window layer writes into.
    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn gfx(&self) -> &G {
        &self.gfx
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }
}

/// Polls zoom keys and pointer state into camera deltas
fn apply_input(camera: &mut Camera, input: &InputState, distance_step: f32) {
    if input.is_down(CameraKey::Forward) {
        camera.set_distance(-distance_step);
    }
    if input.is_down(CameraKey::Backward) {
        camera.set_distance(distance_step);
    }

    let (x, y) = input.cursor();
    camera.on_mouse_move(x, y, input.pressed_button());
}

impl<G: GraphicsApi, U: UiBackend<G>> Drop for Viewer<G, U> {
    fn drop(&mut self) {
        self.ui.shutdown(&mut self.gfx);

        if let Some(program) = self.program.take() {
            program.unload(&mut self.gfx);
        }
        if let Some(mesh) = self.mesh.take() {
            mesh.release(&mut self.gfx);
        }
        std::mem::take(&mut self.frame_buffer).release(&mut self.gfx);

        self.gfx.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::MouseButton;
    use crate::testing::{Call, CallLog, RecordingGraphics, RecordingUi, test_settings};
    use approx::assert_relative_eq;

    type TestViewer = Viewer<RecordingGraphics, RecordingUi>;

    fn viewer() -> (TestViewer, CallLog) {
        let gfx = RecordingGraphics::new();
        let log = gfx.log();
        let ui = RecordingUi::new(log.clone());
        (Viewer::new(gfx, ui, test_settings()), log)
    }

    fn running_viewer() -> (TestViewer, CallLog) {
        let (mut viewer, log) = viewer();
        assert!(viewer.init(800, 600, "test").unwrap());
        log.clear();
        (viewer, log)
    }

    #[test]
    fn test_init_enters_running_state() {
        let (mut viewer, log) = viewer();
        assert_eq!(viewer.state(), ViewerState::Uninitialized);

        let running = viewer.init(800, 600, "Mesh Viewer").unwrap();

        assert!(running);
        assert!(viewer.is_running());
        assert_eq!(viewer.state(), ViewerState::Running);
        assert_eq!(viewer.title(), "Mesh Viewer");
        assert_relative_eq!(viewer.camera().aspect(), 800.0 / 600.0);
        assert_eq!(viewer.frame_buffer().size(), (800, 600));

        let calls = log.calls();
        let surface = calls.iter().position(|c| *c == Call::ConfigureSurface(800, 600));
        let target = calls.iter().position(|c| matches!(c, Call::CreateTarget { .. }));
        let ui = calls.iter().position(|c| *c == Call::UiInit(800, 600));
        let shader = calls.iter().position(|c| *c == Call::CompileProgram);
        let mesh = calls.iter().position(|c| matches!(c, Call::UploadMesh { .. }));
        assert!(surface < target && target < ui && ui < shader && shader < mesh);
    }

    #[test]
    fn test_init_single_triangle() {
        let (viewer, _log) = running_viewer();

        let mesh = viewer.mesh().unwrap();
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.index_count(), 3);
        assert!(mesh.is_initialized());
    }

    #[test]
    fn test_render_issues_one_draw_of_three_indices() {
        let (mut viewer, log) = running_viewer();

        let stats = viewer.render().unwrap();

        assert_eq!(stats, FrameStats { draw_calls: 1, indices: 3 });
        assert_eq!(log.count(|c| matches!(c, Call::DrawIndexed { .. })), 1);
        assert_eq!(log.count(|c| *c == Call::DrawIndexed { index_count: 3 }), 1);
    }

    #[test]
    fn test_frame_order() {
        let (mut viewer, log) = running_viewer();

        viewer.render().unwrap();

        let texture = viewer.frame_buffer().get_texture().unwrap().handle;
        assert_eq!(
            log.calls(),
            vec![
                Call::WriteLight,
                Call::BeginFrame,
                Call::BeginTargetPass(texture),
                Call::DrawIndexed { index_count: 3 },
                Call::EndTargetPass,
                Call::UiBegin,
                Call::PropertyPanel,
                Call::ContentRegion,
                Call::WriteCamera,
                Call::ContentImage(texture),
                Call::UiEnd,
                Call::EndFrame,
            ]
        );
    }

    #[test]
    fn test_camera_pushed_when_region_hidden() {
        let (mut viewer, log) = running_viewer();
        viewer.ui_mut().set_region_visible(false);

        viewer.render().unwrap();

        assert_eq!(log.count(|c| *c == Call::WriteCamera), 1);
        assert_relative_eq!(viewer.camera().aspect(), 800.0 / 600.0);
    }

    #[test]
    fn test_aspect_follows_content_region() {
        let (mut viewer, _log) = running_viewer();
        viewer.ui_mut().set_region_size(300.0, 200.0);

        viewer.on_resize(1000, 500).unwrap();
        assert_relative_eq!(viewer.camera().aspect(), 1.5);

        viewer.ui_mut().set_region_size(640.0, 480.0);
        viewer.render().unwrap();
        assert_relative_eq!(viewer.camera().aspect(), 640.0 / 480.0);
    }

    #[test]
    fn test_zero_height_region_keeps_aspect() {
        let (mut viewer, _log) = running_viewer();
        viewer.ui_mut().set_region_size(300.0, 0.0);

        viewer.render().unwrap();

        assert_relative_eq!(viewer.camera().aspect(), 800.0 / 600.0);
    }

    #[test]
    fn test_resize_recreates_target_and_renders_once() {
        let (mut viewer, log) = running_viewer();

        viewer.on_resize(1920, 1080).unwrap();

        let texture = viewer.frame_buffer().get_texture().unwrap();
        assert_ne!(texture.handle, 0);
        assert_eq!((texture.width, texture.height), (1920, 1080));
        assert_eq!(viewer.size(), (1920, 1080));
        assert_eq!(log.count(|c| *c == Call::EndFrame), 1);
        assert_eq!(log.count(|c| *c == Call::UiResize(1920, 1080)), 1);
        assert_eq!(
            log.count(|c| *c == Call::CreateTarget { handle: texture.handle, width: 1920, height: 1080 }),
            1
        );
    }

    #[test]
    fn test_repeated_resize_never_leaves_stale_target() {
        let (mut viewer, _log) = running_viewer();

        viewer.on_resize(1280, 720).unwrap();
        viewer.on_resize(640, 480).unwrap();

        let texture = viewer.frame_buffer().get_texture().unwrap();
        assert_eq!((texture.width, texture.height), (640, 480));
        assert_eq!(viewer.gfx().live_targets(), 1);
    }

    #[test]
    fn test_failed_resize_is_surfaced() {
        let (mut viewer, _log) = running_viewer();
        viewer.gfx.fail_target_allocation(true);

        let result = viewer.on_resize(1920, 1080);

        assert!(matches!(result, Err(ViewerError::Render(RenderError::Resource(_)))));
        assert!(viewer.frame_buffer().get_texture().is_none());
        assert!(matches!(
            viewer.render(),
            Err(ViewerError::Render(RenderError::TargetMissing))
        ));
    }

    #[test]
    fn test_zero_resize_is_rejected() {
        let (mut viewer, _log) = running_viewer();

        let result = viewer.on_resize(0, 0);

        assert!(matches!(
            result,
            Err(ViewerError::Render(RenderError::InvalidTargetSize { .. }))
        ));
        assert_eq!(viewer.frame_buffer().size(), (800, 600));
    }

    #[test]
    fn test_resize_before_init_only_records_size() {
        let (mut viewer, log) = viewer();

        viewer.on_resize(1024, 768).unwrap();

        assert_eq!(viewer.size(), (1024, 768));
        assert!(log.calls().is_empty());
    }

    #[test]
    fn test_draw_failure_still_unbinds() {
        let (mut viewer, log) = running_viewer();
        viewer.gfx.fail_draws(true);

        let result = viewer.render();

        assert!(result.is_err());
        assert_eq!(log.count(|c| *c == Call::EndTargetPass), 1);
    }

    #[test]
    fn test_missing_mesh_is_fatal() {
        let gfx = RecordingGraphics::new();
        let log = gfx.log();
        let mut settings = test_settings();
        settings.assets.mesh = PathBuf::from("does/not/exist.obj");
        let mut viewer = Viewer::new(gfx, RecordingUi::new(log.clone()), settings);

        let result = viewer.init(800, 600, "test");

        assert!(matches!(result, Err(ViewerError::Import(ImportError::ParseFailure(_)))));
        assert_eq!(viewer.state(), ViewerState::Uninitialized);
        assert!(!viewer.is_running());
        assert!(viewer.mesh().is_none());
        assert!(matches!(viewer.render(), Err(ViewerError::NotRunning)));
    }

    #[test]
    fn test_mesh_without_faces_is_fatal() {
        let gfx = RecordingGraphics::new();
        let log = gfx.log();
        let mut settings = test_settings();
        settings.assets.mesh = PathBuf::from(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../assets/models/points.obj"
        ));
        let mut viewer = Viewer::new(gfx, RecordingUi::new(log.clone()), settings);

        let result = viewer.init(800, 600, "test");

        assert!(matches!(result, Err(ViewerError::Import(ImportError::NoMeshes))));
        assert_eq!(viewer.state(), ViewerState::Uninitialized);
        assert!(viewer.mesh().is_none());
        assert_eq!(log.count(|c| matches!(c, Call::UploadMesh { .. })), 0);
        assert!(matches!(viewer.render(), Err(ViewerError::NotRunning)));
    }

    #[test]
    fn test_init_twice_fails() {
        let (mut viewer, _log) = running_viewer();
        assert!(matches!(
            viewer.init(800, 600, "again"),
            Err(ViewerError::AlreadyInitialized)
        ));
    }

    #[test]
    fn test_keys_change_distance() {
        let (mut viewer, _log) = running_viewer();
        let start = viewer.camera().distance();

        viewer.input_mut().set_key(CameraKey::Forward, true);
        viewer.render().unwrap();
        viewer.render().unwrap();
        viewer.input_mut().set_key(CameraKey::Forward, false);

        assert_relative_eq!(viewer.camera().distance(), start - 0.2, epsilon = 1e-5);

        viewer.input_mut().set_key(CameraKey::Backward, true);
        viewer.render().unwrap();

        assert_relative_eq!(viewer.camera().distance(), start - 0.1, epsilon = 1e-5);
    }

    #[test]
    fn test_pointer_without_button_is_ignored() {
        let (mut viewer, _log) = running_viewer();
        viewer.render().unwrap();
        let pose = viewer.camera().pose();

        viewer.input_mut().set_cursor(120.0, 80.0);
        viewer.render().unwrap();
        viewer.input_mut().set_cursor(300.0, -50.0);
        viewer.render().unwrap();

        assert_eq!(viewer.camera().pose(), pose);
    }

    #[test]
    fn test_right_drag_orbits_camera() {
        let (mut viewer, _log) = running_viewer();
        viewer.input_mut().set_cursor(100.0, 100.0);
        viewer.render().unwrap();

        viewer.input_mut().set_button(MouseButton::Right, true);
        viewer.input_mut().set_cursor(160.0, 100.0);
        viewer.render().unwrap();

        assert!(viewer.camera().pose().yaw > 0.0);
    }

    #[test]
    fn test_panel_load_replaces_mesh() {
        let (mut viewer, log) = running_viewer();
        let cube = concat!(env!("CARGO_MANIFEST_DIR"), "/../../assets/models/cube.obj");
        viewer
            .ui_mut()
            .queue_action(PanelAction::LoadMesh(PathBuf::from(cube)));

        viewer.render().unwrap();

        assert_eq!(viewer.mesh().unwrap().index_count(), 36);
        assert_eq!(viewer.mesh_path(), Path::new(cube));
        assert_eq!(log.count(|c| matches!(c, Call::ReleaseMesh(_))), 1);

        let stats = viewer.render().unwrap();
        assert_eq!(stats, FrameStats { draw_calls: 1, indices: 36 });
    }

    #[test]
    fn test_failed_panel_load_keeps_mesh() {
        let (mut viewer, log) = running_viewer();
        viewer
            .ui_mut()
            .queue_action(PanelAction::LoadMesh(PathBuf::from("missing.stl")));

        viewer.render().unwrap();

        assert_eq!(viewer.mesh().unwrap().index_count(), 3);
        assert_eq!(log.count(|c| matches!(c, Call::ReleaseMesh(_))), 0);
    }

    #[test]
    fn test_reset_camera_keeps_aspect() {
        let (mut viewer, _log) = running_viewer();
        viewer.input_mut().set_key(CameraKey::Backward, true);
        viewer.render().unwrap();
        viewer.input_mut().set_key(CameraKey::Backward, false);

        viewer.ui_mut().queue_action(PanelAction::ResetCamera);
        viewer.render().unwrap();

        assert_relative_eq!(viewer.camera().distance(), 3.0, epsilon = 1e-5);
        assert_relative_eq!(viewer.camera().aspect(), 800.0 / 600.0);
    }

    #[test]
    fn test_close_stops_rendering() {
        let (mut viewer, log) = running_viewer();

        viewer.on_close();

        assert!(!viewer.is_running());
        assert_eq!(viewer.state(), ViewerState::Closed);
        assert!(matches!(viewer.render(), Err(ViewerError::NotRunning)));
        viewer.on_resize(640, 480).unwrap();
        assert!(log.calls().is_empty());
    }

    #[test]
    fn test_drop_releases_in_order() {
        let (viewer, log) = running_viewer();

        drop(viewer);

        let calls = log.calls();
        let ui = calls.iter().position(|c| *c == Call::UiShutdown);
        let program = calls.iter().position(|c| *c == Call::ReleaseProgram);
        let device = calls.iter().position(|c| *c == Call::Shutdown);
        assert!(ui.is_some() && program.is_some() && device.is_some());
        assert!(ui < program && program < device);
        assert_eq!(calls.last(), Some(&Call::Shutdown));
    }
}
