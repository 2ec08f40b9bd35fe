//! winit application driving the viewer

use std::sync::Arc;

use meshview_core::{Viewer, ViewerError};
use meshview_renderer::RenderContext;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use crate::config::{AppConfig, ConfigError};
use crate::input::apply_window_event;
use crate::ui_context::UiContext;

/// Errors that end the application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Viewer(#[from] ViewerError),

    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    EventLoop(#[from] winit::error::EventLoopError),
}

type MeshViewer = Viewer<RenderContext, UiContext>;

/// Window plus the viewer bound to it. The viewer drops first.
struct Session {
    viewer: MeshViewer,
    window: Arc<Window>,
}

/// Application state handed to the event loop
pub struct MeshViewApp {
    config: AppConfig,
    session: Option<Session>,
    error: Option<AppError>,
}

impl MeshViewApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            session: None,
            error: None,
        }
    }

    /// Fatal error that stopped the event loop, if any
    pub fn take_error(&mut self) -> Option<AppError> {
        self.error.take()
    }

    fn start(&self, event_loop: &ActiveEventLoop) -> Result<Session, AppError> {
        let window_config = &self.config.window;
        let attributes = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(LogicalSize::new(window_config.width, window_config.height));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let size = window.inner_size();
        let gfx = pollster::block_on(RenderContext::new(
            window.clone(),
            size.width,
            size.height,
            self.config.renderer.clone(),
        ))
        .map_err(ViewerError::from)?;
        let ui = UiContext::new(window.clone());

        let mut viewer = Viewer::new(gfx, ui, self.config.viewer.clone());
        viewer.init(size.width, size.height, &window_config.title)?;

        Ok(Session { viewer, window })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: AppError) {
        tracing::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for MeshViewApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }

        match self.start(event_loop) {
            Ok(session) => {
                session.window.request_redraw();
                self.session = Some(session);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let viewer = &mut session.viewer;

        let consumed = viewer.ui_mut().on_window_event(&event);
        apply_window_event(viewer.input_mut(), &event, consumed);

        match event {
            WindowEvent::CloseRequested => {
                viewer.on_close();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if size.width == 0 || size.height == 0 {
                    tracing::debug!("Skipping resize to {}x{}", size.width, size.height);
                    return;
                }
                if let Err(e) = viewer.on_resize(size.width, size.height) {
                    tracing::error!("Resize to {}x{} failed: {}", size.width, size.height, e);
                }
            }
            WindowEvent::RedrawRequested => {
                if viewer.is_running() {
                    if let Err(e) = viewer.render() {
                        tracing::error!("Frame failed: {}", e);
                    }
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(session) = &self.session {
            if session.viewer.is_running() {
                session.window.request_redraw();
            }
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.session = None;
        tracing::info!("Exiting");
    }
}
