//! Mesh Viewer Frontend
//!
//! winit window, egui panels and configuration around the viewer.

mod app;
pub mod config;
pub mod input;
mod panels;
mod ui_context;

pub use app::{AppError, MeshViewApp};
pub use config::{AppConfig, CliArgs, ConfigError};
pub use ui_context::UiContext;
