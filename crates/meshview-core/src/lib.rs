//! Mesh Viewer Core
//!
//! Everything the viewer does that does not depend on a window or a GPU:
//! - Import: first mesh of an OBJ or STL file
//! - Pipeline resources: frame buffer, shader program, mesh, camera, light
//! - Viewer: init / resize / render / close lifecycle
//!
//! The graphics device and the immediate-mode UI are reached through the
//! [`GraphicsApi`] and [`UiBackend`] traits.

pub mod camera;
pub mod frame_buffer;
pub mod gfx;
pub mod import;
pub mod input;
pub mod light;
pub mod mesh;
pub mod obj;
pub mod settings;
pub mod shader;
pub mod stl;
pub mod ui;
pub mod viewer;

#[cfg(test)]
mod testing;

pub use camera::*;
pub use frame_buffer::*;
pub use gfx::*;
pub use import::*;
pub use input::*;
pub use light::*;
pub use mesh::*;
pub use settings::*;
pub use shader::*;
pub use ui::*;
pub use viewer::*;
