//! Mesh Viewer Renderer
//!
//! wgpu implementation of the viewer's graphics service: device and surface,
//! offscreen targets, mesh buffers and the mesh shader program.

pub mod config;
pub mod context;
pub mod mesh;
pub mod program;
pub mod target;

pub use config::*;
pub use context::*;
pub use mesh::*;
pub use program::*;
pub use target::*;
