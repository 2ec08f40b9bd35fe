//! Graphics service abstraction.
//!
//! The viewer never calls a graphics API directly. Everything it needs from
//! the device (frame hooks, offscreen targets, buffers, programs, draws) goes
//! through [`GraphicsApi`]. `meshview-renderer` implements it on top of wgpu.

use std::fmt::Debug;
use std::path::PathBuf;

use crate::camera::CameraUniform;
use crate::light::LightUniform;
use crate::mesh::Vertex;

/// Vertex and fragment source text of a shader program.
#[derive(Debug, Clone, Copy)]
pub struct ShaderSource<'a> {
    pub label: &'a str,
    pub vertex: &'a str,
    pub fragment: &'a str,
}

/// Device-level operations used by the render pipeline.
///
/// Resources are returned as associated types and owned by the caller.
/// The `release_*` hooks are called when the pipeline replaces a resource;
/// the default implementation simply drops it.
pub trait GraphicsApi {
    /// Offscreen color + depth render target.
    type Target;
    /// GPU-resident vertex and index buffers.
    type Mesh;
    /// Compiled shader program with its uniform storage.
    type Program;
    /// Identifier of a target's color attachment, used for sampling in the UI.
    type TextureHandle: Copy + Eq + Debug;

    /// (Re)configures the presentation surface.
    fn configure_surface(&mut self, width: u32, height: u32) -> Result<(), RenderError>;

    /// Acquires the next surface image and starts recording commands.
    fn begin_frame(&mut self) -> Result<(), RenderError>;

    /// Submits recorded commands and presents the surface image.
    fn end_frame(&mut self) -> Result<(), RenderError>;

    /// Allocates a color + depth target of exactly `width` x `height`.
    fn create_target(&mut self, width: u32, height: u32) -> Result<Self::Target, RenderError>;

    fn release_target(&mut self, target: Self::Target) {
        drop(target);
    }

    /// Handle of the target's color attachment.
    fn target_texture(target: &Self::Target) -> Self::TextureHandle;

    /// Actual dimensions of the target's attachments.
    fn target_size(target: &Self::Target) -> (u32, u32);

    /// Starts a render pass into `target`. Draws go there until
    /// [`end_target_pass`](Self::end_target_pass).
    fn begin_target_pass(&mut self, target: &Self::Target) -> Result<(), RenderError>;

    fn end_target_pass(&mut self);

    /// Uploads vertex and index streams into GPU buffers.
    fn upload_mesh(&mut self, vertices: &[Vertex], indices: &[u32])
    -> Result<Self::Mesh, RenderError>;

    fn release_mesh(&mut self, mesh: Self::Mesh) {
        drop(mesh);
    }

    fn compile_program(&mut self, source: &ShaderSource<'_>) -> Result<Self::Program, RenderError>;

    fn release_program(&mut self, program: Self::Program) {
        drop(program);
    }

    fn write_camera(&mut self, program: &Self::Program, uniform: &CameraUniform);

    fn write_light(&mut self, program: &Self::Program, uniform: &LightUniform);

    /// Issues one indexed triangle-list draw inside the current target pass.
    fn draw_indexed(
        &mut self,
        program: &Self::Program,
        mesh: &Self::Mesh,
        index_count: u32,
    ) -> Result<(), RenderError>;

    /// Tears down the device context. Called last when the viewer is dropped.
    fn shutdown(&mut self) {}
}

/// Errors raised by GPU resources and pipeline preconditions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RenderError {
    #[error("GPU resource allocation failed: {0}")]
    Resource(String),

    #[error("Invalid render target size {width}x{height}")]
    InvalidTargetSize { width: u32, height: u32 },

    #[error("Frame buffer has no render target")]
    TargetMissing,

    #[error("Render target is {actual:?} but the frame buffer expects {expected:?}")]
    StaleTarget {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("Failed to read shader '{path}': {reason}")]
    ShaderLoad { path: PathBuf, reason: String },

    #[error("Shader compilation failed: {0}")]
    ShaderCompile(String),

    #[error("Shader program is not active")]
    ProgramInactive,

    #[error("Mesh drawn before init()")]
    MeshNotInitialized,

    #[error("Mesh is already uploaded")]
    MeshAlreadyInitialized,

    #[error("Index count {0} is not a multiple of 3")]
    IncompleteTriangles(usize),

    #[error("No frame in progress")]
    NoActiveFrame,

    #[error("Surface error: {0}")]
    Surface(String),
}
