//! Mesh data and the GPU mesh resource

use bytemuck::{Pod, Zeroable};

use crate::frame_buffer::BoundFrameBuffer;
use crate::gfx::{GraphicsApi, RenderError};
use crate::shader::ShaderProgram;

/// Vertex layout shared by the importer and the GPU buffers (24 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }
}

/// Triangulated geometry produced by the importer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Result of a single mesh draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub index_count: u32,
}

/// Vertex and triangle counts shown in the property panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshSummary {
    pub vertex_count: usize,
    pub triangle_count: usize,
}

/// Mesh owned by the viewer.
///
/// Starts as a mutable builder. [`init`](Self::init) uploads the vertex and
/// index sequences once; from then on the mesh is read-only and drawable.
pub struct MeshResource<G: GraphicsApi> {
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    gpu: Option<G::Mesh>,
}

impl<G: GraphicsApi> MeshResource<G> {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            gpu: None,
        }
    }

    /// Creates a builder pre-filled with imported geometry.
    pub fn from_data(data: MeshData) -> Self {
        Self {
            vertices: data.vertices,
            indices: data.indices,
            gpu: None,
        }
    }

    pub fn add_vertex(&mut self, vertex: Vertex) -> Result<(), RenderError> {
        self.ensure_building()?;
        self.vertices.push(vertex);
        Ok(())
    }

    pub fn add_vertex_index(&mut self, index: u32) -> Result<(), RenderError> {
        self.ensure_building()?;
        self.indices.push(index);
        Ok(())
    }

    /// Uploads both sequences to GPU buffers.
    pub fn init(&mut self, gfx: &mut G) -> Result<(), RenderError> {
        self.ensure_building()?;
        if self.indices.len() % 3 != 0 {
            return Err(RenderError::IncompleteTriangles(self.indices.len()));
        }

        self.gpu = Some(gfx.upload_mesh(&self.vertices, &self.indices)?);

        tracing::debug!(
            "Uploaded mesh: {} vertices, {} indices",
            self.vertices.len(),
            self.indices.len()
        );
        Ok(())
    }

    /// Draws the mesh with the active program into the bound frame buffer.
    ///
    /// Camera and light uniforms must already be pushed for this frame.
    pub fn render(
        &self,
        pass: &mut BoundFrameBuffer<'_, G>,
        program: &ShaderProgram<G>,
    ) -> Result<DrawStats, RenderError> {
        let gpu = self.gpu.as_ref().ok_or(RenderError::MeshNotInitialized)?;
        if !program.is_active() {
            return Err(RenderError::ProgramInactive);
        }

        let index_count = self.indices.len() as u32;
        pass.draw_indexed(program.handle(), gpu, index_count)?;

        Ok(DrawStats { index_count })
    }

    pub fn is_initialized(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn summary(&self) -> MeshSummary {
        MeshSummary {
            vertex_count: self.vertices.len(),
            triangle_count: self.indices.len() / 3,
        }
    }

    /// Hands the GPU buffers back to the device.
    pub fn release(self, gfx: &mut G) {
        if let Some(gpu) = self.gpu {
            gfx.release_mesh(gpu);
        }
    }

    fn ensure_building(&self) -> Result<(), RenderError> {
        if self.gpu.is_some() {
            return Err(RenderError::MeshAlreadyInitialized);
        }
        Ok(())
    }
}

impl<G: GraphicsApi> Default for MeshResource<G> {
    fn default() -> Self {
        Self::new()
    }
}
