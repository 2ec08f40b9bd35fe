//! Shader program and uniform access

use std::path::Path;

use crate::camera::CameraUniform;
use crate::gfx::{GraphicsApi, RenderError, ShaderSource};
use crate::light::LightUniform;

/// Compiled shader program.
///
/// Uniforms can only be written once the program has been made active with
/// [`use_program`](Self::use_program); writers are handed out through
/// [`uniforms`](Self::uniforms).
pub struct ShaderProgram<G: GraphicsApi> {
    handle: G::Program,
    active: bool,
}

impl<G: GraphicsApi> ShaderProgram<G> {
    /// Reads the vertex and fragment sources from disk and compiles them.
    pub fn load(
        gfx: &mut G,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, RenderError> {
        let vertex_path = vertex_path.as_ref();
        let fragment_path = fragment_path.as_ref();

        let vertex = read_source(vertex_path)?;
        let fragment = read_source(fragment_path)?;

        let label = vertex_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("shader");

        let program = Self::from_source(
            gfx,
            &ShaderSource {
                label,
                vertex: &vertex,
                fragment: &fragment,
            },
        )?;

        tracing::info!(
            "Loaded shader program from {:?} and {:?}",
            vertex_path,
            fragment_path
        );
        Ok(program)
    }

    pub fn from_source(gfx: &mut G, source: &ShaderSource<'_>) -> Result<Self, RenderError> {
        let handle = gfx.compile_program(source)?;
        Ok(Self {
            handle,
            active: false,
        })
    }

    /// Makes this program the one used by subsequent draws.
    pub fn use_program(&mut self) {
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn handle(&self) -> &G::Program {
        &self.handle
    }

    /// Uniform writer bound to this program.
    pub fn uniforms<'a>(&'a self, gfx: &'a mut G) -> Result<UniformWriter<'a, G>, RenderError> {
        if !self.active {
            return Err(RenderError::ProgramInactive);
        }
        Ok(UniformWriter {
            gfx,
            program: &self.handle,
        })
    }

    pub fn unload(self, gfx: &mut G) {
        gfx.release_program(self.handle);
    }
}

fn read_source(path: &Path) -> Result<String, RenderError> {
    std::fs::read_to_string(path).map_err(|e| RenderError::ShaderLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Capability to write uniforms of an active program.
pub struct UniformWriter<'a, G: GraphicsApi> {
    gfx: &'a mut G,
    program: &'a G::Program,
}

impl<G: GraphicsApi> UniformWriter<'_, G> {
    pub fn set_camera(&mut self, uniform: &CameraUniform) {
        self.gfx.write_camera(self.program, uniform);
    }

    pub fn set_light(&mut self, uniform: &LightUniform) {
        self.gfx.write_light(self.program, uniform);
    }
}
