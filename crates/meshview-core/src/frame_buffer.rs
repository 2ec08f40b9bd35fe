//! Offscreen frame buffer
//!
//! Color + depth render target the 3D pass draws into. The color attachment
//! is sampled by the UI to show the viewport image.

use crate::gfx::{GraphicsApi, RenderError};

/// Color attachment of the current target, as exposed to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetTexture<H> {
    pub handle: H,
    pub width: u32,
    pub height: u32,
}

/// Offscreen render target sized to the viewport.
///
/// Dimensions only change through [`create_buffers`](Self::create_buffers),
/// which destroys the previous target and allocates a new one.
pub struct FrameBuffer<G: GraphicsApi> {
    target: Option<G::Target>,
    width: u32,
    height: u32,
}

impl<G: GraphicsApi> FrameBuffer<G> {
    /// Creates an empty frame buffer. Nothing can be bound until
    /// [`create_buffers`](Self::create_buffers) succeeds.
    pub fn new() -> Self {
        Self {
            target: None,
            width: 0,
            height: 0,
        }
    }

    /// (Re)allocates the color and depth attachments at exactly
    /// `width` x `height`.
    ///
    /// The old target is released first. If the allocation fails the frame
    /// buffer is left without a target, so the next bind reports it.
    pub fn create_buffers(&mut self, gfx: &mut G, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTargetSize { width, height });
        }

        if let Some(old) = self.target.take() {
            gfx.release_target(old);
        }
        self.width = 0;
        self.height = 0;

        let target = gfx.create_target(width, height)?;
        self.target = Some(target);
        self.width = width;
        self.height = height;

        tracing::debug!("Frame buffer created at {}x{}", width, height);
        Ok(())
    }

    /// Starts rendering into the offscreen target.
    ///
    /// The returned guard ends the pass when dropped, including on early
    /// return from a failed draw.
    pub fn bind<'a>(&'a self, gfx: &'a mut G) -> Result<BoundFrameBuffer<'a, G>, RenderError> {
        let target = self.target.as_ref().ok_or(RenderError::TargetMissing)?;

        let actual = G::target_size(target);
        if actual != (self.width, self.height) {
            return Err(RenderError::StaleTarget {
                expected: (self.width, self.height),
                actual,
            });
        }

        gfx.begin_target_pass(target)?;
        Ok(BoundFrameBuffer { gfx })
    }

    /// Color attachment handle and its real size.
    pub fn get_texture(&self) -> Option<TargetTexture<G::TextureHandle>> {
        self.target.as_ref().map(|target| {
            let (width, height) = G::target_size(target);
            TargetTexture {
                handle: G::target_texture(target),
                width,
                height,
            }
        })
    }

    /// Backend target, for UI backends that need the native view.
    pub fn target(&self) -> Option<&G::Target> {
        self.target.as_ref()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn release(mut self, gfx: &mut G) {
        if let Some(target) = self.target.take() {
            gfx.release_target(target);
        }
    }
}

impl<G: GraphicsApi> Default for FrameBuffer<G> {
    fn default() -> Self {
        Self::new()
    }
}

/// Scope in which draws go to the offscreen target.
pub struct BoundFrameBuffer<'a, G: GraphicsApi> {
    gfx: &'a mut G,
}

impl<G: GraphicsApi> BoundFrameBuffer<'_, G> {
    pub(crate) fn draw_indexed(
        &mut self,
        program: &G::Program,
        mesh: &G::Mesh,
        index_count: u32,
    ) -> Result<(), RenderError> {
        self.gfx.draw_indexed(program, mesh, index_count)
    }
}

impl<G: GraphicsApi> Drop for BoundFrameBuffer<'_, G> {
    fn drop(&mut self) {
        self.gfx.end_target_pass();
    }
}
