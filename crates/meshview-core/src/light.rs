//! Point light

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::gfx::GraphicsApi;
use crate::settings::LightSettings;
use crate::shader::UniformWriter;

/// Light uniform buffer data sent to GPU (32 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightUniform {
    /// World position (xyz), w = 1
    pub position: [f32; 4],
    /// Color scaled by strength (rgb), w unused
    pub radiance: [f32; 4],
}

impl Default for LightUniform {
    fn default() -> Self {
        Light::default().uniform()
    }
}

/// Single point light edited from the property panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub position: Vec3,
    /// Linear RGB, 0.0-1.0
    pub color: Vec3,
    /// Radiance multiplier; falloff is inverse-square in the shader
    pub strength: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec3::new(1.5, 3.5, 3.0),
            color: Vec3::ONE,
            strength: 100.0,
        }
    }
}

impl Light {
    pub fn from_settings(settings: &LightSettings) -> Self {
        Self {
            position: settings.position,
            color: settings.color,
            strength: settings.strength,
        }
    }

    pub fn radiance(&self) -> Vec3 {
        self.color * self.strength
    }

    pub fn uniform(&self) -> LightUniform {
        let radiance = self.radiance();
        LightUniform {
            position: [self.position.x, self.position.y, self.position.z, 1.0],
            radiance: [radiance.x, radiance.y, radiance.z, 0.0],
        }
    }

    /// Pushes the light state for this frame.
    pub fn update<G: GraphicsApi>(&self, uniforms: &mut UniformWriter<'_, G>) {
        uniforms.set_light(&self.uniform());
    }
}
