//! Viewer settings
//!
//! Serializable defaults for assets, camera and light. The frontend embeds
//! these in its RON configuration file.

use std::path::PathBuf;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Files loaded at startup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetSettings {
    /// Scene file whose first mesh is displayed
    pub mesh: PathBuf,
    /// WGSL vertex stage (entry point `vs_main`)
    pub vertex_shader: PathBuf,
    /// WGSL fragment stage (entry point `fs_main`)
    pub fragment_shader: PathBuf,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            mesh: PathBuf::from("assets/models/cube.obj"),
            vertex_shader: PathBuf::from("assets/shaders/mesh.vert.wgsl"),
            fragment_shader: PathBuf::from("assets/shaders/mesh.frag.wgsl"),
        }
    }
}

/// Camera placement and input sensitivity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraSettings {
    /// Initial eye position; the camera orbits the origin
    pub position: Vec3,
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Distance change per frame while a zoom key is held
    pub distance_step: f32,
    pub rotation_speed: f32,
    pub pan_speed: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            distance_step: 0.1,
            rotation_speed: 2.0,
            pan_speed: 1.0,
        }
    }
}

/// Initial light state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LightSettings {
    pub position: Vec3,
    pub color: Vec3,
    pub strength: f32,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(1.5, 3.5, 3.0),
            color: Vec3::ONE,
            strength: 100.0,
        }
    }
}

/// Everything the viewer reads at init
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ViewerSettings {
    #[serde(default)]
    pub assets: AssetSettings,
    #[serde(default)]
    pub camera: CameraSettings,
    #[serde(default)]
    pub light: LightSettings,
}
