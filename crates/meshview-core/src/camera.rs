//! Orbit camera

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

use crate::gfx::GraphicsApi;
use crate::input::MouseButton;
use crate::settings::CameraSettings;
use crate::shader::UniformWriter;

/// Closest the camera may orbit to its focus point
pub const MIN_DISTANCE: f32 = 0.1;
/// Farthest the camera may orbit from its focus point
pub const MAX_DISTANCE: f32 = 50.0;

/// Pointer pixels to radians before `rotation_speed`
const ROTATE_SCALE: f32 = 0.004;
/// Pointer pixels to world units (per unit of distance) before `pan_speed`
const PAN_SCALE: f32 = 0.003;

/// Camera uniform buffer data sent to GPU (208 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    /// Eye position (xyz), w = 1
    pub eye: [f32; 4],
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            view: Mat4::IDENTITY.to_cols_array_2d(),
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            eye: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Orbit state: everything input can change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub focus: Vec3,
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
}

/// Camera orbiting a focus point.
///
/// The eye sits `distance` behind the focus along the forward axis given by
/// yaw and pitch.
#[derive(Debug, Clone)]
pub struct Camera {
    pose: CameraPose,
    fov_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
    rotation_speed: f32,
    pan_speed: f32,
    pointer: Option<Vec2>,
}

impl Camera {
    /// Creates a camera at `position` looking at the origin.
    pub fn new(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let distance = position.length().clamp(MIN_DISTANCE, MAX_DISTANCE);
        let forward = if position.length_squared() > f32::EPSILON {
            -position.normalize()
        } else {
            Vec3::NEG_Z
        };

        let pitch = (-forward.y).clamp(-1.0, 1.0).asin();
        let yaw = forward.x.atan2(-forward.z);

        let mut camera = Self {
            pose: CameraPose {
                focus: Vec3::ZERO,
                distance,
                yaw,
                pitch,
            },
            fov_degrees,
            aspect: 1.0,
            near,
            far,
            rotation_speed: 2.0,
            pan_speed: 1.0,
            pointer: None,
        };
        camera.set_aspect(aspect);
        camera
    }

    pub fn from_settings(settings: &CameraSettings, aspect: f32) -> Self {
        let mut camera = Self::new(
            settings.position,
            settings.fov_degrees,
            aspect,
            settings.near,
            settings.far,
        );
        camera.rotation_speed = settings.rotation_speed;
        camera.pan_speed = settings.pan_speed;
        camera
    }

    /// Sets the projection aspect ratio (width / height).
    ///
    /// Non-finite or non-positive values come from empty regions and are
    /// ignored.
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Moves the eye towards (negative) or away from (positive) the focus.
    pub fn set_distance(&mut self, delta: f32) {
        self.pose.distance = (self.pose.distance + delta).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    pub fn distance(&self) -> f32 {
        self.pose.distance
    }

    /// Applies pointer movement.
    ///
    /// Right button orbits, middle button pans. Without one of those
    /// buttons the pose does not change; the pointer anchor always follows.
    pub fn on_mouse_move(&mut self, x: f64, y: f64, button: Option<MouseButton>) {
        let position = Vec2::new(x as f32, y as f32);
        let Some(previous) = self.pointer.replace(position) else {
            return;
        };
        let delta = position - previous;

        match button {
            Some(MouseButton::Right) => {
                let delta = delta * ROTATE_SCALE;
                let sign = if self.up().y < 0.0 { -1.0 } else { 1.0 };
                self.pose.yaw += sign * delta.x * self.rotation_speed;
                self.pose.pitch += delta.y * self.rotation_speed;
            }
            Some(MouseButton::Middle) => {
                let delta = delta * PAN_SCALE * self.pan_speed;
                let right = self.right();
                let up = self.up();
                self.pose.focus += -right * delta.x * self.pose.distance;
                self.pose.focus += up * delta.y * self.pose.distance;
            }
            Some(MouseButton::Left) | None => {}
        }
    }

    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, -self.pose.yaw, -self.pose.pitch, 0.0)
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation() * Vec3::NEG_Z
    }

    pub fn right(&self) -> Vec3 {
        self.orientation() * Vec3::X
    }

    pub fn up(&self) -> Vec3 {
        self.orientation() * Vec3::Y
    }

    /// Eye position in world space.
    pub fn position(&self) -> Vec3 {
        self.pose.focus - self.forward() * self.pose.distance
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation(), self.position()).inverse()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn uniform(&self) -> CameraUniform {
        let eye = self.position();
        CameraUniform {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            view: self.view_matrix().to_cols_array_2d(),
            projection: self.projection_matrix().to_cols_array_2d(),
            eye: [eye.x, eye.y, eye.z, 1.0],
        }
    }

    /// Pushes view/projection for this frame.
    pub fn update<G: GraphicsApi>(&self, uniforms: &mut UniformWriter<'_, G>) {
        uniforms.set_camera(&self.uniform());
    }
}
