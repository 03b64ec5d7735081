//! Fixed perspective camera and the visible viewport it implies.
//!
//! The camera sits on the +z axis looking at the origin. The background is laid
//! out on the z = 0 plane, so the world-space [`Viewport`] is the rectangle the
//! camera sees at that depth.

use crate::error::ConfigError;
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Visible world-space rectangle centred on the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    #[inline]
    pub fn half_width(&self) -> f32 {
        self.width * 0.5
    }

    #[inline]
    pub fn half_height(&self) -> f32 {
        self.height * 0.5
    }

    /// Whether `pos` lies inside the rectangle on x/y (z ignored).
    pub fn contains_xy(&self, pos: Vec3) -> bool {
        pos.x.abs() <= self.half_width() && pos.y.abs() <= self.half_height()
    }
}

/// Perspective camera looking down -z at the origin.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Camera {
    /// Distance from the origin along +z.
    pub distance: f32,
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            distance: 5.0,
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Camera {
    /// Camera world position.
    pub fn position(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, self.distance)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), Vec3::ZERO, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_degrees.to_radians(), aspect, self.near, self.far)
    }

    /// Combined view-projection matrix for the render layer.
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// World-space rectangle visible on the z = 0 plane.
    pub fn viewport(&self, aspect: f32) -> Viewport {
        let height = 2.0 * (self.fov_y_degrees.to_radians() * 0.5).tan() * self.distance;
        Viewport::new(height * aspect, height)
    }

    /// Project a point in normalized device coordinates onto the plane `z = plane_z`.
    ///
    /// Returns `None` when the pick ray is parallel to the plane or the plane
    /// lies behind the camera.
    pub fn unproject(&self, ndc: Vec2, aspect: f32, plane_z: f32) -> Option<Vec3> {
        let inv = self.view_proj(aspect).inverse();
        let near = inv.project_point3(Vec3::new(ndc.x, ndc.y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc.x, ndc.y, 1.0));
        let dir = far - near;

        if dir.z.abs() < f32::EPSILON {
            return None;
        }

        let t = (plane_z - near.z) / dir.z;
        if !t.is_finite() || t < 0.0 {
            return None;
        }

        Some(near + dir * t)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(self.distance.is_finite() && self.distance > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "camera distance must be positive, got {}",
                self.distance
            )));
        }
        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera fov must be within (0, 180) degrees, got {}",
                self.fov_y_degrees
            )));
        }
        if !(self.near > 0.0 && self.near < self.far) {
            return Err(ConfigError::Invalid(format!(
                "camera clip planes must satisfy 0 < near < far, got {}..{}",
                self.near, self.far
            )));
        }
        Ok(())
    }
}
