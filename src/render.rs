//! GPU-ready records for the render layer.
//!
//! The scene exports flat `#[repr(C)]` records so a renderer can upload them
//! with `bytemuck::cast_slice` and draw points as instances and lines as a
//! line list.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// One point instance.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PointInstance {
    pub position: [f32; 3],
    pub opacity: f32,
}

impl PointInstance {
    pub fn new(position: Vec3, opacity: f32) -> Self {
        Self {
            position: position.to_array(),
            opacity,
        }
    }
}

/// One line-list vertex. Segments are emitted as consecutive vertex pairs.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub opacity: f32,
}

impl LineVertex {
    pub fn new(position: Vec3, opacity: f32) -> Self {
        Self {
            position: position.to_array(),
            opacity,
        }
    }
}
