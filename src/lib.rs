//! # starchain
//!
//! A drifting field of points for ambient backgrounds, with click-triggered
//! "constellation" chains: the nearest points to a click are linked one after
//! another by lines that draw in, hold, and fade away.
//!
//! starchain owns the simulation only. A renderer reads positions and line
//! segments every frame and feeds back the frame delta and clicks.
//!
//! ## Quick Start
//!
//! ```ignore
//! use starchain::prelude::*;
//!
//! let config = BackgroundConfig::default().with_point_count(1000);
//! let mut scene = Scene::new(config, 16.0 / 9.0)?;
//!
//! // Host frame loop:
//! scene.click(Vec3::new(0.3, -0.2, 0.1));
//! scene.frame(1.0 / 60.0);
//! let points = scene.point_instances();   // &[PointInstance] -> GPU
//! let lines = scene.line_vertices();      // &[LineVertex]    -> GPU
//! ```
//!
//! ## Pieces
//!
//! | Stage | Type |
//! |-------|------|
//! | Moving points, bouncing off the viewport | [`PointField`] |
//! | Uniform grid for neighbor queries | [`SpatialGrid`] |
//! | Closest unvisited point | [`find_nearest`] |
//! | Greedy walk from a seed | [`ChainBuilder`] |
//! | Staggered draw / hold / fade | [`Sequencer`] |
//! | Everything wired together | [`Scene`] |
//!
//! ## Chains
//!
//! A click picks the point nearest to it (within the 3×3×3 cells around the
//! click). From there the walk keeps hopping to the nearest point it hasn't
//! used yet, stopping when nothing is in reach, when a freshly rolled depth
//! bound is exceeded, or at the hard depth cap. Each hop becomes a line; line
//! `i` is inserted `i × stagger` after the click and lines draw one at a time.

pub mod camera;
pub mod chain;
pub mod config;
pub mod error;
pub mod field;
pub mod input;
pub mod neighbors;
pub mod render;
pub mod scene;
pub mod sequencer;
pub mod spatial;
pub mod time;

pub use bytemuck;
pub use camera::{Camera, Viewport};
pub use chain::{Chain, ChainBuilder};
pub use config::BackgroundConfig;
pub use error::ConfigError;
pub use field::{Point, PointField, PointId};
pub use glam::{Vec2, Vec3};
pub use neighbors::{find_nearest, Visited};
pub use render::{LineVertex, PointInstance};
pub use scene::Scene;
pub use sequencer::{LineAnimation, LineSegment, LineState, LineTiming, PendingLine, Sequencer};
pub use spatial::{GridEntry, SpatialGrid};
pub use time::{SimClock, TimerQueue};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use starchain::prelude::*;
/// ```
pub mod prelude {
    pub use crate::camera::{Camera, Viewport};
    pub use crate::config::BackgroundConfig;
    pub use crate::input::Input;
    pub use crate::render::{LineVertex, PointInstance};
    pub use crate::scene::Scene;
    pub use crate::sequencer::{LineSegment, LineState};
    pub use crate::{Vec2, Vec3};
}
