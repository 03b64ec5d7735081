//! The drifting point field.
//!
//! [`PointField`] owns every [`Point`] in the background. Points are created
//! once, drift by a constant per-tick velocity on x/y and bounce off the
//! viewport edges. Everything else in the crate refers to points through
//! [`PointId`] handles and looks positions up live, so lines keep following
//! their endpoints after they finish drawing.
//!
//! # Handles
//!
//! A [`PointId`] carries the generation of the population it was issued for.
//! [`PointField::reseed`] bumps the generation, so handles from an earlier
//! population stop resolving instead of silently pointing at new points.

use crate::camera::Viewport;
use crate::config::BackgroundConfig;
use glam::{Vec2, Vec3};
use rand::Rng;

/// Stable handle to a point in a [`PointField`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId {
    index: u32,
    generation: u32,
}

impl PointId {
    /// Position of the point in [`PointField::points`].
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// A single drifting point.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub id: PointId,
    pub position: Vec3,
    /// Per-tick velocity on x/y. z never moves.
    pub velocity: Vec2,
}

/// Owns the point population and integrates it once per frame.
#[derive(Clone, Debug, Default)]
pub struct PointField {
    points: Vec<Point>,
    generation: u32,
}

impl PointField {
    /// Create `config.point_count` points spread over `viewport` and `config.depth_range`.
    pub fn new<R: Rng + ?Sized>(config: &BackgroundConfig, viewport: Viewport, rng: &mut R) -> Self {
        let mut field = Self::default();
        field.populate(config, viewport, rng);
        field
    }

    /// Build a field from explicit points, e.g. for tests or a host-supplied layout.
    pub fn from_points(points: impl IntoIterator<Item = (Vec3, Vec2)>) -> Self {
        let points = points
            .into_iter()
            .enumerate()
            .map(|(i, (position, velocity))| Point {
                id: PointId {
                    index: i as u32,
                    generation: 0,
                },
                position,
                velocity,
            })
            .collect();
        Self {
            points,
            generation: 0,
        }
    }

    /// Replace the whole population. Every previously issued [`PointId`] becomes stale.
    pub fn reseed<R: Rng + ?Sized>(&mut self, config: &BackgroundConfig, viewport: Viewport, rng: &mut R) {
        self.generation = self.generation.wrapping_add(1);
        self.populate(config, viewport, rng);
        log::info!(
            "Reseeded point field: {} points, generation {}",
            self.points.len(),
            self.generation
        );
    }

    fn populate<R: Rng + ?Sized>(&mut self, config: &BackgroundConfig, viewport: Viewport, rng: &mut R) {
        let generation = self.generation;
        let (hw, hh) = (viewport.half_width(), viewport.half_height());

        self.points = (0..config.point_count)
            .map(|i| {
                let velocity = Vec2::new(
                    sample(rng, config.x_velocity_range),
                    sample(rng, config.y_velocity_range),
                );
                let position = Vec3::new(
                    sample(rng, (-hw, hw)),
                    sample(rng, (-hh, hh)),
                    sample(rng, config.depth_range),
                );
                Point {
                    id: PointId {
                        index: i as u32,
                        generation,
                    },
                    position,
                    velocity,
                }
            })
            .collect();
    }

    /// Advance every point by one tick of velocity and reflect off the viewport edges.
    ///
    /// An axis is reflected only while the point is outside the half-extent and
    /// still heading outward. There is no positional clamp, so a point may
    /// overshoot the edge by at most one tick of velocity before turning back.
    pub fn step(&mut self, viewport: Viewport) {
        let (hw, hh) = (viewport.half_width(), viewport.half_height());

        for point in &mut self.points {
            point.position.x += point.velocity.x;
            point.position.y += point.velocity.y;

            if heading_out(point.position.x, point.velocity.x, hw) {
                point.velocity.x = -point.velocity.x;
            }
            if heading_out(point.position.y, point.velocity.y, hh) {
                point.velocity.y = -point.velocity.y;
            }
        }
    }

    /// Resolve a handle. Stale or out-of-range handles return `None`.
    pub fn get(&self, id: PointId) -> Option<&Point> {
        if id.generation != self.generation {
            return None;
        }
        self.points.get(id.index())
    }

    #[inline]
    pub fn position(&self, id: PointId) -> Option<Vec3> {
        self.get(id).map(|p| p.position)
    }

    #[inline]
    pub fn contains(&self, id: PointId) -> bool {
        self.get(id).is_some()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

#[inline]
fn heading_out(pos: f32, vel: f32, half_extent: f32) -> bool {
    (pos > half_extent && vel > 0.0) || (pos < -half_extent && vel < 0.0)
}

/// Uniform sample from an inclusive `(min, max)` range; a degenerate range yields `min`.
pub(crate) fn sample<R: Rng + ?Sized>(rng: &mut R, (min, max): (f32, f32)) -> f32 {
    if min < max {
        rng.gen_range(min..=max)
    } else {
        min
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_config(count: usize) -> BackgroundConfig {
        BackgroundConfig::default().with_point_count(count)
    }

    #[test]
    fn test_initial_placement_within_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let viewport = Viewport::new(8.0, 4.0);
        let config = test_config(500);
        let field = PointField::new(&config, viewport, &mut rng);

        assert_eq!(field.len(), 500);
        for p in field.iter() {
            assert!(viewport.contains_xy(p.position));
            assert!(p.position.z >= -2.0 && p.position.z <= 4.0);
            assert!(p.velocity.x.abs() <= 0.0005);
            assert!(p.velocity.y.abs() <= 0.0005);
        }
    }

    #[test]
    fn test_points_stay_in_viewport() {
        let mut rng = StdRng::seed_from_u64(2);
        let viewport = Viewport::new(2.0, 1.0);
        // Fast points so that many bounces happen.
        let config = test_config(200).with_velocity_range(-0.05, 0.05);
        let mut field = PointField::new(&config, viewport, &mut rng);
        let zs: Vec<f32> = field.iter().map(|p| p.position.z).collect();

        let slack = 0.05 + 1e-5;
        for _ in 0..5000 {
            field.step(viewport);
            for p in field.iter() {
                assert!(p.position.x.abs() <= viewport.half_width() + slack);
                assert!(p.position.y.abs() <= viewport.half_height() + slack);
            }
        }

        let zs_after: Vec<f32> = field.iter().map(|p| p.position.z).collect();
        assert_eq!(zs, zs_after);
    }

    #[test]
    fn test_reflection_negates_velocity() {
        let mut field = PointField::from_points([(Vec3::new(0.99, 0.0, 0.0), Vec2::new(0.02, 0.0))]);
        let viewport = Viewport::new(2.0, 2.0);

        field.step(viewport);
        let p = &field.points()[0];
        assert!((p.position.x - 1.01).abs() < 1e-6);
        assert_eq!(p.velocity.x, -0.02);

        field.step(viewport);
        assert!((field.points()[0].position.x - 0.99).abs() < 1e-6);
    }

    #[test]
    fn test_point_outside_shrunk_viewport_walks_back() {
        let mut field = PointField::from_points([(Vec3::new(3.0, 0.0, 0.0), Vec2::new(-0.1, 0.0))]);
        let viewport = Viewport::new(2.0, 2.0);

        for _ in 0..5 {
            field.step(viewport);
            assert!(field.points()[0].velocity.x < 0.0);
        }
        assert!(field.points()[0].position.x < 3.0);
    }

    #[test]
    fn test_reseed_invalidates_handles() {
        let mut rng = StdRng::seed_from_u64(3);
        let viewport = Viewport::new(4.0, 4.0);
        let config = test_config(10);
        let mut field = PointField::new(&config, viewport, &mut rng);
        let old = field.points()[0].id;
        assert!(field.contains(old));

        field.reseed(&config, viewport, &mut rng);
        assert!(!field.contains(old));
        assert!(field.contains(field.points()[0].id));
    }

    #[test]
    fn test_zero_sized_viewport() {
        let mut rng = StdRng::seed_from_u64(4);
        let field = PointField::new(&test_config(5), Viewport::new(0.0, 0.0), &mut rng);
        for p in field.iter() {
            assert_eq!(p.position.x, 0.0);
            assert_eq!(p.position.y, 0.0);
        }
    }
}
