//! Greedy nearest-neighbor chain walk.
//!
//! Starting from a seed, the walk repeatedly hops to the closest point that has
//! not been visited yet. Before every hop the grid is rebuilt from the
//! remaining unvisited points, so the grid only ever holds candidates.
//!
//! # Depth bound
//!
//! The stopping depth is not fixed per chain: a new bound is drawn from
//! `depth_range` at every step (the first step uses the hard cap). A walk
//! therefore stops as soon as the current depth exceeds whatever bound was just
//! rolled. Independently of the roll, `depth_cap` bounds the walk to
//! `depth_cap + 1` points.

use crate::field::{PointField, PointId};
use crate::neighbors::{find_nearest, Visited};
use crate::spatial::SpatialGrid;
use rand::Rng;

/// Ordered, repeat-free walk through the field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Chain {
    points: Vec<PointId>,
}

impl Chain {
    pub fn new(points: Vec<PointId>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[PointId] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<PointId> {
        self.points.first().copied()
    }

    /// Consecutive `(from, to)` pairs in walk order.
    pub fn edges(&self) -> impl Iterator<Item = (PointId, PointId)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }
}

/// Builds [`Chain`]s with a randomized, per-step depth bound.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainBuilder {
    /// Inclusive range the per-step bound is drawn from.
    pub depth_range: (u32, u32),
    /// Hard limit on depth, independent of the drawn bound.
    pub depth_cap: u32,
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self {
            depth_range: (4, 50),
            depth_cap: 20,
        }
    }
}

impl ChainBuilder {
    pub fn new(depth_range: (u32, u32), depth_cap: u32) -> Self {
        Self {
            depth_range,
            depth_cap,
        }
    }

    /// Walk the field from `seed`. A `None` seed yields an empty chain.
    ///
    /// `grid` is used as scratch space and is left holding whatever points
    /// were still unvisited at the last hop.
    pub fn build<R: Rng + ?Sized>(
        &self,
        seed: Option<PointId>,
        field: &PointField,
        grid: &mut SpatialGrid,
        rng: &mut R,
    ) -> Chain {
        let mut visited = Visited::new();
        let mut points = Vec::new();
        let mut current = seed;
        let mut depth = 0u32;
        let mut bound = self.depth_cap;

        while let Some(id) = current {
            if visited.contains(&id) || depth > bound || depth > self.depth_cap {
                break;
            }
            // Stale handles end the walk like a missing neighbor would.
            let Some(point) = field.get(id) else {
                break;
            };

            visited.insert(id);
            points.push(id);

            grid.rebuild(field.iter().filter(|p| !visited.contains(&p.id)));
            current = find_nearest(grid, point.position, &visited);

            depth += 1;
            bound = self.draw_bound(rng);
        }

        log::debug!("Built chain of {} points (depth cap {})", points.len(), self.depth_cap);
        Chain { points }
    }

    fn draw_bound<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let (min, max) = self.depth_range;
        if min < max {
            rng.gen_range(min..=max)
        } else {
            min
        }
    }
}
