//! Nearest unvisited neighbor lookup on top of [`SpatialGrid`].

use crate::field::PointId;
use crate::spatial::SpatialGrid;
use glam::Vec3;
use std::collections::HashSet;

/// Points already consumed by a chain walk.
pub type Visited = HashSet<PointId>;

/// Closest point to `target` in the 3×3×3 neighborhood that is not in `visited`.
///
/// Distances are compared squared. On an exact tie the first candidate in
/// neighborhood iteration order wins. `None` just means the neighborhood is
/// empty after filtering.
pub fn find_nearest(grid: &SpatialGrid, target: Vec3, visited: &Visited) -> Option<PointId> {
    let mut closest = None;
    let mut closest_dist = f32::INFINITY;

    for entry in grid.neighborhood(target) {
        if visited.contains(&entry.id) {
            continue;
        }
        let dist = entry.position.distance_squared(target);
        if dist < closest_dist {
            closest_dist = dist;
            closest = Some(entry.id);
        }
    }

    closest
}
