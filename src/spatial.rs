//! Uniform grid spatial index.
//!
//! Points are bucketed into cubic cells of `cell_size` world units keyed by
//! `floor(position / cell_size)` per axis. A neighborhood query visits the 27
//! cells (3×3×3) around the query cell, so with a cell size of 1 every point
//! within one world unit of the query is guaranteed to be returned.
//!
//! The grid is rebuilt from scratch before each query sequence rather than
//! maintained incrementally. Each bucket stores the point's position as it was
//! at rebuild time.

use crate::field::{Point, PointId};
use glam::{IVec3, Vec3};
use std::collections::HashMap;

/// Offsets for the 27 neighboring cells (including self).
#[rustfmt::skip]
pub const NEIGHBOR_OFFSETS: [IVec3; 27] = [
    IVec3::new(-1, -1, -1), IVec3::new(0, -1, -1), IVec3::new(1, -1, -1),
    IVec3::new(-1,  0, -1), IVec3::new(0,  0, -1), IVec3::new(1,  0, -1),
    IVec3::new(-1,  1, -1), IVec3::new(0,  1, -1), IVec3::new(1,  1, -1),
    IVec3::new(-1, -1,  0), IVec3::new(0, -1,  0), IVec3::new(1, -1,  0),
    IVec3::new(-1,  0,  0), IVec3::new(0,  0,  0), IVec3::new(1,  0,  0),
    IVec3::new(-1,  1,  0), IVec3::new(0,  1,  0), IVec3::new(1,  1,  0),
    IVec3::new(-1, -1,  1), IVec3::new(0, -1,  1), IVec3::new(1, -1,  1),
    IVec3::new(-1,  0,  1), IVec3::new(0,  0,  1), IVec3::new(1,  0,  1),
    IVec3::new(-1,  1,  1), IVec3::new(0,  1,  1), IVec3::new(1,  1,  1),
];

/// A point as recorded in a grid bucket.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridEntry {
    pub id: PointId,
    pub position: Vec3,
}

/// Bucket map from integer cell coordinates to the points inside each cell.
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<IVec3, Vec<GridEntry>>,
    len: usize,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        debug_assert!(cell_size > 0.0, "cell size must be positive");
        Self {
            cell_size,
            cells: HashMap::new(),
            len: 0,
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell coordinates containing `pos`.
    #[inline]
    pub fn cell_key(&self, pos: Vec3) -> IVec3 {
        (pos / self.cell_size).floor().as_ivec3()
    }

    /// Clear every bucket and reinsert `points` by their current position.
    ///
    /// Bucket allocations are kept around so repeated rebuilds during a chain
    /// walk don't reallocate; empty buckets are dropped from the map.
    pub fn rebuild<'a>(&mut self, points: impl IntoIterator<Item = &'a Point>) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }

        let mut len = 0;
        for point in points {
            let key = self.cell_key(point.position);
            self.cells.entry(key).or_default().push(GridEntry {
                id: point.id,
                position: point.position,
            });
            len += 1;
        }

        self.cells.retain(|_, bucket| !bucket.is_empty());
        self.len = len;
        log::trace!("Rebuilt spatial grid: {} points in {} cells", len, self.cells.len());
    }

    /// Drop every bucket.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.len = 0;
    }

    /// Entries in the 3×3×3 block of cells around the cell containing `pos`.
    ///
    /// Cell keys saturate at the `i32` limits, so neighbors past the edge of
    /// the key space are skipped.
    pub fn neighborhood(&self, pos: Vec3) -> impl Iterator<Item = &GridEntry> + '_ {
        let center = self.cell_key(pos);
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |offset| neighbor_cell(center, *offset))
            .filter_map(move |key| self.cells.get(&key))
            .flatten()
    }

    /// Collected form of [`neighborhood`](Self::neighborhood).
    pub fn query_neighborhood(&self, pos: Vec3) -> Vec<GridEntry> {
        self.neighborhood(pos).copied().collect()
    }

    /// Entries in exactly one cell.
    pub fn bucket(&self, key: IVec3) -> &[GridEntry] {
        self.cells.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of points inserted by the last rebuild.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of non-empty cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }
}

fn neighbor_cell(center: IVec3, offset: IVec3) -> Option<IVec3> {
    Some(IVec3::new(
        center.x.checked_add(offset.x)?,
        center.y.checked_add(offset.y)?,
        center.z.checked_add(offset.z)?,
    ))
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::PointField;
    use glam::Vec2;

    fn field_of(positions: &[Vec3]) -> PointField {
        PointField::from_points(positions.iter().map(|&p| (p, Vec2::ZERO)))
    }

    #[test]
    fn test_cell_key_floors_negative() {
        let grid = SpatialGrid::new(1.0);
        assert_eq!(grid.cell_key(Vec3::new(0.5, -0.5, 1.0)), IVec3::new(0, -1, 1));
        assert_eq!(grid.cell_key(Vec3::new(-1.0, -1.01, 2.99)), IVec3::new(-1, -2, 2));

        let grid = SpatialGrid::new(0.25);
        assert_eq!(grid.cell_key(Vec3::new(0.6, 0.0, -0.1)), IVec3::new(2, 0, -1));
    }

    #[test]
    fn test_every_point_in_exactly_one_bucket() {
        let field = field_of(&[
            Vec3::new(0.1, 0.1, 0.1),
            Vec3::new(0.9, 0.2, 0.3),
            Vec3::new(-3.5, 2.0, 1.0),
            Vec3::new(7.0, -7.0, 0.0),
        ]);
        let mut grid = SpatialGrid::new(1.0);
        grid.rebuild(field.iter());

        assert_eq!(grid.len(), 4);
        assert_eq!(grid.occupied_cells(), 3);
        for p in field.iter() {
            let key = grid.cell_key(p.position);
            assert_eq!(grid.bucket(key).iter().filter(|e| e.id == p.id).count(), 1);
        }
    }

    #[test]
    fn test_neighborhood_includes_own_position() {
        let field = field_of(&[
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::new(-2.3, 4.1, -1.7),
            Vec3::new(10.0, 10.0, 10.0),
        ]);
        let mut grid = SpatialGrid::new(1.0);
        grid.rebuild(field.iter());

        for p in field.iter() {
            let found = grid.query_neighborhood(p.position);
            assert!(found.iter().any(|e| e.id == p.id));
        }
    }

    #[test]
    fn test_neighborhood_excludes_far_cells() {
        let field = field_of(&[Vec3::new(0.5, 0.5, 0.5), Vec3::new(2.5, 0.5, 0.5)]);
        let mut grid = SpatialGrid::new(1.0);
        grid.rebuild(field.iter());

        let found = grid.query_neighborhood(Vec3::new(0.5, 0.5, 0.5));
        assert_eq!(found.len(), 1);

        // Cell 1 borders both.
        let found = grid.query_neighborhood(Vec3::new(1.5, 0.5, 0.5));
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let first = field_of(&[Vec3::ZERO, Vec3::ONE]);
        let second = field_of(&[Vec3::new(5.0, 5.0, 5.0)]);
        let mut grid = SpatialGrid::new(1.0);

        grid.rebuild(first.iter());
        assert_eq!(grid.len(), 2);

        grid.rebuild(second.iter());
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.occupied_cells(), 1);
        assert!(grid.query_neighborhood(Vec3::ZERO).is_empty());
    }

    #[test]
    fn test_query_at_key_space_edge() {
        let far = Vec3::splat(3.0e9);
        let field = field_of(&[far, -far, Vec3::ZERO]);
        let mut grid = SpatialGrid::new(1.0);
        grid.rebuild(field.iter());

        assert_eq!(grid.cell_key(far), IVec3::splat(i32::MAX));
        assert_eq!(grid.cell_key(-far), IVec3::splat(i32::MIN));

        let found = grid.query_neighborhood(far);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].position, far);
        assert_eq!(grid.query_neighborhood(-far).len(), 1);
        assert!(grid.query_neighborhood(Vec3::new(3.0e9, 0.0, 0.0)).is_empty());
    }

    #[test]
    fn test_empty_grid() {
        let grid = SpatialGrid::default();
        assert!(grid.is_empty());
        assert_eq!(grid.neighborhood(Vec3::ZERO).count(), 0);
    }
}
