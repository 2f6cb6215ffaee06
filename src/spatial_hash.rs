//! Uniform-grid spatial hash for neighbor candidate queries.

use std::collections::HashMap;

use glam::DVec2;

/// Maps grid cells to the agent indices inside them. Rebuilt every step.
#[derive(Debug)]
pub struct SpatialHash {
    cell_size: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl SpatialHash {
    /// `cell_size` should be on the order of the neighbor search radius so
    /// queries touch only a handful of cells.
    #[must_use]
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    /// Remove all entries, keeping bucket allocations for the next rebuild.
    pub fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }
    }

    /// Record agent `index` at `position`.
    pub fn insert(&mut self, index: usize, position: DVec2) {
        let coords = self.cell_coords(position);
        self.cells.entry(coords).or_default().push(index);
    }

    /// Append to `out` every recorded index whose cell intersects the disk
    /// of `radius` around `position`. Returns a superset; callers must
    /// distance-filter. `out` is not cleared first.
    pub fn query_into(&self, position: DVec2, radius: f64, out: &mut Vec<usize>) {
        let min = self.cell_coords(position - DVec2::splat(radius));
        let max = self.cell_coords(position + DVec2::splat(radius));
        for x in min.0..=max.0 {
            for y in min.1..=max.1 {
                if let Some(bucket) = self.cells.get(&(x, y)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_coords(&self, position: DVec2) -> (i64, i64) {
        (
            (position.x / self.cell_size).floor() as i64,
            (position.y / self.cell_size).floor() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(hash: &SpatialHash, position: DVec2, radius: f64) -> Vec<usize> {
        let mut out = Vec::new();
        hash.query_into(position, radius, &mut out);
        out
    }

    #[test]
    fn finds_inserted_index_near_its_position() {
        let mut hash = SpatialHash::new(5.0);
        hash.insert(7, DVec2::new(2.5, 2.5));
        assert!(query(&hash, DVec2::new(2.0, 2.0), 1.0).contains(&7));
    }

    #[test]
    fn excludes_distant_indices() {
        let mut hash = SpatialHash::new(5.0);
        hash.insert(0, DVec2::new(1.0, 1.0));
        hash.insert(1, DVec2::new(50.0, 50.0));
        let found = query(&hash, DVec2::new(1.0, 1.0), 3.0);
        assert!(found.contains(&0));
        assert!(!found.contains(&1));
    }

    #[test]
    fn straddles_cell_boundaries() {
        let mut hash = SpatialHash::new(5.0);
        hash.insert(0, DVec2::new(5.0, 0.0));
        assert!(query(&hash, DVec2::new(4.9, 0.0), 0.5).contains(&0));
    }

    #[test]
    fn clear_empties_every_bucket() {
        let mut hash = SpatialHash::new(5.0);
        hash.insert(0, DVec2::ZERO);
        hash.insert(1, DVec2::new(100.0, 100.0));
        hash.clear();
        assert!(query(&hash, DVec2::ZERO, 200.0).is_empty());
    }

    #[test]
    fn negative_coordinates_round_toward_negative_infinity() {
        let mut hash = SpatialHash::new(5.0);
        hash.insert(0, DVec2::new(-0.1, -0.1));
        hash.insert(1, DVec2::new(0.1, 0.1));
        // Both sit next to the origin even though they hash to different
        // cells.
        let found = query(&hash, DVec2::ZERO, 0.5);
        assert!(found.contains(&0));
        assert!(found.contains(&1));
    }
}
