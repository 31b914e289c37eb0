//! Uniform spatial hash over accepted pores.
//!
//! Each accepted pore is registered in every cell its clearance-inflated
//! bounding box touches. A candidate then only needs to be compared with the
//! pores registered in the cells its own bounding box touches: any accepted
//! pore closer than the clearance has an inflated box overlapping the
//! candidate's box, so it shares at least one cell.
//!
//! The grid is generic over dimension so the 2D packer and the sphere packer
//! share it.

use hashbrown::HashMap;

/// Queries spanning more cells than this scan every entry instead.
const MAX_QUERY_CELLS: usize = 4096;

/// Spatial hash mapping grid cells to entry indices.
#[derive(Debug, Clone)]
pub struct SpatialGrid<const D: usize> {
    cell_size: f64,
    cells: HashMap<[i64; D], Vec<usize>>,
    len: usize,
}

impl<const D: usize> SpatialGrid<D> {
    /// Create an empty grid. Non-positive or non-finite sizes fall back to 1.
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size > 0.0 && cell_size.is_finite() {
            cell_size
        } else {
            1.0
        };
        Self {
            cell_size,
            cells: HashMap::new(),
            len: 0,
        }
    }

    /// Edge length of one cell.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of occupied cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Register entry `index` over the box `[min, max]` grown by `margin`.
    pub fn insert(&mut self, index: usize, min: [f64; D], max: [f64; D], margin: f64) {
        let lo = min.map(|v| self.cell_of(v - margin));
        let hi = max.map(|v| self.cell_of(v + margin));
        for_each_cell(lo, hi, |key| self.cells.entry(key).or_default().push(index));
        self.len += 1;
    }

    /// Indices of entries that may lie near the box `[min, max]`.
    ///
    /// Sorted, without duplicates. Boxes with non-finite corners, or spanning
    /// an excessive number of cells, return every entry.
    pub fn query(&self, min: [f64; D], max: [f64; D]) -> Vec<usize> {
        let finite = min.iter().chain(max.iter()).all(|v| v.is_finite());
        if !finite {
            return (0..self.len).collect();
        }
        let lo = min.map(|v| self.cell_of(v));
        let hi = max.map(|v| self.cell_of(v));
        let span = lo
            .iter()
            .zip(hi.iter())
            .map(|(l, h)| (h - l + 1).max(0) as usize)
            .try_fold(1usize, |acc, n| acc.checked_mul(n));
        if span.is_none_or(|n| n > MAX_QUERY_CELLS) {
            return (0..self.len).collect();
        }

        let mut found = Vec::new();
        for_each_cell(lo, hi, |key| {
            if let Some(indices) = self.cells.get(&key) {
                found.extend_from_slice(indices);
            }
        });
        found.sort_unstable();
        found.dedup();
        found
    }

    fn cell_of(&self, v: f64) -> i64 {
        (v / self.cell_size).floor() as i64
    }
}

/// Visit every integer key in the inclusive box `[lo, hi]`.
fn for_each_cell<const D: usize>(lo: [i64; D], hi: [i64; D], mut visit: impl FnMut([i64; D])) {
    if D == 0 || lo.iter().zip(hi.iter()).any(|(l, h)| l > h) {
        return;
    }
    let mut key = lo;
    loop {
        visit(key);
        let mut axis = 0;
        loop {
            if axis == D {
                return;
            }
            if key[axis] < hi[axis] {
                key[axis] += 1;
                break;
            }
            key[axis] = lo[axis];
            axis += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbours_found() {
        let mut grid = SpatialGrid::<2>::new(1.0);
        grid.insert(0, [0.2, 0.2], [0.8, 0.8], 0.25);
        grid.insert(1, [5.0, 5.0], [5.5, 5.5], 0.25);

        // Candidate box 0.2 away from entry 0.
        assert_eq!(grid.query([1.0, 0.2], [1.4, 0.6]), vec![0]);
        assert_eq!(grid.query([5.6, 5.6], [5.9, 5.9]), vec![1]);
        assert!(grid.query([3.0, 3.0], [3.2, 3.2]).is_empty());
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn test_query_deduplicates() {
        let mut grid = SpatialGrid::<2>::new(0.5);
        grid.insert(7, [0.0, 0.0], [2.0, 2.0], 0.0);
        assert_eq!(grid.query([0.1, 0.1], [1.9, 1.9]), vec![7]);
        assert!(grid.occupied_cells() >= 16);
    }

    #[test]
    fn test_negative_coordinates() {
        let mut grid = SpatialGrid::<2>::new(1.0);
        grid.insert(0, [-0.5, -0.5], [-0.1, -0.1], 0.0);
        assert_eq!(grid.query([-0.3, -0.3], [-0.2, -0.2]), vec![0]);
        assert!(grid.query([0.5, 0.5], [0.6, 0.6]).is_empty());
    }

    #[test]
    fn test_non_finite_query_returns_everything() {
        let mut grid = SpatialGrid::<2>::new(1.0);
        grid.insert(0, [0.0, 0.0], [0.1, 0.1], 0.0);
        grid.insert(1, [9.0, 9.0], [9.1, 9.1], 0.0);
        assert_eq!(grid.query([f64::NAN, 0.0], [1.0, 1.0]), vec![0, 1]);
        assert_eq!(grid.query([-1e9, -1e9], [1e9, 1e9]), vec![0, 1]);
    }

    #[test]
    fn test_three_dimensions() {
        let mut grid = SpatialGrid::<3>::new(1.0);
        grid.insert(0, [0.0, 0.0, 0.0], [0.5, 0.5, 0.5], 0.1);
        grid.insert(1, [0.0, 0.0, 4.0], [0.5, 0.5, 4.5], 0.1);
        assert_eq!(grid.query([0.55, 0.0, 0.0], [0.9, 0.5, 0.5]), vec![0]);
        assert_eq!(grid.query([0.0, 0.0, 4.6], [0.2, 0.2, 4.9]), vec![1]);
    }

    #[test]
    fn test_invalid_cell_size_falls_back() {
        assert_eq!(SpatialGrid::<2>::new(0.0).cell_size(), 1.0);
        assert_eq!(SpatialGrid::<2>::new(f64::NAN).cell_size(), 1.0);
    }
}
