// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A flat, arena-backed two-dimensional map.
//!
//! One storage type serves every intermediate product of the carve: a
//! plain `u64` per cell for the energy map, or a cost-plus-backpointer
//! cell for the dynamic-programming table.  Flat storage with computed
//! offsets keeps the hot row scans cache-friendly.

use std::ops::{Index, IndexMut};

#[derive(Debug)]
pub struct TwoDimensionalMap<P: Default + Copy> {
    pub width: usize,
    pub height: usize,
    cells: Vec<P>,
}

impl<P: Default + Copy> TwoDimensionalMap<P> {
    pub fn new(width: usize, height: usize) -> Self {
        TwoDimensionalMap {
            width,
            height,
            cells: vec![P::default(); width * height],
        }
    }

    /// Wrap a pre-filled cell vector; length must be `width * height`.
    pub fn from_raw(width: usize, height: usize, cells: Vec<P>) -> Self {
        assert_eq!(cells.len(), width * height);
        TwoDimensionalMap {
            width,
            height,
            cells,
        }
    }

    // All index math funnels through here.  Rows are contiguous.
    #[inline]
    fn cell_index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    pub fn as_slice(&self) -> &[P] {
        &self.cells
    }

    pub fn as_mut_slice(&mut self) -> &mut [P] {
        &mut self.cells
    }

    /// Iterate over whole rows mutably; each item is one `width`-long
    /// contiguous row.
    pub fn rows_mut(&mut self) -> std::slice::ChunksMut<'_, P> {
        self.cells.chunks_mut(self.width)
    }
}

impl<P: Default + Copy> Index<(usize, usize)> for TwoDimensionalMap<P> {
    type Output = P;

    fn index(&self, (x, y): (usize, usize)) -> &P {
        let index = self.cell_index(x, y);
        &self.cells[index]
    }
}

impl<P: Default + Copy> IndexMut<(usize, usize)> for TwoDimensionalMap<P> {
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut P {
        let index = self.cell_index(x, y);
        &mut self.cells[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addressing_is_row_major() {
        let mut map: TwoDimensionalMap<u64> = TwoDimensionalMap::new(3, 2);
        map[(2, 0)] = 5;
        map[(0, 1)] = 7;
        assert_eq!(map.as_slice(), &[0, 0, 5, 7, 0, 0]);
    }

    #[test]
    fn rows_are_contiguous() {
        let mut map: TwoDimensionalMap<u64> = TwoDimensionalMap::from_raw(2, 2, vec![1, 2, 3, 4]);
        let rows: Vec<Vec<u64>> = map.rows_mut().map(|r| r.to_vec()).collect();
        assert_eq!(rows, vec![vec![1, 2], vec![3, 4]]);
    }
}
