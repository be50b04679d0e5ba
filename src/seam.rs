// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Minimum-cost vertical seam search.
//!
//! The classic dynamic program over the energy map: the cost of a cell
//! is its own energy plus the cheapest of its up-to-three upper
//! neighbors, rows filled strictly top to bottom.  Out-of-range
//! neighbor columns are simply absent from the candidate set.
//!
//! Ties are resolved deterministically so that two runs over the same
//! image produce bit-identical seams: among equal-cost predecessors the
//! straight-down one wins, then the left, then the right; among
//! equal-cost bottom-row cells the lowest column wins.

use itertools::Itertools;

use crate::twodmap::TwoDimensionalMap;

/// A connected, one-pixel-wide top-to-bottom path: one column index
/// per row, adjacent entries differing by at most one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seam {
    columns: Vec<usize>,
}

impl Seam {
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Every entry in `[0, width)` and 8-connected row to row.
    pub fn is_valid(&self, width: usize) -> bool {
        self.columns.iter().all(|&x| x < width)
            && self
                .columns
                .windows(2)
                .all(|w| w[0].abs_diff(w[1]) <= 1)
    }
}

#[derive(Default, Debug, Copy, Clone)]
struct CostAndParent {
    cost: u64,
    parent: usize,
}

/// Given an energy map, return the minimum-cost vertical seam: the
/// list of x-coordinates that, paired with the range `0..height`, give
/// the coordinates of each pixel to remove.
pub fn find_vertical_seam(energy: &TwoDimensionalMap<u64>) -> Seam {
    let (width, height) = (energy.width, energy.height);

    // A map with no rows or no columns holds no path at all.  Buffers
    // reject degenerate extents, but the map type itself does not.
    if width == 0 || height == 0 {
        return Seam { columns: Vec::new() };
    }

    let mut table: TwoDimensionalMap<CostAndParent> = TwoDimensionalMap::new(width, height);

    // The top row's cost is its own energy; each cell is its own parent.
    for x in 0..width {
        table[(x, 0)] = CostAndParent {
            cost: energy[(x, 0)],
            parent: x,
        };
    }

    for y in 1..height {
        for x in 0..width {
            // Candidate order encodes the tie-break: straight down
            // first, then left, then right, each displacing the
            // incumbent only on a strictly lower cost.
            let mut best = CostAndParent {
                cost: table[(x, y - 1)].cost,
                parent: x,
            };
            if x > 0 && table[(x - 1, y - 1)].cost < best.cost {
                best = CostAndParent {
                    cost: table[(x - 1, y - 1)].cost,
                    parent: x - 1,
                };
            }
            if x + 1 < width && table[(x + 1, y - 1)].cost < best.cost {
                best = CostAndParent {
                    cost: table[(x + 1, y - 1)].cost,
                    parent: x + 1,
                };
            }
            table[(x, y)] = CostAndParent {
                cost: energy[(x, y)] + best.cost,
                parent: best.parent,
            };
        }
    }

    // Argmin of the bottom row; position_min_by_key keeps the first of
    // several equal minima, which is the lowest column.  The range is
    // non-empty: zero widths bailed out above.
    let mut col = (0..width)
        .position_min_by_key(|&x| table[(x, height - 1)].cost)
        .expect("width checked above");

    // Retrace the chosen parents upward, then flip into top-down order.
    let mut columns = Vec::with_capacity(height);
    for y in (0..height).rev() {
        columns.push(col);
        col = table[(col, y)].parent;
    }
    columns.reverse();

    let seam = Seam { columns };
    debug_assert!(seam.is_valid(width));
    seam
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENERGY_DATA: [u64; 20] = [9, 9, 0, 9, 9, 9, 1, 9, 8, 9, 9, 9, 9, 9, 0, 9, 9, 9, 0, 9];

    #[test]
    fn energy_grid_to_vertical_seam() {
        let energies = TwoDimensionalMap::from_raw(5, 4, ENERGY_DATA.to_vec());
        let expected = [2, 3, 4, 3];
        assert_eq!(find_vertical_seam(&energies).columns(), &expected);
    }

    #[test]
    fn uniform_energy_yields_a_straight_left_seam() {
        // Everything ties: the bottom-row argmin takes column 0 and
        // every backtrack step prefers straight down.
        let energies = TwoDimensionalMap::from_raw(4, 3, vec![5; 12]);
        assert_eq!(find_vertical_seam(&energies).columns(), &[0, 0, 0]);
    }

    #[test]
    fn left_wins_over_right_on_ties() {
        // From (1,1) both diagonal parents cost 0; left must win.
        let energies = TwoDimensionalMap::from_raw(3, 2, vec![0, 5, 0, 9, 0, 9]);
        assert_eq!(find_vertical_seam(&energies).columns(), &[0, 1]);
    }

    #[test]
    fn seams_stay_eight_connected() {
        // A cheap column on each side; the seam may not teleport
        // between them.
        let energies = TwoDimensionalMap::from_raw(
            5,
            4,
            vec![0, 9, 9, 9, 0, 9, 0, 9, 0, 9, 0, 9, 9, 9, 0, 9, 0, 9, 0, 9],
        );
        let seam = find_vertical_seam(&energies);
        assert!(seam.is_valid(5));
        assert_eq!(seam.len(), 4);
    }

    #[test]
    fn degenerate_maps_yield_an_empty_seam() {
        let no_rows: TwoDimensionalMap<u64> = TwoDimensionalMap::new(5, 0);
        assert!(find_vertical_seam(&no_rows).is_empty());
        let no_columns: TwoDimensionalMap<u64> = TwoDimensionalMap::new(0, 4);
        assert!(find_vertical_seam(&no_columns).is_empty());
    }

    #[test]
    fn seam_search_is_deterministic() {
        let energies = TwoDimensionalMap::from_raw(5, 4, ENERGY_DATA.to_vec());
        let first = find_vertical_seam(&energies);
        let second = find_vertical_seam(&energies);
        assert_eq!(first, second);
    }
}
