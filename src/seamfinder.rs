// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Find the cheapest seam through an energy map.
//!
//! A seam is a top-to-bottom path with exactly one pixel per row, where
//! the column of each pixel differs from the one above it by at most
//! one.  The search is the classic forward pass plus backtrack: fill a
//! cumulative map with the cheapest way to reach every pixel from the
//! top row, then walk back up from the cheapest pixel in the bottom
//! row.
//!
//! Ties always resolve to the lowest column, both when choosing where
//! the seam ends and when walking back up, so a given energy map
//! always yields the same seam.

use crate::cq;
use crate::error::CarveError;
use crate::twodmap::{EnergyMap, TwoDimensionalMap};
use itertools::Itertools;
use std::ops::Deref;

/// The column index of the seam in every row, top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seam(Vec<u32>);

impl Seam {
    pub fn new(columns: Vec<u32>) -> Self {
        Seam(columns)
    }

    pub fn into_inner(self) -> Vec<u32> {
        self.0
    }

    /// Check that the seam has one entry per row and stays inside
    /// `[0, width)`.  This is all the seam transforms need.
    pub fn check_bounds(&self, width: u32, height: u32) -> Result<(), CarveError> {
        if self.0.len() != height as usize {
            return Err(CarveError::seam(format!(
                "seam has {} rows, image has {}",
                self.0.len(),
                height
            )));
        }
        if let Some((y, x)) = self.0.iter().enumerate().find(|(_, x)| **x >= width) {
            return Err(CarveError::seam(format!(
                "column {} in row {} is outside an image {} pixels wide",
                x, y, width
            )));
        }
        Ok(())
    }

    /// Full check: bounds, plus every step between rows moves at most
    /// one column.
    pub fn validate(&self, width: u32, height: u32) -> Result<(), CarveError> {
        self.check_bounds(width, height)?;
        if let Some((y, (a, b))) = self
            .0
            .iter()
            .tuple_windows()
            .enumerate()
            .find(|(_, (a, b))| (**a as i64 - **b as i64).abs() > 1)
        {
            return Err(CarveError::seam(format!(
                "seam jumps from column {} to {} between rows {} and {}",
                a,
                b,
                y,
                y + 1
            )));
        }
        Ok(())
    }

    /// After a column has been inserted at `inserted[y]` in every row,
    /// move this seam so it still names the same pixels: every entry
    /// at or right of the insertion slides one column right.
    pub fn shift_past(&mut self, inserted: &Seam) {
        for (x, &at) in self.0.iter_mut().zip(inserted.0.iter()) {
            if *x >= at {
                *x += 1;
            }
        }
    }
}

impl Deref for Seam {
    type Target = [u32];

    fn deref(&self) -> &[u32] {
        &self.0
    }
}

impl From<Vec<u32>> for Seam {
    fn from(columns: Vec<u32>) -> Self {
        Seam(columns)
    }
}

/// Anything that can pick a seam out of an energy map.
pub trait SeamStrategy: Send + Sync {
    /// Return the seam to carve next.
    fn find(&self, energy: &EnergyMap) -> Result<Seam, CarveError>;
}

/// The minimum-total-energy seam, found by dynamic programming.
#[derive(Debug, Default, Clone, Copy)]
pub struct DynamicProgramming;

impl SeamStrategy for DynamicProgramming {
    fn find(&self, energy: &EnergyMap) -> Result<Seam, CarveError> {
        if energy.is_empty() {
            return Err(CarveError::InvalidEnergyShape {
                width: 1,
                height: 1,
                found_width: energy.width(),
                found_height: energy.height(),
            });
        }
        Ok(cumulative_to_seam(&cumulative_energy(energy)))
    }
}

// The cheapest of up to three candidates in `row` centred on `x`, and
// its column.  Off-map candidates cost infinity; ties prefer left,
// then middle, then right.
fn cheapest_parent(row: &[f64], x: usize) -> (usize, f64) {
    let last = row.len() - 1;
    let candidates = [
        cq!(x == 0, None, Some(x - 1)),
        Some(x),
        cq!(x == last, None, Some(x + 1)),
    ];
    candidates
        .iter()
        .map(|c| c.map_or((x, std::f64::INFINITY), |c| (c, row[c])))
        .fold((x, std::f64::INFINITY), |best, cand| {
            cq!(cand.1 < best.1, cand, best)
        })
}

/// Fill the cumulative map: the first row is the energy itself, every
/// later cell is its own energy plus the cheapest of its (up to) three
/// parents.  Each row depends on the finished row above it, so rows go
/// strictly in order.
pub fn cumulative_energy(energy: &EnergyMap) -> TwoDimensionalMap<f64> {
    let (width, height) = energy.dimensions();
    let mut cumulative: TwoDimensionalMap<f64> = TwoDimensionalMap::new(width, height);
    if energy.is_empty() {
        return cumulative;
    }

    cumulative.row_mut(0).copy_from_slice(energy.row(0));
    for y in 1..height {
        let own = energy.row(y);
        let (above, row) = cumulative.row_pair_mut(y);
        for (x, cell) in row.iter_mut().enumerate() {
            *cell = own[x] + cheapest_parent(above, x).1;
        }
    }
    cumulative
}

// Working backwards from the cheapest cell in the bottom row, follow
// the cheapest parent up to the top, then reverse.
fn cumulative_to_seam(cumulative: &TwoDimensionalMap<f64>) -> Seam {
    let height = cumulative.height();
    let mut seam_col = cumulative
        .row(height - 1)
        .iter()
        .position_min_by(|a, b| a.total_cmp(b))
        .unwrap_or(0);

    let mut columns = Vec::with_capacity(height as usize);
    columns.push(seam_col as u32);
    for y in (0..height - 1).rev() {
        seam_col = cheapest_parent(cumulative.row(y), seam_col).0;
        columns.push(seam_col as u32);
    }
    columns.reverse();
    Seam(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn energy(rows: &[&[f64]]) -> EnergyMap {
        EnergyMap::from_rows(rows).unwrap()
    }

    fn find(rows: &[&[f64]]) -> Vec<u32> {
        DynamicProgramming.find(&energy(rows)).unwrap().into_inner()
    }

    #[test]
    fn follows_the_cheap_valley() {
        let seam = find(&[
            &[9.0, 9.0, 0.0, 9.0, 9.0],
            &[9.0, 1.0, 9.0, 8.0, 9.0],
            &[9.0, 9.0, 9.0, 9.0, 0.0],
            &[9.0, 9.0, 9.0, 0.0, 9.0],
        ]);
        assert_eq!(seam, vec![2, 3, 4, 3]);
    }

    #[test]
    fn isolated_minimum_at_the_centre() {
        // Every bottom-row total is 19, so the leftmost column wins and
        // the backtrack still threads through the cheap centre pixel.
        let seam = find(&[&[9.0, 9.0, 9.0], &[9.0, 1.0, 9.0], &[9.0, 9.0, 9.0]]);
        assert_eq!(seam, vec![0, 1, 0]);
    }

    #[test]
    fn strictly_cheapest_column_is_taken_whole() {
        let seam = find(&[&[9.0, 1.0, 9.0], &[9.0, 1.0, 9.0], &[9.0, 1.0, 9.0]]);
        assert_eq!(seam, vec![1, 1, 1]);
    }

    #[test]
    fn ties_resolve_to_the_lowest_column() {
        let seam = find(&[&[2.0, 2.0, 2.0, 2.0], &[2.0, 2.0, 2.0, 2.0]]);
        assert_eq!(seam, vec![0, 0]);
    }

    #[test]
    fn single_column_seam_is_all_zeros() {
        let seam = find(&[&[3.0], &[1.0], &[7.0], &[0.0]]);
        assert_eq!(seam, vec![0, 0, 0, 0]);
    }

    #[test]
    fn single_row_picks_the_minimum() {
        assert_eq!(find(&[&[4.0, 3.0, 1.0, 1.0, 5.0]]), vec![2]);
    }

    #[test]
    fn seams_are_connected_and_in_bounds() {
        let (width, height) = (13u32, 11u32);
        let data = (0..width * height)
            .map(|i| f64::from((i * 7919) % 97))
            .collect();
        let map = EnergyMap::from_vec(width, height, data).unwrap();
        let seam = DynamicProgramming.find(&map).unwrap();
        assert_eq!(seam.len(), height as usize);
        assert!(seam.validate(width, height).is_ok());
    }

    #[test]
    fn cumulative_map_matches_the_recurrence() {
        let map = energy(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        let cumulative = cumulative_energy(&map);
        assert_eq!(cumulative.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(cumulative.row(1), &[5.0, 6.0, 8.0]);
    }

    #[test]
    fn empty_map_is_rejected() {
        let map = EnergyMap::new(0, 0);
        assert!(DynamicProgramming.find(&map).is_err());
    }

    #[test]
    fn validation_catches_broken_seams() {
        assert!(Seam::new(vec![0, 2]).validate(3, 2).is_err());
        assert!(Seam::new(vec![0, 3]).validate(3, 2).is_err());
        assert!(Seam::new(vec![0]).validate(3, 2).is_err());
        assert!(Seam::new(vec![1, 2]).validate(3, 2).is_ok());
    }

    #[test]
    fn shifting_moves_entries_at_or_right_of_the_insertion() {
        let mut pending = Seam::new(vec![1, 2, 3]);
        pending.shift_past(&Seam::new(vec![2, 2, 2]));
        assert_eq!(pending.into_inner(), vec![1, 3, 4]);
    }
}
