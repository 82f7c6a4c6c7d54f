// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A row-major two-dimensional grid addressed by `(x, y)`.

use crate::error::CarveError;
use num_traits::Float;
use std::ops::{Index, IndexMut};

/// An addressable two-dimensional field holding one value per pixel:
/// the energy of each pixel for an energy map, or the accumulated
/// cost of the cheapest path to each pixel for the seam search.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoDimensionalMap<P> {
    width: u32,
    height: u32,
    data: Vec<P>,
}

/// One importance score per pixel, higher means keep.
pub type EnergyMap = TwoDimensionalMap<f64>;

impl<P: Default + Copy> TwoDimensionalMap<P> {
    /// A new map with every cell set to the content type's default.
    pub fn new(width: u32, height: u32) -> Self {
        TwoDimensionalMap {
            width,
            height,
            data: vec![P::default(); width as usize * height as usize],
        }
    }
}

impl<P> TwoDimensionalMap<P> {
    /// Wrap an existing row-major buffer.  The buffer must hold exactly
    /// `width * height` values.
    pub fn from_vec(width: u32, height: u32, data: Vec<P>) -> Result<Self, CarveError> {
        if data.len() != width as usize * height as usize {
            let found_height = if width == 0 {
                0
            } else {
                (data.len() / width as usize) as u32
            };
            return Err(CarveError::InvalidEnergyShape {
                width,
                height,
                found_width: width,
                found_height,
            });
        }
        Ok(TwoDimensionalMap {
            width,
            height,
            data,
        })
    }

    /// Build a map from nested rows.  Every row must have the same
    /// length.
    pub fn from_rows<R: AsRef<[P]>>(rows: &[R]) -> Result<Self, CarveError>
    where
        P: Copy,
    {
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.as_ref().len()) as u32;
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for row in rows {
            let row = row.as_ref();
            if row.len() as u32 != width {
                return Err(CarveError::InvalidEnergyShape {
                    width,
                    height,
                    found_width: row.len() as u32,
                    found_height: height,
                });
            }
            data.extend_from_slice(row);
        }
        Ok(TwoDimensionalMap {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True if the map has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fail with `InvalidEnergyShape` unless the map is exactly
    /// `width` by `height`.
    pub fn expect_dimensions(&self, width: u32, height: u32) -> Result<(), CarveError> {
        if (self.width, self.height) != (width, height) {
            return Err(CarveError::InvalidEnergyShape {
                width,
                height,
                found_width: self.width,
                found_height: self.height,
            });
        }
        Ok(())
    }

    // Absolutely, the number one name of this game is keep the index
    // math in a singular location and never, ever mess with it.
    fn get_index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// A single row as a slice.
    pub fn row(&self, y: u32) -> &[P] {
        let start = self.get_index(0, y);
        &self.data[start..start + self.width as usize]
    }

    /// A single row as a mutable slice.
    pub fn row_mut(&mut self, y: u32) -> &mut [P] {
        let start = self.get_index(0, y);
        let width = self.width as usize;
        &mut self.data[start..start + width]
    }

    /// Row `y - 1` for reading alongside row `y` for writing, split
    /// out of the one buffer.  `y` must be at least 1.
    pub fn row_pair_mut(&mut self, y: u32) -> (&[P], &mut [P]) {
        let start = self.get_index(0, y);
        let width = self.width as usize;
        let (before, rest) = self.data.split_at_mut(start);
        (&before[start - width..], &mut rest[..width])
    }

    /// Every cell, row-major.
    pub fn as_slice(&self) -> &[P] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<P> {
        self.data
    }
}

impl<P: Float> TwoDimensionalMap<P> {
    /// The largest value in the map, or zero for an empty map.
    pub fn max_value(&self) -> P {
        self.data
            .iter()
            .copied()
            .fold(P::zero(), |acc, v| if v > acc { v } else { acc })
    }

    /// True when no cell is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

impl<P> Index<(u32, u32)> for TwoDimensionalMap<P> {
    type Output = P;

    /// A convenience addressing mode for getting values.
    fn index(&self, (x, y): (u32, u32)) -> &P {
        let index = self.get_index(x, y);
        &self.data[index]
    }
}

impl<P> IndexMut<(u32, u32)> for TwoDimensionalMap<P> {
    /// A convenience addressing mode for setting values.
    fn index_mut(&mut self, (x, y): (u32, u32)) -> &mut P {
        let index = self.get_index(x, y);
        &mut self.data[index]
    }
}
