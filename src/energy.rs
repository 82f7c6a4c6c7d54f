// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calculate the energy of an image
//!
//! Given an image, calculate an energy map: one non-negative score per
//! pixel, higher meaning "more worth keeping".  Four calculators are
//! provided: a first-difference calculator, and the Sobel, Scharr and
//! Laplacian operators.  Every one of them works per channel and
//! averages the three channel responses.
//!
//! With the `threaded` feature the rows of the map are divided into
//! contiguous bands and each band is filled by its own worker.  Every
//! pixel's score depends only on the source image, so the bands never
//! need to talk to each other.

use crate::cq;
use crate::error::CarveError;
use crate::twodmap::EnergyMap;
use image::RgbImage;
use std::fmt;
use std::str::FromStr;

/// Anything that can score the pixels of an image.
pub trait EnergyStrategy: Send + Sync {
    /// Produce an energy map with exactly the dimensions of `image`.
    fn compute(&self, image: &RgbImage) -> Result<EnergyMap, CarveError>;
}

/// The built-in energy calculators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Energy {
    /// Sum of absolute differences against the pixel above and the
    /// pixel to the left.
    SquaredDifference,
    /// `|Gx| + |Gy|` of the 3×3 Sobel kernels.
    Sobel,
    /// `|Gx| + |Gy|` of the 3×3 Scharr kernels.
    Scharr,
    /// Absolute response of the 4-neighbour Laplacian.
    Laplacian,
}

impl Default for Energy {
    fn default() -> Self {
        Energy::SquaredDifference
    }
}

impl Energy {
    /// Every calculator's command-line name.
    pub const NAMES: [&'static str; 4] = ["squared-difference", "sobel", "scharr", "laplacian"];

    pub fn name(self) -> &'static str {
        match self {
            Energy::SquaredDifference => Self::NAMES[0],
            Energy::Sobel => Self::NAMES[1],
            Energy::Scharr => Self::NAMES[2],
            Energy::Laplacian => Self::NAMES[3],
        }
    }

    fn energy_at(self, image: &RgbImage, pt: (u32, u32)) -> f64 {
        match self {
            Energy::SquaredDifference => first_difference(image, pt),
            Energy::Sobel => gradient(image, pt, &SOBEL_X, &SOBEL_Y),
            Energy::Scharr => gradient(image, pt, &SCHARR_X, &SCHARR_Y),
            Energy::Laplacian => average(convolve(image, pt, &LAPLACIAN), f64::abs),
        }
    }
}

impl EnergyStrategy for Energy {
    fn compute(&self, image: &RgbImage) -> Result<EnergyMap, CarveError> {
        let strategy = *self;
        compute_map(image, |x, y| strategy.energy_at(image, (x, y)))
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Energy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "squared-difference" | "squared_diff" => Ok(Energy::SquaredDifference),
            "sobel" => Ok(Energy::Sobel),
            "scharr" => Ok(Energy::Scharr),
            "laplacian" => Ok(Energy::Laplacian),
            other => Err(format!(
                "unknown energy function '{}', expected one of: {}",
                other,
                Energy::NAMES.join(", ")
            )),
        }
    }
}

type Kernel3 = [[f64; 3]; 3];

const SOBEL_X: Kernel3 = [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]];
const SOBEL_Y: Kernel3 = [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]];

const SCHARR_X: Kernel3 = [[-3.0, 0.0, 3.0], [-10.0, 0.0, 10.0], [-3.0, 0.0, 3.0]];
const SCHARR_Y: Kernel3 = [[-3.0, -10.0, -3.0], [0.0, 0.0, 0.0], [3.0, 10.0, 3.0]];

const LAPLACIAN: Kernel3 = [[0.0, 1.0, 0.0], [1.0, -4.0, 1.0], [0.0, 1.0, 0.0]];

/// Reject anything the calculators cannot score.  `RgbImage` already
/// pins the channel count and sample type; what is left to check is
/// that there is at least one pixel and that the backing buffer is
/// exactly the size the dimensions claim.
pub(crate) fn validate_image(image: &RgbImage) -> Result<(), CarveError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(CarveError::shape(format!(
            "{}x{} image has no pixels",
            width, height
        )));
    }
    let expected = width as usize * height as usize * 3;
    if image.as_raw().len() != expected {
        return Err(CarveError::shape(format!(
            "{}x{}x3 image backed by {} samples",
            width,
            height,
            image.as_raw().len()
        )));
    }
    Ok(())
}

fn compute_map<F>(image: &RgbImage, energy_at: F) -> Result<EnergyMap, CarveError>
where
    F: Fn(u32, u32) -> f64 + Sync,
{
    validate_image(image)?;
    let (width, height) = image.dimensions();
    EnergyMap::from_vec(width, height, fill(width, height, energy_at)?)
}

#[cfg(not(feature = "threaded"))]
fn fill<F>(width: u32, height: u32, energy_at: F) -> Result<Vec<f64>, CarveError>
where
    F: Fn(u32, u32) -> f64 + Sync,
{
    use itertools::iproduct;

    Ok(iproduct!(0..height, 0..width)
        .map(|(y, x)| energy_at(x, y))
        .collect())
}

// Break the target into row bands with chunks_mut, hand each band to
// a worker, and re-derive the (x, y) address of every cell from its
// band's first row.
#[cfg(feature = "threaded")]
fn fill<F>(width: u32, height: u32, energy_at: F) -> Result<Vec<f64>, CarveError>
where
    F: Fn(u32, u32) -> f64 + Sync,
{
    let row_len = width as usize;
    let workers = num_cpus::get().max(1);
    let rows_per_band = ((height as usize + workers - 1) / workers).max(1);
    let mut target = vec![0.0; row_len * height as usize];
    let energy_at = &energy_at;

    crossbeam::scope(|scope| {
        for (band, cells) in target.chunks_mut(rows_per_band * row_len).enumerate() {
            scope.spawn(move |_| {
                let first_row = band * rows_per_band;
                for (i, cell) in cells.iter_mut().enumerate() {
                    let x = (i % row_len) as u32;
                    let y = (first_row + i / row_len) as u32;
                    *cell = energy_at(x, y);
                }
            });
        }
    })
    .map_err(|_| CarveError::WorkerPanicked)?;

    Ok(target)
}

// Neighbours that fall off the image are replaced by the pixel itself,
// so the border contributes nothing.
fn first_difference(image: &RgbImage, (x, y): (u32, u32)) -> f64 {
    let current = image.get_pixel(x, y).0;
    let up = image.get_pixel(x, cq!(y == 0, y, y - 1)).0;
    let left = image.get_pixel(cq!(x == 0, x, x - 1), y).0;

    let total: i32 = (0..3)
        .map(|c| {
            let v = i32::from(current[c]);
            (v - i32::from(up[c])).abs() + (v - i32::from(left[c])).abs()
        })
        .sum();
    f64::from(total) / 3.0
}

// Convolve one 3×3 kernel against every channel, clamping addresses at
// the image border.
fn convolve(image: &RgbImage, (x, y): (u32, u32), kernel: &Kernel3) -> [f64; 3] {
    let (width, height) = image.dimensions();
    let xs = [cq!(x == 0, 0, x - 1), x, cq!(x + 1 >= width, x, x + 1)];
    let ys = [cq!(y == 0, 0, y - 1), y, cq!(y + 1 >= height, y, y + 1)];

    let mut response = [0.0; 3];
    for (krow, &sy) in kernel.iter().zip(ys.iter()) {
        for (&k, &sx) in krow.iter().zip(xs.iter()) {
            if k == 0.0 {
                continue;
            }
            let p = image.get_pixel(sx, sy).0;
            for (r, &c) in response.iter_mut().zip(p.iter()) {
                *r += k * f64::from(c);
            }
        }
    }
    response
}

fn gradient(image: &RgbImage, pt: (u32, u32), kx: &Kernel3, ky: &Kernel3) -> f64 {
    let gx = convolve(image, pt, kx);
    let gy = convolve(image, pt, ky);
    (0..3).map(|c| gx[c].abs() + gy[c].abs()).sum::<f64>() / 3.0
}

fn average(response: [f64; 3], f: fn(f64) -> f64) -> f64 {
    response.iter().copied().map(f).sum::<f64>() / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn gray(width: u32, height: u32, values: &[u8]) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            let v = values[(y * width + x) as usize];
            Rgb([v, v, v])
        })
    }

    const ALL: [Energy; 4] = [
        Energy::SquaredDifference,
        Energy::Sobel,
        Energy::Scharr,
        Energy::Laplacian,
    ];

    #[test]
    fn every_strategy_preserves_dimensions() {
        let image = ImageBuffer::from_fn(7, 5, |x, y| Rgb([(x * 30) as u8, (y * 40) as u8, 9]));
        for strategy in ALL.iter() {
            let energy = strategy.compute(&image).unwrap();
            assert_eq!(energy.dimensions(), (7, 5), "{}", strategy);
            assert!(energy.as_slice().iter().all(|e| *e >= 0.0 && e.is_finite()));
        }
    }

    #[test]
    fn flat_image_has_no_energy() {
        let image = ImageBuffer::from_pixel(4, 4, Rgb([80u8, 120, 200]));
        for strategy in ALL.iter() {
            let energy = strategy.compute(&image).unwrap();
            assert_eq!(energy.max_value(), 0.0, "{}", strategy);
        }
    }

    #[test]
    fn first_difference_looks_up_and_left() {
        let image = gray(3, 1, &[0, 30, 90]);
        let energy = Energy::SquaredDifference.compute(&image).unwrap();
        assert_eq!(energy.as_slice(), &[0.0, 30.0, 60.0]);
    }

    #[test]
    fn channels_are_averaged() {
        let image: RgbImage = ImageBuffer::from_raw(2, 1, vec![0, 0, 0, 30, 0, 0]).unwrap();
        let energy = Energy::SquaredDifference.compute(&image).unwrap();
        assert_eq!(energy.as_slice(), &[0.0, 10.0]);
    }

    #[test]
    fn sobel_and_scharr_find_a_vertical_edge() {
        #[rustfmt::skip]
        let image = gray(4, 3, &[
            0, 0, 255, 255,
            0, 0, 255, 255,
            0, 0, 255, 255,
        ]);
        let sobel = Energy::Sobel.compute(&image).unwrap();
        assert_eq!(sobel.row(1), &[0.0, 1020.0, 1020.0, 0.0]);
        let scharr = Energy::Scharr.compute(&image).unwrap();
        assert_eq!(scharr.row(1), &[0.0, 4080.0, 4080.0, 0.0]);
    }

    #[test]
    fn laplacian_peaks_on_an_isolated_pixel() {
        #[rustfmt::skip]
        let image = gray(3, 3, &[
            0, 0, 0,
            0, 100, 0,
            0, 0, 0,
        ]);
        let energy = Energy::Laplacian.compute(&image).unwrap();
        assert_eq!(energy[(1, 1)], 400.0);
        assert_eq!(energy[(1, 0)], 100.0);
        assert_eq!(energy[(0, 0)], 0.0);
    }

    #[test]
    fn empty_image_is_rejected() {
        let image: RgbImage = ImageBuffer::new(0, 3);
        match Energy::Sobel.compute(&image) {
            Err(CarveError::InvalidImageShape(_)) => (),
            other => panic!("expected InvalidImageShape, got {:?}", other),
        }
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for strategy in ALL.iter() {
            assert_eq!(strategy.name().parse::<Energy>(), Ok(*strategy));
        }
        assert!("canny".parse::<Energy>().is_err());
    }

    #[cfg(feature = "threaded")]
    #[test]
    fn banded_fill_covers_uneven_rows() {
        let cells = fill(5, 13, |x, y| f64::from(y * 5 + x)).unwrap();
        let expected: Vec<f64> = (0..65).map(f64::from).collect();
        assert_eq!(cells, expected);
    }

    #[cfg(feature = "threaded")]
    #[test]
    fn banded_fill_matches_cell_by_cell() {
        use itertools::iproduct;

        let image = ImageBuffer::from_fn(9, 13, |x, y| {
            Rgb([(x * 29 + y * 7) as u8, (x * y) as u8, (200 - y * 11) as u8])
        });
        for strategy in ALL.iter() {
            let energy = strategy.compute(&image).unwrap();
            let expected: Vec<f64> = iproduct!(0..13, 0..9)
                .map(|(y, x)| strategy.energy_at(&image, (x, y)))
                .collect();
            assert_eq!(energy.as_slice(), &expected[..], "{}", strategy);
        }
    }

    #[cfg(feature = "threaded")]
    #[test]
    fn worker_panic_is_reported() {
        let result = fill(3, 9, |_, y| cq!(y == 8, panic!("bad row"), 0.0));
        assert_eq!(result, Err(CarveError::WorkerPanicked));
    }
}
