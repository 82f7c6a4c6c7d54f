// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Cut a seam out of an image, or stitch a new one in.
//!
//! Both transforms build a fresh buffer; the source image is never
//! touched.

use crate::cq;
use crate::error::CarveError;
use crate::seamfinder::Seam;
use image::{ImageBuffer, Rgb, RgbImage};

/// Remove one pixel per row at the seam's column, shifting everything
/// to its right one place left.  The result is one column narrower.
pub fn remove_vertical_seam(image: &RgbImage, seam: &Seam) -> Result<RgbImage, CarveError> {
    let (width, height) = image.dimensions();
    seam.check_bounds(width, height)?;
    if width < 2 {
        return Err(CarveError::RequestedSeamsExceedsDimension {
            requested: 1,
            dimension: width,
        });
    }

    Ok(ImageBuffer::from_fn(width - 1, height, |x, y| {
        let cut = seam[y as usize];
        *image.get_pixel(cq!(x < cut, x, x + 1), y)
    }))
}

/// Insert one pixel per row at the seam's column.  The new pixel is the
/// floor average of the seam pixel and its right-hand neighbour, and
/// it lands in front of the seam pixel; a seam on the last column has
/// no neighbour, so its pixel is simply doubled.  The result is one
/// column wider.
pub fn insert_vertical_seam(image: &RgbImage, seam: &Seam) -> Result<RgbImage, CarveError> {
    let (width, height) = image.dimensions();
    seam.check_bounds(width, height)?;

    Ok(ImageBuffer::from_fn(width + 1, height, |x, y| {
        let at = seam[y as usize];
        if x < at {
            *image.get_pixel(x, y)
        } else if x == at {
            let here = image.get_pixel(at, y);
            cq!(
                at + 1 < width,
                average(here, image.get_pixel(at + 1, y)),
                *here
            )
        } else {
            *image.get_pixel(x - 1, y)
        }
    }))
}

fn average(a: &Rgb<u8>, b: &Rgb<u8>) -> Rgb<u8> {
    let mut mixed = [0u8; 3];
    for (m, (&ca, &cb)) in mixed.iter_mut().zip(a.0.iter().zip(b.0.iter())) {
        *m = ((u16::from(ca) + u16::from(cb)) / 2) as u8;
    }
    Rgb(mixed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_image(pixels: &[[u8; 3]]) -> RgbImage {
        ImageBuffer::from_fn(pixels.len() as u32, 1, |x, _| Rgb(pixels[x as usize]))
    }

    fn pixels(image: &RgbImage) -> Vec<[u8; 3]> {
        image.pixels().map(|p| p.0).collect()
    }

    #[test]
    fn removal_drops_exactly_the_seam_pixel() {
        let image: RgbImage =
            ImageBuffer::from_fn(4, 3, |x, y| Rgb([x as u8, y as u8, (10 * y + x) as u8]));
        let seam = Seam::new(vec![0, 1, 3]);
        let carved = remove_vertical_seam(&image, &seam).unwrap();
        assert_eq!(carved.dimensions(), (3, 3));
        let columns: Vec<Vec<u8>> = (0..3)
            .map(|y| (0..3).map(|x| carved.get_pixel(x, y).0[0]).collect())
            .collect();
        assert_eq!(columns, vec![vec![1, 2, 3], vec![0, 2, 3], vec![0, 1, 2]]);
    }

    #[test]
    fn removal_leaves_the_source_alone() {
        let image = row_image(&[[1, 1, 1], [2, 2, 2]]);
        let before = image.clone();
        let _ = remove_vertical_seam(&image, &Seam::new(vec![0])).unwrap();
        assert_eq!(image, before);
    }

    #[test]
    fn insertion_averages_with_the_right_neighbour() {
        let image = row_image(&[[10, 20, 30], [15, 25, 36], [200, 200, 200]]);
        let grown = insert_vertical_seam(&image, &Seam::new(vec![0])).unwrap();
        assert_eq!(
            pixels(&grown),
            vec![[12, 22, 33], [10, 20, 30], [15, 25, 36], [200, 200, 200]]
        );
    }

    #[test]
    fn insertion_on_the_last_column_duplicates() {
        let image = row_image(&[[1, 2, 3], [7, 8, 9]]);
        let grown = insert_vertical_seam(&image, &Seam::new(vec![1])).unwrap();
        assert_eq!(pixels(&grown), vec![[1, 2, 3], [7, 8, 9], [7, 8, 9]]);
    }

    #[test]
    fn shapes_change_by_one_column() {
        let image: RgbImage = ImageBuffer::from_pixel(5, 4, Rgb([3, 4, 5]));
        let seam = Seam::new(vec![2, 3, 4, 4]);
        assert_eq!(remove_vertical_seam(&image, &seam).unwrap().dimensions(), (4, 4));
        assert_eq!(insert_vertical_seam(&image, &seam).unwrap().dimensions(), (6, 4));
    }

    #[test]
    fn out_of_range_seam_is_an_invariant_violation() {
        let image: RgbImage = ImageBuffer::from_pixel(3, 2, Rgb([0, 0, 0]));
        for seam in [Seam::new(vec![0, 3]), Seam::new(vec![0])].iter() {
            match remove_vertical_seam(&image, seam) {
                Err(CarveError::SeamInvariantViolation(_)) => (),
                other => panic!("expected a seam violation, got {:?}", other),
            }
            assert!(insert_vertical_seam(&image, seam).is_err());
        }
    }

    #[test]
    fn cannot_remove_the_last_column() {
        let image: RgbImage = ImageBuffer::from_pixel(1, 2, Rgb([0, 0, 0]));
        assert_eq!(
            remove_vertical_seam(&image, &Seam::new(vec![0, 0])),
            Err(CarveError::RequestedSeamsExceedsDimension {
                requested: 1,
                dimension: 1
            })
        );
    }
}
