// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Image dimensional flipper
//!
//! Swap every x with its y.  A horizontal seam in an image is a
//! vertical seam in its transpose, so carving height is: flip, carve
//! width, flip back.  The flip is its own inverse.

use crate::protect::ProtectionRegion;
use image::{ImageBuffer, RgbImage};

/// The transpose of `image`: a `w`×`h` image becomes `h`×`w`.
pub fn flip(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    ImageBuffer::from_fn(height, width, |x, y| *image.get_pixel(y, x))
}

/// The same rectangle, seen in the transposed image.
pub fn flip_region(region: &ProtectionRegion) -> ProtectionRegion {
    ProtectionRegion {
        x: region.y,
        y: region.x,
        width: region.height,
        height: region.width,
    }
}
