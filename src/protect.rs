// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Protected regions.
//!
//! A region detector (a face detector, typically) hands back
//! rectangles that must survive carving.  Before each seam search the
//! energy inside those rectangles is raised to `max(energy) * factor`,
//! which keeps seams out of them whenever a way around exists while
//! leaving every cost finite.

use crate::twodmap::EnergyMap;
use image::RgbImage;
use std::str::FromStr;

/// How much more than the hottest pixel a protected pixel costs.
pub const DEFAULT_PROTECTION_FACTOR: f64 = 10.0;

/// An axis-aligned rectangle in current-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectionRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ProtectionRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        ProtectionRegion {
            x,
            y,
            width,
            height,
        }
    }
}

impl FromStr for ProtectionRegion {
    type Err = String;

    /// Parses `x,y,width,height`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid region '{}': {}", s, e))?;
        match parts.as_slice() {
            [x, y, w, h] => Ok(ProtectionRegion::new(*x, *y, *w, *h)),
            _ => Err(format!(
                "invalid region '{}': expected x,y,width,height",
                s
            )),
        }
    }
}

/// The external collaborator that finds what to protect.  It is called
/// once per carving iteration, synchronously, with the image as it
/// stands at that moment.
pub trait RegionDetector {
    fn detect(&self, image: &RgbImage) -> Vec<ProtectionRegion>;
}

impl<F> RegionDetector for F
where
    F: Fn(&RgbImage) -> Vec<ProtectionRegion>,
{
    fn detect(&self, image: &RgbImage) -> Vec<ProtectionRegion> {
        self(image)
    }
}

/// A detector that always reports the same rectangles.
#[derive(Debug, Clone, Default)]
pub struct StaticRegions(pub Vec<ProtectionRegion>);

impl RegionDetector for StaticRegions {
    fn detect(&self, _image: &RgbImage) -> Vec<ProtectionRegion> {
        self.0.clone()
    }
}

/// Raise every cell covered by `regions` to `max(energy) * factor`.
/// Rectangles are clipped to the map; ones entirely outside it are
/// ignored.
pub fn protect_regions(energy: &mut EnergyMap, regions: &[ProtectionRegion], factor: f64) {
    if regions.is_empty() {
        return;
    }
    let protected = energy.max_value() * factor;
    let (width, height) = energy.dimensions();
    for region in regions {
        let x_end = region.x.saturating_add(region.width).min(width);
        let y_end = region.y.saturating_add(region.height).min(height);
        for y in region.y.min(y_end)..y_end {
            for cell in &mut energy.row_mut(y)[region.x.min(x_end) as usize..x_end as usize] {
                *cell = protected;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seamfinder::{DynamicProgramming, SeamStrategy};

    fn ramp(width: u32, height: u32) -> EnergyMap {
        let data = (0..width * height).map(|i| f64::from(i % width)).collect();
        EnergyMap::from_vec(width, height, data).unwrap()
    }

    #[test]
    fn covered_cells_cost_max_times_factor() {
        let mut energy = ramp(4, 3);
        protect_regions(&mut energy, &[ProtectionRegion::new(0, 1, 2, 1)], 10.0);
        assert_eq!(energy.row(0), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(energy.row(1), &[30.0, 30.0, 2.0, 3.0]);
        assert_eq!(energy.row(2), &[0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn regions_are_clipped_to_the_map() {
        let mut energy = ramp(3, 3);
        protect_regions(
            &mut energy,
            &[
                ProtectionRegion::new(2, 2, 50, 50),
                ProtectionRegion::new(9, 9, 1, 1),
            ],
            2.0,
        );
        assert_eq!(energy[(2, 2)], 4.0);
        assert_eq!(energy[(1, 2)], 1.0);
    }

    #[test]
    fn seams_steer_around_protection() {
        let mut energy = ramp(4, 4);
        // Column 0 is the cheapest; protect it.
        protect_regions(&mut energy, &[ProtectionRegion::new(0, 0, 1, 4)], 10.0);
        let seam = DynamicProgramming.find(&energy).unwrap();
        assert!(seam.iter().all(|&x| x != 0));
    }

    #[test]
    fn protecting_everything_stays_finite() {
        let mut energy = ramp(5, 4);
        protect_regions(&mut energy, &[ProtectionRegion::new(0, 0, 5, 4)], 10.0);
        assert!(energy.is_finite());
        let seam = DynamicProgramming.find(&energy).unwrap();
        assert!(seam.validate(5, 4).is_ok());
    }

    #[test]
    fn parses_from_the_command_line_form() {
        assert_eq!(
            "4, 5,6,7".parse::<ProtectionRegion>(),
            Ok(ProtectionRegion::new(4, 5, 6, 7))
        );
        assert!("4,5,6".parse::<ProtectionRegion>().is_err());
        assert!("a,b,c,d".parse::<ProtectionRegion>().is_err());
    }

    #[test]
    fn closures_are_detectors() {
        let detector = |image: &RgbImage| vec![ProtectionRegion::new(0, 0, image.width(), 1)];
        let image = RgbImage::new(3, 2);
        assert_eq!(detector.detect(&image), vec![ProtectionRegion::new(0, 0, 3, 1)]);
    }
}
