// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Content-aware image resizing by seam carving.
//!
//! Instead of scaling every pixel uniformly, seam carving removes (or
//! duplicates) the connected top-to-bottom paths of pixels that matter
//! least, leaving the interesting parts of the picture alone.
//!
//! ```no_run
//! use seamcarve::{CarvableImage, Energy, DynamicProgramming};
//!
//! # fn main() -> Result<(), failure::Error> {
//! let image = image::open("castle.png")?.to_rgb8();
//! let mut carver = CarvableImage::with_strategies(image, Energy::Sobel, DynamicProgramming)?;
//! carver.reduce(128)?;
//! carver.into_image().save("castle-narrow.png")?;
//! # Ok(())
//! # }
//! ```

mod ternary;

pub mod aspect;
pub mod energy;
pub mod error;
pub mod flipper;
pub mod protect;
pub mod seamcarver;
pub mod seamfinder;
pub mod transform;
pub mod twodmap;

pub use aspect::{seams_for_aspect_ratio, AspectRatio};
pub use energy::{Energy, EnergyStrategy};
pub use error::CarveError;
pub use protect::{ProtectionRegion, RegionDetector, StaticRegions, DEFAULT_PROTECTION_FACTOR};
pub use seamcarver::{CancellationToken, CarvableImage, Carve, Progress};
pub use seamfinder::{DynamicProgramming, Seam, SeamStrategy};
pub use transform::{insert_vertical_seam, remove_vertical_seam};
pub use twodmap::{EnergyMap, TwoDimensionalMap};
