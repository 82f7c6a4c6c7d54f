// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Seamcarve - The main routines
//!
//! `CarvableImage` holds an image together with the energy and seam
//! strategies that will carve it, and repeats energy → seam →
//! transform as many times as asked.  Every operation works on a
//! private copy and only replaces the held image once the whole run
//! has succeeded; a failure or cancellation leaves it as it was.
//!
//! Height is carved by transposing, carving width, and transposing
//! back.

use crate::aspect::{seams_for_aspect_ratio, AspectRatio};
use crate::energy::{validate_image, Energy, EnergyStrategy};
use crate::error::CarveError;
use crate::flipper::{flip, flip_region};
use crate::protect::{protect_regions, RegionDetector, DEFAULT_PROTECTION_FACTOR};
use crate::seamfinder::{DynamicProgramming, Seam, SeamStrategy};
use crate::transform::{insert_vertical_seam, remove_vertical_seam};
use crate::twodmap::EnergyMap;
use image::{DynamicImage, ImageBuffer, RgbImage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Which dimension a run of seams shrinks or grows.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Carve {
    /// Vertical seams; the image gets narrower or wider.
    Width,
    /// Horizontal seams; the image gets shorter or taller.
    Height,
}

impl Carve {
    /// The other direction.
    pub fn turn(self) -> Self {
        match self {
            Carve::Width => Carve::Height,
            Carve::Height => Carve::Width,
        }
    }
}

/// Reported once per completed seam.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: u32,
    pub total: u32,
    pub direction: Carve,
}

/// Progress hook installed with [`CarvableImage::with_progress`].
pub type ProgressFn = Box<dyn FnMut(Progress) + Send>;

/// A cooperative stop switch, checked before every seam.  Clones share
/// the same switch, so one can be handed to another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

fn oriented(image: &RgbImage, direction: Carve) -> RgbImage {
    match direction {
        Carve::Width => image.clone(),
        Carve::Height => flip(image),
    }
}

fn restored(working: RgbImage, direction: Carve) -> RgbImage {
    match direction {
        Carve::Width => working,
        Carve::Height => flip(&working),
    }
}

fn check_seam_count(requested: u32, dimension: u32) -> Result<(), CarveError> {
    if requested > 0 && requested >= dimension {
        return Err(CarveError::RequestedSeamsExceedsDimension {
            requested,
            dimension,
        });
    }
    Ok(())
}

/// An image to be carved, and the strategies that will carve it.
pub struct CarvableImage<E = Energy, S = DynamicProgramming> {
    image: RgbImage,
    energy: E,
    seams: S,
    protection_factor: f64,
    cancel: Option<CancellationToken>,
    progress: Option<ProgressFn>,
}

impl CarvableImage<Energy, DynamicProgramming> {
    /// Carve `image` with the default energy calculator and the dynamic
    /// programming seam search.
    pub fn new(image: RgbImage) -> Result<Self, CarveError> {
        Self::with_strategies(image, Energy::default(), DynamicProgramming)
    }

    /// Accept a raw, row-major, 3-samples-per-pixel buffer.  The buffer
    /// must be exactly `width * height * 3` bytes.
    pub fn from_raw(width: u32, height: u32, samples: Vec<u8>) -> Result<Self, CarveError> {
        let expected = width as usize * height as usize * 3;
        if samples.len() != expected {
            return Err(CarveError::shape(format!(
                "{}x{}x3 needs {} samples, got {}",
                width,
                height,
                expected,
                samples.len()
            )));
        }
        let image = ImageBuffer::from_raw(width, height, samples)
            .ok_or_else(|| CarveError::shape("buffer does not match its dimensions"))?;
        Self::new(image)
    }

    /// Accept a decoded image, provided it already is 8-bit RGB.
    /// Nothing is converted.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self, CarveError> {
        match image {
            DynamicImage::ImageRgb8(buffer) => Self::new(buffer),
            other => Err(CarveError::shape(format!(
                "expected 8-bit RGB, got {:?}",
                other.color()
            ))),
        }
    }
}

impl<E, S> CarvableImage<E, S>
where
    E: EnergyStrategy,
    S: SeamStrategy,
{
    /// Carve `image` with the given energy calculator and seam search.
    /// Both stay fixed for the lifetime of the carver.
    pub fn with_strategies(image: RgbImage, energy: E, seams: S) -> Result<Self, CarveError> {
        validate_image(&image)?;
        Ok(CarvableImage {
            image,
            energy,
            seams,
            protection_factor: DEFAULT_PROTECTION_FACTOR,
            cancel: None,
            progress: None,
        })
    }

    /// How much protected pixels (and, when enlarging, already chosen
    /// seams) cost relative to the hottest pixel.  Must be finite and
    /// greater than one; anything else is ignored.
    pub fn with_protection_factor(mut self, factor: f64) -> Self {
        if factor.is_finite() && factor > 1.0 {
            self.protection_factor = factor;
        } else {
            warn!(factor, "ignoring protection factor, it must be finite and > 1");
        }
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_progress<F>(mut self, progress: F) -> Self
    where
        F: FnMut(Progress) + Send + 'static,
    {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn protection_factor(&self) -> f64 {
        self.protection_factor
    }

    /// The energy map of the image as it stands.
    pub fn energy_map(&self) -> Result<EnergyMap, CarveError> {
        self.energy.compute(&self.image)
    }

    /// Remove `n` vertical seams.
    pub fn reduce(&mut self, n: u32) -> Result<(), CarveError> {
        self.carve_along(Carve::Width, n, None, &mut |_: &RgbImage, _: &Seam| {})
    }

    /// Remove `n` horizontal seams.
    pub fn reduce_height(&mut self, n: u32) -> Result<(), CarveError> {
        self.carve_along(Carve::Height, n, None, &mut |_: &RgbImage, _: &Seam| {})
    }

    /// Remove `n` vertical seams, asking `detector` before every seam
    /// which rectangles of the current image to keep out of its way.
    pub fn reduce_with_protection(
        &mut self,
        n: u32,
        detector: &dyn RegionDetector,
    ) -> Result<(), CarveError> {
        self.carve_along(
            Carve::Width,
            n,
            Some(detector),
            &mut |_: &RgbImage, _: &Seam| {},
        )
    }

    /// Remove `n` horizontal seams around the detector's rectangles.
    /// The detector always sees the image upright, and its rectangles
    /// are in upright coordinates.
    pub fn reduce_height_with_protection(
        &mut self,
        n: u32,
        detector: &dyn RegionDetector,
    ) -> Result<(), CarveError> {
        self.carve_along(
            Carve::Height,
            n,
            Some(detector),
            &mut |_: &RgbImage, _: &Seam| {},
        )
    }

    /// Remove `n` vertical seams, showing each one to `on_seam_found`
    /// together with the image it is about to be cut from.
    pub fn interactive_carve<F>(&mut self, n: u32, mut on_seam_found: F) -> Result<(), CarveError>
    where
        F: FnMut(&RgbImage, &Seam),
    {
        self.carve_along(Carve::Width, n, None, &mut on_seam_found)
    }

    /// Insert `n` vertical seams.
    pub fn enlarge(&mut self, n: u32) -> Result<(), CarveError> {
        self.enlarge_along(Carve::Width, n, 0, n)
    }

    /// Insert `n` horizontal seams.
    pub fn enlarge_height(&mut self, n: u32) -> Result<(), CarveError> {
        self.enlarge_along(Carve::Height, n, 0, n)
    }

    /// Carve or stretch to exactly `width`×`height`.  While both
    /// dimensions shrink, width and height seams alternate one at a
    /// time; growing dimensions are enlarged afterwards.  Progress
    /// counts every seam of both phases against one total.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), CarveError> {
        let (current_width, current_height) = self.dimensions();
        if width == 0 {
            return Err(CarveError::RequestedSeamsExceedsDimension {
                requested: current_width,
                dimension: current_width,
            });
        }
        if height == 0 {
            return Err(CarveError::RequestedSeamsExceedsDimension {
                requested: current_height,
                dimension: current_height,
            });
        }
        let before = self.image.clone();
        let result = self.resize_inner(width, height);
        if result.is_err() {
            self.image = before;
        }
        result
    }

    /// Shrink whichever dimension is too long for `ratio`.
    pub fn reduce_to_aspect(&mut self, ratio: AspectRatio) -> Result<(), CarveError> {
        let (width, height) = self.dimensions();
        let (vertical, horizontal) = seams_for_aspect_ratio(width, height, ratio);
        debug!(%ratio, vertical, horizontal, "seams for aspect ratio");
        self.resize(width - vertical, height - horizontal)
    }

    fn check_cancelled(&self) -> Result<(), CarveError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(CarveError::Cancelled),
            _ => Ok(()),
        }
    }

    fn report(&mut self, progress: Progress) {
        if let Some(callback) = self.progress.as_mut() {
            callback(progress);
        }
    }

    // One seam through the (already oriented) working image.  The seam
    // finder's output is checked in full here, since a bad seam can
    // only mean a defect in the finder.
    fn next_seam(
        &self,
        working: &RgbImage,
        direction: Carve,
        detector: Option<&dyn RegionDetector>,
    ) -> Result<Seam, CarveError> {
        let (width, height) = working.dimensions();
        let mut energy = self.energy.compute(working)?;
        energy.expect_dimensions(width, height)?;

        if let Some(detector) = detector {
            let regions = match direction {
                Carve::Width => detector.detect(working),
                Carve::Height => detector
                    .detect(&flip(working))
                    .iter()
                    .map(flip_region)
                    .collect(),
            };
            trace!(regions = regions.len(), "protecting regions");
            protect_regions(&mut energy, &regions, self.protection_factor);
        }

        let seam = self.seams.find(&energy)?;
        seam.validate(width, height)?;
        Ok(seam)
    }

    fn carve_along(
        &mut self,
        direction: Carve,
        n: u32,
        detector: Option<&dyn RegionDetector>,
        on_seam_found: &mut dyn FnMut(&RgbImage, &Seam),
    ) -> Result<(), CarveError> {
        let mut working = oriented(&self.image, direction);
        check_seam_count(n, working.width())?;
        debug!(?direction, seams = n, protected = detector.is_some(), "reducing");

        for i in 0..n {
            self.check_cancelled()?;
            let seam = self.next_seam(&working, direction, detector)?;
            on_seam_found(&working, &seam);
            working = remove_vertical_seam(&working, &seam)?;
            trace!(seam = i + 1, remaining = working.width(), "removed seam");
            self.report(Progress {
                completed: i + 1,
                total: n,
                direction,
            });
        }

        self.image = restored(working, direction);
        Ok(())
    }

    // Phase one finds all `n` seams against the untouched image: after
    // each search the seam's pixels are made expensive in the energy
    // map, so the next search goes elsewhere, and since nothing is
    // removed every seam is already in original coordinates.  Phase
    // two inserts them newest first; each insertion pushes the pending
    // seams at or right of it one column over.  Progress starts after
    // `done` of `total` seams.
    fn enlarge_along(
        &mut self,
        direction: Carve,
        n: u32,
        done: u32,
        total: u32,
    ) -> Result<(), CarveError> {
        let original = oriented(&self.image, direction);
        let (width, height) = original.dimensions();
        check_seam_count(n, width)?;
        if n == 0 {
            return Ok(());
        }
        debug!(?direction, seams = n, "enlarging");

        let mut energy = self.energy.compute(&original)?;
        energy.expect_dimensions(width, height)?;
        let chosen_cost = energy.max_value().max(1.0) * self.protection_factor;

        let mut chosen: Vec<Seam> = Vec::with_capacity(n as usize);
        for i in 0..n {
            self.check_cancelled()?;
            let seam = self.seams.find(&energy)?;
            seam.validate(width, height)?;
            for (y, &x) in seam.iter().enumerate() {
                energy[(x, y as u32)] = chosen_cost;
            }
            trace!(seam = i + 1, "chose seam to duplicate");
            chosen.push(seam);
            self.report(Progress {
                completed: done + i + 1,
                total,
                direction,
            });
        }

        let mut enlarged = original;
        while let Some(seam) = chosen.pop() {
            enlarged = insert_vertical_seam(&enlarged, &seam)?;
            for pending in chosen.iter_mut() {
                pending.shift_past(&seam);
            }
        }

        self.image = restored(enlarged, direction);
        Ok(())
    }

    fn carve_once(&self, image: &RgbImage, direction: Carve) -> Result<RgbImage, CarveError> {
        let working = oriented(image, direction);
        let seam = self.next_seam(&working, direction, None)?;
        Ok(restored(remove_vertical_seam(&working, &seam)?, direction))
    }

    fn resize_inner(&mut self, width: u32, height: u32) -> Result<(), CarveError> {
        let (start_width, start_height) = self.dimensions();
        debug!(
            from_width = start_width,
            from_height = start_height,
            width,
            height,
            "resizing"
        );

        let grow_width = width.saturating_sub(start_width);
        let grow_height = height.saturating_sub(start_height);
        let total = start_width.saturating_sub(width)
            + start_height.saturating_sub(height)
            + grow_width
            + grow_height;
        let mut scratch = self.image.clone();
        let mut direction = Carve::Width;
        let mut completed = 0;
        while scratch.width() > width || scratch.height() > height {
            self.check_cancelled()?;
            if scratch.width() <= width {
                direction = Carve::Height;
            } else if scratch.height() <= height {
                direction = Carve::Width;
            }
            scratch = self.carve_once(&scratch, direction)?;
            completed += 1;
            self.report(Progress {
                completed,
                total,
                direction,
            });
            direction = direction.turn();
        }
        self.image = scratch;

        if grow_width > 0 {
            self.enlarge_along(Carve::Width, grow_width, completed, total)?;
            completed += grow_width;
        }
        if grow_height > 0 {
            self.enlarge_along(Carve::Height, grow_height, completed, total)?;
        }
        Ok(())
    }
}
