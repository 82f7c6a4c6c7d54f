// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Errors for the carving engine.

use failure::Fail;

/// Everything that can go wrong while scoring, searching, or carving
/// an image.
#[derive(Debug, Fail, PartialEq)]
pub enum CarveError {
    /// The image is not a non-empty H×W×3 buffer of 8-bit samples.
    #[fail(display = "invalid image shape: {}", _0)]
    InvalidImageShape(String),

    /// An energy map does not match the image it belongs to.
    #[fail(
        display = "energy map is {}x{}, expected {}x{}",
        found_width, found_height, width, height
    )]
    InvalidEnergyShape {
        width: u32,
        height: u32,
        found_width: u32,
        found_height: u32,
    },

    /// A seam escaped the image or broke 3-connectivity.  Always a
    /// defect in the seam finder, never bad input.
    #[fail(display = "seam invariant violated: {}", _0)]
    SeamInvariantViolation(String),

    /// More seams were asked for than the dimension can give up.
    #[fail(
        display = "cannot carve {} seams from a dimension of {} pixels",
        requested, dimension
    )]
    RequestedSeamsExceedsDimension { requested: u32, dimension: u32 },

    /// An aspect ratio that is not of the form `W:H`.
    #[fail(display = "invalid aspect ratio: {}", _0)]
    InvalidAspectRatio(String),

    /// The operation's cancellation token was tripped.
    #[fail(display = "carving cancelled")]
    Cancelled,

    /// A worker thread died while computing an energy map.
    #[fail(display = "energy worker thread panicked")]
    WorkerPanicked,
}

impl CarveError {
    pub(crate) fn seam<S: Into<String>>(msg: S) -> Self {
        CarveError::SeamInvariantViolation(msg.into())
    }

    pub(crate) fn shape<S: Into<String>>(msg: S) -> Self {
        CarveError::InvalidImageShape(msg.into())
    }
}
