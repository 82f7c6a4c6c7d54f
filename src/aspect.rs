// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turn a target aspect ratio into seam counts.

use crate::error::CarveError;
use std::fmt;
use std::str::FromStr;

/// A `width:height` ratio such as `16:9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl AspectRatio {
    pub fn new(width: u32, height: u32) -> Result<Self, CarveError> {
        if width == 0 || height == 0 {
            return Err(CarveError::InvalidAspectRatio(format!(
                "{}:{} has a zero term",
                width, height
            )));
        }
        Ok(AspectRatio { width, height })
    }
}

impl FromStr for AspectRatio {
    type Err = CarveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || CarveError::InvalidAspectRatio(format!("'{}' is not of the form W:H", s));
        let mut terms = s.splitn(2, ':');
        let width = terms.next().and_then(|t| t.trim().parse().ok()).ok_or_else(bad)?;
        let height = terms.next().and_then(|t| t.trim().parse().ok()).ok_or_else(bad)?;
        AspectRatio::new(width, height)
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

/// How many vertical and horizontal seams to remove so that a
/// `width`×`height` image reaches `ratio` without growing in either
/// direction.  Returns `(vertical, horizontal)`; at least one is zero.
pub fn seams_for_aspect_ratio(width: u32, height: u32, ratio: AspectRatio) -> (u32, u32) {
    let (w, h) = (u64::from(width), u64::from(height));
    let (rw, rh) = (u64::from(ratio.width), u64::from(ratio.height));

    let target_width = (h * rw / rh).min(w);
    let target_height = (w * rh / rw).min(h);

    ((w - target_width) as u32, (h - target_height) as u32)
}
