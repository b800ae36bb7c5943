//! Target dimension calculation and bilinear resampling

use image::imageops::FilterType;
use image::DynamicImage;
use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SmallifyError};

/// Longest side an output image may have
pub const MAX_SIZE_LARGER: u32 = 640;
/// Shortest side an output image may have
pub const MAX_SIZE_SMALLER: u32 = 480;

/// Landscape covers square images too
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Landscape,
    Portrait,
}

impl Orientation {
    pub fn of(width: u32, height: u32) -> Self {
        if width >= height {
            Self::Landscape
        } else {
            Self::Portrait
        }
    }
}

/// Output bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScaleTarget {
    pub width: u32,
    pub height: u32,
}

/// Bounds for the longer and the shorter side of an output image.
///
/// Both bounds are applied regardless of axis, so a portrait source is held
/// to `max_larger` on its height and `max_smaller` on its width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleBounds {
    pub max_larger: u32,
    pub max_smaller: u32,
}

impl Default for ScaleBounds {
    fn default() -> Self {
        Self {
            max_larger: MAX_SIZE_LARGER,
            max_smaller: MAX_SIZE_SMALLER,
        }
    }
}

impl ScaleBounds {
    /// Compute the output box for a `width` x `height` source.
    ///
    /// The scale is `min(max_larger / larger, max_smaller / smaller)` and the
    /// new sides are floored. The comparison and the floors use integer
    /// arithmetic so the binding bound is always reached exactly. Sources
    /// smaller than the bounds are enlarged.
    pub fn fit(&self, width: u32, height: u32) -> Result<ScaleTarget> {
        if width == 0 || height == 0 {
            return Err(SmallifyError::InvalidDimensions { width, height });
        }

        let orientation = Orientation::of(width, height);
        let (larger, smaller) = match orientation {
            Orientation::Landscape => (u64::from(width), u64::from(height)),
            Orientation::Portrait => (u64::from(height), u64::from(width)),
        };
        let max_larger = u64::from(self.max_larger);
        let max_smaller = u64::from(self.max_smaller);

        // max_larger / larger <= max_smaller / smaller
        let (new_larger, new_smaller) = if max_larger * smaller <= max_smaller * larger {
            (max_larger, smaller * max_larger / larger)
        } else {
            (larger * max_smaller / smaller, max_smaller)
        };

        // Both values are bounded by the u32 maxima above
        let new_larger = u32::try_from(new_larger).unwrap_or(u32::MAX).max(1);
        let new_smaller = u32::try_from(new_smaller).unwrap_or(u32::MAX).max(1);

        let target = match orientation {
            Orientation::Landscape => ScaleTarget {
                width: new_larger,
                height: new_smaller,
            },
            Orientation::Portrait => ScaleTarget {
                width: new_smaller,
                height: new_larger,
            },
        };

        debug!(
            "Scaled {}x{} ({:?}) -> {}x{}",
            width, height, orientation, target.width, target.height
        );

        Ok(target)
    }
}

/// Resamples whole images into a new bounding box
pub struct ImageResizer {
    filter: FilterType,
}

impl ImageResizer {
    /// Bilinear resizer
    pub fn new() -> Self {
        Self {
            filter: FilterType::Triangle,
        }
    }

    /// Resample the full source into `target`. No cropping, no padding.
    pub fn resize(&self, image: &DynamicImage, target: ScaleTarget) -> DynamicImage {
        debug!(
            "Resizing {}x{} -> {}x{} using {:?}",
            image.width(),
            image.height(),
            target.width,
            target.height,
            self.filter
        );

        image.resize_exact(target.width, target.height, self.filter)
    }
}

impl Default for ImageResizer {
    fn default() -> Self {
        Self::new()
    }
}
