// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Binary masks — single-channel rasters restricted to {0, 255}.

use image::{GrayImage, Luma};
use plandiff_core::error::{PlanDiffError, Result};

/// Value of a set mask pixel.
pub const SET: u8 = 255;

/// A single-channel mask whose pixels are either 0 or 255.
///
/// The invariant is enforced at construction, so the noise filter and the
/// compositor never see graded values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask(GrayImage);

impl BinaryMask {
    /// All-clear mask.
    pub fn empty(width: u32, height: u32) -> Self {
        Self(GrayImage::new(width, height))
    }

    /// Binarise a graded raster: values strictly greater than `level` become
    /// 255, everything else 0.
    pub fn from_threshold(raw: &GrayImage, level: u8) -> Self {
        let mut out = GrayImage::new(raw.width(), raw.height());
        for (dst, src) in out.pixels_mut().zip(raw.pixels()) {
            if src.0[0] > level {
                *dst = Luma([SET]);
            }
        }
        Self(out)
    }

    /// Wrap an existing raster after checking it is strictly binary.
    pub fn try_from_gray(image: GrayImage) -> Result<Self> {
        if let Some((x, y, p)) = image
            .enumerate_pixels()
            .find(|(_, _, p)| p.0[0] != 0 && p.0[0] != SET)
        {
            return Err(PlanDiffError::InvalidInput(format!(
                "mask pixel ({x}, {y}) has non-binary value {}",
                p.0[0]
            )));
        }
        Ok(Self(image))
    }

    pub(crate) fn from_gray_unchecked(image: GrayImage) -> Self {
        Self(image)
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    /// Whether the pixel at (x, y) is set. Out-of-range coordinates read as clear.
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height() && self.0.get_pixel(x, y).0[0] == SET
    }

    /// Number of set pixels.
    pub fn count(&self) -> usize {
        self.0.as_raw().iter().filter(|&&v| v == SET).count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.as_raw().iter().all(|&v| v == 0)
    }

    /// True when every pixel set here is also set in `other`.
    pub fn is_subset_of(&self, other: &BinaryMask) -> bool {
        self.dimensions() == other.dimensions()
            && self
                .0
                .as_raw()
                .iter()
                .zip(other.0.as_raw())
                .all(|(&a, &b)| a == 0 || b == SET)
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    pub fn into_gray(self) -> GrayImage {
        self.0
    }
}
