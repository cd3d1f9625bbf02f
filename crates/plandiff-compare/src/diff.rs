// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Difference extractor — tolerance-aware subtraction of two co-registered
// grayscale pages.

use image::{GrayImage, Luma};
use plandiff_core::ProcessingConfig;
use plandiff_core::error::{PlanDiffError, Result};
use tracing::{debug, instrument};

use crate::mask::BinaryMask;

/// Raw differences are binarised with "value > 1".
const BINARY_LEVEL: u8 = 1;

/// Graded (not yet binary) difference rasters.
#[derive(Debug, Clone)]
pub struct RawDifference {
    /// Ink present on the modified page but outside the reference's tolerance.
    pub added: GrayImage,
    /// Ink present on the reference page but outside the modified page's tolerance.
    pub removed: GrayImage,
}

/// Binarised difference masks, ready for the noise filter.
#[derive(Debug, Clone)]
pub struct DifferenceMasks {
    pub added: BinaryMask,
    pub removed: BinaryMask,
}

impl RawDifference {
    pub fn binarize(&self) -> DifferenceMasks {
        DifferenceMasks {
            added: BinaryMask::from_threshold(&self.added, BINARY_LEVEL),
            removed: BinaryMask::from_threshold(&self.removed, BINARY_LEVEL),
        }
    }
}

/// Luminance inversion: dark ink becomes high-valued.
pub fn invert(image: &GrayImage) -> GrayImage {
    let mut out = image.clone();
    for p in out.pixels_mut() {
        p.0[0] = 255 - p.0[0];
    }
    out
}

/// Values at or below `threshold` become 0; the rest pass through unchanged.
pub fn threshold_to_zero(image: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = image.clone();
    for p in out.pixels_mut() {
        if p.0[0] <= threshold {
            p.0[0] = 0;
        }
    }
    out
}

/// Grey-level dilation with a `kw` x `kh` rectangle, repeated `iterations`
/// times.
///
/// The kernel anchor sits at `(kw / 2, kh / 2)`, so output pixel (x, y) is
/// the maximum over input columns `x - kw/2 ..= x + (kw - 1 - kw/2)` and the
/// matching rows. Samples outside the image are ignored. The filter is
/// separable and runs as a row pass followed by a column pass.
pub fn dilate_rect(image: &GrayImage, kernel: (u32, u32), iterations: u32) -> GrayImage {
    let (kw, kh) = (kernel.0.max(1), kernel.1.max(1));
    let mut current = image.clone();
    if kw == 1 && kh == 1 {
        return current;
    }
    for _ in 0..iterations {
        let rows = max_filter_1d(&current, kw, Axis::Horizontal);
        current = max_filter_1d(&rows, kh, Axis::Vertical);
    }
    current
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn max_filter_1d(image: &GrayImage, size: u32, axis: Axis) -> GrayImage {
    if size <= 1 {
        return image.clone();
    }
    let (width, height) = image.dimensions();
    let before = (size / 2) as i64;
    let after = (size - 1) as i64 - before;
    let mut out = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let (centre, limit) = match axis {
                Axis::Horizontal => (x as i64, width as i64),
                Axis::Vertical => (y as i64, height as i64),
            };
            let lo = (centre - before).max(0);
            let hi = (centre + after).min(limit - 1);
            let mut best = 0u8;
            for i in lo..=hi {
                let value = match axis {
                    Axis::Horizontal => image.get_pixel(i as u32, y).0[0],
                    Axis::Vertical => image.get_pixel(x, i as u32).0[0],
                };
                best = best.max(value);
            }
            out.put_pixel(x, y, Luma([best]));
        }
    }
    out
}

fn saturating_difference(minuend: &GrayImage, subtrahend: &GrayImage) -> GrayImage {
    let mut out = minuend.clone();
    for (dst, sub) in out.pixels_mut().zip(subtrahend.pixels()) {
        dst.0[0] = dst.0[0].saturating_sub(sub.0[0]);
    }
    out
}

/// Compute the raw added and removed rasters for two co-registered pages.
///
/// `added = modified - dilate(reference)` and
/// `removed = reference - dilate(modified)`, both after inversion and
/// threshold-to-zero, with saturating subtraction.
#[instrument(skip_all, fields(width = reference.width(), height = reference.height()))]
pub fn extract(
    reference: &GrayImage,
    modified: &GrayImage,
    config: &ProcessingConfig,
) -> Result<RawDifference> {
    if reference.dimensions() != modified.dimensions() {
        return Err(PlanDiffError::InvalidInput(format!(
            "difference needs equal sizes, got {:?} and {:?}",
            reference.dimensions(),
            modified.dimensions()
        )));
    }

    let reference_ink = threshold_to_zero(&invert(reference), config.threshold_value);
    let modified_ink = threshold_to_zero(&invert(modified), config.threshold_value);

    let kernel = config.tolerance_kernel_size;
    let iterations = config.tolerance_iterations;
    let reference_tolerance = dilate_rect(&reference_ink, kernel, iterations);
    let modified_tolerance = dilate_rect(&modified_ink, kernel, iterations);

    let added = saturating_difference(&modified_ink, &reference_tolerance);
    let removed = saturating_difference(&reference_ink, &modified_tolerance);
    debug!(?kernel, iterations, "Raw differences extracted");

    Ok(RawDifference { added, removed })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: u32, height: u32, data: &[u8]) -> GrayImage {
        GrayImage::from_raw(width, height, data.to_vec()).unwrap()
    }

    #[test]
    fn invert_and_threshold() {
        let img = gray(4, 1, &[255, 250, 240, 0]);
        let inverted = invert(&img);
        assert_eq!(inverted.as_raw(), &vec![0, 5, 15, 255]);
        let kept = threshold_to_zero(&inverted, 10);
        assert_eq!(kept.as_raw(), &vec![0, 0, 15, 255]);
    }

    #[test]
    fn two_by_two_dilation_grows_towards_positive_axes() {
        let mut img = GrayImage::new(5, 5);
        img.put_pixel(2, 2, Luma([200]));
        let out = dilate_rect(&img, (2, 2), 1);
        let set: Vec<(u32, u32)> = out
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] == 200)
            .map(|(x, y, _)| (x, y))
            .collect();
        assert_eq!(set, vec![(2, 2), (3, 2), (2, 3), (3, 3)]);
    }

    #[test]
    fn three_by_three_dilation_is_centred_and_clipped() {
        let mut img = GrayImage::new(4, 4);
        img.put_pixel(0, 0, Luma([9]));
        let out = dilate_rect(&img, (3, 3), 2);
        for (x, y, p) in out.enumerate_pixels() {
            let expected = if x <= 2 && y <= 2 { 9 } else { 0 };
            assert_eq!(p.0[0], expected, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn unit_kernel_is_identity() {
        let img = gray(3, 1, &[1, 50, 3]);
        assert_eq!(dilate_rect(&img, (1, 1), 4), img);
        assert_eq!(dilate_rect(&img, (3, 3), 0), img);
    }

    #[test]
    fn added_and_removed_are_directional() {
        // Reference ink at x = 1, modified ink at x = 4.
        let reference = gray(6, 1, &[255, 0, 255, 255, 255, 255]);
        let modified = gray(6, 1, &[255, 255, 255, 255, 0, 255]);
        let raw = extract(&reference, &modified, &ProcessingConfig::default()).unwrap();
        assert_eq!(raw.added.as_raw(), &vec![0, 0, 0, 0, 255, 0]);
        assert_eq!(raw.removed.as_raw(), &vec![0, 255, 0, 0, 0, 0]);

        let masks = raw.binarize();
        assert_eq!(masks.added.count(), 1);
        assert!(masks.added.is_set(4, 0));
        assert!(masks.removed.is_set(1, 0));
    }

    #[test]
    fn one_pixel_shift_inside_tolerance_is_absorbed() {
        // Modified ink sits one pixel to the right of the reference ink.
        let reference = gray(6, 1, &[255, 255, 0, 255, 255, 255]);
        let modified = gray(6, 1, &[255, 255, 255, 0, 255, 255]);
        let raw = extract(&reference, &modified, &ProcessingConfig::default()).unwrap();
        assert!(raw.added.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn faint_ink_is_ignored() {
        let reference = gray(3, 1, &[255, 255, 255]);
        let modified = gray(3, 1, &[250, 246, 255]);
        let raw = extract(&reference, &modified, &ProcessingConfig::default()).unwrap();
        assert!(raw.binarize().added.is_empty());
    }

    #[test]
    fn mismatched_sizes_are_rejected() {
        let a = GrayImage::new(4, 4);
        let b = GrayImage::new(4, 5);
        assert!(matches!(
            extract(&a, &b, &ProcessingConfig::default()),
            Err(PlanDiffError::InvalidInput(_))
        ));
    }
}
