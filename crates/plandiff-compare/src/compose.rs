// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compositor — faded reference page with colour-coded changes on top.

use image::{GrayImage, Luma, Rgb, RgbImage};
use plandiff_core::ProcessingConfig;
use plandiff_core::error::{PlanDiffError, Result};
use tracing::{debug, instrument};

use crate::mask::BinaryMask;

/// Blend the reference page towards white:
/// `round(g * ghost_base_weight + 255 * ghost_bg_weight)`, clamped to 0..=255.
pub fn ghost_background(reference: &GrayImage, config: &ProcessingConfig) -> GrayImage {
    let base = config.ghost_base_weight;
    let white = 255.0 * config.ghost_bg_weight;
    let mut out = GrayImage::new(reference.width(), reference.height());
    for (dst, src) in out.pixels_mut().zip(reference.pixels()) {
        let value = (src.0[0] as f32 * base + white).round().clamp(0.0, 255.0);
        *dst = Luma([value as u8]);
    }
    out
}

/// Render the final RGB page: ghost background, then `added` pixels in
/// `green_color`, then `removed` pixels in `magenta_color`. Where both masks
/// are set the removal colour wins.
#[instrument(skip_all, fields(width = reference.width(), height = reference.height()))]
pub fn compose(
    reference: &GrayImage,
    added: &BinaryMask,
    removed: &BinaryMask,
    config: &ProcessingConfig,
) -> Result<RgbImage> {
    let dimensions = reference.dimensions();
    if added.dimensions() != dimensions || removed.dimensions() != dimensions {
        return Err(PlanDiffError::InvalidInput(format!(
            "compositor needs equal sizes: page {:?}, added {:?}, removed {:?}",
            dimensions,
            added.dimensions(),
            removed.dimensions()
        )));
    }

    let ghost = ghost_background(reference, config);
    let green = Rgb(config.green_color.channels());
    let magenta = Rgb(config.magenta_color.channels());

    let mut out = RgbImage::new(dimensions.0, dimensions.1);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let g = ghost.get_pixel(x, y).0[0];
        *pixel = Rgb([g, g, g]);
    }

    let overlays = [(added, green), (removed, magenta)];
    for (mask, colour) in overlays {
        for (dst, m) in out.pixels_mut().zip(mask.as_gray().pixels()) {
            if m.0[0] != 0 {
                *dst = colour;
            }
        }
    }

    debug!(added = added.count(), removed = removed.count(), "Composite rendered");
    Ok(out)
}
