// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster helpers — channel normalisation, blank pages, the resize fallback
// and the per-page memory budget.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Rgb, RgbImage, Rgba, RgbaImage};
use plandiff_core::ProcessingConfig;
use plandiff_core::error::{PlanDiffError, Result};

/// Page background.
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Normalise any decoded page to 8-bit RGB.
///
/// Pages with an alpha channel are composited onto white paper first, so a
/// transparent background does not read as ink.
pub fn to_rgb(image: &DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb.clone(),
        other if other.color().has_alpha() => flatten_onto_white(&other.to_rgba8()),
        other => other.to_rgb8(),
    }
}

fn flatten_onto_white(image: &RgbaImage) -> RgbImage {
    let (width, height) = image.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
        let alpha = a as u16;
        let over = |ink: u8, paper: u8| {
            ((ink as u16 * alpha + paper as u16 * (255 - alpha) + 127) / 255) as u8
        };
        Rgb([over(r, WHITE.0[0]), over(g, WHITE.0[1]), over(b, WHITE.0[2])])
    })
}

/// Single-channel luminance copy of an RGB page.
pub fn to_gray(image: &RgbImage) -> GrayImage {
    imageops::grayscale(image)
}

/// An all-white page, used in place of a missing side.
pub fn blank_page(width: u32, height: u32) -> RgbImage {
    RgbImage::from_pixel(width, height, WHITE)
}

/// Stretch `image` to exactly `width` x `height` (bilinear).
///
/// This is the aligner's fallback whenever registration is not possible.
pub fn resize_to(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Triangle)
}

/// Refuse pages whose pixel count exceeds `config.max_page_pixels`, and
/// pages with no pixels at all.
pub fn check_page_budget(width: u32, height: u32, config: &ProcessingConfig) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(PlanDiffError::InvalidInput(format!(
            "page has no pixels ({width}x{height})"
        )));
    }
    let pixels = width as u64 * height as u64;
    if pixels > config.max_page_pixels {
        return Err(PlanDiffError::ResourceExhausted {
            width,
            height,
            limit: config.max_page_pixels,
        });
    }
    Ok(())
}
