// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ORB keypoints — FAST-9 corners over an image pyramid, oriented by the
// intensity centroid, described with steered 256-bit BRIEF.

use std::sync::OnceLock;

use image::GrayImage;
use image::imageops::{self, FilterType};
use imageproc::corners::{Corner, corners_fast9};
use imageproc::filter::gaussian_blur_f32;
use plandiff_core::ProcessingConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

/// Radius of the orientation patch.
const PATCH_RADIUS: i32 = 15;
/// Test-pair offsets are clipped to this before steering.
const PATTERN_EXTENT: i32 = 13;
/// Keypoints closer than this to a level's edge are discarded, so that both
/// the orientation patch and a steered test pair stay inside the image.
const EDGE_BORDER: u32 = 20;
const DESCRIPTOR_BITS: usize = 256;
const BLUR_SIGMA: f32 = 2.0;
const PATTERN_SEED: u64 = 0x0b1f_5eed;

/// 256-bit binary descriptor.
pub type Descriptor = [u64; 4];

/// A detected keypoint in level-0 pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Orientation in radians.
    pub angle: f32,
    /// FAST corner score.
    pub response: f32,
    /// Pyramid level the keypoint was found on.
    pub level: u32,
}

/// Keypoints and their descriptors, index-aligned.
#[derive(Debug, Clone, Default)]
pub struct Features {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl Features {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Oriented FAST + rotated BRIEF detector.
#[derive(Debug, Clone)]
pub struct OrbDetector {
    max_features: usize,
    fast_threshold: u8,
    levels: u32,
    scale: f32,
}

impl OrbDetector {
    pub fn new(max_features: usize, fast_threshold: u8, levels: u32, scale: f32) -> Self {
        Self {
            max_features,
            fast_threshold,
            levels: levels.max(1),
            scale,
        }
    }

    pub fn from_config(config: &ProcessingConfig) -> Self {
        Self::new(
            config.orb_features,
            config.alignment.fast_threshold,
            config.alignment.pyramid_levels,
            config.alignment.pyramid_scale,
        )
    }

    /// Detect up to `max_features` keypoints and compute their descriptors.
    ///
    /// Returns an empty set for images without corners (blank pages) or
    /// images too small to hold a single patch.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn detect_and_compute(&self, image: &GrayImage) -> Features {
        let (base_w, base_h) = image.dimensions();
        let budgets = level_budgets(self.max_features, self.levels, self.scale);
        let mut features = Features::default();

        for (level, budget) in budgets.into_iter().enumerate() {
            let factor = self.scale.powi(level as i32);
            let width = (base_w as f32 / factor).round() as u32;
            let height = (base_h as f32 / factor).round() as u32;
            if width <= 2 * EDGE_BORDER || height <= 2 * EDGE_BORDER {
                break;
            }
            if budget == 0 {
                continue;
            }

            let resized;
            let level_image: &GrayImage = if level == 0 {
                image
            } else {
                resized = imageops::resize(image, width, height, FilterType::Triangle);
                &resized
            };

            let corners = strongest_corners(level_image, self.fast_threshold, budget);
            if corners.is_empty() {
                continue;
            }

            let smoothed = gaussian_blur_f32(level_image, BLUR_SIGMA);
            let sx = base_w as f32 / width as f32;
            let sy = base_h as f32 / height as f32;

            for corner in &corners {
                let angle = centroid_angle(level_image, corner.x, corner.y);
                features.descriptors.push(steered_brief(&smoothed, corner.x, corner.y, angle));
                features.keypoints.push(Keypoint {
                    x: (corner.x as f32 + 0.5) * sx - 0.5,
                    y: (corner.y as f32 + 0.5) * sy - 0.5,
                    angle,
                    response: corner.score,
                    level: level as u32,
                });
            }
            debug!(level, width, height, kept = corners.len(), "Pyramid level processed");
        }

        features
    }
}

/// Split `total` features over the pyramid geometrically, so each level gets
/// a share proportional to its linear scale. The last level takes the rest.
fn level_budgets(total: usize, levels: u32, scale: f32) -> Vec<usize> {
    let levels = levels.max(1) as usize;
    let factor = 1.0 / scale as f64;
    let mut per_level = total as f64 * (1.0 - factor) / (1.0 - factor.powi(levels as i32));
    let mut budgets = Vec::with_capacity(levels);
    let mut assigned = 0usize;

    for _ in 0..levels - 1 {
        let share = (per_level.round() as usize).min(total - assigned);
        budgets.push(share);
        assigned += share;
        per_level *= factor;
    }
    budgets.push(total - assigned);
    budgets
}

/// FAST-9 corners away from the border, thinned by 3x3 non-maximum
/// suppression and truncated to the `budget` strongest.
fn strongest_corners(image: &GrayImage, threshold: u8, budget: usize) -> Vec<Corner> {
    let (width, height) = image.dimensions();
    let corners = corners_fast9(image, threshold);

    let mut scores = vec![0f32; width as usize * height as usize];
    for corner in &corners {
        scores[corner.y as usize * width as usize + corner.x as usize] = corner.score;
    }

    let mut kept: Vec<Corner> = corners
        .into_iter()
        .filter(|c| {
            c.x >= EDGE_BORDER
                && c.y >= EDGE_BORDER
                && c.x < width - EDGE_BORDER
                && c.y < height - EDGE_BORDER
        })
        .filter(|c| is_local_maximum(&scores, width as usize, c))
        .collect();

    kept.sort_by(|a, b| b.score.total_cmp(&a.score));
    kept.truncate(budget);
    kept
}

/// Ties go to the neighbour that comes first in raster order.
fn is_local_maximum(scores: &[f32], stride: usize, corner: &Corner) -> bool {
    let own_index = corner.y as usize * stride + corner.x as usize;
    let own = scores[own_index];
    for dy in -1i64..=1 {
        for dx in -1i64..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let index = ((corner.y as i64 + dy) as usize) * stride + (corner.x as i64 + dx) as usize;
            let other = scores[index];
            if other > own || (other == own && index < own_index) {
                return false;
            }
        }
    }
    true
}

/// Orientation from the intensity centroid of a circular patch.
fn centroid_angle(image: &GrayImage, cx: u32, cy: u32) -> f32 {
    let mut m10: i64 = 0;
    let mut m01: i64 = 0;
    for dy in -PATCH_RADIUS..=PATCH_RADIUS {
        let span = ((PATCH_RADIUS * PATCH_RADIUS - dy * dy) as f32).sqrt() as i32;
        let y = (cy as i32 + dy) as u32;
        for dx in -span..=span {
            let value = image.get_pixel((cx as i32 + dx) as u32, y).0[0] as i64;
            m10 += dx as i64 * value;
            m01 += dy as i64 * value;
        }
    }
    (m01 as f32).atan2(m10 as f32)
}

/// Binary intensity tests over the rotated sampling pattern.
fn steered_brief(smoothed: &GrayImage, cx: u32, cy: u32, angle: f32) -> Descriptor {
    let (sin, cos) = angle.sin_cos();
    let sample = |px: i8, py: i8| -> u8 {
        let (px, py) = (px as f32, py as f32);
        let x = cx as i32 + (px * cos - py * sin).round() as i32;
        let y = cy as i32 + (px * sin + py * cos).round() as i32;
        smoothed.get_pixel(x as u32, y as u32).0[0]
    };

    let mut descriptor: Descriptor = [0; 4];
    for (bit, pair) in sampling_pattern().iter().enumerate() {
        if sample(pair[0], pair[1]) < sample(pair[2], pair[3]) {
            descriptor[bit / 64] |= 1u64 << (bit % 64);
        }
    }
    descriptor
}

/// Fixed test-pair pattern `[x1, y1, x2, y2]`, drawn once from an isotropic
/// Gaussian (sigma = patch size / 5) with a fixed seed.
fn sampling_pattern() -> &'static [[i8; 4]; DESCRIPTOR_BITS] {
    static PATTERN: OnceLock<[[i8; 4]; DESCRIPTOR_BITS]> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
        let mut pattern = [[0i8; 4]; DESCRIPTOR_BITS];
        for pair in pattern.iter_mut() {
            loop {
                let candidate = [
                    gaussian_offset(&mut rng),
                    gaussian_offset(&mut rng),
                    gaussian_offset(&mut rng),
                    gaussian_offset(&mut rng),
                ];
                if candidate[..2] != candidate[2..] {
                    *pair = candidate;
                    break;
                }
            }
        }
        pattern
    })
}

fn gaussian_offset(rng: &mut StdRng) -> i8 {
    // Irwin-Hall: the sum of four uniforms, recentred and rescaled to unit variance.
    let sum: f32 = (0..4).map(|_| rng.gen_range(0.0f32..1.0)).sum();
    let z = (sum - 2.0) * 3f32.sqrt();
    let sigma = (2 * PATCH_RADIUS + 1) as f32 / 5.0;
    (z * sigma).round().clamp(-PATTERN_EXTENT as f32, PATTERN_EXTENT as f32) as i8
}
