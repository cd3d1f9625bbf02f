// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Feature aligner — registers the modified page onto the reference page.
//
// ORB keypoints are detected on both pages, matched by Hamming distance with
// a cross-check, and the best matches feed a RANSAC homography that warps
// the modified page into the reference frame. Every failure along the way
// degrades to a plain resize; alignment never returns an error.

pub mod homography;
pub mod matcher;
pub mod orb;

use std::fmt;

use image::RgbImage;
use imageproc::geometric_transformations::{Interpolation, warp_into};
use plandiff_core::ProcessingConfig;
use tracing::{debug, instrument, warn};

use crate::raster::{self, WHITE};

pub use homography::{Homography, RansacFit, RansacParams};
pub use matcher::DescriptorMatch;
pub use orb::{Features, Keypoint, OrbDetector};

/// Why registration was skipped in favour of a resize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// One of the pages produced no descriptors (blank or featureless).
    NoDescriptors,
    /// Fewer retained matches than `ProcessingConfig::min_matches`.
    TooFewMatches { found: usize, required: usize },
    /// No usable homography could be estimated from the matches.
    DegenerateHomography,
    /// The aligner failed unexpectedly; the message is kept for the log.
    InternalFailure(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDescriptors => write!(f, "no descriptors"),
            Self::TooFewMatches { found, required } => {
                write!(f, "too few matches ({found} < {required})")
            }
            Self::DegenerateHomography => write!(f, "degenerate homography"),
            Self::InternalFailure(msg) => write!(f, "internal failure: {msg}"),
        }
    }
}

/// Result of aligning a page. Both variants carry an image with exactly the
/// reference page's dimensions.
#[derive(Debug, Clone)]
pub enum Alignment {
    Aligned {
        image: RgbImage,
        homography: Homography,
        /// Matches handed to the estimator.
        matches: usize,
        inliers: usize,
    },
    Fallback {
        image: RgbImage,
        reason: FallbackReason,
    },
}

impl Alignment {
    /// Build the resize-only fallback for `target`.
    pub fn fallback(target: &RgbImage, width: u32, height: u32, reason: FallbackReason) -> Self {
        warn!(%reason, "Alignment fell back to resize");
        Self::Fallback {
            image: raster::resize_to(target, width, height),
            reason,
        }
    }

    pub fn image(&self) -> &RgbImage {
        match self {
            Self::Aligned { image, .. } | Self::Fallback { image, .. } => image,
        }
    }

    pub fn into_image(self) -> RgbImage {
        match self {
            Self::Aligned { image, .. } | Self::Fallback { image, .. } => image,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Warp `target` into the coordinate frame and extent of `reference`.
#[instrument(skip_all, fields(
    ref_w = reference.width(),
    ref_h = reference.height(),
    target_w = target.width(),
    target_h = target.height(),
))]
pub fn align(reference: &RgbImage, target: &RgbImage, config: &ProcessingConfig) -> Alignment {
    let (width, height) = reference.dimensions();

    let detector = OrbDetector::from_config(config);
    let (reference_features, target_features) = {
        let reference_gray = raster::to_gray(reference);
        let target_gray = raster::to_gray(target);
        rayon::join(
            || detector.detect_and_compute(&reference_gray),
            || detector.detect_and_compute(&target_gray),
        )
    };
    debug!(
        reference = reference_features.len(),
        target = target_features.len(),
        "Keypoints detected"
    );

    if reference_features.is_empty() || target_features.is_empty() {
        return Alignment::fallback(target, width, height, FallbackReason::NoDescriptors);
    }

    let matches = matcher::cross_check_match(&target_features.descriptors, &reference_features.descriptors);
    let cross_checked = matches.len();
    let matches = matcher::select_best(matches, config.match_percentage);
    debug!(cross_checked, retained = matches.len(), "Descriptors matched");

    if matches.len() < config.min_matches {
        return Alignment::fallback(
            target,
            width,
            height,
            FallbackReason::TooFewMatches {
                found: matches.len(),
                required: config.min_matches,
            },
        );
    }

    let (src, dst): (Vec<[f64; 2]>, Vec<[f64; 2]>) = matches
        .iter()
        .map(|m| {
            let t = &target_features.keypoints[m.query];
            let r = &reference_features.keypoints[m.train];
            ([t.x as f64, t.y as f64], [r.x as f64, r.y as f64])
        })
        .unzip();

    let params = RansacParams::from_tuning(&config.alignment);
    let Some(fit) = homography::fit_ransac(&src, &dst, &params) else {
        return Alignment::fallback(target, width, height, FallbackReason::DegenerateHomography);
    };
    let Some(projection) = fit.homography.to_projection() else {
        return Alignment::fallback(target, width, height, FallbackReason::DegenerateHomography);
    };

    let mut warped = RgbImage::from_pixel(width, height, WHITE);
    warp_into(target, &projection, Interpolation::Bilinear, WHITE, &mut warped);
    debug!(matches = matches.len(), inliers = fit.inlier_count, "Homography applied");

    Alignment::Aligned {
        image: warped,
        homography: fit.homography,
        matches: matches.len(),
        inliers: fit.inlier_count,
    }
}
