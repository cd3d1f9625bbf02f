// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Processing configuration shared by every comparison stage.

use serde::{Deserialize, Serialize};

use crate::error::{PlanDiffError, Result};
use crate::types::HighlightColor;

/// Numeric parameters for the alignment and difference pipeline.
///
/// Built once (usually via `Default` or a JSON file), validated, then passed
/// by reference to every stage. Nothing in the engine mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Rasterisation resolution the pages were rendered at.
    pub dpi: u32,
    /// Difference regions with a contour area at or below this are dropped.
    pub min_area_noise: u32,
    /// Width and height of the tolerance dilation kernel.
    pub tolerance_kernel_size: (u32, u32),
    /// Number of tolerance dilation passes.
    pub tolerance_iterations: u32,
    /// Keypoint budget for the ORB detector (per image).
    pub orb_features: usize,
    /// Fraction of the cross-checked matches kept for homography estimation.
    pub match_percentage: f32,
    /// Fewer retained matches than this skips registration.
    pub min_matches: usize,
    /// Weight of the reference page in the ghost background.
    pub ghost_base_weight: f32,
    /// Weight of the white canvas in the ghost background.
    pub ghost_bg_weight: f32,
    /// Highlight for content present only in the modified page.
    pub green_color: HighlightColor,
    /// Highlight for content present only in the reference page.
    pub magenta_color: HighlightColor,
    /// Inverted intensities at or below this are zeroed before comparison.
    pub threshold_value: u8,
    /// Largest page (width * height) the engine accepts.
    pub max_page_pixels: u64,
    /// Detector and estimator constants.
    pub alignment: AlignmentTuning,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            min_area_noise: 5,
            tolerance_kernel_size: (2, 2),
            tolerance_iterations: 1,
            orb_features: 10_000,
            match_percentage: 0.20,
            min_matches: 4,
            ghost_base_weight: 0.3,
            ghost_bg_weight: 0.7,
            green_color: HighlightColor::new(0, 200, 0),
            magenta_color: HighlightColor::new(255, 0, 180),
            threshold_value: 10,
            max_page_pixels: 250_000_000,
            alignment: AlignmentTuning::default(),
        }
    }
}

/// Lower-level knobs of the feature aligner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentTuning {
    /// FAST intensity threshold for corner detection.
    pub fast_threshold: u8,
    /// Number of pyramid levels searched for keypoints.
    pub pyramid_levels: u32,
    /// Downscale ratio between consecutive pyramid levels.
    pub pyramid_scale: f32,
    /// Maximum reprojection error (pixels) for a RANSAC inlier.
    pub ransac_reproj_threshold: f64,
    /// Hard cap on RANSAC iterations.
    pub ransac_max_iters: usize,
    /// Confidence used to stop RANSAC early.
    pub ransac_confidence: f64,
    /// Seed for RANSAC sampling, so reruns produce identical reports.
    pub ransac_seed: u64,
}

impl Default for AlignmentTuning {
    fn default() -> Self {
        Self {
            fast_threshold: 20,
            pyramid_levels: 8,
            pyramid_scale: 1.2,
            ransac_reproj_threshold: 3.0,
            ransac_max_iters: 2000,
            ransac_confidence: 0.995,
            ransac_seed: 0,
        }
    }
}

impl ProcessingConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(data: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject parameter combinations the pipeline cannot run with.
    ///
    /// The ghost weights are deliberately not required to sum to 1.0; the
    /// compositor clamps instead.
    pub fn validate(&self) -> Result<()> {
        let (kw, kh) = self.tolerance_kernel_size;
        if kw == 0 || kh == 0 {
            return Err(invalid(format!(
                "tolerance_kernel_size must be non-zero, got ({kw}, {kh})"
            )));
        }
        if !(self.match_percentage > 0.0 && self.match_percentage <= 1.0) {
            return Err(invalid(format!(
                "match_percentage must be in (0, 1], got {}",
                self.match_percentage
            )));
        }
        if self.orb_features == 0 {
            return Err(invalid("orb_features must be at least 1".into()));
        }
        for (name, weight) in [
            ("ghost_base_weight", self.ghost_base_weight),
            ("ghost_bg_weight", self.ghost_bg_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(invalid(format!("{name} must be a finite, non-negative number")));
            }
        }
        if self.max_page_pixels == 0 {
            return Err(invalid("max_page_pixels must be at least 1".into()));
        }

        let tuning = &self.alignment;
        if tuning.pyramid_levels == 0 {
            return Err(invalid("alignment.pyramid_levels must be at least 1".into()));
        }
        if !(tuning.pyramid_scale > 1.0) {
            return Err(invalid(format!(
                "alignment.pyramid_scale must be greater than 1, got {}",
                tuning.pyramid_scale
            )));
        }
        if !(tuning.ransac_reproj_threshold > 0.0) {
            return Err(invalid(
                "alignment.ransac_reproj_threshold must be positive".into(),
            ));
        }
        if !(tuning.ransac_confidence > 0.0 && tuning.ransac_confidence < 1.0) {
            return Err(invalid(format!(
                "alignment.ransac_confidence must be in (0, 1), got {}",
                tuning.ransac_confidence
            )));
        }
        Ok(())
    }
}

fn invalid(message: String) -> PlanDiffError {
    PlanDiffError::InvalidConfig(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ProcessingConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_kernel_is_rejected() {
        let config = ProcessingConfig {
            tolerance_kernel_size: (0, 2),
            ..ProcessingConfig::default()
        };
        assert!(matches!(config.validate(), Err(PlanDiffError::InvalidConfig(_))));
    }

    #[test]
    fn match_percentage_bounds() {
        let mut config = ProcessingConfig::default();
        config.match_percentage = 0.0;
        assert!(config.validate().is_err());
        config.match_percentage = 1.0;
        assert!(config.validate().is_ok());
        config.match_percentage = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unnormalized_ghost_weights_are_allowed() {
        let config = ProcessingConfig {
            ghost_base_weight: 0.9,
            ghost_bg_weight: 0.9,
            ..ProcessingConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config =
            ProcessingConfig::from_json(r#"{ "min_area_noise": 12, "alignment": { "ransac_seed": 7 } }"#)
                .unwrap();
        assert_eq!(config.min_area_noise, 12);
        assert_eq!(config.alignment.ransac_seed, 7);
        assert_eq!(config.alignment.fast_threshold, 20);
        assert_eq!(config.orb_features, 10_000);
        assert_eq!(config.green_color, HighlightColor::new(0, 200, 0));
    }

    #[test]
    fn invalid_json_config_is_rejected() {
        let result = ProcessingConfig::from_json(r#"{ "match_percentage": 2.0 }"#);
        assert!(matches!(result, Err(PlanDiffError::InvalidConfig(_))));
    }
}
