// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Homography estimation — normalised DLT inside a seeded RANSAC loop.

use imageproc::geometric_transformations::Projection;
use nalgebra::{DMatrix, Matrix3, SymmetricEigen, Vector3};
use plandiff_core::AlignmentTuning;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Points needed for one homography hypothesis.
const SAMPLE_SIZE: usize = 4;

/// A 3x3 projective transform from modified-page pixels to reference-page pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography(Matrix3<f64>);

impl Homography {
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// Accept `matrix` only if it is finite and invertible. The result is
    /// scaled so that `h[2][2] == 1` whenever that entry is non-zero.
    pub fn from_matrix(matrix: Matrix3<f64>) -> Option<Self> {
        if matrix.iter().any(|v| !v.is_finite()) || matrix.determinant().abs() < 1e-12 {
            return None;
        }
        let scale = matrix[(2, 2)];
        let matrix = if scale.abs() > 1e-15 { matrix / scale } else { matrix };
        Some(Self(matrix))
    }

    /// Map a point; `None` when it lands on the line at infinity.
    pub fn project(&self, x: f64, y: f64) -> Option<[f64; 2]> {
        let p = self.0 * Vector3::new(x, y, 1.0);
        if p[2].abs() < 1e-12 {
            return None;
        }
        Some([p[0] / p[2], p[1] / p[2]])
    }

    fn reprojection_error(&self, src: &[f64; 2], dst: &[f64; 2]) -> f64 {
        match self.project(src[0], src[1]) {
            Some(p) => ((p[0] - dst[0]).powi(2) + (p[1] - dst[1]).powi(2)).sqrt(),
            None => f64::INFINITY,
        }
    }

    /// Row-major `f32` projection for `imageproc`'s warping routines.
    pub fn to_projection(&self) -> Option<Projection> {
        let m = &self.0;
        Projection::from_matrix([
            m[(0, 0)] as f32,
            m[(0, 1)] as f32,
            m[(0, 2)] as f32,
            m[(1, 0)] as f32,
            m[(1, 1)] as f32,
            m[(1, 2)] as f32,
            m[(2, 0)] as f32,
            m[(2, 1)] as f32,
            m[(2, 2)] as f32,
        ])
    }
}

/// Translate the centroid to the origin and scale the mean distance to sqrt(2).
fn normalize_points(points: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = points.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_dist = points
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let transform = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = points.iter().map(|p| [s * (p[0] - cx), s * (p[1] - cy)]).collect();
    (transform, normalized)
}

/// Direct linear transform from at least four correspondences.
///
/// Returns `H` with `dst ~ H * src`, or `None` for too few points or a
/// numerically degenerate configuration.
pub fn estimate_dlt(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Option<Homography> {
    let n = src.len();
    if n < SAMPLE_SIZE || dst.len() != n {
        return None;
    }

    let (t_src, src_n) = normalize_points(src);
    let (t_dst, dst_n) = normalize_points(dst);

    let mut a = DMatrix::zeros(2 * n, 9);
    for i in 0..n {
        let (sx, sy) = (src_n[i][0], src_n[i][1]);
        let (dx, dy) = (dst_n[i][0], dst_n[i][1]);

        a[(2 * i, 3)] = -sx;
        a[(2 * i, 4)] = -sy;
        a[(2 * i, 5)] = -1.0;
        a[(2 * i, 6)] = dy * sx;
        a[(2 * i, 7)] = dy * sy;
        a[(2 * i, 8)] = dy;

        a[(2 * i + 1, 0)] = sx;
        a[(2 * i + 1, 1)] = sy;
        a[(2 * i + 1, 2)] = 1.0;
        a[(2 * i + 1, 6)] = -dx * sx;
        a[(2 * i + 1, 7)] = -dx * sy;
        a[(2 * i + 1, 8)] = -dx;
    }

    // Null vector of A = eigenvector of A^T A with the smallest eigenvalue.
    let eig = SymmetricEigen::new(a.transpose() * &a);
    let min_idx = (0..9).min_by(|&i, &j| {
        eig.eigenvalues[i]
            .abs()
            .total_cmp(&eig.eigenvalues[j].abs())
    })?;
    let h = eig.eigenvectors.column(min_idx);
    let h_norm = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

    let t_dst_inv = t_dst.try_inverse()?;
    Homography::from_matrix(t_dst_inv * h_norm * t_src)
}

/// RANSAC parameters.
#[derive(Debug, Clone)]
pub struct RansacParams {
    /// Reprojection error (pixels) below which a correspondence is an inlier.
    pub reproj_threshold: f64,
    pub max_iters: usize,
    /// Probability of having drawn at least one all-inlier sample.
    pub confidence: f64,
    pub seed: u64,
}

impl RansacParams {
    pub fn from_tuning(tuning: &AlignmentTuning) -> Self {
        Self {
            reproj_threshold: tuning.ransac_reproj_threshold,
            max_iters: tuning.ransac_max_iters.max(1),
            confidence: tuning.ransac_confidence,
            seed: tuning.ransac_seed,
        }
    }
}

impl Default for RansacParams {
    fn default() -> Self {
        Self::from_tuning(&AlignmentTuning::default())
    }
}

/// Outcome of a successful RANSAC fit.
#[derive(Debug, Clone)]
pub struct RansacFit {
    pub homography: Homography,
    pub inliers: Vec<bool>,
    pub inlier_count: usize,
}

/// Fit a homography that tolerates outlier correspondences.
///
/// Returns `None` when fewer than four points are given or no hypothesis
/// collects at least four inliers.
pub fn fit_ransac(src: &[[f64; 2]], dst: &[[f64; 2]], params: &RansacParams) -> Option<RansacFit> {
    let n = src.len();
    if n < SAMPLE_SIZE || dst.len() != n {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut best: Option<(Homography, Vec<bool>, usize)> = None;
    let mut iterations_needed = params.max_iters;
    let mut iteration = 0;

    while iteration < iterations_needed {
        iteration += 1;

        let Some(indices) = sample_indices(&mut rng, n) else {
            continue;
        };
        let s4: Vec<[f64; 2]> = indices.iter().map(|&i| src[i]).collect();
        let d4: Vec<[f64; 2]> = indices.iter().map(|&i| dst[i]).collect();
        if has_collinear_triple(&s4) || has_collinear_triple(&d4) {
            continue;
        }
        let Some(h) = estimate_dlt(&s4, &d4) else {
            continue;
        };

        let (mask, count) = classify(&h, src, dst, params.reproj_threshold);
        if best.as_ref().is_none_or(|(_, _, best_count)| count > *best_count) {
            iterations_needed = required_iterations(
                count as f64 / n as f64,
                params.confidence,
                params.max_iters,
            );
            best = Some((h, mask, count));
        }
    }

    let (h, mask, count) = best?;
    if count < SAMPLE_SIZE {
        return None;
    }

    // Refit on the consensus set, keeping the sampled model if that fails.
    let inlier_src: Vec<[f64; 2]> = (0..n).filter(|&i| mask[i]).map(|i| src[i]).collect();
    let inlier_dst: Vec<[f64; 2]> = (0..n).filter(|&i| mask[i]).map(|i| dst[i]).collect();
    let refit = estimate_dlt(&inlier_src, &inlier_dst).unwrap_or(h);
    let (refit_mask, refit_count) = classify(&refit, src, dst, params.reproj_threshold);

    let (homography, inliers, inlier_count) = if refit_count >= count {
        (refit, refit_mask, refit_count)
    } else {
        (h, mask, count)
    };
    debug!(iterations = iteration, candidates = n, inlier_count, "RANSAC converged");

    Some(RansacFit {
        homography,
        inliers,
        inlier_count,
    })
}

fn sample_indices(rng: &mut StdRng, n: usize) -> Option<[usize; SAMPLE_SIZE]> {
    let mut indices = [0usize; SAMPLE_SIZE];
    for slot in 0..SAMPLE_SIZE {
        let mut attempts = 0;
        loop {
            let candidate = rng.gen_range(0..n);
            if !indices[..slot].contains(&candidate) {
                indices[slot] = candidate;
                break;
            }
            attempts += 1;
            if attempts > 100 {
                return None;
            }
        }
    }
    Some(indices)
}

fn has_collinear_triple(points: &[[f64; 2]]) -> bool {
    let len = points.len();
    for i in 0..len {
        for j in (i + 1)..len {
            for k in (j + 1)..len {
                let (a, b, c) = (points[i], points[j], points[k]);
                let cross = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
                if cross.abs() < 1e-6 {
                    return true;
                }
            }
        }
    }
    false
}

fn classify(h: &Homography, src: &[[f64; 2]], dst: &[[f64; 2]], threshold: f64) -> (Vec<bool>, usize) {
    let mask: Vec<bool> = src
        .iter()
        .zip(dst)
        .map(|(s, d)| h.reprojection_error(s, d) < threshold)
        .collect();
    let count = mask.iter().filter(|&&inlier| inlier).count();
    (mask, count)
}

/// Iterations needed to draw one all-inlier sample with `confidence`, given
/// the current inlier ratio.
fn required_iterations(inlier_ratio: f64, confidence: f64, max_iters: usize) -> usize {
    let p_good_sample = inlier_ratio.powi(SAMPLE_SIZE as i32);
    if p_good_sample <= 0.0 {
        return max_iters;
    }
    let denominator = (1.0 - p_good_sample).ln();
    if !denominator.is_finite() {
        return 1;
    }
    if denominator >= 0.0 {
        return max_iters;
    }
    let needed = ((1.0 - confidence).ln() / denominator).ceil();
    if needed.is_finite() {
        (needed as usize).clamp(1, max_iters)
    } else {
        max_iters
    }
}
