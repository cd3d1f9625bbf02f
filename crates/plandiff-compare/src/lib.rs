// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// plandiff-compare — Page alignment and difference engine.
//
// Registers a modified page onto its reference (ORB features, cross-checked
// Hamming matching, RANSAC homography, perspective warp), extracts
// tolerance-aware added/removed masks, removes small noise regions and
// renders a ghost composite with colour-coded changes.

pub mod align;
pub mod batch;
pub mod compose;
pub mod diff;
pub mod mask;
pub mod noise;
pub mod pipeline;
pub mod raster;

#[cfg(test)]
mod test_support;

// Re-export the primary entry points so callers can use `plandiff_compare::compare_page` etc.
pub use align::{Alignment, FallbackReason, align};
pub use batch::{BatchComparer, BatchOptions, CancellationToken, InMemoryPages, PageSource, RenderedPage};
pub use diff::{DifferenceMasks, RawDifference};
pub use mask::BinaryMask;
pub use pipeline::{AlignmentSummary, PageComparison, PagePair, PageSlot, compare_page};
