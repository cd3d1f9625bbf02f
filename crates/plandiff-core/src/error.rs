// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Plandiff.

use thiserror::Error;

/// Top-level error type for all Plandiff operations.
///
/// Registration problems (too few features, too few matches, degenerate
/// homography) are not represented here: the aligner absorbs them with a
/// resize fallback.
#[derive(Debug, Error)]
pub enum PlanDiffError {
    // -- Contract violations --
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Batch control --
    #[error("page of {width}x{height} pixels exceeds the limit of {limit} pixels")]
    ResourceExhausted { width: u32, height: u32, limit: u64 },

    #[error("comparison cancelled after {completed} pages")]
    Cancelled { completed: usize },

    // -- Collaborators --
    #[error("no result pages to assemble")]
    EmptyReport,

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PlanDiffError>;
