// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// plandiff-document — Page input and report output for Plandiff.
//
// Loads page rasters from disk, pairs the two revisions page by page (padding
// the shorter one), and assembles the per-page composites into a multi-page
// PDF report or a directory of PNGs.

pub mod pages;
pub mod report;

// Re-export the primary items so callers can use `plandiff_document::ReportWriter` etc.
pub use pages::{PageDirectoryPair, list_page_files, open_page, pair_pages};
pub use report::{ReportWriter, export_pngs};
