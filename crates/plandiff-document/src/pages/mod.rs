// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pages module — decoding page rasters and pairing two revisions.

pub mod loader;
pub mod source;

pub use loader::{list_page_files, open_page};
pub use source::{PageDirectoryPair, pair_pages};
