// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page loader — decodes rendered page images from disk.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use plandiff_core::error::{PlanDiffError, Result};
use tracing::{debug, info, instrument};

/// File extensions accepted as page rasters (compared case-insensitively).
pub const PAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Load a page raster from a file path.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn open_page(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let img = image::open(path.as_ref()).map_err(|err| {
        PlanDiffError::ImageError(format!(
            "failed to open {}: {}",
            path.as_ref().display(),
            err
        ))
    })?;
    debug!(width = img.width(), height = img.height(), "Page loaded");
    Ok(img)
}

fn is_page_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| PAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

/// The page images in `dir`, sorted by file name. Subdirectories and other
/// files are ignored.
#[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
pub fn list_page_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.is_file() && is_page_file(&path) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    info!(pages = files.len(), "Page files listed");
    Ok(files)
}
