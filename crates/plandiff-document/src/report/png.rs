// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PNG export of page composites.

use std::path::{Path, PathBuf};

use plandiff_compare::RenderedPage;
use plandiff_core::error::{PlanDiffError, Result};
use tracing::{info, instrument};

/// Write each composite to `dir` as `page-0001.png`, `page-0002.png`, ...
/// numbered by page index (1-based). The directory is created if needed.
#[instrument(skip(pages), fields(pages = pages.len(), dir = %dir.as_ref().display()))]
pub fn export_pngs(pages: &[RenderedPage], dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    if pages.is_empty() {
        return Err(PlanDiffError::EmptyReport);
    }
    std::fs::create_dir_all(dir.as_ref())?;

    let mut written = Vec::with_capacity(pages.len());
    for page in pages {
        let path = dir.as_ref().join(format!("page-{:04}.png", page.index + 1));
        page.image.save(&path).map_err(|err| {
            PlanDiffError::ImageError(format!("failed to write {}: {}", path.display(), err))
        })?;
        written.push(path);
    }
    info!(written = written.len(), "Page composites exported");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn files_are_named_by_page_number() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("pngs");
        let pages = vec![
            RenderedPage {
                index: 0,
                image: RgbImage::from_pixel(4, 4, Rgb([255, 0, 180])),
            },
            RenderedPage {
                index: 6,
                image: RgbImage::from_pixel(3, 2, Rgb([255, 255, 255])),
            },
        ];
        let written = export_pngs(&pages, &out).unwrap();
        assert_eq!(written, vec![out.join("page-0001.png"), out.join("page-0007.png")]);

        let back = image::open(&written[1]).unwrap();
        assert_eq!((back.width(), back.height()), (3, 2));
    }

    #[test]
    fn nothing_to_export_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            export_pngs(&[], dir.path()),
            Err(PlanDiffError::EmptyReport)
        ));
    }
}
