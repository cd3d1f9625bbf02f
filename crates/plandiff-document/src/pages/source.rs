// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page pairing — lines up two revisions page by page and feeds the batch
// driver one decoded pair at a time.

use std::path::{Path, PathBuf};

use plandiff_compare::{PagePair, PageSource};
use plandiff_core::error::{PlanDiffError, Result};
use tracing::{debug, info, instrument, warn};

use super::loader::{list_page_files, open_page};

/// Pair two page lists by index, padding the shorter one with `None` at the
/// tail so both sides have the same length.
pub fn pair_pages<T>(reference: Vec<T>, modified: Vec<T>) -> Vec<(Option<T>, Option<T>)> {
    let len = reference.len().max(modified.len());
    let mut reference = reference.into_iter();
    let mut modified = modified.into_iter();
    (0..len).map(|_| (reference.next(), modified.next())).collect()
}

/// Two directories of page images, compared page by page.
///
/// Pages are decoded only when the batch asks for them, so at most one pair
/// per worker is resident.
#[derive(Debug, Clone)]
pub struct PageDirectoryPair {
    pairs: Vec<(Option<PathBuf>, Option<PathBuf>)>,
}

impl PageDirectoryPair {
    /// List both directories and pair their page files.
    #[instrument(skip_all, fields(
        reference = %reference_dir.as_ref().display(),
        modified = %modified_dir.as_ref().display(),
    ))]
    pub fn open(reference_dir: impl AsRef<Path>, modified_dir: impl AsRef<Path>) -> Result<Self> {
        let reference = list_page_files(reference_dir)?;
        let modified = list_page_files(modified_dir)?;
        if reference.len() != modified.len() {
            warn!(
                reference = reference.len(),
                modified = modified.len(),
                "Page counts differ; missing pages are treated as blank"
            );
        }
        Ok(Self::from_files(reference, modified))
    }

    /// Pair explicit file lists.
    pub fn from_files(reference: Vec<PathBuf>, modified: Vec<PathBuf>) -> Self {
        let pairs = pair_pages(reference, modified);
        info!(pages = pairs.len(), "Page pairs prepared");
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl PageSource for PageDirectoryPair {
    fn page_count(&self) -> usize {
        self.pairs.len()
    }

    fn load(&self, index: usize) -> Result<PagePair> {
        let (reference, modified) = self
            .pairs
            .get(index)
            .ok_or_else(|| PlanDiffError::InvalidInput(format!("page {index} is out of range")))?;
        debug!(index, "Decoding page pair");
        let reference = reference.as_ref().map(open_page).transpose()?;
        let modified = modified.as_ref().map(open_page).transpose()?;
        Ok(PagePair::new(reference, modified))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use plandiff_core::PagePresence;

    #[test]
    fn shorter_side_is_padded_at_the_tail() {
        let pairs = pair_pages(vec![1, 2, 3], vec![10]);
        assert_eq!(pairs, vec![(Some(1), Some(10)), (Some(2), None), (Some(3), None)]);
        assert!(pair_pages(Vec::<u8>::new(), Vec::new()).is_empty());
    }

    #[test]
    fn directories_become_lazy_page_pairs() {
        let reference = tempfile::tempdir().unwrap();
        let modified = tempfile::tempdir().unwrap();
        let page = GrayImage::from_pixel(12, 9, Luma([255u8]));
        page.save(reference.path().join("p1.png")).unwrap();
        page.save(reference.path().join("p2.png")).unwrap();
        page.save(modified.path().join("p1.png")).unwrap();

        let source = PageDirectoryPair::open(reference.path(), modified.path()).unwrap();
        assert_eq!(source.page_count(), 2);
        assert_eq!(source.load(0).unwrap().presence(), PagePresence::BothPresent);
        assert_eq!(source.load(1).unwrap().presence(), PagePresence::ReferenceOnly);
        assert!(matches!(source.load(2), Err(PlanDiffError::InvalidInput(_))));
    }

    #[test]
    fn unreadable_page_surfaces_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("broken.png");
        std::fs::write(&bogus, b"not a png").unwrap();

        let source = PageDirectoryPair::from_files(vec![bogus], Vec::new());
        assert_eq!(source.len(), 1);
        assert!(matches!(source.load(0), Err(PlanDiffError::ImageError(_))));
    }
}
