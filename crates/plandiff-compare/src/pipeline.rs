// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page pipeline — resolves which sides of a page exist, then runs
// align -> extract -> clean -> compose for that single page.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use image::{DynamicImage, GenericImageView, RgbImage};
use plandiff_core::error::Result;
use plandiff_core::{PagePresence, ProcessingConfig};
use tracing::{debug, info, instrument, warn};

use crate::align::{self, Alignment, FallbackReason};
use crate::mask::BinaryMask;
use crate::{compose, diff, noise, raster};

/// One side of a page pair.
#[derive(Debug, Clone)]
pub enum PageSlot {
    Present(DynamicImage),
    Absent,
}

impl PageSlot {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Self::Present(image) => Some(image.dimensions()),
            Self::Absent => None,
        }
    }
}

impl From<Option<DynamicImage>> for PageSlot {
    fn from(image: Option<DynamicImage>) -> Self {
        image.map_or(Self::Absent, Self::Present)
    }
}

/// The reference and modified rasters for one page index.
#[derive(Debug, Clone)]
pub struct PagePair {
    pub reference: PageSlot,
    pub modified: PageSlot,
}

impl PagePair {
    pub fn new(reference: Option<DynamicImage>, modified: Option<DynamicImage>) -> Self {
        Self {
            reference: reference.into(),
            modified: modified.into(),
        }
    }

    pub fn presence(&self) -> PagePresence {
        PagePresence::from_flags(self.reference.is_present(), self.modified.is_present())
    }
}

/// How the modified side was brought into the reference frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignmentSummary {
    Aligned { inliers: usize, matches: usize },
    Fallback(FallbackReason),
    /// One side was synthesised blank at the right size; nothing to align.
    Skipped,
}

/// Everything produced for one page.
#[derive(Debug, Clone)]
pub struct PageComparison {
    pub presence: PagePresence,
    pub alignment: AlignmentSummary,
    /// Ghost background with highlights, sized like the reference side.
    pub composite: RgbImage,
    pub added: BinaryMask,
    pub removed: BinaryMask,
}

impl PageComparison {
    pub fn into_composite(self) -> RgbImage {
        self.composite
    }
}

/// Compare one page pair.
///
/// Returns `Ok(None)` when both sides are absent. A missing side is replaced
/// by a white page the size of the present side. Alignment problems, panics
/// included, degrade to the resize fallback; only oversized or empty pages
/// and internal size mismatches are errors.
#[instrument(skip_all, fields(presence = %pair.presence()))]
pub fn compare_page(pair: PagePair, config: &ProcessingConfig) -> Result<Option<PageComparison>> {
    let presence = pair.presence();
    for (width, height) in [pair.reference.dimensions(), pair.modified.dimensions()]
        .into_iter()
        .flatten()
    {
        raster::check_page_budget(width, height, config)?;
    }

    let (reference, modified, alignment) = match (pair.reference, pair.modified) {
        (PageSlot::Absent, PageSlot::Absent) => {
            debug!("Both sides absent, page skipped");
            return Ok(None);
        }
        (PageSlot::Present(reference), PageSlot::Absent) => {
            let reference = raster::to_rgb(&reference);
            let blank = raster::blank_page(reference.width(), reference.height());
            (reference, blank, AlignmentSummary::Skipped)
        }
        (PageSlot::Absent, PageSlot::Present(modified)) => {
            let modified = raster::to_rgb(&modified);
            let blank = raster::blank_page(modified.width(), modified.height());
            (blank, modified, AlignmentSummary::Skipped)
        }
        (PageSlot::Present(reference), PageSlot::Present(modified)) => {
            let reference = raster::to_rgb(&reference);
            let modified = raster::to_rgb(&modified);
            let (width, height) = reference.dimensions();
            let alignment = guarded(&modified, width, height, || {
                align::align(&reference, &modified, config)
            });
            let summary = match &alignment {
                Alignment::Aligned { inliers, matches, .. } => AlignmentSummary::Aligned {
                    inliers: *inliers,
                    matches: *matches,
                },
                Alignment::Fallback { reason, .. } => AlignmentSummary::Fallback(reason.clone()),
            };
            (reference, alignment.into_image(), summary)
        }
    };

    let reference_gray = raster::to_gray(&reference);
    let masks = {
        let modified_gray = raster::to_gray(&modified);
        diff::extract(&reference_gray, &modified_gray, config)?.binarize()
    };
    drop(modified);

    let added = noise::clean(&masks.added, config.min_area_noise);
    let removed = noise::clean(&masks.removed, config.min_area_noise);
    let composite = compose::compose(&reference_gray, &added, &removed, config)?;

    info!(
        width = composite.width(),
        height = composite.height(),
        added = added.count(),
        removed = removed.count(),
        alignment = ?alignment,
        "Page compared"
    );

    Ok(Some(PageComparison {
        presence,
        alignment,
        composite,
        added,
        removed,
    }))
}

/// Run `align_fn`, turning a panic into the resize fallback.
fn guarded<F>(target: &RgbImage, width: u32, height: u32, align_fn: F) -> Alignment
where
    F: FnOnce() -> Alignment,
{
    match panic::catch_unwind(AssertUnwindSafe(align_fn)) {
        Ok(alignment) => alignment,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(%message, "Aligner panicked");
            Alignment::fallback(target, width, height, FallbackReason::InternalFailure(message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
