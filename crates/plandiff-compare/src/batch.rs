// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch driver — runs the page pipeline over every page index, sequentially
// or on a bounded rayon pool, with cancellation between pages.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::RgbImage;
use plandiff_core::ProcessingConfig;
use plandiff_core::error::{PlanDiffError, Result};
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use crate::pipeline::{self, PagePair};

/// Shared flag used to stop a batch between pages.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Supplies page pairs on demand, so only the pages currently being compared
/// are resident.
pub trait PageSource: Sync {
    /// Number of page indices, after padding the shorter document.
    fn page_count(&self) -> usize;

    /// Materialise the pair for `index`. Called at most once per index.
    fn load(&self, index: usize) -> Result<PagePair>;
}

/// A [`PageSource`] over pairs that are already decoded.
#[derive(Debug)]
pub struct InMemoryPages {
    pages: Mutex<Vec<Option<PagePair>>>,
}

impl InMemoryPages {
    pub fn new(pages: Vec<PagePair>) -> Self {
        Self {
            pages: Mutex::new(pages.into_iter().map(Some).collect()),
        }
    }
}

impl PageSource for InMemoryPages {
    fn page_count(&self) -> usize {
        self.pages.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn load(&self, index: usize) -> Result<PagePair> {
        let mut pages = self.pages.lock().unwrap_or_else(|e| e.into_inner());
        pages
            .get_mut(index)
            .and_then(Option::take)
            .ok_or_else(|| PlanDiffError::InvalidInput(format!("page {index} is not available")))
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Worker threads; `0` or `1` runs the pages one after another.
    pub workers: usize,
    /// Compare at most this many page indices.
    pub max_pages: Option<usize>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            max_pages: None,
        }
    }
}

/// The composite for one page index.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub index: usize,
    pub image: RgbImage,
}

/// Drives [`pipeline::compare_page`] over a whole document pair.
pub struct BatchComparer<'a> {
    config: &'a ProcessingConfig,
    options: BatchOptions,
    cancel: CancellationToken,
}

impl<'a> BatchComparer<'a> {
    pub fn new(config: &'a ProcessingConfig, options: BatchOptions) -> Self {
        Self {
            config,
            options,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Compare every page of `source` and return the composites in page
    /// order. Indices with both sides absent are omitted. `progress(done,
    /// total)` is called after each page.
    ///
    /// Cancellation is honoured before a page starts; a cancelled batch
    /// returns [`PlanDiffError::Cancelled`] and no pages at all.
    #[instrument(skip_all, fields(workers = self.options.workers))]
    pub fn run<S, P>(&self, source: &S, progress: P) -> Result<Vec<RenderedPage>>
    where
        S: PageSource + ?Sized,
        P: Fn(usize, usize) + Sync,
    {
        let available = source.page_count();
        let total = match self.options.max_pages {
            Some(limit) if limit < available => {
                warn!(available, limit, "Page limit reached; remaining pages are not compared");
                limit
            }
            _ => available,
        };
        info!(total, "Batch started");

        let done = AtomicUsize::new(0);
        let run_page = |index: usize| -> Result<Option<RenderedPage>> {
            if self.cancel.is_cancelled() {
                return Err(PlanDiffError::Cancelled {
                    completed: done.load(Ordering::SeqCst),
                });
            }
            let pair = source.load(index)?;
            let rendered = pipeline::compare_page(pair, self.config)?.map(|comparison| RenderedPage {
                index,
                image: comparison.into_composite(),
            });
            let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
            progress(finished, total);
            Ok(rendered)
        };

        let pages: Vec<Option<RenderedPage>> = if self.options.workers <= 1 {
            (0..total).map(run_page).collect::<Result<_>>()?
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.workers)
                .build()
                .map_err(|e| PlanDiffError::InvalidConfig(format!("worker pool: {e}")))?;
            pool.install(|| (0..total).into_par_iter().map(run_page).collect::<Result<_>>())?
        };

        let pages: Vec<RenderedPage> = pages.into_iter().flatten().collect();
        info!(total, rendered = pages.len(), "Batch finished");
        Ok(pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::square_page;
    use image::{DynamicImage, GrayImage, Luma};

    fn blank() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(48, 48, Luma([255])))
    }

    /// Page `i` carries a square whose side encodes the index, on the modified side.
    fn numbered_pages(count: usize) -> Vec<PagePair> {
        (0..count)
            .map(|i| {
                let side = 4 + i as u32;
                PagePair::new(
                    Some(blank()),
                    Some(DynamicImage::ImageLuma8(square_page(48, 10, 10, side))),
                )
            })
            .collect()
    }

    fn green_pixels(image: &RgbImage) -> usize {
        image.pixels().filter(|p| p.0 == [0, 200, 0]).count()
    }

    #[test]
    fn parallel_run_keeps_page_order() {
        let config = ProcessingConfig::default();
        let source = InMemoryPages::new(numbered_pages(8));
        let options = BatchOptions {
            workers: 4,
            max_pages: None,
        };
        let pages = BatchComparer::new(&config, options).run(&source, |_, _| {}).unwrap();

        assert_eq!(pages.len(), 8);
        for (i, page) in pages.iter().enumerate() {
            assert_eq!(page.index, i);
            let side = 4 + i;
            assert_eq!(green_pixels(&page.image), side * side);
        }
    }

    #[test]
    fn both_absent_indices_are_omitted() {
        let config = ProcessingConfig::default();
        let mut pairs = numbered_pages(3);
        pairs.insert(1, PagePair::new(None, None));
        let source = InMemoryPages::new(pairs);

        let pages = BatchComparer::new(&config, BatchOptions::default())
            .run(&source, |_, _| {})
            .unwrap();
        let indices: Vec<usize> = pages.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 2, 3]);
    }

    #[test]
    fn progress_reports_every_page() {
        let config = ProcessingConfig::default();
        let source = InMemoryPages::new(numbered_pages(5));
        let calls = Mutex::new(Vec::new());
        BatchComparer::new(&config, BatchOptions::default())
            .run(&source, |done, total| calls.lock().unwrap().push((done, total)))
            .unwrap();
        assert_eq!(
            calls.into_inner().unwrap(),
            vec![(1, 5), (2, 5), (3, 5), (4, 5), (5, 5)]
        );
    }

    #[test]
    fn max_pages_truncates_the_batch() {
        let config = ProcessingConfig::default();
        let source = InMemoryPages::new(numbered_pages(6));
        let options = BatchOptions {
            workers: 1,
            max_pages: Some(2),
        };
        let pages = BatchComparer::new(&config, options).run(&source, |_, _| {}).unwrap();
        assert_eq!(pages.len(), 2);
    }

    #[test]
    fn cancellation_before_start_produces_nothing() {
        let config = ProcessingConfig::default();
        let source = InMemoryPages::new(numbered_pages(3));
        let token = CancellationToken::new();
        token.cancel();

        let result = BatchComparer::new(&config, BatchOptions::default())
            .with_cancellation(token)
            .run(&source, |_, _| {});
        assert!(matches!(result, Err(PlanDiffError::Cancelled { completed: 0 })));
    }

    #[test]
    fn cancellation_takes_effect_between_pages() {
        let config = ProcessingConfig::default();
        let source = InMemoryPages::new(numbered_pages(4));
        let token = CancellationToken::new();
        let trigger = token.clone();

        let result = BatchComparer::new(&config, BatchOptions::default())
            .with_cancellation(token)
            .run(&source, move |done, _| {
                if done == 2 {
                    trigger.cancel();
                }
            });
        assert!(matches!(result, Err(PlanDiffError::Cancelled { completed: 2 })));
    }

    #[test]
    fn cancellation_stops_a_parallel_batch() {
        let config = ProcessingConfig::default();
        let pairs = (0..64).map(|_| PagePair::new(Some(blank()), Some(blank()))).collect();
        let source = InMemoryPages::new(pairs);
        let token = CancellationToken::new();
        let trigger = token.clone();
        let options = BatchOptions {
            workers: 4,
            max_pages: None,
        };

        let result = BatchComparer::new(&config, options)
            .with_cancellation(token)
            .run(&source, move |_, _| trigger.cancel());
        match result {
            Err(PlanDiffError::Cancelled { completed }) => {
                assert!((1..64).contains(&completed), "{completed} pages completed")
            }
            other => panic!("expected cancellation, got {other:?}"),
        }
    }

    #[test]
    fn oversized_page_aborts_the_batch() {
        let config = ProcessingConfig {
            max_page_pixels: 100,
            ..ProcessingConfig::default()
        };
        let source = InMemoryPages::new(numbered_pages(2));
        let result = BatchComparer::new(&config, BatchOptions::default()).run(&source, |_, _| {});
        assert!(matches!(result, Err(PlanDiffError::ResourceExhausted { .. })));
    }

    #[test]
    fn pages_are_handed_out_once() {
        let source = InMemoryPages::new(numbered_pages(1));
        assert_eq!(source.page_count(), 1);
        assert!(source.load(0).is_ok());
        assert!(matches!(source.load(0), Err(PlanDiffError::InvalidInput(_))));
        assert!(source.load(7).is_err());
    }
}
