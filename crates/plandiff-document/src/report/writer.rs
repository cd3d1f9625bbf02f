// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Report writer — assembles page composites into one PDF using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use std::path::Path;

use plandiff_compare::RenderedPage;
use plandiff_core::error::{PlanDiffError, Result};
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

const MM_PER_INCH: f32 = 25.4;

/// Builds a multi-page difference report, one composite per PDF page.
///
/// Each page is sized so the composite is shown at exactly the resolution it
/// was rasterised at.
pub struct ReportWriter {
    /// Resolution of the composites in dots per inch.
    dpi: u32,
    /// Title metadata embedded in the PDF /Info dictionary.
    title: Option<String>,
}

impl ReportWriter {
    pub fn new(dpi: u32) -> Self {
        Self {
            dpi: dpi.max(1),
            title: None,
        }
    }

    /// Set a title for the PDF metadata.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Physical page size for a raster of `width` x `height` pixels.
    fn page_dimensions(&self, width: u32, height: u32) -> (Mm, Mm) {
        let dpi = self.dpi as f32;
        (
            Mm(width as f32 / dpi * MM_PER_INCH),
            Mm(height as f32 / dpi * MM_PER_INCH),
        )
    }

    // -- Report assembly ------------------------------------------------------

    /// Create the PDF bytes for `pages`, in the order given.
    ///
    /// Fails with [`PlanDiffError::EmptyReport`] when there is nothing to
    /// assemble.
    #[instrument(skip(self, pages), fields(pages = pages.len(), dpi = self.dpi))]
    pub fn create(&self, pages: &[RenderedPage]) -> Result<Vec<u8>> {
        if pages.is_empty() {
            return Err(PlanDiffError::EmptyReport);
        }
        let title = self.title.as_deref().unwrap_or("Plandiff Report");
        info!(title, "Creating difference report");

        let mut doc = PdfDocument::new(title);
        let mut pdf_pages: Vec<PdfPage> = Vec::with_capacity(pages.len());

        for page in pages {
            let (width, height) = page.image.dimensions();
            if width == 0 || height == 0 {
                return Err(PlanDiffError::PdfError(format!(
                    "page {} has no pixels",
                    page.index + 1
                )));
            }
            let raw = RawImage {
                pixels: RawImageData::U8(page.image.as_raw().clone()),
                width: width as usize,
                height: height as usize,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            };
            let xobject_id = doc.add_image(&raw);

            let (page_w, page_h) = self.page_dimensions(width, height);
            let ops = vec![Op::UseXobject {
                id: xobject_id,
                transform: XObjectTransform {
                    translate_x: Some(Pt(0.0)),
                    translate_y: Some(Pt(0.0)),
                    scale_x: None,
                    scale_y: None,
                    dpi: Some(self.dpi as f32),
                    rotate: None,
                },
            }];
            pdf_pages.push(PdfPage::new(page_w, page_h, ops));
            debug!(index = page.index, width, height, "Page placed");
        }

        doc.with_pages(pdf_pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!(count = warnings.len(), "printpdf reported warnings");
        }

        info!(bytes = output.len(), "Report assembled");
        Ok(output)
    }

    // -- File output convenience ----------------------------------------------

    /// Create the report and write it directly to a file.
    pub fn write_to_file(&self, pages: &[RenderedPage], path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.create(pages)?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!("Wrote report to {}", path.as_ref().display());
        Ok(())
    }
}
