// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface and configuration assembly.

use std::path::PathBuf;

use clap::Parser;
use plandiff_core::ProcessingConfig;
use plandiff_core::error::Result;
use tracing::info;

/// Report file name used when `--output` is not given.
pub const DEFAULT_REPORT_NAME: &str = "Reporte_Diferencias.pdf";

/// Page cap applied when `--max-pages` is not given.
pub const DEFAULT_MAX_PAGES: usize = 50;

#[derive(Parser, Debug)]
#[command(
    name = "plandiff",
    version,
    about = "Highlight what changed between two revisions of a multi-page drawing set",
    long_about = "Compares two directories of rendered page images page by page.\n\
                  Each modified page is registered onto its reference page, then\n\
                  additions are painted green and removals magenta on a faded copy\n\
                  of the reference. The composites are written as one PDF report.",
    after_help = "EXAMPLES:\n  \
                  plandiff rev-a/ rev-b/\n  \
                  plandiff rev-a/ rev-b/ -o changes.pdf --png-dir changes/\n  \
                  plandiff rev-a/ rev-b/ --config plandiff.json --workers 4"
)]
pub struct Cli {
    /// Directory with the reference revision's page images
    pub reference_dir: PathBuf,

    /// Directory with the modified revision's page images
    pub modified_dir: PathBuf,

    /// PDF report to write
    #[arg(short, long, default_value = DEFAULT_REPORT_NAME)]
    pub output: PathBuf,

    /// Also write each composite as a PNG into this directory
    #[arg(long)]
    pub png_dir: Option<PathBuf>,

    /// JSON file with processing settings; missing fields keep their defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Pages compared in parallel (1 = one after another)
    #[arg(long, default_value_t = 1)]
    pub workers: usize,

    /// Compare at most this many pages (0 = no limit)
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: usize,

    /// Override the minimum area a change region must exceed
    #[arg(long)]
    pub min_area: Option<u32>,

    /// Override the resolution the pages were rendered at
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// `None` when the page cap is disabled.
    pub fn page_limit(&self) -> Option<usize> {
        (self.max_pages > 0).then_some(self.max_pages)
    }

    /// Defaults, then the config file, then command-line overrides.
    pub fn processing_config(&self) -> Result<ProcessingConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!(path = %path.display(), "Loading settings");
                ProcessingConfig::from_json(&std::fs::read_to_string(path)?)?
            }
            None => ProcessingConfig::default(),
        };
        if let Some(min_area) = self.min_area {
            config.min_area_noise = min_area;
        }
        if let Some(dpi) = self.dpi {
            config.dpi = dpi;
        }
        config.validate()?;
        Ok(config)
    }
}
