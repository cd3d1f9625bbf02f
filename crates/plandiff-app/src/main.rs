// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plandiff — visual difference reports for two revisions of a drawing set.
//
// Entry point. Initialises logging, assembles the processing settings, runs
// the page batch and writes the report.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use plandiff_compare::{BatchComparer, BatchOptions};
use plandiff_core::error::Result;
use plandiff_core::human_errors::{Severity, humanize_error};
use plandiff_document::{PageDirectoryPair, ReportWriter, export_pngs};
use tracing::{debug, error, info, warn};

use cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    info!("Plandiff starting");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let human = humanize_error(&err);
            match human.severity {
                Severity::Transient => warn!(error = %err, "comparison interrupted"),
                Severity::ActionRequired | Severity::Permanent => {
                    error!(error = %err, severity = ?human.severity, "comparison failed")
                }
            }
            eprintln!("{}", human.render());
            exit_code(human.severity)
        }
    }
}

/// 1 for bad inputs or settings, 2 for transient failures worth a retry.
fn exit_code(severity: Severity) -> ExitCode {
    match severity {
        Severity::Transient => ExitCode::from(2),
        Severity::ActionRequired | Severity::Permanent => ExitCode::FAILURE,
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.processing_config()?;
    let source = PageDirectoryPair::open(&cli.reference_dir, &cli.modified_dir)?;

    let options = BatchOptions {
        workers: cli.workers,
        max_pages: cli.page_limit(),
    };
    let pages = BatchComparer::new(&config, options).run(&source, |done, total| {
        debug!(done, total, "Progress");
    })?;

    let mut writer = ReportWriter::new(config.dpi);
    writer.set_title(format!(
        "{} vs {}",
        cli.reference_dir.display(),
        cli.modified_dir.display()
    ));
    writer.write_to_file(&pages, &cli.output)?;

    if let Some(dir) = &cli.png_dir {
        export_pngs(&pages, dir)?;
    }

    info!(
        pages = pages.len(),
        report = %cli.output.display(),
        "Comparison complete"
    );
    Ok(())
}
