// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for reviewers running a comparison.
//
// Every technical error is mapped to plain English with a clear suggestion.

use crate::error::PlanDiffError;

/// Severity of an error from the reviewer's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Something outside our control hiccupped; running again may work.
    Transient,
    /// The reviewer must change an input or a setting.
    ActionRequired,
    /// The inputs cannot be compared as given.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the reviewer should try.
    pub suggestion: String,
    /// Whether simply running again could help.
    pub retriable: bool,
    pub severity: Severity,
}

impl HumanError {
    /// Terminal text: heading, indented suggestion and, when it applies, a
    /// hint that running again may work.
    pub fn render(&self) -> String {
        let mut text = format!("{}\n  {}", self.message, self.suggestion);
        if self.retriable {
            text.push_str("\n  Running the comparison again may fix this.");
        }
        text
    }
}

/// Convert a `PlanDiffError` into a `HumanError`.
pub fn humanize_error(err: &PlanDiffError) -> HumanError {
    match err {
        PlanDiffError::InvalidInput(detail) => HumanError {
            message: "The pages could not be compared.".into(),
            suggestion: format!("Check that both page sets are readable images. ({detail})"),
            retriable: false,
            severity: Severity::Permanent,
        },

        PlanDiffError::InvalidConfig(detail) => HumanError {
            message: "The comparison settings are not valid.".into(),
            suggestion: format!("Fix the setting and run again: {detail}"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PlanDiffError::ResourceExhausted { limit, .. } => HumanError {
            message: "A page is too large to compare.".into(),
            suggestion: format!(
                "Rasterise the documents at a lower resolution so each page stays under {limit} pixels."
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PlanDiffError::Cancelled { completed } => HumanError {
            message: "The comparison was stopped.".into(),
            suggestion: format!("{completed} pages were finished before stopping. Run again to produce a report."),
            retriable: true,
            severity: Severity::Transient,
        },

        PlanDiffError::EmptyReport => HumanError {
            message: "No pages were found to compare.".into(),
            suggestion: "Make sure both folders contain page images (PNG, JPEG, TIFF or BMP).".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        PlanDiffError::ImageError(_) => HumanError {
            message: "There's a problem with one of the page images.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try exporting the pages as PNG again.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        PlanDiffError::PdfError(_) => HumanError {
            message: "The difference report could not be written.".into(),
            suggestion: "Try writing the pages as PNG files instead with --png-dir.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        PlanDiffError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "A file or folder couldn't be found.".into(),
                    suggestion: "Check the paths you passed and try again.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Plandiff doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or choose a different output location.".into(),
                    retriable: false,
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, the disk may be full.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        PlanDiffError::Serialization(_) => HumanError {
            message: "The settings file could not be read.".into(),
            suggestion: "Check that the settings file is valid JSON.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}
