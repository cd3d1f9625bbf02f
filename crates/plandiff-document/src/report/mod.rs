// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Report module — multi-page PDF assembly and PNG export of page composites.

pub mod png;
pub mod writer;

pub use png::export_pngs;
pub use writer::ReportWriter;
