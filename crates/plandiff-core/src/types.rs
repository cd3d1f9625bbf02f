// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types shared by the engine and its collaborators.

use serde::{Deserialize, Serialize};

/// An 8-bit RGB highlight colour. Serialised as `[r, g, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HighlightColor(pub [u8; 3]);

impl HighlightColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    pub fn channels(&self) -> [u8; 3] {
        self.0
    }
}

/// Which sides of a page pair carry a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PagePresence {
    /// Both revisions have this page; it goes through registration.
    BothPresent,
    /// Only the reference has this page; everything on it reads as removed.
    ReferenceOnly,
    /// Only the modified revision has this page; everything reads as added.
    ModifiedOnly,
    /// Neither revision has this page; no result is produced.
    BothAbsent,
}

impl PagePresence {
    pub fn from_flags(reference: bool, modified: bool) -> Self {
        match (reference, modified) {
            (true, true) => Self::BothPresent,
            (true, false) => Self::ReferenceOnly,
            (false, true) => Self::ModifiedOnly,
            (false, false) => Self::BothAbsent,
        }
    }
}

impl std::fmt::Display for PagePresence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::BothPresent => "both-present",
            Self::ReferenceOnly => "reference-only",
            Self::ModifiedOnly => "modified-only",
            Self::BothAbsent => "both-absent",
        };
        f.write_str(label)
    }
}
