// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Brute-force Hamming matcher with mutual (cross-check) consistency.

use rayon::prelude::*;

use super::orb::Descriptor;

/// A query descriptor paired with its nearest train descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorMatch {
    pub query: usize,
    pub train: usize,
    pub distance: u32,
}

/// Number of differing bits between two descriptors.
pub fn hamming(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Match every query descriptor to its nearest train descriptor, keeping a
/// pair only when the query is also the train descriptor's nearest query.
pub fn cross_check_match(query: &[Descriptor], train: &[Descriptor]) -> Vec<DescriptorMatch> {
    if query.is_empty() || train.is_empty() {
        return Vec::new();
    }

    let forward: Vec<(usize, u32)> = query.par_iter().map(|q| nearest(q, train)).collect();
    let backward: Vec<(usize, u32)> = train.par_iter().map(|t| nearest(t, query)).collect();

    forward
        .iter()
        .enumerate()
        .filter(|&(query_index, &(train_index, _))| backward[train_index].0 == query_index)
        .map(|(query_index, &(train_index, distance))| DescriptorMatch {
            query: query_index,
            train: train_index,
            distance,
        })
        .collect()
}

/// Keep the best `fraction` of `matches` by distance (stable, floor).
pub fn select_best(mut matches: Vec<DescriptorMatch>, fraction: f32) -> Vec<DescriptorMatch> {
    matches.sort_by_key(|m| m.distance);
    let keep = (matches.len() as f64 * fraction as f64) as usize;
    matches.truncate(keep);
    matches
}

/// Index and distance of the closest candidate; ties keep the lowest index.
fn nearest(descriptor: &Descriptor, candidates: &[Descriptor]) -> (usize, u32) {
    let mut best = (0usize, u32::MAX);
    for (index, candidate) in candidates.iter().enumerate() {
        let distance = hamming(descriptor, candidate);
        if distance < best.1 {
            best = (index, distance);
            if distance == 0 {
                break;
            }
        }
    }
    best
}
