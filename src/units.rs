// mapc-csr: throughput-optimal scheduling for Wi-Fi coordinated spatial reuse
// Copyright (C) 2024 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Unit conversions and the TGax path-loss model.
//!
//! The solver itself only consumes a path-loss matrix and is independent of any channel model.
//! [`positions_to_path_loss`] is a convenience for callers that do not bring their own model.

use crate::constants::{BREAKING_POINT, CENTRAL_FREQUENCY, REFERENCE_DISTANCE, WALL_LOSS};

/// Convert a value in dBm (or dB) to linear scale.
pub fn dbm_to_lin(x: f64) -> f64 {
    10f64.powf(x / 10.0)
}

/// Convert a value in linear scale to dBm (or dB).
pub fn lin_to_dbm(x: f64) -> f64 {
    10.0 * x.log10()
}

/// Path loss in dB of the TGax channel model for the given distance (in meters) and number of
/// walls between the two nodes.
///
/// Up to the breakpoint distance, the loss follows the free-space term
/// `40.05 + 20 log10(d * f_c / 2.4)`. Beyond the breakpoint, an additional `35 log10(d / 10)`
/// applies. Each wall adds a fixed attenuation.
pub fn tgax_path_loss(distance: f64, walls: f64) -> f64 {
    let mut pl = 40.05 + 20.0 * (distance.min(BREAKING_POINT) * CENTRAL_FREQUENCY / 2.4).log10();
    if distance > BREAKING_POINT {
        pl += 35.0 * (distance / BREAKING_POINT).log10();
    }
    pl + WALL_LOSS * walls
}

/// Compute the path loss in dB between all pairs of nodes from their positions and the wall
/// adjacency matrix.
///
/// Row `i` of `pos` holds the x and y coordinates of node `i`, and `walls[i][j]` the number of
/// walls between nodes `i` and `j` (usually 0 or 1). Distances are clipped below at the reference
/// distance of 1 m.
///
/// # Panics
/// Panics if `walls` is not an `n x n` matrix for `n` positions.
pub fn positions_to_path_loss(pos: &[[f64; 2]], walls: &[Vec<f64>]) -> Vec<Vec<f64>> {
    assert_eq!(walls.len(), pos.len(), "wall matrix must have one row per node");
    pos.iter()
        .enumerate()
        .map(|(i, a)| {
            assert_eq!(walls[i].len(), pos.len(), "wall matrix must have one column per node");
            pos.iter()
                .enumerate()
                .map(|(j, b)| {
                    let distance = ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2))
                        .sqrt()
                        .max(REFERENCE_DISTANCE);
                    tgax_path_loss(distance, walls[i][j])
                })
                .collect()
        })
        .collect()
}
