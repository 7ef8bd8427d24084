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

//! Test the unit conversions and the TGax path-loss model.

use approx::assert_relative_eq;
use test_log::test;

use crate::units::{dbm_to_lin, lin_to_dbm, positions_to_path_loss, tgax_path_loss};

#[test]
fn conversions_round_trip() {
    for x in [-93.97, -30.0, -10.0, 0.0, 10.0, 20.0, 36.5] {
        assert_relative_eq!(lin_to_dbm(dbm_to_lin(x)), x, epsilon = 1e-12);
    }
    for x in [1e-10, 1e-3, 0.5, 1.0, 100.0, 12345.6] {
        assert_relative_eq!(dbm_to_lin(lin_to_dbm(x)), x, max_relative = 1e-12);
    }
}

#[test]
fn free_space_up_to_the_breakpoint() {
    let reference = 40.05 + 20.0 * (5.16 / 2.4f64).log10();
    assert_relative_eq!(tgax_path_loss(1.0, 0.0), reference, epsilon = 1e-9);
    // the free-space term grows by 20 dB per decade
    assert_relative_eq!(tgax_path_loss(10.0, 0.0), reference + 20.0, epsilon = 1e-9);
}

#[test]
fn steeper_slope_beyond_the_breakpoint() {
    let at_breakpoint = tgax_path_loss(10.0, 0.0);
    // beyond the breakpoint, an additional 35 dB per decade applies
    assert_relative_eq!(tgax_path_loss(100.0, 0.0), at_breakpoint + 35.0, epsilon = 1e-9);
}

#[test]
fn every_wall_attenuates() {
    let free = tgax_path_loss(5.0, 0.0);
    assert_relative_eq!(tgax_path_loss(5.0, 1.0), free + 7.0, epsilon = 1e-9);
    assert_relative_eq!(tgax_path_loss(5.0, 2.0), free + 14.0, epsilon = 1e-9);
}

#[test]
fn distances_clipped_at_the_reference() {
    let pos = [[0.0, 0.0], [0.2, 0.0]];
    let walls = vec![vec![0.0; 2]; 2];
    let pl = positions_to_path_loss(&pos, &walls);
    // both the short distance and the diagonal are clipped to 1 m
    assert_relative_eq!(pl[0][1], tgax_path_loss(1.0, 0.0), epsilon = 1e-9);
    assert_relative_eq!(pl[0][0], tgax_path_loss(1.0, 0.0), epsilon = 1e-9);
    assert_relative_eq!(pl[0][1], pl[1][0], epsilon = 1e-9);
}
