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

//! Test the problem-data builder: link admission, association, the interference bounds, and the
//! input validation.

use approx::assert_relative_eq;
use maplit::hashmap;
use test_log::test;

use super::builder::path_loss_without_walls;
use crate::solver::data::{InputError, Link, Phy, ProblemData};
use crate::units::dbm_to_lin;
use crate::SolverOptions;

/// Physical-layer parameters with the default options.
fn phy() -> Phy {
    Phy::from_options(&SolverOptions::default()).unwrap()
}

#[test]
fn stations_associate_to_the_nearest_access_point() {
    // the station (id 2) is 10 m from AP 0 and 20 m from AP 1
    let pos = [[0.0, 0.0], [30.0, 0.0], [10.0, 0.0]];
    let pl = path_loss_without_walls(&pos);
    let data = ProblemData::build(&[2], &[0, 1], &pl, None, phy()).unwrap();
    assert_eq!(data.links, vec![Link { ap: 0, sta: 2 }]);
}

#[test]
fn explicit_associations_override_the_default() {
    let pos = [[0.0, 0.0], [30.0, 0.0], [10.0, 0.0]];
    let pl = path_loss_without_walls(&pos);
    let associations = hashmap! { 1 => vec![2] };
    let data = ProblemData::build(&[2], &[0, 1], &pl, Some(&associations), phy()).unwrap();
    assert_eq!(data.links, vec![Link { ap: 1, sta: 2 }]);
}

#[test]
fn unreachable_stations_get_no_link() {
    // at 150 m, even the lowest MCS fails against noise alone
    let pos = [[0.0, 0.0], [150.0, 0.0]];
    let pl = path_loss_without_walls(&pos);
    let data = ProblemData::build(&[1], &[0], &pl, None, phy()).unwrap();
    assert!(data.links.is_empty());
}

#[test]
fn interference_bounds_match_the_worst_case() {
    let pos = [[0.0, 0.0], [30.0, 0.0], [10.0, 0.0], [25.0, 0.0]];
    let pl_db = path_loss_without_walls(&pos);
    let data = ProblemData::build(&[2, 3], &[0, 1], &pl_db, None, phy()).unwrap();
    let phy = phy();

    for (l, link) in data.links.iter().enumerate() {
        // the bound is reached when every other access point transmits at maximum power
        let pl = dbm_to_lin(pl_db[link.ap][link.sta]);
        let worst_case: f64 = data
            .access_points
            .iter()
            .filter(|&&a| a != link.ap)
            .map(|&a| phy.max_tx_power / dbm_to_lin(pl_db[a][link.sta]))
            .sum();
        for (m, &sinr) in phy.min_sinr.iter().enumerate() {
            let expected = sinr * pl * (worst_case + phy.noise_floor);
            assert_relative_eq!(data.max_interference[l][m], expected, max_relative = 1e-9);
        }
        // the thresholds grow with the MCS, and so must the bounds
        for m in 1..phy.min_sinr.len() {
            assert!(data.max_interference[l][m] > data.max_interference[l][m - 1]);
        }
    }
}

#[test]
fn node_ids_must_be_unique_and_contiguous() {
    let pos = [[0.0, 0.0], [5.0, 0.0], [10.0, 0.0]];
    let pl = path_loss_without_walls(&pos);

    assert_eq!(
        ProblemData::build(&[1, 1], &[0], &pl, None, phy()).unwrap_err(),
        InputError::DuplicateNodeId(1)
    );
    assert_eq!(
        ProblemData::build(&[5], &[0], &pl, None, phy()).unwrap_err(),
        InputError::NodeIdOutOfRange { id: 5, n: 2 }
    );
}

#[test]
fn path_loss_matrix_must_match_the_node_count() {
    let pos = [[0.0, 0.0], [5.0, 0.0]];
    let pl = path_loss_without_walls(&pos);
    assert_eq!(
        ProblemData::build(&[1, 2], &[0], &pl, None, phy()).unwrap_err(),
        InputError::PathLossShape {
            expected: 3,
            found: 2
        }
    );
}

#[test]
fn associations_must_be_consistent() {
    let pos = [[0.0, 0.0], [5.0, 0.0], [10.0, 0.0]];
    let pl = path_loss_without_walls(&pos);

    let unknown_ap = hashmap! { 2 => vec![2] };
    assert_eq!(
        ProblemData::build(&[2], &[0, 1], &pl, Some(&unknown_ap), phy()).unwrap_err(),
        InputError::UnknownAccessPoint(2)
    );

    let unknown_sta = hashmap! { 0 => vec![1] };
    assert_eq!(
        ProblemData::build(&[2], &[0, 1], &pl, Some(&unknown_sta), phy()).unwrap_err(),
        InputError::UnknownStation(1)
    );

    let reassociated = hashmap! { 0 => vec![2], 1 => vec![2] };
    assert_eq!(
        ProblemData::build(&[2], &[0, 1], &pl, Some(&reassociated), phy()).unwrap_err(),
        InputError::StationReassociated(2)
    );
}

#[test]
fn mcs_tables_are_validated() {
    let empty = SolverOptions {
        mcs_data_rates: vec![],
        min_snr: vec![],
        ..Default::default()
    };
    assert!(matches!(
        Phy::from_options(&empty),
        Err(InputError::McsTable(_))
    ));

    let mismatched = SolverOptions {
        mcs_data_rates: vec![8.6, 17.2],
        min_snr: vec![10.0],
        ..Default::default()
    };
    assert!(matches!(
        Phy::from_options(&mismatched),
        Err(InputError::McsTable(_))
    ));

    let decreasing = SolverOptions {
        mcs_data_rates: vec![17.2, 8.6],
        min_snr: vec![10.0, 12.0],
        ..Default::default()
    };
    assert!(matches!(
        Phy::from_options(&decreasing),
        Err(InputError::McsTable(_))
    ));
}

#[test]
fn best_noise_limited_mcs() {
    let phy = phy();
    // at 1 m everything is feasible, far out nothing is
    let close = dbm_to_lin(46.7);
    assert_eq!(phy.best_mcs(close), Some(phy.min_sinr.len() - 1));
    let far = dbm_to_lin(140.0);
    assert_eq!(phy.best_mcs(far), None);
    assert!(!phy.tx_possible(far));
}
