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

//! End-to-end tests of the column-generation solver.

use approx::assert_relative_eq;
use test_log::test;

use super::builder::{assert_schedule_valid, path_loss_without_walls, square_of_four};
use crate::{Solver, SolverOptions};

/// Two cells that interfere strongly: a station at 1 m of its access point, and a weaker one at
/// 25 m of the second access point 10 m away. Concurrent transmission is infeasible, so the two
/// links can only share time.
fn strong_and_weak_cell() -> (Vec<usize>, Vec<usize>, Vec<Vec<f64>>) {
    let pos = [[0.0, 0.0], [10.0, 0.0], [0.0, 1.0], [10.0, 25.0]];
    (vec![2, 3], vec![0, 1], path_loss_without_walls(&pos))
}

#[test]
fn square_of_four_total_throughput() {
    let (stations, access_points, path_loss) = square_of_four(100.0, 2.0);
    let options = SolverOptions {
        opt_sum: true,
        ..Default::default()
    };
    let solver = Solver::with_options(stations, access_points, options.clone()).unwrap();
    let schedule = solver.solve(&path_loss, None).unwrap();

    assert!(*schedule.pricing_objectives.last().unwrap() < 1e-5);
    assert!(
        schedule.total_rate > 550.0 && schedule.total_rate < 600.0,
        "aggregate rate {} lies outside the expected envelope",
        schedule.total_rate
    );
    assert_schedule_valid(&schedule, &path_loss, &options);
}

#[test]
fn square_of_four_worst_case_throughput() {
    let (stations, access_points, path_loss) = square_of_four(100.0, 2.0);
    let options = SolverOptions::default();
    let solver = Solver::with_options(stations.clone(), access_points, options.clone()).unwrap();
    let schedule = solver.solve(&path_loss, None).unwrap();

    assert!(*schedule.pricing_objectives.last().unwrap() < 1e-5);
    assert!(
        schedule.total_rate > 550.0 && schedule.total_rate < 600.0,
        "aggregate rate {} lies outside the expected envelope",
        schedule.total_rate
    );
    // the scenario is symmetric, so every station gets the same rate
    for &s in stations.iter() {
        assert!(
            schedule.station_rates[&s] > 30.0,
            "station {s} only gets {} Mb/s",
            schedule.station_rates[&s]
        );
    }
    assert_schedule_valid(&schedule, &path_loss, &options);
}

#[test]
fn isolated_cells_reach_the_top_rate() {
    // two AP/STA pairs so far apart that they do not interfere at all
    let pos = [[0.0, 0.0], [1e4, 0.0], [0.0, 1.0], [1e4, 1.0]];
    let path_loss = path_loss_without_walls(&pos);
    let options = SolverOptions::default();
    let solver = Solver::with_options(vec![2, 3], vec![0, 1], options.clone()).unwrap();
    let schedule = solver.solve(&path_loss, None).unwrap();

    // the generator discovers the configuration with both links active, so both stations
    // transmit all the time at the highest MCS
    assert_relative_eq!(schedule.station_rates[&2], 143.2, max_relative = 1e-3);
    assert_relative_eq!(schedule.station_rates[&3], 143.2, max_relative = 1e-3);
    assert_relative_eq!(schedule.total_rate, 2.0 * 143.2, max_relative = 1e-3);
    assert_schedule_valid(&schedule, &path_loss, &options);
}

#[test]
fn unreachable_station_yields_an_empty_schedule() {
    let pos = [[0.0, 0.0], [150.0, 0.0]];
    let path_loss = path_loss_without_walls(&pos);
    let solver = Solver::new(vec![1], vec![0]).unwrap();
    let schedule = solver.solve(&path_loss, None).unwrap();

    assert!(schedule.is_empty());
    assert_eq!(schedule.total_rate, 0.0);
    assert!(schedule.pricing_objectives.is_empty());
}

#[test]
fn worst_case_objective_equalises_the_stations() {
    let (stations, access_points, path_loss) = strong_and_weak_cell();
    let options = SolverOptions::default();
    let solver = Solver::with_options(stations, access_points, options.clone()).unwrap();
    let schedule = solver.solve(&path_loss, None).unwrap();

    let strong = schedule.station_rates[&2];
    let weak = schedule.station_rates[&3];
    // time sharing balances the two stations at 143.2 * 114.7 / (143.2 + 114.7)
    assert!((strong - weak).abs() < 0.5, "rates {strong} and {weak} differ");
    assert!(strong > 60.0 && strong < 67.0, "unexpected rate {strong}");
    assert_schedule_valid(&schedule, &path_loss, &options);
}

#[test]
fn total_throughput_objective_starves_the_weak_station() {
    let (stations, access_points, path_loss) = strong_and_weak_cell();
    let options = SolverOptions {
        opt_sum: true,
        min_throughput: 0.0,
        ..Default::default()
    };
    let solver = Solver::with_options(stations, access_points, options.clone()).unwrap();
    let schedule = solver.solve(&path_loss, None).unwrap();

    assert!(schedule.station_rates[&2] > 140.0);
    assert!(schedule.station_rates[&3] < 1.0);
    assert_schedule_valid(&schedule, &path_loss, &options);
}

#[test]
fn total_throughput_dominates_the_worst_case_schedule() {
    let (stations, access_points, path_loss) = strong_and_weak_cell();

    let max_min = Solver::new(stations.clone(), access_points.clone()).unwrap();
    let max_min_rate = max_min.solve(&path_loss, None).unwrap().total_rate;

    let options = SolverOptions {
        opt_sum: true,
        ..Default::default()
    };
    let max_sum = Solver::with_options(stations, access_points, options).unwrap();
    let max_sum_rate = max_sum.solve(&path_loss, None).unwrap().total_rate;

    assert!(
        max_sum_rate > max_min_rate + 10.0,
        "expected the total-throughput objective ({max_sum_rate}) to clearly dominate \
         the worst-case one ({max_min_rate})"
    );
}

#[test]
fn looser_tolerance_terminates_no_later() {
    let (stations, access_points, path_loss) = square_of_four(100.0, 2.0);

    let tight_options = SolverOptions {
        opt_sum: true,
        ..Default::default()
    };
    let tight = Solver::with_options(stations.clone(), access_points.clone(), tight_options)
        .unwrap()
        .solve(&path_loss, None)
        .unwrap();

    let loose_options = SolverOptions {
        opt_sum: true,
        epsilon: 1e-3,
        ..Default::default()
    };
    let loose = Solver::with_options(stations, access_points, loose_options)
        .unwrap()
        .solve(&path_loss, None)
        .unwrap();

    assert!(loose.pricing_objectives.len() <= tight.pricing_objectives.len());
    // both runs walk the same iteration sequence, the loose one just stops earlier
    assert!(loose.total_rate <= tight.total_rate + 1e-6);
    assert!(
        tight.total_rate - loose.total_rate < 5.0,
        "the duality gap at the loose tolerance is too large"
    );
}

#[test]
fn identical_inputs_give_identical_schedules() {
    let (stations, access_points, path_loss) = strong_and_weak_cell();
    let solver = Solver::new(stations.clone(), access_points).unwrap();

    let first = solver.solve(&path_loss, None).unwrap();
    let second = solver.solve(&path_loss, None).unwrap();

    assert_eq!(first.shares.len(), second.shares.len());
    for (&a, &b) in first.shares.iter().zip(second.shares.iter()) {
        assert_relative_eq!(a, b, epsilon = 1e-9);
    }
    for &s in stations.iter() {
        assert_relative_eq!(
            first.station_rates[&s],
            second.station_rates[&s],
            epsilon = 1e-9
        );
    }
}
