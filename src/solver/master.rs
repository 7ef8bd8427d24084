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

//! The main (restricted master) problem, distributing unit time over the configurations found so
//! far.
//!
//! The master is a pure LP. Its dual multipliers steer the pricing problem towards configurations
//! that improve the current schedule:
//!
//! ```text
//! alpha    dual of the time-normalisation constraint
//! beta[s]  dual of the per-station throughput definition
//! gamma[s] dual of the worst-case (or frozen-rate) constraint
//! delta[s] dual of the reference-rate constraint (progressive rounds only)
//! ```

use crate::lp::{Backend, LinExpr, Model, SolveFailure, Var};

use super::data::ProblemData;
use super::Configuration;

/// Objective and constraint mode of a master solve.
#[derive(Debug)]
pub(crate) enum MasterMode<'a> {
    /// Maximise the total throughput, subject to a per-station floor.
    MaxSum {
        /// Minimum throughput in Mb/s guaranteed to every station.
        min_throughput: f64,
    },
    /// Maximise the worst-case per-station throughput.
    MaxMin,
    /// One round of the progressive (lexicographic) max-min scheme.
    Progressive(&'a ProgressiveRound),
}

/// Parameters of a progressive master round.
#[derive(Debug, Clone)]
pub(crate) struct ProgressiveRound {
    /// Rate already promised to each station by committed configurations (station-indexed).
    pub sigma: Vec<f64>,
    /// Reference rate each station should keep (station-indexed); zero in global rounds, the
    /// previous global rates in single-station rounds.
    pub rho: Vec<f64>,
    /// Fraction of time already committed; the remaining shares must sum to its complement.
    pub committed: f64,
    /// Station positions over which the worst case is taken.
    pub selected: Vec<usize>,
    /// Penalty coefficient for violating promised or reference rates.
    pub penalty: f64,
}

/// Duals, shares, and objective value of a solved master problem.
#[derive(Debug, Clone)]
pub(crate) struct MasterSolution {
    /// Dual of the time-normalisation constraint.
    pub alpha: f64,
    /// Dual of the throughput definition of each station (station-indexed).
    pub beta: Vec<f64>,
    /// Dual of the worst-case or frozen-rate constraint of each station (station-indexed).
    pub gamma: Vec<f64>,
    /// Dual of the reference-rate constraint of each station, in progressive rounds.
    pub delta: Option<Vec<f64>>,
    /// Time share of each configuration, aligned with the pool.
    pub shares: Vec<f64>,
    /// Objective value.
    pub objective: f64,
}

/// Solve the master LP over the current configuration pool.
pub(crate) fn solve(
    data: &ProblemData,
    pool: &[Configuration],
    mode: &MasterMode<'_>,
    backend: &impl Backend,
) -> Result<MasterSolution, SolveFailure> {
    let n_sta = data.stations.len();
    let mut model = Model::maximise();

    let shares: Vec<Var> = pool.iter().map(|_| model.add_var(0.0, 1.0)).collect();
    let throughput: Vec<Var> = (0..n_sta).map(|_| model.add_var(0.0, f64::INFINITY)).collect();
    let worst = model.add_var(0.0, f64::INFINITY);

    // all shares together must fill the (remaining) unit of time
    let mut norm = LinExpr::new();
    for &w in shares.iter() {
        norm.add_term(w, 1.0);
    }
    let total_time = match mode {
        MasterMode::Progressive(round) => (1.0 - round.committed).max(0.0),
        _ => 1.0,
    };
    let norm_row = model.add_eq(norm, total_time);

    // Define the throughput of each station over all configurations. In progressive rounds the
    // rate already committed to the output enters as a constant, so the remaining time is never
    // spent re-earning rate that frozen configurations already deliver.
    let throughput_rows = (0..n_sta)
        .map(|s| {
            let mut expr = LinExpr::term(throughput[s], 1.0);
            for (c, conf) in pool.iter().enumerate() {
                expr.add_term(shares[c], -conf.station_rate(data.stations[s]));
            }
            let frozen = match mode {
                MasterMode::Progressive(round) => round.sigma[s],
                _ => 0.0,
            };
            model.add_eq(expr, frozen)
        })
        .collect::<Vec<_>>();

    let mut objective = LinExpr::new();
    let (gamma_rows, delta_rows) = match mode {
        MasterMode::MaxSum { min_throughput } => {
            let gamma_rows = worst_case_rows(&mut model, &throughput, worst, 0..n_sta);
            model.add_ge(LinExpr::term(worst, 1.0), *min_throughput);
            for (c, conf) in pool.iter().enumerate() {
                objective.add_term(shares[c], conf.total_rate);
            }
            (gamma_rows, None)
        }
        MasterMode::MaxMin => {
            let gamma_rows = worst_case_rows(&mut model, &throughput, worst, 0..n_sta);
            objective.add_term(worst, 1.0);
            (gamma_rows, None)
        }
        MasterMode::Progressive(round) => {
            let slack = model.add_var(0.0, f64::INFINITY);
            // promised and reference rates may only be missed at the cost of the slack
            let gamma_rows = (0..n_sta)
                .map(|s| {
                    let mut expr = LinExpr::term(throughput[s], 1.0);
                    expr.add_term(slack, 1.0);
                    model.add_ge(expr, round.sigma[s])
                })
                .collect::<Vec<_>>();
            let delta_rows = (0..n_sta)
                .map(|s| {
                    let mut expr = LinExpr::term(throughput[s], 1.0);
                    expr.add_term(slack, 1.0);
                    model.add_ge(expr, round.rho[s])
                })
                .collect::<Vec<_>>();
            worst_case_rows(&mut model, &throughput, worst, round.selected.iter().copied());
            objective.add_term(worst, 1.0);
            objective.add_term(slack, -round.penalty);
            (gamma_rows, Some(delta_rows))
        }
    };
    model.set_objective(objective);

    log::debug!(
        "solving the master LP with {} configurations ({}x{})",
        pool.len(),
        model.num_rows(),
        model.num_vars()
    );
    let solution = backend.solve(&model)?;

    Ok(MasterSolution {
        alpha: solution.dual(norm_row),
        beta: throughput_rows.iter().map(|&r| solution.dual(r)).collect(),
        gamma: gamma_rows.iter().map(|&r| solution.dual(r)).collect(),
        delta: delta_rows.map(|rows| rows.iter().map(|&r| solution.dual(r)).collect()),
        shares: shares.iter().map(|&w| solution.value(w)).collect(),
        objective: solution.objective(),
    })
}

/// Require the throughput of every listed station to reach the worst-case variable.
fn worst_case_rows(
    model: &mut Model,
    throughput: &[Var],
    worst: Var,
    stations: impl Iterator<Item = usize>,
) -> Vec<crate::lp::Row> {
    stations
        .map(|s| {
            let mut expr = LinExpr::term(throughput[s], 1.0);
            expr.add_term(worst, -1.0);
            model.add_ge(expr, 0.0)
        })
        .collect()
}
