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

//! The pricing problem, generating one new configuration per iteration.
//!
//! Pricing is a MILP over all admitted links: which links are active, at which power, and on
//! which MCS. The SINR requirement of an MCS is linearised with a big-M constant `U[l][m]` that
//! deactivates the constraint while the MCS is not selected:
//!
//! ```text
//! p[l] + U[l][m] * (1 - mcs[l][m]) >= sinr[m] * pl[l] * (interference(l) + noise)
//! ```
//!
//! where `interference(l)` sums the received powers of all links transmitting from other access
//! points. The objective is the reduced cost of the new configuration with respect to the duals
//! of the master problem; a non-positive value proves that no further configuration can improve
//! the schedule.

use std::collections::HashMap;

use crate::lp::{Backend, LinExpr, Model, SolveFailure, Solution, Var};

use super::data::ProblemData;
use super::master::MasterSolution;
use super::Configuration;

/// Which terms enter the pricing objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PricingMode {
    /// Include the bare sum of link rates (total-throughput optimisation).
    pub include_rate_sum: bool,
    /// Include the reference-rate duals (single-station progressive rounds).
    pub use_delta: bool,
}

/// All variables of the pricing MILP, indexed by link position.
#[derive(Debug)]
struct PricingVars {
    /// Whether each link is active.
    on: Vec<Var>,
    /// Transmission power of each link in linear scale.
    power: Vec<Var>,
    /// Achieved data rate of each link in Mb/s.
    rate: Vec<Var>,
    /// Incremental MCS indicators of each link.
    mcs: Vec<Vec<Var>>,
}

/// Solve the pricing problem and return the generated configuration together with its reduced
/// cost.
pub(crate) fn solve(
    data: &ProblemData,
    main: &MasterSolution,
    mode: PricingMode,
    backend: &impl Backend,
) -> Result<(Configuration, f64), SolveFailure> {
    let mut model = Model::maximise();
    let vars = setup_vars(&mut model, data);
    setup_constraints(&mut model, &vars, data);
    setup_objective(&mut model, &vars, data, main, mode);

    log::debug!(
        "solving the pricing MILP over {} links ({}x{})",
        data.links.len(),
        model.num_rows(),
        model.num_vars()
    );
    let solution = backend.solve(&model)?;

    let configuration = extract_configuration(data, &vars, &solution);
    Ok((configuration, solution.objective()))
}

/// Create all variables of the pricing MILP.
fn setup_vars(model: &mut Model, data: &ProblemData) -> PricingVars {
    let n_mcs = data.phy.min_sinr.len();
    PricingVars {
        on: data.links.iter().map(|_| model.add_binary()).collect(),
        power: data
            .links
            .iter()
            .map(|_| model.add_var(0.0, data.phy.max_tx_power))
            .collect(),
        rate: data
            .links
            .iter()
            .map(|_| model.add_var(0.0, f64::INFINITY))
            .collect(),
        mcs: data
            .links
            .iter()
            .map(|_| (0..n_mcs).map(|_| model.add_binary()).collect())
            .collect(),
    }
}

/// Create all constraints of the pricing MILP.
fn setup_constraints(model: &mut Model, vars: &PricingVars, data: &ProblemData) {
    let phy = &data.phy;

    // each station receives from at most one access point
    for &s in data.stations.iter() {
        let mut expr = LinExpr::new();
        for (l, link) in data.links.iter().enumerate() {
            if link.sta == s {
                expr.add_term(vars.on[l], 1.0);
            }
        }
        if !expr.is_empty() {
            model.add_le(expr, 1.0);
        }
    }

    // each access point transmits to at most one of its stations
    for &a in data.access_points.iter() {
        let mut expr = LinExpr::new();
        for (l, link) in data.links.iter().enumerate() {
            if link.ap == a {
                expr.add_term(vars.on[l], 1.0);
            }
        }
        if !expr.is_empty() {
            model.add_le(expr, 1.0);
        }
    }

    for (l, link) in data.links.iter().enumerate() {
        let pl = data.path_loss[link.ap][link.sta];

        // an active link transmits within the power window, an inactive one not at all
        let mut upper = LinExpr::term(vars.power[l], 1.0);
        upper.add_term(vars.on[l], -phy.max_tx_power);
        model.add_le(upper, 0.0);
        let mut lower = LinExpr::term(vars.power[l], 1.0);
        lower.add_term(vars.on[l], -phy.min_tx_power);
        model.add_ge(lower, 0.0);

        for m in 0..phy.min_sinr.len() {
            // MCS indicators switch on incrementally
            let mut incr = LinExpr::term(vars.mcs[l][m], 1.0);
            if m == 0 {
                incr.add_term(vars.on[l], -1.0);
            } else {
                incr.add_term(vars.mcs[l][m - 1], -1.0);
            }
            model.add_le(incr, 0.0);

            // big-M linearisation of the SINR requirement of this MCS
            let sinr = phy.min_sinr[m];
            let big_m = data.max_interference[l][m];
            let mut expr = LinExpr::term(vars.power[l], 1.0);
            expr.add_term(vars.mcs[l][m], -big_m);
            for (i, interferer) in data.links.iter().enumerate() {
                if interferer.ap != link.ap {
                    expr.add_term(
                        vars.power[i],
                        -sinr * pl / data.path_loss[interferer.ap][link.sta],
                    );
                }
            }
            model.add_ge(expr, sinr * pl * phy.noise_floor - big_m);
        }

        // the link rate telescopes over the switched-on MCS increments
        let mut rate = LinExpr::term(vars.rate[l], 1.0);
        for m in 0..phy.min_sinr.len() {
            rate.add_term(vars.mcs[l][m], -phy.rate_diff[m]);
        }
        model.add_eq(rate, 0.0);
    }
}

/// Set the reduced-cost objective of the pricing MILP.
fn setup_objective(
    model: &mut Model,
    vars: &PricingVars,
    data: &ProblemData,
    main: &MasterSolution,
    mode: PricingMode,
) {
    let mut objective = LinExpr::new();
    for (l, link) in data.links.iter().enumerate() {
        let s = data.sta_index[&link.sta];
        let mut coeff = main.beta[s];
        if mode.include_rate_sum {
            coeff += 1.0;
        }
        if mode.use_delta {
            coeff += main.delta.as_ref().map_or(0.0, |delta| delta[s]);
        }
        objective.add_term(vars.rate[l], coeff);
    }
    objective.add_constant(-main.alpha);
    model.set_objective(objective);
}

/// Read the generated configuration out of the MILP solution.
fn extract_configuration(
    data: &ProblemData,
    vars: &PricingVars,
    solution: &Solution,
) -> Configuration {
    let phy = &data.phy;
    let mut links = Vec::new();
    let mut tx_power = HashMap::new();
    let mut link_rates = HashMap::new();
    let mut total_rate = 0.0;

    for (l, &link) in data.links.iter().enumerate() {
        if solution.value(vars.on[l]) < 0.5 {
            continue;
        }
        let power = solution
            .value(vars.power[l])
            .clamp(phy.min_tx_power, phy.max_tx_power);
        let rate = solution.value(vars.rate[l]).max(0.0);
        links.push(link);
        tx_power.insert(link, power);
        link_rates.insert(link, rate);
        total_rate += rate;
    }

    Configuration {
        links,
        tx_power,
        link_rates,
        total_rate,
    }
}

/// Seed the configuration pool with one singleton configuration per admitted link.
///
/// A singleton transmits at maximum power and sees no interference, so its rate is the best MCS
/// against thermal noise alone.
pub(crate) fn initial_configurations(data: &ProblemData) -> Vec<Configuration> {
    data.links
        .iter()
        .filter_map(|&link| {
            let pl = data.path_loss[link.ap][link.sta];
            let mcs = data.phy.best_mcs(pl)?;
            let rate = data.phy.data_rates[mcs];
            Some(Configuration {
                links: vec![link],
                tx_power: HashMap::from([(link, data.phy.max_tx_power)]),
                link_rates: HashMap::from([(link, rate)]),
                total_rate: rate,
            })
        })
        .collect()
}
