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

//! The progressive solver, computing a lexicographic max-min schedule.
//!
//! A plain max-min schedule only pins down the rate of the bottleneck stations; all others are
//! left wherever the LP happens to put them. The progressive scheme instead freezes stations one
//! by one: each round first computes the max-min rate over the still-active stations, then probes
//! every active station on its own. A station whose individual rate cannot exceed the global one
//! is *tight*: its configurations are committed to the final schedule, the rates they promise
//! are recorded, and the station leaves the active set. Frozen promises are protected in later
//! rounds by a heavily penalised slack, so no station can lose rate it was already granted.

use std::collections::HashMap;

use crate::lp::{Backend, HighsBackend};
use crate::solver::data::{Phy, ProblemData};
use crate::solver::master::{self, MasterMode, ProgressiveRound};
use crate::solver::pricing::{self, PricingMode};
use crate::solver::{Configuration, InputError, Schedule, SolverError, SolverOptions};

/// The progressive (lexicographic) max-min solver.
///
/// Shares the option set of [`crate::Solver`]; the `opt_sum` and `min_throughput` options are
/// ignored, as the progressive scheme always optimises worst-case throughput.
#[derive(Debug)]
pub struct ProgressiveSolver<B = HighsBackend> {
    /// Station ids.
    stations: Vec<usize>,
    /// Access-point ids.
    access_points: Vec<usize>,
    /// Tunables.
    options: SolverOptions,
    /// The LP/MILP engine.
    backend: B,
}

impl ProgressiveSolver<HighsBackend> {
    /// Create a progressive solver with default options and the default engine.
    pub fn new(stations: Vec<usize>, access_points: Vec<usize>) -> Result<Self, InputError> {
        Self::with_options(stations, access_points, SolverOptions::default())
    }

    /// Create a progressive solver with the given options and the default engine.
    pub fn with_options(
        stations: Vec<usize>,
        access_points: Vec<usize>,
        options: SolverOptions,
    ) -> Result<Self, InputError> {
        Self::with_backend(stations, access_points, options, HighsBackend::new())
    }
}

impl<B: Backend> ProgressiveSolver<B> {
    /// Create a progressive solver with a custom engine.
    pub fn with_backend(
        stations: Vec<usize>,
        access_points: Vec<usize>,
        options: SolverOptions,
        backend: B,
    ) -> Result<Self, InputError> {
        Phy::from_options(&options)?;
        Ok(Self {
            stations,
            access_points,
            options,
            backend,
        })
    }

    /// Compute a lexicographic max-min schedule for the given path-loss matrix (in dB).
    ///
    /// Inputs are interpreted exactly as in [`crate::Solver::solve`]. The returned shares are
    /// those of the committed configurations and sum to 1.
    pub fn solve(
        &self,
        path_loss: &[Vec<f64>],
        associations: Option<&HashMap<usize, Vec<usize>>>,
    ) -> Result<Schedule, SolverError> {
        let phy = Phy::from_options(&self.options)?;
        let data = ProblemData::build(
            &self.stations,
            &self.access_points,
            path_loss,
            associations,
            phy,
        )?;

        if data.links.is_empty() {
            log::info!("no station is reachable from any access point");
            return Ok(Schedule::default());
        }

        let n_sta = data.stations.len();
        let mut pool = pricing::initial_configurations(&data);
        let mut sigma = vec![0.0; n_sta];
        let mut committed_time = 0.0;
        let mut committed: Vec<(Configuration, f64)> = Vec::new();
        let mut active: Vec<usize> = (0..n_sta).collect();
        let mut objectives = Vec::new();
        let rho_zero = vec![0.0; n_sta];

        while !active.is_empty() {
            log::info!(
                "progressive round over {} active stations ({} configurations committed)",
                active.len(),
                committed.len()
            );

            // max-min over all still-active stations
            let (global_shares, global_objective) = self.max_min_pass(
                &data,
                &mut pool,
                &active,
                &sigma,
                &rho_zero,
                committed_time,
                false,
            )?;
            objectives.push(global_objective);
            let rho_global = station_rates(&data, &pool, &global_shares, &sigma);

            // probe each active station on its own; tight stations get frozen
            let mut frozen = Vec::new();
            let mut best_gap: Option<(f64, usize)> = None;
            for &s in active.iter() {
                let (single_shares, _) = self.max_min_pass(
                    &data,
                    &mut pool,
                    &[s],
                    &sigma,
                    &rho_global,
                    committed_time,
                    true,
                )?;
                let rho_single = station_rates(&data, &pool, &single_shares, &sigma);
                let gap = (rho_single[s] - rho_global[s]).abs();
                if gap <= self.options.epsilon {
                    log::debug!(
                        "station {} is tight at {:.3} Mb/s",
                        data.stations[s],
                        rho_global[s]
                    );
                    commit_station(
                        &data,
                        s,
                        &single_shares,
                        self.options.epsilon,
                        &mut pool,
                        &mut sigma,
                        &mut committed_time,
                        &mut committed,
                    );
                    frozen.push(s);
                } else if best_gap.map_or(true, |(g, _)| gap < g) {
                    best_gap = Some((gap, s));
                }
            }

            // Tightness is decided with a finite tolerance, so a round may end without any frozen
            // station. Freeze the closest candidate to keep the active set shrinking.
            if frozen.is_empty() {
                let Some((gap, s)) = best_gap else {
                    break;
                };
                log::warn!(
                    "no station tight in this round, freezing station {} with gap {:.3e}",
                    data.stations[s],
                    gap
                );
                let (single_shares, _) = self.max_min_pass(
                    &data,
                    &mut pool,
                    &[s],
                    &sigma,
                    &rho_global,
                    committed_time,
                    true,
                )?;
                commit_station(
                    &data,
                    s,
                    &single_shares,
                    self.options.epsilon,
                    &mut pool,
                    &mut sigma,
                    &mut committed_time,
                    &mut committed,
                );
                frozen.push(s);
            }

            active.retain(|s| !frozen.contains(s));
        }

        let (configurations, shares): (Vec<_>, Vec<_>) = committed.into_iter().unzip();
        Ok(Schedule::from_parts(
            configurations,
            shares,
            &data.stations,
            objectives,
        ))
    }

    /// One column-generation pass over the progressive master, taking the worst case over the
    /// given stations. Returns the final shares (aligned with the pool) and the last pricing
    /// objective.
    #[allow(clippy::too_many_arguments)]
    fn max_min_pass(
        &self,
        data: &ProblemData,
        pool: &mut Vec<Configuration>,
        selected: &[usize],
        sigma: &[f64],
        rho: &[f64],
        committed_time: f64,
        use_delta: bool,
    ) -> Result<(Vec<f64>, f64), SolverError> {
        let round = ProgressiveRound {
            sigma: sigma.to_vec(),
            rho: rho.to_vec(),
            committed: committed_time,
            selected: selected.to_vec(),
            penalty: self.penalty(data),
        };
        let mode = MasterMode::Progressive(&round);
        let pricing_mode = PricingMode {
            include_rate_sum: false,
            use_delta,
        };

        let mut shares = Vec::new();
        let mut last_objective = f64::INFINITY;
        for iteration in 0..=self.options.max_iterations {
            let main = master::solve(data, pool, &mode, &self.backend)
                .map_err(SolverError::MainProblem)?;
            shares = main.shares.clone();

            if iteration == self.options.max_iterations {
                log::warn!(
                    "progressive pass did not converge within {} iterations",
                    self.options.max_iterations
                );
                break;
            }

            let (column, objective) = pricing::solve(data, &main, pricing_mode, &self.backend)
                .map_err(SolverError::PricingProblem)?;
            last_objective = objective;
            if objective <= self.options.epsilon {
                break;
            }
            pool.push(column);
        }
        Ok((shares, last_objective))
    }

    /// Penalty coefficient for missing a promised rate: the largest throughput the network could
    /// hand out in total.
    fn penalty(&self, data: &ProblemData) -> f64 {
        data.stations.len() as f64 * data.phy.data_rates.last().copied().unwrap_or_default()
    }
}

/// Total rate of each station under the given shares, including the rate already committed to
/// the output, indexed by station position.
fn station_rates(
    data: &ProblemData,
    pool: &[Configuration],
    shares: &[f64],
    sigma: &[f64],
) -> Vec<f64> {
    data.stations
        .iter()
        .enumerate()
        .map(|(pos, &s)| {
            sigma[pos]
                + pool
                    .iter()
                    .zip(shares.iter())
                    .filter(|(_, &w)| w > 0.0)
                    .map(|(conf, &w)| w * conf.station_rate(s))
                    .sum::<f64>()
        })
        .collect()
}

/// Commit every configuration of the single-station solution that serves the frozen station:
/// record the rates it promises, account for its share of time, and take it out of the pool.
#[allow(clippy::too_many_arguments)]
fn commit_station(
    data: &ProblemData,
    sta_pos: usize,
    shares: &[f64],
    epsilon: f64,
    pool: &mut Vec<Configuration>,
    sigma: &mut [f64],
    committed_time: &mut f64,
    committed: &mut Vec<(Configuration, f64)>,
) {
    let sta = data.stations[sta_pos];
    let mut removed = Vec::new();
    for (c, (conf, &share)) in pool.iter().zip(shares.iter()).enumerate() {
        if share <= epsilon || !conf.serves_station(sta) {
            continue;
        }
        for link in conf.links.iter() {
            if let Some(&pos) = data.sta_index.get(&link.sta) {
                sigma[pos] += share * conf.link_rates.get(link).copied().unwrap_or(0.0);
            }
        }
        *committed_time += share;
        committed.push((conf.clone(), share));
        removed.push(c);
    }
    // remove back to front so the indices stay valid
    for c in removed.into_iter().rev() {
        pool.remove(c);
    }
}
