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

//! The column-generation solver coordinating the master and pricing problems.
//!
//! The solver starts from one singleton configuration per station and alternates two problems:
//! the master LP distributes unit time over the configurations found so far and exposes its dual
//! multipliers, and the pricing MILP uses those duals to generate the configuration with the
//! largest reduced cost. The loop terminates once the reduced cost drops to the tolerance, or
//! after a bounded number of iterations.

use std::collections::HashMap;

use thiserror::Error;

use crate::constants::{
    DATA_RATES, MAX_TX_POWER, MIN_SNRS, MIN_TX_POWER, NOISE_FLOOR,
};
use crate::lp::{Backend, HighsBackend, SolveFailure};
use crate::units::lin_to_dbm;

pub mod data;
pub(crate) mod master;
pub(crate) mod pricing;

pub use data::{InputError, Link, Node};

use data::{Phy, ProblemData};
use master::MasterMode;
use pricing::PricingMode;

/// Tunables of a solver instance.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SolverOptions {
    /// Data rate in Mb/s of each MCS, non-decreasing.
    pub mcs_data_rates: Vec<f64>,
    /// Minimal SNR in dB required on each MCS; must have the same length as the data rates.
    pub min_snr: Vec<f64>,
    /// Maximum transmission power in dBm.
    pub max_tx_power: f64,
    /// Minimum transmission power in dBm of an active link.
    pub min_tx_power: f64,
    /// Noise floor in dBm.
    pub noise_floor: f64,
    /// Minimum throughput in Mb/s guaranteed to every station when optimising the total
    /// throughput. Ignored by the progressive solver.
    pub min_throughput: f64,
    /// Optimise the total throughput instead of the worst-case throughput. Ignored by the
    /// progressive solver.
    pub opt_sum: bool,
    /// Upper bound on the number of column-generation iterations.
    pub max_iterations: usize,
    /// Reduced-cost tolerance below which the iteration stops.
    pub epsilon: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            mcs_data_rates: DATA_RATES.to_vec(),
            min_snr: MIN_SNRS.to_vec(),
            max_tx_power: MAX_TX_POWER,
            min_tx_power: MIN_TX_POWER,
            noise_floor: NOISE_FLOOR,
            min_throughput: 0.0,
            opt_sum: false,
            max_iterations: 100,
            epsilon: 1e-5,
        }
    }
}

/// A compatible set: links that may be active simultaneously, together with their transmission
/// powers and achieved rates.
///
/// Every configuration is feasible on its own: the SINR of each active link against the
/// concurrent transmissions of the same configuration reaches the threshold of the MCS behind
/// its reported rate. Within one configuration, each access point transmits to at most one
/// station and each station receives from at most one access point.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Configuration {
    /// The active links.
    pub links: Vec<Link>,
    /// Transmission power of each active link, in linear scale (mW).
    pub tx_power: HashMap<Link, f64>,
    /// Achieved data rate of each active link in Mb/s.
    pub link_rates: HashMap<Link, f64>,
    /// Sum of all link rates in Mb/s.
    pub total_rate: f64,
}

impl Configuration {
    /// Transmission power in dBm on the given link, or `None` if the link is inactive.
    pub fn tx_power_dbm(&self, link: &Link) -> Option<f64> {
        self.tx_power.get(link).map(|&p| lin_to_dbm(p))
    }

    /// Whether one of the active links transmits to the given station.
    pub fn serves_station(&self, sta: usize) -> bool {
        self.links.iter().any(|l| l.sta == sta)
    }

    /// Rate in Mb/s this configuration delivers to the given station while active.
    pub(crate) fn station_rate(&self, sta: usize) -> f64 {
        self.links
            .iter()
            .filter(|l| l.sta == sta)
            .map(|l| self.link_rates.get(l).copied().unwrap_or(0.0))
            .sum()
    }
}

/// A time-sharing schedule over a set of configurations.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Schedule {
    /// The scheduled configurations.
    pub configurations: Vec<Configuration>,
    /// Time share of each configuration in `[0, 1]`, aligned with `configurations`. The shares
    /// sum to 1 unless the schedule is empty.
    pub shares: Vec<f64>,
    /// Achieved throughput in Mb/s of each station, keyed by station id.
    pub station_rates: HashMap<usize, f64>,
    /// Total network throughput in Mb/s.
    pub total_rate: f64,
    /// The pricing objective of every iteration, for convergence inspection. The iteration has
    /// converged if the last value is at most the tolerance.
    pub pricing_objectives: Vec<f64>,
}

impl Schedule {
    /// Whether the schedule contains no configuration at all.
    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    /// Assemble a schedule from a configuration pool with its shares.
    pub(crate) fn from_parts(
        configurations: Vec<Configuration>,
        shares: Vec<f64>,
        stations: &[usize],
        pricing_objectives: Vec<f64>,
    ) -> Self {
        let mut station_rates: HashMap<usize, f64> =
            stations.iter().map(|&s| (s, 0.0)).collect();
        let mut total_rate = 0.0;
        for (conf, &share) in configurations.iter().zip(shares.iter()) {
            if share <= 0.0 {
                continue;
            }
            total_rate += share * conf.total_rate;
            for link in conf.links.iter() {
                if let Some(rate) = station_rates.get_mut(&link.sta) {
                    *rate += share * conf.link_rates.get(link).copied().unwrap_or(0.0);
                }
            }
        }
        Self {
            configurations,
            shares,
            station_rates,
            total_rate,
            pricing_objectives,
        }
    }
}

/// Error surfaced by a solve call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// The inputs were rejected before any solver call.
    #[error("invalid input: {0}")]
    Input(#[from] InputError),
    /// The master problem was not solved to optimality. Fatal for the current call.
    #[error("main problem not solved optimally: {0}")]
    MainProblem(SolveFailure),
    /// The pricing problem was not solved to optimality. Fatal for the current call.
    #[error("pricing problem not solved optimally: {0}")]
    PricingProblem(SolveFailure),
}

/// The column-generation solver.
///
/// A solver is constructed once per network from the station and access-point id lists, and can
/// then solve for any path-loss matrix over those nodes.
#[derive(Debug)]
pub struct Solver<B = HighsBackend> {
    /// Station ids.
    stations: Vec<usize>,
    /// Access-point ids.
    access_points: Vec<usize>,
    /// Tunables.
    options: SolverOptions,
    /// The LP/MILP engine.
    backend: B,
}

impl Solver<HighsBackend> {
    /// Create a solver with default options and the default engine.
    pub fn new(stations: Vec<usize>, access_points: Vec<usize>) -> Result<Self, InputError> {
        Self::with_options(stations, access_points, SolverOptions::default())
    }

    /// Create a solver with the given options and the default engine.
    pub fn with_options(
        stations: Vec<usize>,
        access_points: Vec<usize>,
        options: SolverOptions,
    ) -> Result<Self, InputError> {
        Self::with_backend(stations, access_points, options, HighsBackend::new())
    }
}

impl<B: Backend> Solver<B> {
    /// Create a solver with a custom engine.
    pub fn with_backend(
        stations: Vec<usize>,
        access_points: Vec<usize>,
        options: SolverOptions,
        backend: B,
    ) -> Result<Self, InputError> {
        // reject inconsistent MCS tables right away
        Phy::from_options(&options)?;
        Ok(Self {
            stations,
            access_points,
            options,
            backend,
        })
    }

    /// The tunables of this solver.
    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// Compute a schedule for the given path-loss matrix (in dB).
    ///
    /// The matrix must be `n x n` for `n` nodes, indexed by node id. If `associations` is `None`,
    /// every station is associated to its lowest-path-loss access point. If no station is
    /// reachable at all, the result is an empty schedule with zero rate.
    ///
    /// Reaching the iteration bound without convergence is not an error: the current schedule is
    /// returned, and the pricing objectives allow the caller to judge how far it is off.
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

        let mode = if self.options.opt_sum {
            MasterMode::MaxSum {
                min_throughput: self.options.min_throughput,
            }
        } else {
            MasterMode::MaxMin
        };
        let pricing_mode = PricingMode {
            include_rate_sum: self.options.opt_sum,
            use_delta: false,
        };

        let mut pool = pricing::initial_configurations(&data);
        log::info!(
            "starting column generation with {} singleton configurations over {} links",
            pool.len(),
            data.links.len()
        );

        let mut objectives = Vec::new();
        let mut shares = Vec::new();
        for iteration in 0..=self.options.max_iterations {
            let main = master::solve(&data, &pool, &mode, &self.backend)
                .map_err(SolverError::MainProblem)?;
            shares = main.shares.clone();

            if iteration == self.options.max_iterations {
                log::warn!(
                    "no convergence within {} iterations (last pricing objective {:.3e})",
                    self.options.max_iterations,
                    objectives.last().copied().unwrap_or(f64::INFINITY),
                );
                break;
            }

            log::trace!(
                "duals: alpha {:.3e}, beta {:?}, gamma {:?}",
                main.alpha,
                main.beta,
                main.gamma
            );
            let (column, objective) =
                pricing::solve(&data, &main, pricing_mode, &self.backend)
                    .map_err(SolverError::PricingProblem)?;
            objectives.push(objective);
            log::debug!(
                "iteration {iteration}: master objective {:.6}, pricing objective {:.6}",
                main.objective,
                objective
            );

            if objective <= self.options.epsilon {
                log::info!("converged after {} iterations", iteration + 1);
                break;
            }
            pool.push(column);
        }

        Ok(Schedule::from_parts(pool, shares, &data.stations, objectives))
    }
}
