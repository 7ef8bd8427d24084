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

//! Network nodes, links, and the static problem data derived once per solve call.

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;
use thiserror::Error;

use super::SolverOptions;
use crate::units::dbm_to_lin;

/// A radio in the network, identified by its integer id.
///
/// The ids of all nodes together must cover the range `0..n` without duplicates, where `n` is the
/// total number of nodes. The id doubles as the row/column index into the path-loss matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Node {
    /// An access point.
    Ap(usize),
    /// A station.
    Sta(usize),
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Ap(id) => write!(f, "AP_{id}"),
            Node::Sta(id) => write!(f, "STA_{id}"),
        }
    }
}

/// A directed transmission link from an access point to one of its stations.
///
/// A link only exists if the lowest MCS is feasible at maximum power against thermal noise alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Link {
    /// Id of the transmitting access point.
    pub ap: usize,
    /// Id of the receiving station.
    pub sta: usize,
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", Node::Ap(self.ap), Node::Sta(self.sta))
    }
}

/// Error for inputs rejected before any solver call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    /// A node id lies outside the contiguous id range.
    #[error("node ids must cover 0..{n}, but found id {id}")]
    NodeIdOutOfRange {
        /// The offending id.
        id: usize,
        /// The total number of nodes.
        n: usize,
    },
    /// A node id appears more than once in the station and access-point lists.
    #[error("node id {0} appears more than once")]
    DuplicateNodeId(usize),
    /// The path-loss matrix does not match the number of nodes.
    #[error("the path-loss matrix must be {expected}x{expected}, but found a dimension of {found}")]
    PathLossShape {
        /// The expected number of rows and columns.
        expected: usize,
        /// The offending dimension.
        found: usize,
    },
    /// An association key is not a known access point.
    #[error("association key {0} is not an access point")]
    UnknownAccessPoint(usize),
    /// An associated id is not a known station.
    #[error("associated id {0} is not a station")]
    UnknownStation(usize),
    /// A station is associated to more than one access point.
    #[error("station {0} is associated to more than one access point")]
    StationReassociated(usize),
    /// The MCS tables are empty or inconsistent.
    #[error("invalid MCS table: {0}")]
    McsTable(String),
}

/// Physical-layer parameters of a solve call, converted to linear scale once.
#[derive(Debug, Clone)]
pub(crate) struct Phy {
    /// Data rate of each MCS in Mb/s.
    pub data_rates: Vec<f64>,
    /// Rate increment of each MCS over its predecessor, for the telescoped rate expression.
    pub rate_diff: Vec<f64>,
    /// Minimal SINR of each MCS in linear scale.
    pub min_sinr: Vec<f64>,
    /// Maximum transmission power in linear scale (mW).
    pub max_tx_power: f64,
    /// Minimum transmission power in linear scale (mW).
    pub min_tx_power: f64,
    /// Noise floor in linear scale (mW).
    pub noise_floor: f64,
}

impl Phy {
    /// Convert the solver options to linear scale, validating the MCS tables.
    pub fn from_options(options: &SolverOptions) -> Result<Self, InputError> {
        let rates = &options.mcs_data_rates;
        if rates.is_empty() {
            return Err(InputError::McsTable("the data-rate table is empty".to_string()));
        }
        if rates.len() != options.min_snr.len() {
            return Err(InputError::McsTable(format!(
                "{} data rates but {} SNR thresholds",
                rates.len(),
                options.min_snr.len()
            )));
        }
        if rates.windows(2).any(|w| w[1] < w[0]) {
            return Err(InputError::McsTable(
                "data rates must be non-decreasing".to_string(),
            ));
        }
        let rate_diff = rates
            .iter()
            .enumerate()
            .map(|(m, &r)| if m == 0 { r } else { r - rates[m - 1] })
            .collect();
        Ok(Self {
            data_rates: rates.clone(),
            rate_diff,
            min_sinr: options.min_snr.iter().map(|&snr| dbm_to_lin(snr)).collect(),
            max_tx_power: dbm_to_lin(options.max_tx_power),
            min_tx_power: dbm_to_lin(options.min_tx_power),
            noise_floor: dbm_to_lin(options.noise_floor),
        })
    }

    /// Whether any transmission is possible over the given linear path loss, checking the lowest
    /// MCS at maximum power against thermal noise alone.
    pub fn tx_possible(&self, path_loss: f64) -> bool {
        self.max_tx_power >= self.min_sinr[0] * path_loss * self.noise_floor
    }

    /// The best MCS achievable over the given linear path loss at maximum power against thermal
    /// noise alone, or `None` if even the lowest MCS is infeasible.
    pub fn best_mcs(&self, path_loss: f64) -> Option<usize> {
        let feasible = self
            .min_sinr
            .iter()
            .take_while(|&&sinr| self.max_tx_power >= sinr * path_loss * self.noise_floor)
            .count();
        feasible.checked_sub(1)
    }
}

/// All static data of a single solve call.
///
/// Built once from the inputs; the per-link and per-MCS tables are plain vectors indexed by link
/// position and MCS index, so the per-iteration problem construction allocates no maps.
#[derive(Debug)]
pub(crate) struct ProblemData {
    /// Station ids, in caller order.
    pub stations: Vec<usize>,
    /// Access-point ids, in caller order.
    pub access_points: Vec<usize>,
    /// All admitted links.
    pub links: Vec<Link>,
    /// Path loss between every pair of nodes, in linear scale.
    pub path_loss: Vec<Vec<f64>>,
    /// For each link and MCS, an upper bound on the right-hand side of the SINR constraint, used
    /// to deactivate the constraint when the MCS is not selected.
    pub max_interference: Vec<Vec<f64>>,
    /// Position of each station id in `stations`.
    pub sta_index: HashMap<usize, usize>,
    /// Physical-layer parameters in linear scale.
    pub phy: Phy,
}

impl ProblemData {
    /// Validate the inputs and derive the static problem data.
    ///
    /// If `associations` is `None`, every station is associated to its lowest-path-loss access
    /// point. A link is admitted only if its station is reachable at all (see
    /// [`Phy::tx_possible`]).
    pub fn build(
        stations: &[usize],
        access_points: &[usize],
        path_loss_db: &[Vec<f64>],
        associations: Option<&HashMap<usize, Vec<usize>>>,
        phy: Phy,
    ) -> Result<Self, InputError> {
        let n = stations.len() + access_points.len();
        validate_node_ids(stations, access_points, n)?;
        validate_matrix(path_loss_db, n)?;

        // convert the matrix to linear scale once
        let path_loss: Vec<Vec<f64>> = path_loss_db
            .iter()
            .map(|row| row.iter().map(|&pl| dbm_to_lin(pl)).collect())
            .collect();

        let sta_index: HashMap<usize, usize> =
            stations.iter().enumerate().map(|(i, &s)| (s, i)).collect();

        let links = match associations {
            Some(associations) => {
                validate_associations(associations, stations, access_points, &sta_index)?;
                // iterate in access-point order for a deterministic link list
                access_points
                    .iter()
                    .filter_map(|a| associations.get(a).map(|stas| (*a, stas)))
                    .flat_map(|(a, stas)| stas.iter().map(move |&s| Link { ap: a, sta: s }))
                    .filter(|l| phy.tx_possible(path_loss[l.ap][l.sta]))
                    .collect_vec()
            }
            None => stations
                .iter()
                .filter_map(|&s| {
                    access_points
                        .iter()
                        .min_by(|&&a, &&b| path_loss[a][s].total_cmp(&path_loss[b][s]))
                        .map(|&a| Link { ap: a, sta: s })
                })
                .filter(|l| phy.tx_possible(path_loss[l.ap][l.sta]))
                .collect_vec(),
        };

        // Upper bound on the right-hand side of each SINR constraint, reached when all other
        // access points transmit at maximum power.
        let max_interference = links
            .iter()
            .map(|l| {
                let pl = path_loss[l.ap][l.sta];
                let worst_case: f64 = access_points
                    .iter()
                    .filter(|&&a| a != l.ap)
                    .map(|&a| phy.max_tx_power / path_loss[a][l.sta])
                    .sum();
                phy.min_sinr
                    .iter()
                    .map(|&sinr| sinr * pl * (worst_case + phy.noise_floor))
                    .collect_vec()
            })
            .collect_vec();

        Ok(Self {
            stations: stations.to_vec(),
            access_points: access_points.to_vec(),
            links,
            path_loss,
            max_interference,
            sta_index,
            phy,
        })
    }
}

/// Check that the station and access-point ids together cover `0..n` without duplicates.
fn validate_node_ids(stations: &[usize], access_points: &[usize], n: usize) -> Result<(), InputError> {
    if let Some(&id) = stations
        .iter()
        .chain(access_points.iter())
        .find(|&&id| id >= n)
    {
        return Err(InputError::NodeIdOutOfRange { id, n });
    }
    if let Some(&id) = stations
        .iter()
        .chain(access_points.iter())
        .duplicates()
        .next()
    {
        return Err(InputError::DuplicateNodeId(id));
    }
    Ok(())
}

/// Check that the path-loss matrix is `n x n`.
fn validate_matrix(path_loss: &[Vec<f64>], n: usize) -> Result<(), InputError> {
    if path_loss.len() != n {
        return Err(InputError::PathLossShape {
            expected: n,
            found: path_loss.len(),
        });
    }
    for row in path_loss.iter() {
        if row.len() != n {
            return Err(InputError::PathLossShape {
                expected: n,
                found: row.len(),
            });
        }
    }
    Ok(())
}

/// Check that the association map only references known nodes and associates every station at
/// most once.
fn validate_associations(
    associations: &HashMap<usize, Vec<usize>>,
    stations: &[usize],
    access_points: &[usize],
    sta_index: &HashMap<usize, usize>,
) -> Result<(), InputError> {
    for a in associations.keys() {
        if !access_points.contains(a) {
            return Err(InputError::UnknownAccessPoint(*a));
        }
    }
    let mut seen = vec![false; stations.len()];
    for &s in associations.values().flatten() {
        let Some(&pos) = sta_index.get(&s) else {
            return Err(InputError::UnknownStation(s));
        };
        if seen[pos] {
            return Err(InputError::StationReassociated(s));
        }
        seen[pos] = true;
    }
    Ok(())
}
