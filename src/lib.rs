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

//! # mapc-csr: throughput-optimal scheduling for Wi-Fi coordinated spatial reuse
//!
//! In a dense Wi-Fi deployment, multiple access points (APs) can coordinate their transmissions:
//! links that interfere too much take turns, while links that barely hear each other transmit
//! simultaneously with adapted power and modulation. This crate computes an optimal such
//! schedule. Given the ids of all stations (STAs) and APs, and the path loss between every pair
//! of radios, it returns a time-sharing schedule over *compatible sets*: groups of AP to STA
//! links that can be active at the same time, together with per-link transmission powers and
//! achieved data rates.
//!
//! Two objectives are supported: maximising the total network throughput (subject to an optional
//! per-station minimum), or maximising the worst per-station throughput. The [`ProgressiveSolver`]
//! refines the latter into a lexicographic optimum by freezing stations one by one as their rates
//! become tight.
//!
//! Enumerating all compatible sets is hopeless, so the solver generates them on demand in a
//! column-generation loop: a small LP (the main problem) distributes unit time over the
//! configurations found so far, and its dual multipliers parameterise a MILP (the pricing
//! problem) that searches for a configuration with positive reduced cost. The loop stops once no
//! such configuration exists.
//!
//! ```no_run
//! use mapc_csr::{positions_to_path_loss, Solver};
//!
//! // two access points (ids 0 and 1), each serving one station (ids 2 and 3)
//! let pos = vec![[0.0, 0.0], [50.0, 0.0], [0.0, 2.0], [50.0, 2.0]];
//! let walls = vec![vec![0.0; 4]; 4];
//! let path_loss = positions_to_path_loss(&pos, &walls);
//!
//! let solver = Solver::new(vec![2, 3], vec![0, 1]).unwrap();
//! let schedule = solver.solve(&path_loss, None).unwrap();
//! println!("total throughput: {:.1} Mb/s", schedule.total_rate);
//! ```
//!
//! ## Structure
//! The source code of this crate is structured as follows:
//! - The module [`solver`] contains the column-generation core: the [`Solver`] entry point and
//!   the problem data ([`solver::data`]), the main problem (`solver::master`), and the pricing
//!   problem (`solver::pricing`).
//! - The module [`progressive`] wraps the core into the lexicographic max-min scheme
//!   ([`ProgressiveSolver`]).
//! - The module [`lp`] holds the declarative LP/MILP model and the [`lp::Backend`] abstraction
//!   over the solver engine, with HiGHS ([`lp::HighsBackend`]) as the default.
//! - The modules [`constants`] and [`units`] provide the IEEE 802.11ax physical-layer parameters
//!   and the TGax path-loss model used by the default configuration.

#![deny(
    missing_docs,
    clippy::missing_docs_in_private_items,
    missing_debug_implementations,
    rust_2018_idioms
)]

pub mod constants;
pub mod lp;
pub mod progressive;
pub mod solver;
pub mod units;

#[cfg(test)]
mod test;

pub use progressive::ProgressiveSolver;
pub use solver::data::{InputError, Link, Node};
pub use solver::{Configuration, Schedule, Solver, SolverError, SolverOptions};
pub use units::{dbm_to_lin, lin_to_dbm, positions_to_path_loss, tgax_path_loss};
