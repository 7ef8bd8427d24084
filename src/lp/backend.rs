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

//! The default solver engine: HiGHS.

use std::ops::Bound;

use highs::{HighsModelStatus, RowProblem, Sense as HighsSense};

use super::{Backend, Cmp, Model, Sense, SolveFailure, Solution};

/// Backend solving models with the HiGHS engine.
///
/// HiGHS is free and open source, handles both pure LPs and mixed-integer programs, and reports
/// row duals for continuous models.
#[derive(Debug, Clone, Default)]
pub struct HighsBackend {
    /// Print the engine log to stdout.
    pub verbose: bool,
    /// Wall-clock limit in seconds handed to the engine.
    pub time_limit: Option<f64>,
}

impl HighsBackend {
    /// Create a quiet backend without a time limit.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Translate a finite bound into an inclusive bound, and an infinite one into an open end.
fn bound(value: f64) -> Bound<f64> {
    if value.is_finite() {
        Bound::Included(value)
    } else {
        Bound::Unbounded
    }
}

impl Backend for HighsBackend {
    fn solve(&self, model: &Model) -> Result<Solution, SolveFailure> {
        let mut pb = RowProblem::default();

        let cols: Vec<highs::Col> = model
            .cols
            .iter()
            .zip(model.objective.iter())
            .map(|(col, &obj)| {
                let bounds = (bound(col.lower), bound(col.upper));
                if col.integer {
                    pb.add_integer_column(obj, bounds)
                } else {
                    pb.add_column(obj, bounds)
                }
            })
            .collect();

        for row in model.rows.iter() {
            let factors: Vec<(highs::Col, f64)> = row
                .terms
                .iter()
                .map(|&(col, coeff)| (cols[col], coeff))
                .collect();
            let bounds = match row.cmp {
                Cmp::Eq => (Bound::Included(row.rhs), Bound::Included(row.rhs)),
                Cmp::Le => (Bound::Unbounded, Bound::Included(row.rhs)),
                Cmp::Ge => (Bound::Included(row.rhs), Bound::Unbounded),
            };
            pb.add_row(bounds, &factors);
        }

        let mut highs_model = pb.optimise(match model.sense {
            Sense::Maximise => HighsSense::Maximise,
            Sense::Minimise => HighsSense::Minimise,
        });
        highs_model.set_option("output_flag", self.verbose);
        if let Some(limit) = self.time_limit {
            highs_model.set_option("time_limit", limit);
        }

        let solved = highs_model.solve();
        match solved.status() {
            HighsModelStatus::Optimal => {}
            HighsModelStatus::Infeasible => return Err(SolveFailure::Infeasible),
            HighsModelStatus::Unbounded | HighsModelStatus::UnboundedOrInfeasible => {
                return Err(SolveFailure::Unbounded)
            }
            status => return Err(SolveFailure::Status(format!("{status:?}"))),
        }

        let solution = solved.get_solution();
        let values = solution.columns().to_vec();
        let duals = solution.dual_rows().to_vec();
        let objective = model.objective_value(&values);

        Ok(Solution {
            values,
            duals,
            objective,
        })
    }
}
