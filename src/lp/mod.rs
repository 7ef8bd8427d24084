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

//! Tools and utilities to build LP/MILP systems and hand them to a solver engine.
//!
//! A [`Model`] is a backend-independent description of a linear program: columns with bounds and
//! integrality, rows built from [`LinExpr`] expressions, and a linear objective. The [`Backend`]
//! trait is the narrow interface to the engine that actually solves the model. Any engine that can
//! report primal values (and, for continuous models, row duals) can be plugged in; the default is
//! [`HighsBackend`].

use thiserror::Error;

mod backend;

pub use backend::HighsBackend;

/// Optimisation direction of a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sense {
    /// Maximise the objective function.
    Maximise,
    /// Minimise the objective function.
    Minimise,
}

/// Reference to a decision variable of a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Var(usize);

/// Reference to a constraint row of a [`Model`], used to look up its dual value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Row(usize);

/// Bounds and integrality of a single column.
#[derive(Debug, Clone, Copy)]
struct ColDef {
    /// Lower bound of the column.
    lower: f64,
    /// Upper bound of the column (may be infinite).
    upper: f64,
    /// Whether the column is restricted to integer values.
    integer: bool,
}

/// Comparison operator of a constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cmp {
    /// The row must be less than or equal to the right-hand side.
    Le,
    /// The row must be greater than or equal to the right-hand side.
    Ge,
    /// The row must be equal to the right-hand side.
    Eq,
}

/// A single constraint row with combined coefficients.
#[derive(Debug, Clone)]
struct RowDef {
    /// Non-zero coefficients, sorted by column index without duplicates.
    terms: Vec<(usize, f64)>,
    /// Comparison operator of the row.
    cmp: Cmp,
    /// Right-hand side, with any constant of the expression already folded in.
    rhs: f64,
}

/// A linear expression over the variables of a [`Model`], plus a constant offset.
#[derive(Debug, Clone, Default)]
pub struct LinExpr {
    /// Terms of the expression, in insertion order (duplicates allowed).
    terms: Vec<(Var, f64)>,
    /// Constant offset of the expression.
    constant: f64,
}

impl LinExpr {
    /// Create an empty expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an expression consisting of a single term.
    pub fn term(var: Var, coeff: f64) -> Self {
        let mut expr = Self::new();
        expr.add_term(var, coeff);
        expr
    }

    /// Add `coeff * var` to the expression. Zero coefficients are skipped.
    pub fn add_term(&mut self, var: Var, coeff: f64) {
        if coeff != 0.0 {
            self.terms.push((var, coeff));
        }
    }

    /// Add a constant offset to the expression.
    pub fn add_constant(&mut self, constant: f64) {
        self.constant += constant;
    }

    /// Whether the expression has no terms (a constant offset does not count).
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Collapse the terms into per-column coefficients, sorted by column index.
    fn combined(&self) -> Vec<(usize, f64)> {
        let mut terms: Vec<(usize, f64)> = self.terms.iter().map(|&(v, c)| (v.0, c)).collect();
        terms.sort_by_key(|&(col, _)| col);
        let mut combined: Vec<(usize, f64)> = Vec::with_capacity(terms.len());
        for (col, coeff) in terms {
            match combined.last_mut() {
                Some((last, c)) if *last == col => *c += coeff,
                _ => combined.push((col, coeff)),
            }
        }
        combined
    }
}

impl From<Var> for LinExpr {
    fn from(var: Var) -> Self {
        Self::term(var, 1.0)
    }
}

/// A backend-independent LP/MILP model.
#[derive(Debug, Clone)]
pub struct Model {
    /// Optimisation direction.
    sense: Sense,
    /// All columns of the model.
    cols: Vec<ColDef>,
    /// All constraint rows of the model.
    rows: Vec<RowDef>,
    /// Objective coefficient of each column.
    objective: Vec<f64>,
    /// Constant part of the objective, reported as part of the objective value.
    objective_constant: f64,
}

impl Model {
    /// Create an empty maximisation model.
    pub fn maximise() -> Self {
        Self::new(Sense::Maximise)
    }

    /// Create an empty minimisation model.
    pub fn minimise() -> Self {
        Self::new(Sense::Minimise)
    }

    /// Create an empty model with the given sense.
    fn new(sense: Sense) -> Self {
        Self {
            sense,
            cols: Vec::new(),
            rows: Vec::new(),
            objective: Vec::new(),
            objective_constant: 0.0,
        }
    }

    /// Add a continuous variable with the given bounds. Use `f64::INFINITY` for a free upper
    /// bound.
    pub fn add_var(&mut self, lower: f64, upper: f64) -> Var {
        self.cols.push(ColDef {
            lower,
            upper,
            integer: false,
        });
        self.objective.push(0.0);
        Var(self.cols.len() - 1)
    }

    /// Add a binary variable.
    pub fn add_binary(&mut self) -> Var {
        self.cols.push(ColDef {
            lower: 0.0,
            upper: 1.0,
            integer: true,
        });
        self.objective.push(0.0);
        Var(self.cols.len() - 1)
    }

    /// Add the constraint `expr <= rhs`.
    pub fn add_le(&mut self, expr: LinExpr, rhs: f64) -> Row {
        self.add_row(expr, Cmp::Le, rhs)
    }

    /// Add the constraint `expr >= rhs`.
    pub fn add_ge(&mut self, expr: LinExpr, rhs: f64) -> Row {
        self.add_row(expr, Cmp::Ge, rhs)
    }

    /// Add the constraint `expr == rhs`.
    pub fn add_eq(&mut self, expr: LinExpr, rhs: f64) -> Row {
        self.add_row(expr, Cmp::Eq, rhs)
    }

    /// Add a constraint row, folding the expression constant into the right-hand side.
    fn add_row(&mut self, expr: LinExpr, cmp: Cmp, rhs: f64) -> Row {
        self.rows.push(RowDef {
            terms: expr.combined(),
            cmp,
            rhs: rhs - expr.constant,
        });
        Row(self.rows.len() - 1)
    }

    /// Set the objective function. The constant part of the expression is included in the
    /// objective value reported by the solution.
    pub fn set_objective(&mut self, expr: LinExpr) {
        self.objective = vec![0.0; self.cols.len()];
        for (col, coeff) in expr.combined() {
            self.objective[col] = coeff;
        }
        self.objective_constant = expr.constant;
    }

    /// Number of columns in the model.
    pub fn num_vars(&self) -> usize {
        self.cols.len()
    }

    /// Number of constraint rows in the model.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Evaluate the objective function on the given column values.
    fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective_constant
            + self
                .objective
                .iter()
                .zip(values)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }
}

/// Primal (and, for continuous models, dual) values of a solved [`Model`].
#[derive(Debug, Clone)]
pub struct Solution {
    /// Value of each column.
    values: Vec<f64>,
    /// Dual value of each row. Empty or meaningless for models with integer columns.
    duals: Vec<f64>,
    /// Objective value, including the constant part of the objective.
    objective: f64,
}

impl Solution {
    /// Value of the given variable.
    pub fn value(&self, var: Var) -> f64 {
        self.values[var.0]
    }

    /// Dual value of the given row. Only meaningful for fully continuous models; backends may
    /// report no duals for integer models, in which case this returns 0.
    pub fn dual(&self, row: Row) -> f64 {
        self.duals.get(row.0).copied().unwrap_or(0.0)
    }

    /// Objective value of the solution.
    pub fn objective(&self) -> f64 {
        self.objective
    }
}

/// Terminal failure reported by a solver engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveFailure {
    /// The model admits no feasible assignment.
    #[error("the problem is infeasible")]
    Infeasible,
    /// The objective is unbounded over the feasible region.
    #[error("the problem is unbounded")]
    Unbounded,
    /// Any other terminal status reported by the engine.
    #[error("the solver terminated with status {0}")]
    Status(String),
}

/// Abstract handle to an LP/MILP solver engine.
///
/// Engine handles are not required to be reentrant; embedders running several optimisations
/// concurrently must provide one backend instance per worker.
pub trait Backend {
    /// Solve the model to optimality, returning the primal values, the row duals (for continuous
    /// models), and the objective value.
    fn solve(&self, model: &Model) -> Result<Solution, SolveFailure>;
}
