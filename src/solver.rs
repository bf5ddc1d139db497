//! The seam to external minimizers.
//!
//! The nonlinear optimization algorithm itself lives outside this crate. A solver
//! plugs in by implementing [`Minimizer`]: it receives a [`SolverProblem`] carrying
//! the flat bounds, the initial guess, the constraints (caller-defined ones plus the
//! box bounds) and a scalar objective with a gradient, and returns the minimizing
//! vector.

use ndarray::Array1;

use crate::error::{MarshalError, Result};
use crate::packing::Constraint;

/// A scalar objective over the flat vector.
pub trait ObjectiveFunction {
    /// Length of the flat vector.
    fn dimension(&self) -> usize;

    /// Objective value at `x`.
    fn value(&self, x: &Array1<f64>) -> Result<f64>;

    /// Gradient of the objective at `x`.
    fn gradient(&self, x: &Array1<f64>) -> Result<Array1<f64>>;
}

/// Everything a minimizer needs to run.
pub struct SolverProblem<'o> {
    pub lower: Array1<f64>,
    pub upper: Array1<f64>,
    pub initial: Array1<f64>,

    /// Caller-defined constraints followed by the box bounds as `>=` / `<=`
    /// constraints, for solvers without native bounds
    pub constraints: Vec<Constraint>,

    pub objective: &'o dyn ObjectiveFunction,
}

impl<'o> SolverProblem<'o> {
    /// Bundle a problem, checking that all vectors have the objective's dimension.
    pub fn new(
        lower: Array1<f64>,
        upper: Array1<f64>,
        initial: Array1<f64>,
        constraints: Vec<Constraint>,
        objective: &'o dyn ObjectiveFunction,
    ) -> Result<Self> {
        let expected = objective.dimension();
        for actual in [lower.len(), upper.len(), initial.len()] {
            if actual != expected {
                return Err(MarshalError::VectorLengthMismatch { expected, actual });
            }
        }

        Ok(Self {
            lower,
            upper,
            initial,
            constraints,
            objective,
        })
    }

    pub fn dimension(&self) -> usize {
        self.initial.len()
    }

    /// Clamp `x` into the box bounds, entry by entry.
    pub fn project(&self, x: &mut Array1<f64>) {
        for ((v, lo), hi) in x.iter_mut().zip(self.lower.iter()).zip(self.upper.iter()) {
            *v = v.clamp(*lo, *hi);
        }
    }

    /// Largest violation over all constraints at `x`, 0 when all are satisfied.
    pub fn max_violation(&self, x: &Array1<f64>) -> Result<f64> {
        self.constraints
            .iter()
            .try_fold(0.0_f64, |worst, c| Ok(worst.max(c.violation(x)?)))
    }

    pub fn cost(&self, x: &Array1<f64>) -> Result<f64> {
        self.objective.value(x)
    }

    pub fn gradient(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        self.objective.gradient(x)
    }
}

/// An external optimization algorithm.
pub trait Minimizer {
    /// Return a flat vector that minimizes the problem's objective.
    fn minimize(&mut self, problem: &SolverProblem<'_>) -> Result<Array1<f64>>;
}
