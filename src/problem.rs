//! Residual-vector view of an optimization problem.
//!
//! This module defines the `Problem` trait, which exposes a problem as a vector of
//! residuals over a flat parameter vector. Least-squares solvers consume this view
//! directly; the scalar cost is the sum of squared residuals.

use ndarray::{Array1, Array2};

use crate::error::Result;

/// A trait representing a least squares problem over a flat parameter vector.
pub trait Problem {
    /// Evaluate the residuals at the given parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The flat parameter vector
    ///
    /// # Returns
    ///
    /// * A vector of residuals, or an error if the evaluation fails
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the Jacobian matrix at the given parameters.
    ///
    /// The default implementation uses forward finite differences.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>>
    where
        Self: Sized,
    {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Evaluate the sum of squared residuals at the given parameters.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Offsets {
        targets: Vec<f64>,
    }

    impl Problem for Offsets {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            Ok(params
                .iter()
                .zip(&self.targets)
                .map(|(p, t)| p - t)
                .collect())
        }

        fn parameter_count(&self) -> usize {
            self.targets.len()
        }

        fn residual_count(&self) -> usize {
            self.targets.len()
        }
    }

    #[test]
    fn test_default_cost_and_jacobian() {
        let problem = Offsets {
            targets: vec![1.0, -2.0],
        };
        let params = Array1::from(vec![4.0, 2.0]);

        assert_relative_eq!(problem.eval_cost(&params).unwrap(), 25.0);

        let jac = problem.jacobian(&params).unwrap();
        assert_relative_eq!(jac[[0, 0]], 1.0, epsilon = 1e-6);
        assert_relative_eq!(jac[[1, 1]], 1.0, epsilon = 1e-6);
        assert_relative_eq!(jac[[0, 1]], 0.0, epsilon = 1e-6);
    }
}
