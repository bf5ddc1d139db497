//! Finite difference methods for numerical differentiation.
//!
//! Objectives built from black-box evaluations have no analytic derivatives. This
//! module approximates the gradient of a scalar cost and the Jacobian of a residual
//! vector from function values alone.

use ndarray::{Array1, Array2};

use crate::error::{MarshalError, Result};
use crate::problem::Problem;

/// Default step size for finite differences.
pub const DEFAULT_EPSILON: f64 = 1e-8;

/// Step for one parameter, scaled with the parameter's magnitude.
pub(crate) fn step(param: f64, eps: f64) -> f64 {
    if param.abs() > 1.0 {
        param.abs() * eps
    } else {
        eps
    }
}

/// Compute the Jacobian matrix using forward finite differences.
///
/// The Jacobian is the matrix of partial derivatives of the residuals with
/// respect to the parameters: J[i,j] = ∂residual[i]/∂param[j].
///
/// # Arguments
///
/// * `problem` - The problem to evaluate
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `epsilon` - The step size for finite differences (optional)
///
/// # Returns
///
/// * `Result<Array2<f64>>` - The Jacobian matrix
pub fn jacobian(
    problem: &dyn Problem,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let n_params = params.len();
    let n_residuals = problem.residual_count();

    let residuals = problem.eval(params)?;
    if residuals.len() != n_residuals {
        return Err(MarshalError::VectorLengthMismatch {
            expected: n_residuals,
            actual: residuals.len(),
        });
    }

    let mut jac = Array2::zeros((n_residuals, n_params));

    for j in 0..n_params {
        let eps_j = step(params[j], eps);
        let mut params_perturbed = params.clone();
        params_perturbed[j] += eps_j;

        let residuals_perturbed = problem.eval(&params_perturbed)?;
        for i in 0..n_residuals {
            jac[[i, j]] = (residuals_perturbed[i] - residuals[i]) / eps_j;
        }
    }

    Ok(jac)
}

/// Compute the gradient of a scalar function using central finite differences.
///
/// The gradient is the vector of partial derivatives of the function with
/// respect to the parameters: grad[j] = ∂f/∂param[j].
///
/// # Arguments
///
/// * `f` - The function to differentiate
/// * `params` - The parameter values at which to evaluate the gradient
/// * `epsilon` - The step size for finite differences (optional)
///
/// # Returns
///
/// * `Result<Array1<f64>>` - The gradient vector
pub fn gradient<F>(f: F, params: &Array1<f64>, epsilon: Option<f64>) -> Result<Array1<f64>>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let mut grad = Array1::zeros(params.len());

    for j in 0..params.len() {
        let eps_j = step(params[j], eps);

        let mut params_forward = params.clone();
        params_forward[j] += eps_j;
        let mut params_backward = params.clone();
        params_backward[j] -= eps_j;

        let f_forward = f(&params_forward)?;
        let f_backward = f(&params_backward)?;
        grad[j] = (f_forward - f_backward) / (2.0 * eps_j);
    }

    Ok(grad)
}
