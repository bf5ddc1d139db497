//! Parallel evaluation of objectives.
//!
//! Population-based solvers evaluate many candidate vectors per iteration, and
//! finite-difference gradients evaluate one perturbed vector per parameter. Both are
//! independent evaluations, which this module spreads over Rayon's thread pool.

use ndarray::Array1;
use rayon::prelude::*;

use crate::error::Result;
use crate::solver::ObjectiveFunction;
use crate::utils::finite_difference::{step, DEFAULT_EPSILON};

/// Evaluate the objective at every candidate in parallel.
///
/// # Arguments
///
/// * `objective` - The objective to evaluate
/// * `candidates` - Flat vectors to evaluate
///
/// # Returns
///
/// * `Result<Vec<f64>>` - One cost per candidate, in candidate order
pub fn evaluate_batch<O>(objective: &O, candidates: &[Array1<f64>]) -> Result<Vec<f64>>
where
    O: ObjectiveFunction + Sync + ?Sized,
{
    candidates
        .par_iter()
        .map(|candidate| objective.value(candidate))
        .collect()
}

/// Index and cost of the lowest-cost candidate, or `None` for an empty batch.
pub fn best_candidate<O>(objective: &O, candidates: &[Array1<f64>]) -> Result<Option<(usize, f64)>>
where
    O: ObjectiveFunction + Sync + ?Sized,
{
    let costs = evaluate_batch(objective, candidates)?;
    Ok(costs
        .into_iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(&b.1)))
}

/// Compute the gradient using central finite differences in parallel.
///
/// # Arguments
///
/// * `objective` - The objective to differentiate
/// * `params` - The point at which to evaluate the gradient
/// * `epsilon` - The step size for finite differences (optional)
///
/// # Returns
///
/// * `Result<Array1<f64>>` - The gradient vector
pub fn gradient_parallel<O>(
    objective: &O,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array1<f64>>
where
    O: ObjectiveFunction + Sync + ?Sized,
{
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);

    let partials: Result<Vec<f64>> = (0..params.len())
        .into_par_iter()
        .map(|j| {
            let eps_j = step(params[j], eps);

            let mut params_forward = params.clone();
            params_forward[j] += eps_j;
            let mut params_backward = params.clone();
            params_backward[j] -= eps_j;

            let f_forward = objective.value(&params_forward)?;
            let f_backward = objective.value(&params_backward)?;
            Ok((f_forward - f_backward) / (2.0 * eps_j))
        })
        .collect();

    Ok(Array1::from(partials?))
}
