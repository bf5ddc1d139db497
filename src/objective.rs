//! Objective assembly
//!
//! Output parameters turn raw computed values into signed contributions (see
//! [`OutputParameter::contribution`]). This module combines them: [`residuals`]
//! lists every contribution component in output order, and [`assemble`] sums their
//! squares into the scalar cost.
//!
//! [`Objective`] closes the loop for a solver. For a flat vector it unpacks the
//! inputs, calls the caller's [`Evaluator`], and assembles the cost of the returned
//! outputs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ndarray::Array1;
use rand::Rng;

use crate::config::{EvaluationFailure, MarshalConfig};
use crate::error::{MarshalError, Result};
use crate::packing::{self, Constraint, GeneralConstraint, ValueMap};
use crate::parameters::input::InputParameter;
use crate::parameters::output::{Contribution, OutputParameter};
use crate::parameters::set::ParameterSet;
use crate::problem::Problem;
use crate::solver::{Minimizer, ObjectiveFunction, SolverProblem};
use crate::utils::finite_difference;

/// The caller's domain evaluation: input values in, output values out.
///
/// Any `Fn(&ValueMap) -> Result<ValueMap> + Sync` closure is an evaluator. Failures
/// should be reported as [`MarshalError::Evaluation`].
pub trait Evaluator: Sync {
    fn evaluate(&self, inputs: &ValueMap) -> Result<ValueMap>;
}

impl<F> Evaluator for F
where
    F: Fn(&ValueMap) -> Result<ValueMap> + Sync,
{
    fn evaluate(&self, inputs: &ValueMap) -> Result<ValueMap> {
        self(inputs)
    }
}

/// Contribution of every output, in output order
///
/// # Errors
///
/// `MissingValue` if `raw` has no entry for some output, and any error of
/// [`OutputParameter::contribution`].
pub fn contributions(outputs: &[OutputParameter], raw: &ValueMap) -> Result<Vec<Contribution>> {
    outputs
        .iter()
        .map(|output| {
            let value = raw
                .get(output.name())
                .ok_or_else(|| MarshalError::MissingValue {
                    name: output.name().to_string(),
                })?;
            output.contribution(value)
        })
        .collect()
}

/// Flattened contribution components, in output order (3 per point output).
pub fn residuals(outputs: &[OutputParameter], raw: &ValueMap) -> Result<Array1<f64>> {
    let residuals: Vec<f64> = contributions(outputs, raw)?
        .into_iter()
        .flat_map(Contribution::into_components)
        .collect();
    Ok(Array1::from(residuals))
}

/// Sum of squared contributions over all outputs
///
/// # Examples
///
/// ```
/// use optmarshal_rs::objective::assemble;
/// use optmarshal_rs::packing::ValueMap;
/// use optmarshal_rs::parameters::output::OutputParameter;
/// use optmarshal_rs::parameters::value::Value;
///
/// let outputs = vec![
///     OutputParameter::real("span").with_target(5.0).unwrap(),
///     OutputParameter::real("sag").with_target(1.0).unwrap(),
/// ];
/// let mut raw = ValueMap::new();
/// raw.insert("span".to_string(), Value::Real(7.0));
/// raw.insert("sag".to_string(), Value::Real(0.0));
///
/// assert_eq!(assemble(&outputs, &raw).unwrap(), 5.0);
/// ```
pub fn assemble(outputs: &[OutputParameter], raw: &ValueMap) -> Result<f64> {
    Ok(contributions(outputs, raw)?
        .iter()
        .map(Contribution::squared_norm)
        .sum())
}

/// What an evaluation was requested for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationKind {
    /// A cost requested by the solver
    Function,

    /// A perturbed point of a finite-difference gradient
    Gradient,
}

/// One evaluation of the objective.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub kind: EvaluationKind,

    /// The flat vector that was evaluated
    pub params: Array1<f64>,

    /// Input values unpacked from `params`
    pub inputs: ValueMap,

    /// Output values returned by the evaluator
    pub outputs: ValueMap,

    /// Contribution components, in output order
    pub residuals: Array1<f64>,

    /// Sum of squared residuals
    pub cost: f64,
}

/// A solver-facing objective built from a parameter set and an evaluator.
///
/// Counters, the history and the best evaluation are shared across threads, so an
/// objective can be evaluated concurrently (see [`crate::utils::parallel`]).
pub struct Objective<'a, E> {
    inputs: &'a [InputParameter],
    outputs: &'a [OutputParameter],
    evaluator: E,
    config: MarshalConfig,
    constraints: Vec<GeneralConstraint>,
    evaluations: AtomicUsize,
    gradient_evaluations: AtomicUsize,
    best: Mutex<Option<Evaluation>>,
    history: Mutex<Vec<Evaluation>>,
    cancel: Arc<AtomicBool>,
}

// A panic in another evaluating thread leaves the bookkeeping usable
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<'a, E: Evaluator> Objective<'a, E> {
    /// Create an objective with the default configuration
    ///
    /// # Errors
    ///
    /// `EmptyInputSet` or `DuplicateName` if the inputs cannot be packed.
    pub fn new(set: &'a ParameterSet, evaluator: E) -> Result<Self> {
        packing::check_inputs(set.inputs())?;

        Ok(Self {
            inputs: set.inputs(),
            outputs: set.outputs(),
            evaluator,
            config: MarshalConfig::default(),
            constraints: Vec::new(),
            evaluations: AtomicUsize::new(0),
            gradient_evaluations: AtomicUsize::new(0),
            best: Mutex::new(None),
            history: Mutex::new(Vec::new()),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Replace the configuration after validating it.
    pub fn with_config(mut self, config: MarshalConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Share a cancellation flag with the caller's optimization loop.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Add a caller-defined constraint, handed to solvers before the bound
    /// constraints.
    pub fn with_constraint(mut self, constraint: GeneralConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn constraints(&self) -> &[GeneralConstraint] {
        &self.constraints
    }

    pub fn config(&self) -> &MarshalConfig {
        &self.config
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Request cancellation; every later evaluation fails with `Cancelled`.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Number of successful cost evaluations so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Number of gradient requests so far.
    pub fn gradient_evaluations(&self) -> usize {
        self.gradient_evaluations.load(Ordering::Relaxed)
    }

    /// The lowest-cost evaluation seen so far, among cost evaluations.
    pub fn best(&self) -> Option<Evaluation> {
        lock(&self.best).clone()
    }

    /// Every successful evaluation so far, in completion order
    ///
    /// Empty when [`MarshalConfig::record_history`] is off.
    pub fn history(&self) -> Vec<Evaluation> {
        lock(&self.history).clone()
    }

    /// Clear counters, the history, the best evaluation and the cancellation flag.
    pub fn reset(&self) {
        self.evaluations.store(0, Ordering::Relaxed);
        self.gradient_evaluations.store(0, Ordering::Relaxed);
        self.cancel.store(false, Ordering::SeqCst);
        *lock(&self.best) = None;
        lock(&self.history).clear();
    }

    /// Evaluate the objective at a flat vector
    ///
    /// Errors are always returned, whatever the configured failure policy.
    pub fn evaluate(&self, x: &Array1<f64>) -> Result<Evaluation> {
        self.evaluate_as(x, EvaluationKind::Function)
    }

    /// Scalar cost at a flat vector, applying the configured failure policy
    ///
    /// With [`EvaluationFailure::MaxCost`] only failures of the evaluation
    /// callback are reported as `f64::MAX`; every other error is returned.
    pub fn cost(&self, x: &Array1<f64>) -> Result<f64> {
        match self.evaluate(x) {
            Ok(evaluation) => Ok(evaluation.cost),
            Err(err @ MarshalError::Evaluation(_))
                if self.config.on_evaluation_error == EvaluationFailure::MaxCost =>
            {
                log::warn!("Evaluation failed, reporting maximum cost: {}", err);
                Ok(f64::MAX)
            }
            Err(err) => Err(err),
        }
    }

    /// Central finite-difference gradient of the cost
    ///
    /// A failed evaluation at a perturbed point is always returned as an error.
    pub fn gradient(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        self.gradient_evaluations.fetch_add(1, Ordering::Relaxed);
        finite_difference::gradient(
            |p| Ok(self.evaluate_as(p, EvaluationKind::Gradient)?.cost),
            x,
            Some(self.config.gradient_step),
        )
    }

    /// Caller-defined constraints followed by the bound constraints of the inputs.
    pub fn all_constraints(&self) -> Result<Vec<Constraint>> {
        let bounds = packing::bound_constraints(self.inputs)?;
        Ok(self
            .constraints
            .iter()
            .cloned()
            .map(Constraint::from)
            .chain(bounds.into_iter().map(Constraint::from))
            .collect())
    }

    /// Solver setup with initial guesses from the configured start strategy.
    pub fn solver_problem(&self) -> Result<SolverProblem<'_>> {
        self.solver_problem_with_rng(&mut rand::thread_rng())
    }

    /// Like [`solver_problem`](Self::solver_problem), with a caller-supplied RNG.
    pub fn solver_problem_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<SolverProblem<'_>> {
        let packed = packing::layout_with(
            self.inputs,
            self.config.start_position,
            self.config.start_percent,
            rng,
        )?;
        let constraints = self.all_constraints()?;
        let (lower, upper, initial, _) = packed.into_parts();

        SolverProblem::new(lower, upper, initial, constraints, self)
    }

    /// Run a minimizer and return the named input values of its solution.
    pub fn minimize<M: Minimizer + ?Sized>(&self, minimizer: &mut M) -> Result<ValueMap> {
        let problem = self.solver_problem()?;
        let solution = minimizer.minimize(&problem)?;
        log::debug!(
            "Minimizer finished after {} evaluations",
            self.evaluations()
        );
        packing::unpack(&solution.to_vec(), self.inputs)
    }

    fn evaluate_as(&self, x: &Array1<f64>, kind: EvaluationKind) -> Result<Evaluation> {
        if self.is_cancelled() {
            return Err(MarshalError::Cancelled);
        }

        let inputs = packing::unpack(&x.to_vec(), self.inputs)?;
        let outputs = self.evaluator.evaluate(&inputs)?;
        let residuals = residuals(self.outputs, &outputs)?;
        let cost = residuals.iter().map(|r| r * r).sum();

        if kind == EvaluationKind::Function {
            let count = self.evaluations.fetch_add(1, Ordering::Relaxed) + 1;
            log::trace!("Evaluation {}: cost {}", count, cost);
        }

        let evaluation = Evaluation {
            kind,
            params: x.clone(),
            inputs,
            outputs,
            residuals,
            cost,
        };
        self.record(&evaluation);
        Ok(evaluation)
    }

    fn record(&self, evaluation: &Evaluation) {
        if evaluation.kind == EvaluationKind::Function {
            let mut best = lock(&self.best);
            let improved = best
                .as_ref()
                .map_or(true, |current| evaluation.cost < current.cost);
            if improved {
                *best = Some(evaluation.clone());
            }
        }

        if self.config.record_history {
            lock(&self.history).push(evaluation.clone());
        }
    }
}

impl<E: Evaluator> Problem for Objective<'_, E> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        Ok(self.evaluate(params)?.residuals)
    }

    fn parameter_count(&self) -> usize {
        packing::dimension(self.inputs)
    }

    fn residual_count(&self) -> usize {
        self.outputs.iter().map(|o| o.dimensionality()).sum()
    }
}

impl<E: Evaluator> ObjectiveFunction for Objective<'_, E> {
    fn dimension(&self) -> usize {
        packing::dimension(self.inputs)
    }

    fn value(&self, x: &Array1<f64>) -> Result<f64> {
        self.cost(x)
    }

    fn gradient(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        Objective::gradient(self, x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::point::Point3;
    use crate::parameters::value::{ParamRange, Value};
    use approx::assert_relative_eq;

    fn beam() -> ParameterSet {
        let mut set = ParameterSet::new();
        set.add_input(InputParameter::real("depth", 0.0, 10.0).unwrap())
            .unwrap();
        set.add_output(OutputParameter::real("deflection").with_target(3.0).unwrap())
            .unwrap();
        set
    }

    fn deflection(inputs: &ValueMap) -> Result<ValueMap> {
        let depth = inputs["depth"]
            .as_real()
            .ok_or_else(|| MarshalError::Evaluation("depth is not real".to_string()))?;
        let mut outputs = ValueMap::new();
        outputs.insert("deflection".to_string(), Value::Real(2.0 * depth));
        Ok(outputs)
    }

    #[test]
    fn test_assemble_and_missing_value() {
        let outputs = vec![
            OutputParameter::real("span").with_target(5.0).unwrap(),
            OutputParameter::point("apex"),
        ];
        let mut raw = ValueMap::new();
        raw.insert("span".to_string(), Value::Real(7.0));
        assert!(matches!(
            assemble(&outputs, &raw),
            Err(MarshalError::MissingValue { name }) if name == "apex"
        ));

        raw.insert("apex".to_string(), Value::Point(Point3::new(1.0, 2.0, 2.0)));
        assert_relative_eq!(assemble(&outputs, &raw).unwrap(), 4.0 + 9.0);
        assert_eq!(residuals(&outputs, &raw).unwrap().to_vec(), vec![2.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_penalty_dominates_cost() {
        let outputs = vec![OutputParameter::real("stress")
            .with_allowable_range(ParamRange::real(0.0, 10.0).unwrap())
            .unwrap()];
        let mut raw = ValueMap::new();
        raw.insert("stress".to_string(), Value::Real(15.0));
        assert_relative_eq!(assemble(&outputs, &raw).unwrap(), 250_000.0);
    }

    #[test]
    fn test_objective_evaluate_and_best() {
        let set = beam();
        let objective = Objective::new(&set, deflection).unwrap();

        let eval = objective.evaluate(&Array1::from(vec![2.0])).unwrap();
        assert_relative_eq!(eval.cost, 1.0);
        assert_eq!(eval.outputs["deflection"], Value::Real(4.0));

        objective.evaluate(&Array1::from(vec![1.5])).unwrap();
        objective.evaluate(&Array1::from(vec![5.0])).unwrap();
        assert_eq!(objective.evaluations(), 3);

        let best = objective.best().unwrap();
        assert_relative_eq!(best.cost, 0.0);
        assert_eq!(best.inputs["depth"], Value::Real(1.5));

        objective.reset();
        assert_eq!(objective.evaluations(), 0);
        assert!(objective.best().is_none());
    }

    #[test]
    fn test_gradient() {
        let set = beam();
        let objective = Objective::new(&set, deflection).unwrap();
        // cost = (2d - 3)^2, d cost / d d = 4 (2d - 3)
        let grad = objective.gradient(&Array1::from(vec![2.0])).unwrap();
        assert_relative_eq!(grad[0], 4.0, epsilon = 1e-6);
        assert_eq!(objective.gradient_evaluations(), 1);
    }

    #[test]
    fn test_cancellation() {
        let set = beam();
        let objective = Objective::new(&set, deflection).unwrap();
        let flag = objective.cancel_flag();
        flag.store(true, Ordering::SeqCst);

        assert!(matches!(
            objective.cost(&Array1::from(vec![1.0])),
            Err(MarshalError::Cancelled)
        ));
        assert_eq!(objective.evaluations(), 0);
    }

    #[test]
    fn test_failure_policy() {
        let set = beam();
        let failing = |_: &ValueMap| -> Result<ValueMap> {
            Err(MarshalError::Evaluation("model did not converge".to_string()))
        };

        let objective = Objective::new(&set, failing).unwrap();
        assert!(matches!(
            objective.cost(&Array1::from(vec![1.0])),
            Err(MarshalError::Evaluation(_))
        ));

        let objective = Objective::new(&set, failing)
            .unwrap()
            .with_config(MarshalConfig::default().with_evaluation_failure(EvaluationFailure::MaxCost))
            .unwrap();
        assert_eq!(objective.cost(&Array1::from(vec![1.0])).unwrap(), f64::MAX);

        // Wrong vector length is never swallowed
        assert!(matches!(
            objective.cost(&Array1::from(vec![1.0, 2.0])),
            Err(MarshalError::VectorLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_problem_view() {
        let set = beam();
        let objective = Objective::new(&set, deflection).unwrap();
        assert_eq!(objective.parameter_count(), 1);
        assert_eq!(objective.residual_count(), 1);
        assert_relative_eq!(objective.eval_cost(&Array1::from(vec![3.0])).unwrap(), 9.0);
    }

    #[test]
    fn test_rejects_empty_inputs_and_bad_config() {
        let set = ParameterSet::new();
        assert!(matches!(
            Objective::new(&set, deflection),
            Err(MarshalError::EmptyInputSet)
        ));

        let set = beam();
        let result = Objective::new(&set, deflection)
            .unwrap()
            .with_config(MarshalConfig::default().with_start_percent(2.0));
        assert!(matches!(result, Err(MarshalError::InvalidSetting(_))));
    }

    fn max_cost() -> MarshalConfig {
        MarshalConfig::default().with_evaluation_failure(EvaluationFailure::MaxCost)
    }

    #[test]
    fn test_max_cost_keeps_configuration_errors() {
        let set = beam();
        let empty = |_: &ValueMap| -> Result<ValueMap> { Ok(ValueMap::new()) };
        let objective = Objective::new(&set, empty)
            .unwrap()
            .with_config(max_cost())
            .unwrap();
        assert!(matches!(
            objective.cost(&Array1::from(vec![1.0])),
            Err(MarshalError::MissingValue { name }) if name == "deflection"
        ));

        let mut set = ParameterSet::new();
        set.add_input(InputParameter::real("depth", 0.0, 10.0).unwrap())
            .unwrap();
        set.add_output(
            OutputParameter::real("deflection")
                .with_scale_range(ParamRange::real(3.0, 3.0).unwrap())
                .unwrap(),
        )
        .unwrap();
        let objective = Objective::new(&set, deflection)
            .unwrap()
            .with_config(max_cost())
            .unwrap();
        assert!(matches!(
            objective.cost(&Array1::from(vec![1.0])),
            Err(MarshalError::DegenerateRange { .. })
        ));
    }

    #[test]
    fn test_gradient_propagates_failures_under_max_cost() {
        let set = beam();
        let fragile = |inputs: &ValueMap| -> Result<ValueMap> {
            if inputs["depth"].as_real().unwrap_or_default() > 5.0 {
                return Err(MarshalError::Evaluation("model diverged".to_string()));
            }
            deflection(inputs)
        };
        let objective = Objective::new(&set, fragile)
            .unwrap()
            .with_config(max_cost())
            .unwrap();

        assert_eq!(objective.cost(&Array1::from(vec![6.0])).unwrap(), f64::MAX);
        assert!(matches!(
            objective.gradient(&Array1::from(vec![5.0])),
            Err(MarshalError::Evaluation(_))
        ));
        assert!(objective.gradient(&Array1::from(vec![2.0])).is_ok());
    }

    #[test]
    fn test_history_and_best_by_kind() {
        let set = beam();
        let objective = Objective::new(&set, deflection).unwrap();

        objective.evaluate(&Array1::from(vec![3.0])).unwrap();
        objective.gradient(&Array1::from(vec![1.5])).unwrap();

        let history = objective.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].kind, EvaluationKind::Function);
        assert!(history[1..].iter().all(|e| e.kind == EvaluationKind::Gradient));
        assert_eq!(objective.evaluations(), 1);

        // Gradient points sit closer to the optimum but never count as best
        assert_eq!(objective.best().unwrap().params.to_vec(), vec![3.0]);

        let quiet = Objective::new(&set, deflection)
            .unwrap()
            .with_config(MarshalConfig::default().with_record_history(false))
            .unwrap();
        quiet.evaluate(&Array1::from(vec![3.0])).unwrap();
        assert!(quiet.history().is_empty());
        assert!(quiet.best().is_some());

        objective.reset();
        assert!(objective.history().is_empty());
    }

    #[test]
    fn test_poisoned_lock_still_records() {
        let set = beam();
        let objective = Objective::new(&set, deflection).unwrap();

        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = objective.best.lock().unwrap();
            panic!("evaluating thread panicked");
        }));
        assert!(objective.best.is_poisoned());

        objective.evaluate(&Array1::from(vec![1.5])).unwrap();
        assert_relative_eq!(objective.best().unwrap().cost, 0.0);
    }

    #[test]
    fn test_caller_constraints_come_first() {
        use crate::packing::Comparator;

        let set = beam();
        let objective = Objective::new(&set, deflection)
            .unwrap()
            .with_constraint(GeneralConstraint::new(
                "shallow",
                Comparator::LessThanOrEqual,
                4.0,
                |x| Ok(x[0]),
            ));

        let constraints = objective.all_constraints().unwrap();
        assert_eq!(constraints.len(), 3);
        assert!(matches!(constraints[0], Constraint::General(_)));
        assert!(matches!(constraints[1], Constraint::Bound(_)));

        let problem = objective.solver_problem().unwrap();
        assert_eq!(problem.constraints.len(), 3);
        assert_eq!(problem.max_violation(&Array1::from(vec![6.0])).unwrap(), 2.0);
    }
}
