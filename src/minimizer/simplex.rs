//! Nelder–Mead descent on top of `argmin`.
//!
//! The solver runs in internal coordinates (see [`super::bounds`]); the initial simplex is
//! the seed point plus one vertex displaced by the internal step along each parameter.

use argmin::{
    core::{CostFunction, Error, Executor, State, TerminationReason},
    solver::neldermead::NelderMead,
};
use tracing::debug;

use crate::{objective::Objective, pandelfit_errors::PandelFitError};

use super::{hesse::diagonal_edm, Minimizer, ParameterSpec, SimplexOutcome};

/// Default iteration limit of the descent.
pub const DEFAULT_MAX_ITERATIONS: u64 = 5000;

/// Default tolerance on the standard deviation of the simplex vertex values.
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Objective seen through the internal coordinates of its parameters.
struct InternalCost<'a> {
    objective: &'a dyn Objective,
    parameters: &'a [ParameterSpec],
}

impl InternalCost<'_> {
    fn external(&self, internal: &[f64]) -> Vec<f64> {
        self.parameters
            .iter()
            .zip(internal)
            .map(|(p, &x)| p.to_external(x))
            .collect()
    }
}

impl CostFunction for InternalCost<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.objective.value(&self.external(param)))
    }
}

/// [`Minimizer`] running `argmin`'s Nelder–Mead followed by the finite-difference Hesse phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArgminSimplex {
    pub max_iterations: u64,
    pub tolerance: f64,
}

impl ArgminSimplex {
    pub fn new(max_iterations: u64, tolerance: f64) -> Self {
        ArgminSimplex {
            max_iterations,
            tolerance,
        }
    }

    fn initial_simplex(parameters: &[ParameterSpec]) -> Vec<Vec<f64>> {
        let seed: Vec<f64> = parameters.iter().map(|p| p.to_internal(p.value)).collect();
        let mut vertices = Vec::with_capacity(parameters.len() + 1);
        vertices.push(seed.clone());
        for (i, p) in parameters.iter().enumerate() {
            let mut vertex = seed.clone();
            vertex[i] += p.internal_step();
            vertices.push(vertex);
        }
        vertices
    }
}

impl Default for ArgminSimplex {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE)
    }
}

fn status_code(reason: Option<&TerminationReason>) -> i32 {
    match reason {
        Some(TerminationReason::SolverConverged) | Some(TerminationReason::TargetCostReached) => 0,
        Some(TerminationReason::MaxItersReached) => 4,
        _ => 1,
    }
}

impl Minimizer for ArgminSimplex {
    fn simplex(
        &self,
        objective: &dyn Objective,
        parameters: &[ParameterSpec],
    ) -> Result<SimplexOutcome, PandelFitError> {
        let cost = InternalCost {
            objective,
            parameters,
        };
        let solver = NelderMead::new(Self::initial_simplex(parameters))
            .with_sd_tolerance(self.tolerance)?;

        let result = Executor::new(cost, solver)
            .configure(|state| state.max_iters(self.max_iterations))
            .run()?;
        let state = result.state();

        let internal = state
            .get_best_param()
            .ok_or_else(|| PandelFitError::Minimizer("no best point after descent".into()))?;
        let values: Vec<f64> = parameters
            .iter()
            .zip(internal)
            .map(|(p, &x)| p.to_external(x))
            .collect();

        let status = status_code(state.get_termination_reason());
        debug!(
            status,
            iterations = state.get_iter(),
            fcn = state.get_best_cost(),
            "simplex descent finished"
        );

        Ok(SimplexOutcome {
            status,
            fcn: objective.value(&values),
            edm: diagonal_edm(objective, parameters, &values),
            nvars: parameters.len(),
            values,
        })
    }
}
