//! Generic tensor-train ODE solver implementations.
//!
//! All schemes advance `dx/dt = A x` with operators and states held as
//! [`TensorTrain`]s; every step is a handful of TT products, sums, truncations
//! or linear solves.

mod adaptive;
mod errors;
mod fixed_step;
mod operators;

pub use adaptive::adaptive_step_size_impl;
pub use errors::{errors_expl_euler_impl, errors_impl_euler_impl, errors_trapezoidal_impl};
pub use fixed_step::{
    explicit_euler_impl, fixed_step_impl, implicit_euler_impl, sod_impl, trapezoidal_rule_impl,
};

use numr::runtime::Runtime;

use crate::integrate::error::{IntegrateError, IntegrateResult};
use crate::integrate::ode::TtOdeMethod;
use crate::tensor_train::TensorTrain;

/// Trajectory of a tensor-train integration.
///
/// A run that fails after it started keeps the states computed so far;
/// `success` is then false and `failure` holds the cause.
#[derive(Debug, Clone)]
pub struct TtOdeResult<R: Runtime> {
    /// Absolute times, starting at 0
    pub t: Vec<f64>,

    /// States at the times in `t`; `y[0]` is the initial value
    pub y: Vec<TensorTrain<R>>,

    /// Whether the run completed
    pub success: bool,

    /// Description of the failure, if any
    pub message: Option<String>,

    /// Error that stopped the run, if any
    pub failure: Option<IntegrateError>,

    /// Number of linear solves
    pub nsolve: usize,

    /// Number of accepted steps
    pub naccept: usize,

    /// Number of rejected steps (adaptive runs only)
    pub nreject: usize,

    /// Method used
    pub method: TtOdeMethod,
}

impl<R: Runtime> TtOdeResult<R> {
    /// Turn a failed run into its error, discarding the partial trajectory.
    pub fn into_result(mut self) -> IntegrateResult<Self> {
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    /// Last state of the trajectory.
    pub fn y_final(&self) -> Option<&TensorTrain<R>> {
        self.y.last()
    }

    /// Number of stored states.
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

/// Append-only trajectory under construction.
pub(crate) struct Trajectory<R: Runtime> {
    t: Vec<f64>,
    y: Vec<TensorTrain<R>>,
    pub nsolve: usize,
    pub naccept: usize,
    pub nreject: usize,
}

impl<R: Runtime> Trajectory<R> {
    pub fn new(initial_value: TensorTrain<R>) -> Self {
        Self {
            t: vec![0.0],
            y: vec![initial_value],
            nsolve: 0,
            naccept: 0,
            nreject: 0,
        }
    }

    pub fn time(&self) -> f64 {
        self.t[self.t.len() - 1]
    }

    pub fn last(&self) -> &TensorTrain<R> {
        &self.y[self.y.len() - 1]
    }

    /// Append a state at absolute time `t`.
    pub fn push(&mut self, t: f64, state: TensorTrain<R>) {
        self.t.push(t);
        self.y.push(state);
        self.naccept += 1;
    }

    /// Close the run with the outcome of its step loop.
    pub fn finish(self, method: TtOdeMethod, outcome: IntegrateResult<()>) -> TtOdeResult<R> {
        let (success, message, failure) = match outcome {
            Ok(()) => (true, None, None),
            Err(err) => {
                log::warn!(
                    "{:?} stopped after {} steps at t = {:.6e}: {}",
                    method,
                    self.naccept,
                    self.time(),
                    err
                );
                (false, Some(err.to_string()), Some(err))
            }
        };
        TtOdeResult {
            t: self.t,
            y: self.y,
            success,
            message,
            failure,
            nsolve: self.nsolve,
            naccept: self.naccept,
            nreject: self.nreject,
            method,
        }
    }
}
