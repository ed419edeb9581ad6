//! Integration trait for tensor-train ODEs.
#![allow(clippy::too_many_arguments)]

use numr::runtime::Runtime;

use crate::integrate::error::IntegrateResult;
use crate::integrate::impl_generic::TtOdeResult;
use crate::integrate::ode::{AdaptiveOptions, FixedStepMethod, FixedStepOptions, StepSizeSchedule};
use crate::integrate::progress::ProgressReporter;
use crate::tensor_train::TensorTrain;

/// Time integration of linear ODEs `dx/dt = A x` in tensor-train format.
///
/// Runs that fail after stepping started return `Ok` with
/// `success == false` and the trajectory computed so far; use
/// [`TtOdeResult::into_result`] to turn such a run into an error.
/// Invalid options or mismatched dimensions fail with `Err` before any step.
///
/// # Example
///
/// ```ignore
/// use ttsolvr::integrate::{FixedStepOptions, NoProgress, StepSizeSchedule, TtOdeAlgorithms};
/// use ttsolvr::tensor_train::TensorTrain;
/// use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
///
/// let device = CpuDevice::new();
/// let client = CpuClient::new(device.clone());
///
/// let operator = TensorTrain::<CpuRuntime>::kron_operator(&[vec![-1.0, 0.5, 1.0, -0.5]], &[2], &device)?;
/// let x0 = TensorTrain::<CpuRuntime>::kron_state(&[vec![1.0, 0.0]], &device)?;
/// let steps = StepSizeSchedule::uniform(0.1, 50)?;
///
/// let result = client
///     .implicit_euler(&operator, &x0, &x0, &steps, &FixedStepOptions::default(), &NoProgress)?
///     .into_result()?;
/// ```
pub trait TtOdeAlgorithms<R: Runtime> {
    /// Explicit Euler: `x_{i+1} = truncate((I + h_i A) x_i)`, normalized.
    fn explicit_euler(
        &self,
        operator: &TensorTrain<R>,
        initial_value: &TensorTrain<R>,
        step_sizes: &StepSizeSchedule,
        options: &FixedStepOptions,
        progress: &dyn ProgressReporter,
    ) -> IntegrateResult<TtOdeResult<R>>;

    /// Second order differencing (time-symmetrized explicit Euler).
    ///
    /// `x_{i+1} = truncate(x_{i-1} + 2 h_i A x_i)` with `x_{-1} = (I - h_0 A) x_0`.
    fn sod(
        &self,
        operator: &TensorTrain<R>,
        initial_value: &TensorTrain<R>,
        step_sizes: &StepSizeSchedule,
        options: &FixedStepOptions,
        progress: &dyn ProgressReporter,
    ) -> IntegrateResult<TtOdeResult<R>>;

    /// Implicit Euler: solve `(I - h_i A) x_{i+1} = x_i`.
    ///
    /// The first solve starts from `initial_guess`, every later one from the
    /// previous solution.
    fn implicit_euler(
        &self,
        operator: &TensorTrain<R>,
        initial_value: &TensorTrain<R>,
        initial_guess: &TensorTrain<R>,
        step_sizes: &StepSizeSchedule,
        options: &FixedStepOptions,
        progress: &dyn ProgressReporter,
    ) -> IntegrateResult<TtOdeResult<R>>;

    /// Trapezoidal rule: solve `(I - h_i/2 A) x_{i+1} = (I + h_i/2 A) x_i`.
    ///
    /// States are always normalized in the Manhattan norm.
    fn trapezoidal_rule(
        &self,
        operator: &TensorTrain<R>,
        initial_value: &TensorTrain<R>,
        initial_guess: &TensorTrain<R>,
        step_sizes: &StepSizeSchedule,
        options: &FixedStepOptions,
        progress: &dyn ProgressReporter,
    ) -> IntegrateResult<TtOdeResult<R>>;

    /// Run the fixed-step scheme `method`.
    ///
    /// Implicit schemes start from `initial_guess`, or from `initial_value`
    /// when it is `None`.
    fn solve_fixed_step(
        &self,
        method: FixedStepMethod,
        operator: &TensorTrain<R>,
        initial_value: &TensorTrain<R>,
        initial_guess: Option<&TensorTrain<R>>,
        step_sizes: &StepSizeSchedule,
        options: &FixedStepOptions,
        progress: &dyn ProgressReporter,
    ) -> IntegrateResult<TtOdeResult<R>>;

    /// Relative residuals `‖x_{i+1} − (I + h_i A) x_i‖ / ‖x_i‖`.
    fn errors_expl_euler(
        &self,
        operator: &TensorTrain<R>,
        solution: &[TensorTrain<R>],
        step_sizes: &StepSizeSchedule,
    ) -> IntegrateResult<Vec<f64>>;

    /// Relative residuals `‖(I − h_i A) x_{i+1} − x_i‖ / ‖x_i‖`.
    fn errors_impl_euler(
        &self,
        operator: &TensorTrain<R>,
        solution: &[TensorTrain<R>],
        step_sizes: &StepSizeSchedule,
    ) -> IntegrateResult<Vec<f64>>;

    /// Relative residuals of the trapezoidal rule, measured against
    /// `‖(I + h_i/2 A) x_i‖`.
    fn errors_trapezoidal(
        &self,
        operator: &TensorTrain<R>,
        solution: &[TensorTrain<R>],
        step_sizes: &StepSizeSchedule,
    ) -> IntegrateResult<Vec<f64>>;

    /// Integrate from `t = 0` to `time_end` with adaptive step sizes.
    ///
    /// Stops early once the closeness `‖A x‖` falls to
    /// `options.closeness_min` or the step size to `options.step_size_min`.
    fn adaptive_step_size(
        &self,
        operator: &TensorTrain<R>,
        initial_value: &TensorTrain<R>,
        initial_guess: &TensorTrain<R>,
        time_end: f64,
        options: &AdaptiveOptions,
        progress: &dyn ProgressReporter,
    ) -> IntegrateResult<TtOdeResult<R>>;
}
