//! Adaptive step size control for implicit tensor-train integration.
//!
//! Every step solves the implicit Euler system and a second, more accurate
//! approximation (two implicit Euler half steps or one trapezoidal step).
//! The step size is adapted from two signals:
//!
//! - the relative local error `‖t1 − t2‖ / ‖t1‖` of the embedded pair,
//! - the relative change of the closeness `‖A t1‖` to a stationary state.
//!
//! A step is accepted only if both are within tolerance. Integration stops at
//! `time_end`, once the closeness falls to `closeness_min`, or once the step
//! size falls to `step_size_min`.

use std::sync::atomic::Ordering;

use numr::runtime::Runtime;

use super::operators::{
    closeness, normalize, prepare_guess, shifted_identity, solve_at, validate_problem,
};
use super::{Trajectory, TtOdeResult};
use crate::integrate::error::{IntegrateError, IntegrateResult};
use crate::integrate::ode::{AdaptiveOptions, Normalization, SecondMethod, TtOdeMethod};
use crate::integrate::progress::{ProgressReporter, ProgressTimer};
use crate::tensor_train::impl_generic::{tt_dot_impl, tt_norm_impl, tt_sub_impl};
use crate::tensor_train::{TensorTrain, TtClient, TtNorm};

/// Integrate `dx/dt = A x` from `t = 0` to `time_end` with adaptive steps.
///
/// All states are normalized in the Manhattan norm.
pub fn adaptive_step_size_impl<R, C>(
    client: &C,
    operator: &TensorTrain<R>,
    initial_value: &TensorTrain<R>,
    initial_guess: &TensorTrain<R>,
    time_end: f64,
    options: &AdaptiveOptions,
    progress: &dyn ProgressReporter,
) -> IntegrateResult<TtOdeResult<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    options.validate()?;
    if !(time_end.is_finite() && time_end > 0.0) {
        return Err(IntegrateError::invalid_configuration(
            "time_end",
            format!("must be positive and finite, got {}", time_end),
        ));
    }
    validate_problem(
        operator,
        &[("initial_value", initial_value), ("initial_guess", initial_guess)],
    )?;

    let timer = ProgressTimer::start(progress, "Running adaptive step size method");
    let mut trajectory = Trajectory::new(initial_value.clone());
    let outcome = run(
        client,
        operator,
        initial_guess,
        time_end,
        options,
        &mut trajectory,
        &timer,
    );
    Ok(trajectory.finish(TtOdeMethod::Adaptive(options.second_method), outcome))
}

/// Outcome of one controller iteration.
struct StepTrial<R: Runtime> {
    state: TensorTrain<R>,
    closeness: f64,
    factor_local: f64,
    factor_closeness: f64,
    step_size_new: f64,
}

fn run<R, C>(
    client: &C,
    operator: &TensorTrain<R>,
    initial_guess: &TensorTrain<R>,
    time_end: f64,
    options: &AdaptiveOptions,
    trajectory: &mut Trajectory<R>,
    timer: &ProgressTimer<'_>,
) -> IntegrateResult<()>
where
    R: Runtime,
    C: TtClient<R>,
{
    let mut guess = prepare_guess(client, initial_guess, options.max_rank)?;
    let mut closeness_pre = closeness(client, operator, trajectory.last())?;
    let mut time = 0.0;
    let mut step_size = options.step_size_first;

    loop {
        if time >= time_end {
            log::debug!("adaptive run reached t = {:.6e}", time_end);
            return Ok(());
        }
        if closeness_pre <= options.closeness_min {
            log::debug!(
                "adaptive run stationary at t = {:.6e}, closeness {:.3e}",
                time,
                closeness_pre
            );
            return Ok(());
        }
        if step_size <= options.step_size_min {
            log::debug!(
                "adaptive run stopped at t = {:.6e}, step size {:.3e} below minimum",
                time,
                step_size
            );
            return Ok(());
        }
        if options
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return Err(IntegrateError::Cancelled { t: time });
        }

        let trial = trial_step(
            client,
            operator,
            &guess,
            step_size,
            closeness_pre,
            time,
            options,
            trajectory,
        )?;

        if trial.factor_local > 1.0 && trial.factor_closeness > 1.0 {
            time = (time + step_size).min(time_end);
            step_size = trial
                .step_size_new
                .min(time_end - time)
                .min(options.step_size_max);
            closeness_pre = trial.closeness;
            guess = trial.state.clone();
            trajectory.push(time, trial.state);
            timer.update(100.0 * time / time_end);
        } else {
            log::debug!(
                "rejected step h = {:.3e} at t = {:.6e} (error factor {:.3e}, closeness factor {:.3e})",
                step_size,
                time,
                trial.factor_local,
                trial.factor_closeness
            );
            trajectory.nreject += 1;
            step_size = trial.step_size_new;
        }
    }
}

/// Compute both approximations from the last state and the resulting factors.
#[allow(clippy::too_many_arguments)]
fn trial_step<R, C>(
    client: &C,
    operator: &TensorTrain<R>,
    guess: &TensorTrain<R>,
    step_size: f64,
    closeness_pre: f64,
    time: f64,
    options: &AdaptiveOptions,
    trajectory: &mut Trajectory<R>,
) -> IntegrateResult<StepTrial<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    let sle = options.sle_options();
    let current = trajectory.last().clone();

    let full = shifted_identity(client, operator, -step_size)?;
    let t1 = solve_at(client, &full, guess, &current, &sle, time)?;
    trajectory.nsolve += 1;
    let t1 = normalize(client, t1, Normalization::Manhattan)?;

    let half = shifted_identity(client, operator, -0.5 * step_size)?;
    let t2 = match options.second_method {
        SecondMethod::TwoStepEuler => {
            let midpoint = solve_at(client, &half, guess, &current, &sle, time)?;
            trajectory.nsolve += 1;
            let t2 = solve_at(client, &half, &midpoint, &midpoint, &sle, time)?;
            trajectory.nsolve += 1;
            t2
        }
        SecondMethod::TrapezoidalRule => {
            let forward = shifted_identity(client, operator, 0.5 * step_size)?;
            let rhs = tt_dot_impl(client, &forward, &current)?;
            let t2 = solve_at(client, &half, guess, &rhs, &sle, time)?;
            trajectory.nsolve += 1;
            t2
        }
    };
    let t2 = normalize(client, t2, Normalization::Manhattan)?;

    let closeness = closeness(client, operator, &t1)?;
    let local_error = tt_norm_impl(client, &tt_sub_impl(client, &t1, &t2)?, TtNorm::Euclidean)?
        / tt_norm_impl(client, &t1, TtNorm::Euclidean)?;
    let closeness_change = (closeness - closeness_pre) / closeness_pre;
    if local_error.is_nan() || closeness_change.is_nan() {
        return Err(IntegrateError::NumericalError {
            message: format!(
                "undefined step control at t = {:.6e} (local error {}, closeness change {})",
                time, local_error, closeness_change
            ),
        });
    }

    // A vanishing error or closeness change gives an infinite factor
    let factor_local = options.error_tol / local_error;
    let factor_closeness = options.closeness_tol / closeness_change.abs();
    let step_size_new = options
        .factor_max
        .min(options.factor_safe * factor_local)
        .min(options.factor_safe * factor_closeness)
        * step_size;
    if !step_size_new.is_finite() {
        return Err(IntegrateError::NumericalError {
            message: format!("step size {} at t = {:.6e}", step_size_new, time),
        });
    }

    Ok(StepTrial {
        state: t1,
        closeness,
        factor_local,
        factor_closeness,
        step_size_new,
    })
}
