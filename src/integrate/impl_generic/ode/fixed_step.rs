//! Fixed-step schemes for `dx/dt = A x` in tensor-train format.
#![allow(clippy::too_many_arguments)]

use numr::runtime::Runtime;

use super::operators::{normalize, prepare_guess, shifted_identity, solve_at, validate_problem};
use super::{Trajectory, TtOdeResult};
use crate::integrate::error::IntegrateResult;
use crate::integrate::ode::{
    FixedStepMethod, FixedStepOptions, Normalization, StepSizeSchedule, TtOdeMethod,
};
use crate::integrate::progress::{ProgressReporter, ProgressTimer};
use crate::tensor_train::impl_generic::{tt_add_impl, tt_dot_impl, tt_ortho_impl, tt_scale_impl};
use crate::tensor_train::{TensorTrain, TtClient};

/// Run any fixed-step scheme.
///
/// Implicit schemes warm-start their first solve from `initial_guess`, or
/// from `initial_value` if none is given. Explicit schemes ignore it.
pub fn fixed_step_impl<R, C>(
    client: &C,
    method: FixedStepMethod,
    operator: &TensorTrain<R>,
    initial_value: &TensorTrain<R>,
    initial_guess: Option<&TensorTrain<R>>,
    step_sizes: &StepSizeSchedule,
    options: &FixedStepOptions,
    progress: &dyn ProgressReporter,
) -> IntegrateResult<TtOdeResult<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    options.validate()?;
    let guess = initial_guess.unwrap_or(initial_value);
    validate_problem(
        operator,
        &[("initial_value", initial_value), ("initial_guess", guess)],
    )?;

    let timer = ProgressTimer::start(progress, method.label());
    let mut trajectory = Trajectory::new(initial_value.clone());
    let stepper = Stepper {
        client,
        operator,
        step_sizes: step_sizes.as_slice(),
        options,
        timer: &timer,
    };

    let outcome = match method {
        FixedStepMethod::ExplicitEuler => stepper.explicit_euler(&mut trajectory),
        FixedStepMethod::SymmetrizedEuler => stepper.sod(&mut trajectory),
        FixedStepMethod::ImplicitEuler => stepper.implicit_euler(&mut trajectory, guess),
        FixedStepMethod::TrapezoidalRule => stepper.trapezoidal_rule(&mut trajectory, guess),
    };
    Ok(trajectory.finish(TtOdeMethod::Fixed(method), outcome))
}

/// Explicit Euler: `x_{i+1} = truncate((I + h_i A) x_i)`.
pub fn explicit_euler_impl<R, C>(
    client: &C,
    operator: &TensorTrain<R>,
    initial_value: &TensorTrain<R>,
    step_sizes: &StepSizeSchedule,
    options: &FixedStepOptions,
    progress: &dyn ProgressReporter,
) -> IntegrateResult<TtOdeResult<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    fixed_step_impl(
        client,
        FixedStepMethod::ExplicitEuler,
        operator,
        initial_value,
        None,
        step_sizes,
        options,
        progress,
    )
}

/// Second order differencing: `x_{i+1} = truncate(x_{i-1} + 2 h_i A x_i)`.
pub fn sod_impl<R, C>(
    client: &C,
    operator: &TensorTrain<R>,
    initial_value: &TensorTrain<R>,
    step_sizes: &StepSizeSchedule,
    options: &FixedStepOptions,
    progress: &dyn ProgressReporter,
) -> IntegrateResult<TtOdeResult<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    fixed_step_impl(
        client,
        FixedStepMethod::SymmetrizedEuler,
        operator,
        initial_value,
        None,
        step_sizes,
        options,
        progress,
    )
}

/// Implicit Euler: solve `(I - h_i A) x_{i+1} = x_i`.
pub fn implicit_euler_impl<R, C>(
    client: &C,
    operator: &TensorTrain<R>,
    initial_value: &TensorTrain<R>,
    initial_guess: &TensorTrain<R>,
    step_sizes: &StepSizeSchedule,
    options: &FixedStepOptions,
    progress: &dyn ProgressReporter,
) -> IntegrateResult<TtOdeResult<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    fixed_step_impl(
        client,
        FixedStepMethod::ImplicitEuler,
        operator,
        initial_value,
        Some(initial_guess),
        step_sizes,
        options,
        progress,
    )
}

/// Trapezoidal rule: solve `(I - h_i/2 A) x_{i+1} = (I + h_i/2 A) x_i`.
pub fn trapezoidal_rule_impl<R, C>(
    client: &C,
    operator: &TensorTrain<R>,
    initial_value: &TensorTrain<R>,
    initial_guess: &TensorTrain<R>,
    step_sizes: &StepSizeSchedule,
    options: &FixedStepOptions,
    progress: &dyn ProgressReporter,
) -> IntegrateResult<TtOdeResult<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    fixed_step_impl(
        client,
        FixedStepMethod::TrapezoidalRule,
        operator,
        initial_value,
        Some(initial_guess),
        step_sizes,
        options,
        progress,
    )
}

/// Inputs shared by the step loops of one run.
struct Stepper<'a, R: Runtime, C> {
    client: &'a C,
    operator: &'a TensorTrain<R>,
    step_sizes: &'a [f64],
    options: &'a FixedStepOptions,
    timer: &'a ProgressTimer<'a>,
}

impl<R, C> Stepper<'_, R, C>
where
    R: Runtime,
    C: TtClient<R>,
{
    fn report(&self, completed: usize) {
        self.timer
            .update(100.0 * completed as f64 / self.step_sizes.len() as f64);
    }

    fn truncate(&self, state: &TensorTrain<R>) -> IntegrateResult<TensorTrain<R>> {
        Ok(tt_ortho_impl(
            self.client,
            state,
            self.options.threshold,
            self.options.max_rank,
        )?)
    }

    fn explicit_euler(&self, trajectory: &mut Trajectory<R>) -> IntegrateResult<()> {
        for (i, &h) in self.step_sizes.iter().enumerate() {
            let system = shifted_identity(self.client, self.operator, h)?;
            let next = tt_dot_impl(self.client, &system, trajectory.last())?;
            let next = self.truncate(&next)?;
            let next = normalize(self.client, next, self.options.normalize)?;

            let t = trajectory.time() + h;
            trajectory.push(t, next);
            self.report(i + 1);
        }
        Ok(())
    }

    fn sod(&self, trajectory: &mut Trajectory<R>) -> IntegrateResult<()> {
        let mut previous: Option<TensorTrain<R>> = None;
        for (i, &h) in self.step_sizes.iter().enumerate() {
            let current = trajectory.last();
            // One explicit Euler step backwards in time seeds the recursion
            let before = match previous.take() {
                Some(state) => state,
                None => {
                    let backwards = shifted_identity(self.client, self.operator, -h)?;
                    tt_dot_impl(self.client, &backwards, current)?
                }
            };

            let derivative = tt_dot_impl(self.client, self.operator, current)?;
            let next = tt_add_impl(
                self.client,
                &before,
                &tt_scale_impl(self.client, &derivative, 2.0 * h)?,
            )?;
            let next = self.truncate(&next)?;
            let next = normalize(self.client, next, self.options.normalize)?;
            previous = Some(current.clone());

            let t = trajectory.time() + h;
            trajectory.push(t, next);
            self.report(i + 1);
        }
        Ok(())
    }

    fn implicit_euler(
        &self,
        trajectory: &mut Trajectory<R>,
        initial_guess: &TensorTrain<R>,
    ) -> IntegrateResult<()> {
        let sle = self.options.sle_options();
        let mut guess = prepare_guess(self.client, initial_guess, self.options.max_rank)?;

        for (i, &h) in self.step_sizes.iter().enumerate() {
            let system = shifted_identity(self.client, self.operator, -h)?;
            let next = solve_at(
                self.client,
                &system,
                &guess,
                trajectory.last(),
                &sle,
                trajectory.time(),
            )?;
            trajectory.nsolve += 1;
            let next = normalize(self.client, next, self.options.normalize)?;
            guess = next.clone();

            let t = trajectory.time() + h;
            trajectory.push(t, next);
            self.report(i + 1);
        }
        Ok(())
    }

    fn trapezoidal_rule(
        &self,
        trajectory: &mut Trajectory<R>,
        initial_guess: &TensorTrain<R>,
    ) -> IntegrateResult<()> {
        let sle = self.options.sle_options();
        let mut guess = prepare_guess(self.client, initial_guess, self.options.max_rank)?;

        for (i, &h) in self.step_sizes.iter().enumerate() {
            let system = shifted_identity(self.client, self.operator, -0.5 * h)?;
            let forward = shifted_identity(self.client, self.operator, 0.5 * h)?;
            let rhs = tt_dot_impl(self.client, &forward, trajectory.last())?;
            let next = solve_at(self.client, &system, &guess, &rhs, &sle, trajectory.time())?;
            trajectory.nsolve += 1;
            let next = normalize(self.client, next, Normalization::Manhattan)?;
            guess = next.clone();

            let t = trajectory.time() + h;
            trajectory.push(t, next);
            self.report(i + 1);
        }
        Ok(())
    }
}
