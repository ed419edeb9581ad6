//! Per-step residuals of computed trajectories.
//!
//! Each error compares a stored state with what its scheme should have
//! produced from the preceding state, measured in the Euclidean norm.

use numr::runtime::Runtime;

use super::operators::{shifted_identity, validate_problem};
use crate::integrate::error::{IntegrateError, IntegrateResult};
use crate::integrate::ode::StepSizeSchedule;
use crate::tensor_train::impl_generic::{tt_dot_impl, tt_norm_impl, tt_sub_impl};
use crate::tensor_train::{TensorTrain, TtClient, TtNorm};

/// `‖x_{i+1} − (I + h_i A) x_i‖ / ‖x_i‖` for every step.
pub fn errors_expl_euler_impl<R, C>(
    client: &C,
    operator: &TensorTrain<R>,
    solution: &[TensorTrain<R>],
    step_sizes: &StepSizeSchedule,
) -> IntegrateResult<Vec<f64>>
where
    R: Runtime,
    C: TtClient<R>,
{
    step_errors(operator, solution, step_sizes, |h, current, next| {
        let predicted = tt_dot_impl(client, &shifted_identity(client, operator, h)?, current)?;
        relative_difference(client, next, &predicted, current)
    })
}

/// `‖(I − h_i A) x_{i+1} − x_i‖ / ‖x_i‖` for every step.
pub fn errors_impl_euler_impl<R, C>(
    client: &C,
    operator: &TensorTrain<R>,
    solution: &[TensorTrain<R>],
    step_sizes: &StepSizeSchedule,
) -> IntegrateResult<Vec<f64>>
where
    R: Runtime,
    C: TtClient<R>,
{
    step_errors(operator, solution, step_sizes, |h, current, next| {
        let applied = tt_dot_impl(client, &shifted_identity(client, operator, -h)?, next)?;
        relative_difference(client, &applied, current, current)
    })
}

/// `‖(I − h_i/2 A) x_{i+1} − (I + h_i/2 A) x_i‖ / ‖(I + h_i/2 A) x_i‖` for every step.
pub fn errors_trapezoidal_impl<R, C>(
    client: &C,
    operator: &TensorTrain<R>,
    solution: &[TensorTrain<R>],
    step_sizes: &StepSizeSchedule,
) -> IntegrateResult<Vec<f64>>
where
    R: Runtime,
    C: TtClient<R>,
{
    step_errors(operator, solution, step_sizes, |h, current, next| {
        let applied = tt_dot_impl(client, &shifted_identity(client, operator, -0.5 * h)?, next)?;
        let rhs = tt_dot_impl(client, &shifted_identity(client, operator, 0.5 * h)?, current)?;
        relative_difference(client, &applied, &rhs, &rhs)
    })
}

/// `‖a − b‖₂ / ‖reference‖₂`.
fn relative_difference<R, C>(
    client: &C,
    a: &TensorTrain<R>,
    b: &TensorTrain<R>,
    reference: &TensorTrain<R>,
) -> IntegrateResult<f64>
where
    R: Runtime,
    C: TtClient<R>,
{
    let difference = tt_norm_impl(client, &tt_sub_impl(client, a, b)?, TtNorm::Euclidean)?;
    Ok(difference / tt_norm_impl(client, reference, TtNorm::Euclidean)?)
}

/// Evaluate `error(h_i, x_i, x_{i+1})` over consecutive trajectory states.
///
/// Partial trajectories are accepted: the schedule may hold more steps than
/// the trajectory, never fewer.
fn step_errors<R, F>(
    operator: &TensorTrain<R>,
    solution: &[TensorTrain<R>],
    step_sizes: &StepSizeSchedule,
    mut error: F,
) -> IntegrateResult<Vec<f64>>
where
    R: Runtime,
    F: FnMut(f64, &TensorTrain<R>, &TensorTrain<R>) -> IntegrateResult<f64>,
{
    if solution.len() > step_sizes.len() + 1 {
        return Err(IntegrateError::InvalidInput {
            context: format!(
                "trajectory of {} states needs at least {} step sizes, got {}",
                solution.len(),
                solution.len() - 1,
                step_sizes.len()
            ),
        });
    }
    let states: Vec<(&str, &TensorTrain<R>)> = solution.iter().map(|x| ("solution", x)).collect();
    validate_problem(operator, &states)?;

    solution
        .windows(2)
        .zip(step_sizes.as_slice())
        .map(|(pair, &h)| error(h, &pair[0], &pair[1]))
        .collect()
}
