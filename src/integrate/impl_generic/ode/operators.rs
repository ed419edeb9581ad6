//! Step operators and state bookkeeping shared by all schemes.

use numr::runtime::Runtime;

use crate::integrate::error::{IntegrateError, IntegrateResult};
use crate::integrate::ode::Normalization;
use crate::sle::SleOptions;
use crate::sle::impl_generic::tt_solve_impl;
use crate::tensor_train::impl_generic::{
    tt_add_impl, tt_dot_impl, tt_norm_impl, tt_ortho_impl, tt_scale_impl,
};
use crate::tensor_train::{TensorTrain, TtClient, TtNorm};

/// `I + c · A`.
pub(crate) fn shifted_identity<R, C>(
    client: &C,
    operator: &TensorTrain<R>,
    c: f64,
) -> IntegrateResult<TensorTrain<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    let eye = TensorTrain::eye(operator.row_dims(), client.device())?;
    let scaled = tt_scale_impl(client, operator, c)?;
    Ok(tt_add_impl(client, &eye, &scaled)?)
}

/// Divide `state` by its norm.
///
/// A zero or non-finite norm is a numerical error.
pub(crate) fn normalize<R, C>(
    client: &C,
    state: TensorTrain<R>,
    normalization: Normalization,
) -> IntegrateResult<TensorTrain<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    let Some(norm) = normalization.norm() else {
        return Ok(state);
    };
    let value = tt_norm_impl(client, &state, norm)?;
    if !(value.is_finite() && value > 0.0) {
        return Err(IntegrateError::NumericalError {
            message: format!("cannot normalize a state with {:?} norm {}", norm, value),
        });
    }
    Ok(tt_scale_impl(client, &state, 1.0 / value)?)
}

/// Closeness `‖A x‖₂` of `x` to a stationary state.
pub(crate) fn closeness<R, C>(
    client: &C,
    operator: &TensorTrain<R>,
    state: &TensorTrain<R>,
) -> IntegrateResult<f64>
where
    R: Runtime,
    C: TtClient<R>,
{
    let applied = tt_dot_impl(client, operator, state)?;
    Ok(tt_norm_impl(client, &applied, TtNorm::Euclidean)?)
}

/// Solve one implicit system, tagging failures with the time of the step.
pub(crate) fn solve_at<R, C>(
    client: &C,
    system: &TensorTrain<R>,
    guess: &TensorTrain<R>,
    rhs: &TensorTrain<R>,
    options: &SleOptions,
    time: f64,
) -> IntegrateResult<TensorTrain<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    tt_solve_impl(client, system, guess, rhs, options)
        .map_err(|err| IntegrateError::from(err).at_time(time))
}

/// Starting guess of the first solve, truncated once if its rank exceeds
/// `max_rank`.
pub(crate) fn prepare_guess<R, C>(
    client: &C,
    guess: &TensorTrain<R>,
    max_rank: usize,
) -> IntegrateResult<TensorTrain<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    if guess.rank() <= max_rank {
        return Ok(guess.clone());
    }
    log::debug!(
        "truncating initial guess from rank {} to {}",
        guess.rank(),
        max_rank
    );
    Ok(tt_ortho_impl(client, guess, 0.0, max_rank)?)
}

/// Check that `operator` is square and that all states live on its dimensions.
pub(crate) fn validate_problem<R: Runtime>(
    operator: &TensorTrain<R>,
    states: &[(&str, &TensorTrain<R>)],
) -> IntegrateResult<()> {
    if operator.row_dims() != operator.col_dims() {
        return Err(IntegrateError::InvalidInput {
            context: format!(
                "operator must be square, got {:?}x{:?}",
                operator.row_dims(),
                operator.col_dims()
            ),
        });
    }
    for (name, state) in states {
        if state.is_operator() || state.row_dims() != operator.col_dims() {
            return Err(IntegrateError::InvalidInput {
                context: format!(
                    "{} must be a state with dimensions {:?}, got {:?}x{:?}",
                    name,
                    operator.col_dims(),
                    state.row_dims(),
                    state.col_dims()
                ),
            });
        }
    }
    Ok(())
}
