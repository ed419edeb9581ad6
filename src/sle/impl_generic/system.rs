//! Checks shared by the sweep solvers.

use numr::runtime::Runtime;

use crate::sle::error::{SleError, SleResult};
use crate::sle::types::SleOptions;
use crate::tensor_train::impl_generic::{tt_dot_impl, tt_norm_impl, tt_sub_impl};
use crate::tensor_train::{TensorTrain, TtClient, TtNorm};

/// Check that `operator · x = rhs` is a well-formed square system.
pub(crate) fn validate_system<R: Runtime>(
    operator: &TensorTrain<R>,
    initial_guess: &TensorTrain<R>,
    rhs: &TensorTrain<R>,
) -> SleResult<()> {
    if operator.row_dims() != operator.col_dims() {
        return Err(SleError::InvalidParameter {
            parameter: "operator".to_string(),
            message: format!(
                "operator must be square, got {:?}x{:?}",
                operator.row_dims(),
                operator.col_dims()
            ),
        });
    }
    if rhs.is_operator() || rhs.row_dims() != operator.row_dims() {
        return Err(SleError::InvalidParameter {
            parameter: "rhs".to_string(),
            message: format!(
                "expected a state with dimensions {:?}, got {:?}x{:?}",
                operator.row_dims(),
                rhs.row_dims(),
                rhs.col_dims()
            ),
        });
    }
    if initial_guess.is_operator() || initial_guess.row_dims() != operator.col_dims() {
        return Err(SleError::InvalidParameter {
            parameter: "initial_guess".to_string(),
            message: format!(
                "expected a state with dimensions {:?}, got {:?}x{:?}",
                operator.col_dims(),
                initial_guess.row_dims(),
                initial_guess.col_dims()
            ),
        });
    }
    Ok(())
}

/// Relative residual `‖A x − b‖ / ‖b‖`, or `‖A x‖` for `b = 0`.
pub(crate) fn relative_residual<R, C>(
    client: &C,
    operator: &TensorTrain<R>,
    x: &TensorTrain<R>,
    rhs: &TensorTrain<R>,
) -> SleResult<f64>
where
    R: Runtime,
    C: TtClient<R>,
{
    let ax = tt_dot_impl(client, operator, x)?;
    let residual = tt_norm_impl(client, &tt_sub_impl(client, &ax, rhs)?, TtNorm::Euclidean)?;
    let rhs_norm = tt_norm_impl(client, rhs, TtNorm::Euclidean)?;
    if rhs_norm > 0.0 {
        Ok(residual / rhs_norm)
    } else {
        Ok(residual)
    }
}

/// Enforce `options.tolerance`, if set.
pub(crate) fn check_convergence<R, C>(
    client: &C,
    operator: &TensorTrain<R>,
    x: &TensorTrain<R>,
    rhs: &TensorTrain<R>,
    options: &SleOptions,
) -> SleResult<()>
where
    R: Runtime,
    C: TtClient<R>,
{
    let Some(tolerance) = options.tolerance else {
        return Ok(());
    };
    let residual = relative_residual(client, operator, x, rhs)?;
    log::debug!(
        "{:?} finished after {} sweeps, relative residual {:.3e}",
        options.tt_solver,
        options.repeats,
        residual
    );
    if !(residual <= tolerance) {
        return Err(SleError::DidNotConverge {
            repeats: options.repeats,
            residual,
            tolerance,
        });
    }
    Ok(())
}
