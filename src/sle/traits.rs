//! Linear solver trait for tensor-train systems.

use numr::runtime::Runtime;

use super::error::SleResult;
use super::types::SleOptions;
use crate::tensor_train::TensorTrain;

/// Solvers for `A · x = b` with operator `A` and states `x`, `b` in TT format.
pub trait TtLinearSolvers<R: Runtime> {
    /// Solve with the scheme selected by `options.tt_solver`.
    ///
    /// # Arguments
    /// * `operator` - Square operator `A`
    /// * `initial_guess` - Starting point; its ranks fix those of an ALS solution
    /// * `rhs` - Right-hand side `b`
    /// * `options` - Sweep scheme, local solver and sweep count
    fn tt_solve(
        &self,
        operator: &TensorTrain<R>,
        initial_guess: &TensorTrain<R>,
        rhs: &TensorTrain<R>,
        options: &SleOptions,
    ) -> SleResult<TensorTrain<R>>;

    /// Alternating linear scheme, ignoring `options.tt_solver`.
    fn tt_als(
        &self,
        operator: &TensorTrain<R>,
        initial_guess: &TensorTrain<R>,
        rhs: &TensorTrain<R>,
        options: &SleOptions,
    ) -> SleResult<TensorTrain<R>>;

    /// Modified alternating linear scheme, ignoring `options.tt_solver`.
    fn tt_mals(
        &self,
        operator: &TensorTrain<R>,
        initial_guess: &TensorTrain<R>,
        rhs: &TensorTrain<R>,
        options: &SleOptions,
    ) -> SleResult<TensorTrain<R>>;
}
