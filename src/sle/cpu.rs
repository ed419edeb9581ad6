//! CPU implementation of tensor-train linear solvers.

use numr::runtime::cpu::{CpuClient, CpuRuntime};

use crate::sle::impl_generic::{tt_als_impl, tt_mals_impl, tt_solve_impl};
use crate::sle::{SleOptions, SleResult, TtLinearSolvers};
use crate::tensor_train::TensorTrain;

impl TtLinearSolvers<CpuRuntime> for CpuClient {
    fn tt_solve(
        &self,
        operator: &TensorTrain<CpuRuntime>,
        initial_guess: &TensorTrain<CpuRuntime>,
        rhs: &TensorTrain<CpuRuntime>,
        options: &SleOptions,
    ) -> SleResult<TensorTrain<CpuRuntime>> {
        tt_solve_impl(self, operator, initial_guess, rhs, options)
    }

    fn tt_als(
        &self,
        operator: &TensorTrain<CpuRuntime>,
        initial_guess: &TensorTrain<CpuRuntime>,
        rhs: &TensorTrain<CpuRuntime>,
        options: &SleOptions,
    ) -> SleResult<TensorTrain<CpuRuntime>> {
        tt_als_impl(self, operator, initial_guess, rhs, options)
    }

    fn tt_mals(
        &self,
        operator: &TensorTrain<CpuRuntime>,
        initial_guess: &TensorTrain<CpuRuntime>,
        rhs: &TensorTrain<CpuRuntime>,
        options: &SleOptions,
    ) -> SleResult<TensorTrain<CpuRuntime>> {
        tt_mals_impl(self, operator, initial_guess, rhs, options)
    }
}
