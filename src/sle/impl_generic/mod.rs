//! Generic sweep solvers for linear systems in tensor-train format.

mod als;
mod mals;
mod micro;
mod stacks;
mod system;

pub use als::tt_als_impl;
pub use mals::tt_mals_impl;

use numr::runtime::Runtime;

use crate::sle::error::SleResult;
use crate::sle::types::{SleOptions, TtSolver};
use crate::tensor_train::{TensorTrain, TtClient};

/// Solve `operator · x = rhs` with the scheme selected in `options`.
pub fn tt_solve_impl<R, C>(
    client: &C,
    operator: &TensorTrain<R>,
    initial_guess: &TensorTrain<R>,
    rhs: &TensorTrain<R>,
    options: &SleOptions,
) -> SleResult<TensorTrain<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    match options.tt_solver {
        TtSolver::Als => tt_als_impl(client, operator, initial_guess, rhs, options),
        TtSolver::Mals => tt_mals_impl(client, operator, initial_guess, rhs, options),
    }
}
