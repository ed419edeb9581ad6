//! Alternating linear scheme (ALS).

use numr::runtime::Runtime;
use numr::tensor::Tensor;

use super::micro::{micro_matrix, micro_rhs, solve_micro};
use super::stacks::InterfaceStacks;
use super::system::{check_convergence, validate_system};
use crate::sle::error::SleResult;
use crate::sle::types::{MicroSolver, SleOptions};
use crate::tensor_train::host::{matmul_2d, thin_svd};
use crate::tensor_train::impl_generic::tt_ortho_right_impl;
use crate::tensor_train::{TensorTrain, TtClient};

/// Solve the micro system of core `k` against the current stacks.
///
/// Returns the new core with shape `[r_k, m_k, 1, r_{k+1}]`.
pub(crate) fn solve_site<R, C>(
    client: &C,
    stacks: &InterfaceStacks<R>,
    k: usize,
    a_core: &Tensor<R>,
    b_core: &Tensor<R>,
    micro_solver: MicroSolver,
) -> SleResult<Tensor<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    let (la, lb) = stacks.left(k);
    let (ra, rb) = stacks.right(k + 1);

    let matrix = micro_matrix(client, la, a_core, ra)?;
    let rhs = micro_rhs(client, lb, b_core, rb)?;
    let solution = solve_micro(client, &matrix, &rhs, micro_solver, k)?;

    let p = la.shape()[0];
    let q = ra.shape()[0];
    let m = b_core.shape()[1];
    Ok(solution.reshape(&[p, m, 1, q])?)
}

/// Solve `operator · x = rhs` with ALS.
///
/// The guess is right-orthonormalized, then each of `options.repeats` double
/// sweeps solves the micro systems from the first core to the last and back.
/// Ranks stay those of the (orthonormalized) guess.
pub fn tt_als_impl<R, C>(
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
    options.validate()?;
    validate_system(operator, initial_guess, rhs)?;

    let d = operator.order();
    let mut cores = tt_ortho_right_impl(client, initial_guess, 0.0, usize::MAX)?.into_cores();

    let mut stacks = InterfaceStacks::new(d, client.device());
    for k in (1..d).rev() {
        stacks.push_right(client, k, &cores[k], operator.core(k), rhs.core(k))?;
    }

    for _ in 0..options.repeats {
        // First half sweep
        for k in 0..d - 1 {
            let solved = solve_site(client, &stacks, k, operator.core(k), rhs.core(k), options.micro_solver)?;
            let [p, m, q] = [solved.shape()[0], solved.shape()[1], solved.shape()[3]];

            let svd = thin_svd(client, &solved, [p * m, q])?;
            let r = svd.s.shape()[0];
            let carry = svd.weighted_vt(client)?;
            cores[k] = svd.u.reshape(&[p, m, 1, r])?;

            let next = cores[k + 1].shape().to_vec();
            cores[k + 1] = matmul_2d(client, &carry, [r, q], &cores[k + 1], [q, next[1] * next[3]])?
                .reshape(&[r, next[1], 1, next[3]])?;

            stacks.push_left(client, k, &cores[k], operator.core(k), rhs.core(k))?;
        }

        // Second half sweep
        for k in (0..d).rev() {
            let solved = solve_site(client, &stacks, k, operator.core(k), rhs.core(k), options.micro_solver)?;
            if k == 0 {
                cores[0] = solved;
                continue;
            }
            let [p, m, q] = [solved.shape()[0], solved.shape()[1], solved.shape()[3]];

            let svd = thin_svd(client, &solved, [p, m * q])?;
            let r = svd.s.shape()[0];
            let carry = svd.weighted_u(client)?;
            cores[k] = svd.vt.reshape(&[r, m, 1, q])?;

            let prev = cores[k - 1].shape().to_vec();
            cores[k - 1] = matmul_2d(client, &cores[k - 1], [prev[0] * prev[1], p], &carry, [p, r])?
                .reshape(&[prev[0], prev[1], 1, r])?;

            stacks.push_right(client, k, &cores[k], operator.core(k), rhs.core(k))?;
        }
    }

    let solution = TensorTrain::new(cores)?;
    check_convergence(client, operator, &solution, rhs, options)?;
    Ok(solution)
}
