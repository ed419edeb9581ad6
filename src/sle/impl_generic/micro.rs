//! Local (micro) systems of the sweep solvers.
//!
//! Fixing all cores of `x` but one turns `A · x = b` into a dense system for
//! that core, assembled from the interface stacks and the local cores of
//! `A` and `b`.

use numr::algorithm::linalg::LinearAlgebraAlgorithms;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

use crate::sle::error::{SleError, SleResult};
use crate::sle::types::MicroSolver;
use crate::tensor_train::TtClient;
use crate::tensor_train::host::{matmul_2d, permuted};

/// Assemble `M[(p, i, q), (p', j, q')] = Σ LA[p, α, p'] A[α, i, j, β] RA[q, β, q']`.
pub(crate) fn micro_matrix<R, C>(
    client: &C,
    la: &Tensor<R>,
    a_core: &Tensor<R>,
    ra: &Tensor<R>,
) -> SleResult<Tensor<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    let p = la.shape()[0];
    let alpha = la.shape()[1];
    let q = ra.shape()[0];
    let beta = ra.shape()[1];
    let m = a_core.shape()[1];
    let n = a_core.shape()[2];

    let la_perm = permuted(la, &[0, 2, 1])?;
    let t1 = matmul_2d(client, &la_perm, [p * p, alpha], a_core, [alpha, m * n * beta])?;

    let ra_perm = permuted(ra, &[1, 0, 2])?;
    let t2 = matmul_2d(client, &t1, [p * p * m * n, beta], &ra_perm, [beta, q * q])?
        .reshape(&[p, p, m, n, q, q])?;

    let size = p * m * q;
    Ok(permuted(&t2, &[0, 2, 4, 1, 3, 5])?.reshape(&[size, p * n * q])?)
}

/// Assemble `rhs[(p, i, q)] = Σ Lb[p, γ] B[γ, i, δ] Rb[q, δ]` as a column.
pub(crate) fn micro_rhs<R, C>(
    client: &C,
    lb: &Tensor<R>,
    b_core: &Tensor<R>,
    rb: &Tensor<R>,
) -> SleResult<Tensor<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    let p = lb.shape()[0];
    let gamma = lb.shape()[1];
    let q = rb.shape()[0];
    let delta = rb.shape()[1];
    let m = b_core.shape()[1];

    let t1 = matmul_2d(client, lb, [p, gamma], b_core, [gamma, m * delta])?;
    let rb_t = rb.transpose(0, 1)?.contiguous();
    let t2 = matmul_2d(client, &t1, [p * m, delta], &rb_t, [delta, q])?;
    Ok(t2.reshape(&[p * m * q, 1])?)
}

/// Solve a micro system with the requested local solver.
///
/// Returns the solution as a `[rows, 1]` column.
pub(crate) fn solve_micro<R, C>(
    client: &C,
    matrix: &Tensor<R>,
    rhs: &Tensor<R>,
    solver: MicroSolver,
    site: usize,
) -> SleResult<Tensor<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    let singular = |e: numr::error::Error| SleError::SingularMicroSystem {
        site,
        context: e.to_string(),
    };

    let solution = match solver {
        MicroSolver::Solve => LinearAlgebraAlgorithms::solve(client, matrix, rhs).map_err(singular)?,
        MicroSolver::Lu => {
            let factors = client.lu_decompose(matrix).map_err(singular)?;
            let permuted_rhs = client.index_select(rhs, 0, &row_order(&factors.pivots, client.device()))?;
            let y = client.solve_triangular_lower(&factors.lu, &permuted_rhs, true)?;
            client.solve_triangular_upper(&factors.lu, &y)?
        }
    };

    let values: Vec<f64> = solution.to_vec();
    if values.iter().any(|v| !v.is_finite()) {
        return Err(SleError::SingularMicroSystem {
            site,
            context: "solution contains non-finite values".to_string(),
        });
    }
    Ok(solution)
}

/// Row order `P` of `P · A = L · U` from the sequential row swaps of the
/// factorization (row `i` was swapped with row `pivots[i]`).
fn row_order<R: Runtime>(pivots: &Tensor<R>, device: &R::Device) -> Tensor<R> {
    let swaps: Vec<i64> = pivots.to_vec();
    let mut order: Vec<i64> = (0..swaps.len() as i64).collect();
    for (i, &p) in swaps.iter().enumerate() {
        order.swap(i, p as usize);
    }
    Tensor::<R>::from_slice(&order, &[order.len()], device)
}
