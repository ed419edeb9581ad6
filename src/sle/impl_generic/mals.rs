//! Modified alternating linear scheme (MALS).
//!
//! Works on supercores of two neighbouring cores. Splitting a solved
//! supercore with a truncated SVD lets the bond rank between the two cores
//! grow or shrink, bounded by `threshold` and `max_rank`.

use numr::runtime::Runtime;
use numr::tensor::Tensor;

use super::als::solve_site;
use super::micro::{micro_matrix, micro_rhs, solve_micro};
use super::stacks::InterfaceStacks;
use super::system::{check_convergence, validate_system};
use crate::sle::error::SleResult;
use crate::sle::types::SleOptions;
use crate::tensor_train::host::{matmul_2d, permuted, thin_svd};
use crate::tensor_train::impl_generic::{truncation_rank, tt_ortho_right_impl};
use crate::tensor_train::{TensorTrain, TtClient};

/// Merge `[α, m1, n1, β]` and `[β, m2, n2, γ]` into `[α, m1·m2, n1·n2, γ]`.
fn merge_cores<R, C>(client: &C, first: &Tensor<R>, second: &Tensor<R>) -> SleResult<Tensor<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    let (alpha, m1, n1, beta) = (first.shape()[0], first.shape()[1], first.shape()[2], first.shape()[3]);
    let (m2, n2, gamma) = (second.shape()[1], second.shape()[2], second.shape()[3]);

    let prod = matmul_2d(client, first, [alpha * m1 * n1, beta], second, [beta, m2 * n2 * gamma])?
        .reshape(&[alpha, m1, n1, m2, n2, gamma])?;
    Ok(permuted(&prod, &[0, 1, 3, 2, 4, 5])?.reshape(&[alpha, m1 * m2, n1 * n2, gamma])?)
}

/// Which side of a split supercore keeps the singular values.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Sweep {
    Forward,
    Backward,
}

/// Solve `operator · x = rhs` with MALS.
///
/// A single-core train has no supercores and is solved as with ALS.
pub fn tt_mals_impl<R, C>(
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

    if d == 1 {
        for _ in 0..options.repeats {
            cores[0] = solve_site(client, &stacks, 0, operator.core(0), rhs.core(0), options.micro_solver)?;
        }
        let solution = TensorTrain::new(cores)?;
        check_convergence(client, operator, &solution, rhs, options)?;
        return Ok(solution);
    }

    for _ in 0..options.repeats {
        // First half sweep; the last pair is split for the way back
        for k in 0..d - 1 {
            let sweep = if k + 2 < d { Sweep::Forward } else { Sweep::Backward };
            let (left, right) = solve_pair(client, &stacks, k, operator, rhs, options, sweep)?;
            cores[k] = left;
            cores[k + 1] = right;
            match sweep {
                Sweep::Forward => stacks.push_left(client, k, &cores[k], operator.core(k), rhs.core(k))?,
                Sweep::Backward => stacks.push_right(
                    client,
                    k + 1,
                    &cores[k + 1],
                    operator.core(k + 1),
                    rhs.core(k + 1),
                )?,
            }
        }

        // Second half sweep
        for k in (0..d.saturating_sub(2)).rev() {
            let (left, right) = solve_pair(client, &stacks, k, operator, rhs, options, Sweep::Backward)?;
            cores[k] = left;
            cores[k + 1] = right;
            stacks.push_right(client, k + 1, &cores[k + 1], operator.core(k + 1), rhs.core(k + 1))?;
        }
    }

    let solution = TensorTrain::new(cores)?;
    check_convergence(client, operator, &solution, rhs, options)?;
    Ok(solution)
}

/// Solve the supercore of cores `k` and `k + 1` and split it.
///
/// A forward split leaves core `k` left-orthonormal, a backward split leaves
/// core `k + 1` right-orthonormal.
fn solve_pair<R, C>(
    client: &C,
    stacks: &InterfaceStacks<R>,
    k: usize,
    operator: &TensorTrain<R>,
    rhs: &TensorTrain<R>,
    options: &SleOptions,
    sweep: Sweep,
) -> SleResult<(Tensor<R>, Tensor<R>)>
where
    R: Runtime,
    C: TtClient<R>,
{
    let (la, lb) = stacks.left(k);
    let (ra, rb) = stacks.right(k + 2);

    let a_super = merge_cores(client, operator.core(k), operator.core(k + 1))?;
    let b_super = merge_cores(client, rhs.core(k), rhs.core(k + 1))?;

    let matrix = micro_matrix(client, la, &a_super, ra)?;
    let micro = micro_rhs(client, lb, &b_super, rb)?;
    let solution = solve_micro(client, &matrix, &micro, options.micro_solver, k)?;

    let p = la.shape()[0];
    let q = ra.shape()[0];
    let m1 = rhs.row_dims()[k];
    let m2 = rhs.row_dims()[k + 1];

    let svd = thin_svd(client, &solution, [p * m1, m2 * q])?;
    let rank = truncation_rank(&svd.values(), options.threshold, options.max_rank);
    let svd = svd.truncate(rank)?;

    let (left, right) = match sweep {
        Sweep::Forward => {
            let right = svd.weighted_vt(client)?;
            (svd.u, right)
        }
        Sweep::Backward => {
            let left = svd.weighted_u(client)?;
            (left, svd.vt)
        }
    };
    Ok((left.reshape(&[p, m1, 1, rank])?, right.reshape(&[rank, m2, 1, q])?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sle::impl_generic::system::relative_residual;
    use crate::sle::types::MicroSolver;
    use crate::tensor_train::impl_generic::{tt_add_impl, tt_scale_impl};
    use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};

    fn setup() -> (CpuDevice, CpuClient) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (device, client)
    }

    fn kronecker_sum(
        client: &CpuClient,
        device: &CpuDevice,
        generator: &[f64],
        d: usize,
        h: f64,
    ) -> TensorTrain<CpuRuntime> {
        let eye = vec![1.0, 0.0, 0.0, 1.0];
        let dims = vec![2; d];
        let mut op = TensorTrain::eye(&dims, device).unwrap();
        for site in 0..d {
            let factors: Vec<Vec<f64>> = (0..d)
                .map(|k| if k == site { generator.to_vec() } else { eye.clone() })
                .collect();
            let term = TensorTrain::kron_operator(&factors, &dims, device).unwrap();
            op = tt_add_impl(client, &op, &tt_scale_impl(client, &term, -h).unwrap()).unwrap();
        }
        op
    }

    #[test]
    fn test_merge_cores_matches_dense_kron() {
        let (device, client) = setup();
        let a = Tensor::<CpuRuntime>::from_slice(&[1.0, 2.0, 3.0, 4.0], &[1, 2, 2, 1], &device);
        let b = Tensor::<CpuRuntime>::from_slice(&[0.0, 1.0, 1.0, 0.0], &[1, 2, 2, 1], &device);

        let merged = merge_cores(&client, &a, &b).unwrap();
        assert_eq!(merged.shape(), &[1, 4, 4, 1]);

        let single = TensorTrain::new(vec![merged]).unwrap().to_full().unwrap();
        let pair = TensorTrain::new(vec![a, b]).unwrap().to_full().unwrap();
        assert_eq!(single, pair);
    }

    #[test]
    fn test_mals_grows_rank_from_rank_one_guess() {
        let (device, client) = setup();
        let op = kronecker_sum(&client, &device, &[-1.0, 0.5, 1.0, -0.5], 4, 0.2);
        let b = TensorTrain::<CpuRuntime>::kron_state(
            &[vec![0.9, 0.1], vec![0.5, 0.5], vec![0.3, 0.7], vec![1.0, 0.0]],
            &device,
        )
        .unwrap();
        let guess = b.clone();

        let options = SleOptions::default().tolerance(1e-8).repeats(2);
        let x = tt_mals_impl(&client, &op, &guess, &b, &options).unwrap();
        assert!(x.rank() <= options.max_rank);
        let residual = relative_residual(&client, &op, &x, &b).unwrap();
        assert!(residual < 1e-8, "residual {}", residual);
    }

    #[test]
    fn test_mals_respects_max_rank() {
        let (device, client) = setup();
        let op = kronecker_sum(&client, &device, &[-1.0, 0.5, 1.0, -0.5], 4, 0.2);
        let b = TensorTrain::<CpuRuntime>::kron_state(
            &[vec![0.9, 0.1], vec![0.5, 0.5], vec![0.3, 0.7], vec![1.0, 0.0]],
            &device,
        )
        .unwrap();

        let options = SleOptions::default().truncation(0.0, 1).micro_solver(MicroSolver::Lu);
        let x = tt_mals_impl(&client, &op, &b, &b, &options).unwrap();
        assert_eq!(x.ranks(), &[1, 1, 1, 1, 1]);
    }

    #[test]
    fn test_mals_single_core() {
        let (device, client) = setup();
        let op = TensorTrain::<CpuRuntime>::kron_operator(&[vec![3.0, 1.0, 0.0, 2.0]], &[2], &device).unwrap();
        let b = TensorTrain::<CpuRuntime>::kron_state(&[vec![5.0, 4.0]], &device).unwrap();

        let x = tt_mals_impl(&client, &op, &b, &b, &SleOptions::default()).unwrap();
        let full = x.to_full().unwrap();
        // [[3, 1], [0, 2]] x = [5, 4] -> x = [1, 2]
        assert!((full[0] - 1.0).abs() < 1e-12);
        assert!((full[1] - 2.0).abs() < 1e-12);
    }
}
