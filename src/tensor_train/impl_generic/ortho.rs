//! Orthonormalization and rank truncation of tensor trains.

use numr::error::Result;
use numr::runtime::Runtime;

use crate::tensor_train::TtClient;
use crate::tensor_train::host::{matmul_2d, thin_svd};
use crate::tensor_train::types::TensorTrain;

/// Smallest rank whose discarded tail satisfies
/// `Σ_{i>r} σ_i² ≤ threshold² · Σ_i σ_i²`, clamped to `1..=max_rank`.
///
/// `s` must be sorted in descending order.
pub(crate) fn truncation_rank(s: &[f64], threshold: f64, max_rank: usize) -> usize {
    let total: f64 = s.iter().map(|v| v * v).sum();
    let bound = threshold * threshold * total;

    let mut rank = s.len();
    let mut tail = 0.0;
    for (k, sv) in s.iter().enumerate().rev() {
        tail += sv * sv;
        if tail > bound {
            break;
        }
        rank = k;
    }

    rank.clamp(1, max_rank.max(1)).min(s.len().max(1))
}

pub fn tt_ortho_left_impl<R, C>(
    client: &C,
    a: &TensorTrain<R>,
    threshold: f64,
    max_rank: usize,
) -> Result<TensorTrain<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    let mut cores = a.cores().to_vec();
    let d = cores.len();

    for k in 0..d.saturating_sub(1) {
        let shape = cores[k].shape().to_vec();
        let (r, m, n, r_next) = (shape[0], shape[1], shape[2], shape[3]);

        let svd = thin_svd(client, &cores[k], [r * m * n, r_next])?;
        let rank = truncation_rank(&svd.values(), threshold, max_rank);
        let svd = svd.truncate(rank)?;

        cores[k] = svd.u.reshape(&[r, m, n, rank])?;

        // Push S·Vt into the next core
        let carry = svd.weighted_vt(client)?;
        let next_shape = cores[k + 1].shape().to_vec();
        let tail = next_shape[1] * next_shape[2] * next_shape[3];
        cores[k + 1] = matmul_2d(client, &carry, [rank, r_next], &cores[k + 1], [r_next, tail])?
            .reshape(&[rank, next_shape[1], next_shape[2], next_shape[3]])?;
    }

    TensorTrain::new(cores)
}

pub fn tt_ortho_right_impl<R, C>(
    client: &C,
    a: &TensorTrain<R>,
    threshold: f64,
    max_rank: usize,
) -> Result<TensorTrain<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    let mut cores = a.cores().to_vec();
    let d = cores.len();

    for k in (1..d).rev() {
        let shape = cores[k].shape().to_vec();
        let (r, m, n, r_next) = (shape[0], shape[1], shape[2], shape[3]);

        let svd = thin_svd(client, &cores[k], [r, m * n * r_next])?;
        let rank = truncation_rank(&svd.values(), threshold, max_rank);
        let svd = svd.truncate(rank)?;

        cores[k] = svd.vt.reshape(&[rank, m, n, r_next])?;

        // Push U·S into the previous core
        let carry = svd.weighted_u(client)?;
        let prev_shape = cores[k - 1].shape().to_vec();
        let head = prev_shape[0] * prev_shape[1] * prev_shape[2];
        cores[k - 1] = matmul_2d(client, &cores[k - 1], [head, r], &carry, [r, rank])?
            .reshape(&[prev_shape[0], prev_shape[1], prev_shape[2], rank])?;
    }

    TensorTrain::new(cores)
}

pub fn tt_ortho_impl<R, C>(
    client: &C,
    a: &TensorTrain<R>,
    threshold: f64,
    max_rank: usize,
) -> Result<TensorTrain<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    let left = tt_ortho_left_impl(client, a, 0.0, usize::MAX)?;
    tt_ortho_right_impl(client, &left, threshold, max_rank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor_train::impl_generic::arithmetic::{tt_add_impl, tt_scale_impl};
    use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};

    fn setup() -> (CpuDevice, CpuClient) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (device, client)
    }

    #[test]
    fn test_truncation_rank() {
        let s = [3.0, 2.0, 1.0];
        assert_eq!(truncation_rank(&s, 0.0, 10), 3);
        // tail of 1.0^2 = 1 <= 0.3^2 * 14 = 1.26
        assert_eq!(truncation_rank(&s, 0.3, 10), 2);
        assert_eq!(truncation_rank(&s, 0.0, 2), 2);
        assert_eq!(truncation_rank(&s, 1.0, 10), 1);
        // Exact zeros are always dropped
        assert_eq!(truncation_rank(&[1.0, 0.0, 0.0], 0.0, 10), 1);
        assert_eq!(truncation_rank(&[0.0, 0.0], 0.0, 10), 1);
    }

    #[test]
    fn test_ortho_recompresses_redundant_sum() {
        let (device, client) = setup();
        let x = TensorTrain::<CpuRuntime>::kron_state(
            &[vec![0.25, 0.75], vec![0.5, 0.5], vec![1.0, 2.0, 3.0]],
            &device,
        )
        .unwrap();

        // x + x + x has rank 3 representation but is rank one
        let sum = tt_add_impl(&client, &tt_add_impl(&client, &x, &x).unwrap(), &x).unwrap();
        assert_eq!(sum.rank(), 3);

        let compressed = tt_ortho_impl(&client, &sum, 1e-12, 50).unwrap();
        assert_eq!(compressed.ranks(), &[1, 1, 1, 1]);

        let expected = tt_scale_impl(&client, &x, 3.0).unwrap().to_full().unwrap();
        for (c, e) in compressed.to_full().unwrap().iter().zip(expected) {
            assert!((c - e).abs() < 1e-10);
        }
    }

    #[test]
    fn test_ortho_respects_max_rank() {
        let (device, client) = setup();
        let x = TensorTrain::<CpuRuntime>::kron_state(&[vec![1.0, 0.0], vec![1.0, 0.0]], &device).unwrap();
        let y = TensorTrain::<CpuRuntime>::kron_state(&[vec![0.0, 1.0], vec![0.0, 1.0]], &device).unwrap();
        let sum = tt_add_impl(&client, &x, &tt_scale_impl(&client, &y, 0.5).unwrap()).unwrap();

        let kept = tt_ortho_impl(&client, &sum, 0.0, 50).unwrap();
        assert_eq!(kept.ranks(), &[1, 2, 1]);

        let capped = tt_ortho_impl(&client, &sum, 0.0, 1).unwrap();
        assert_eq!(capped.ranks(), &[1, 1, 1]);
        // Best rank-one approximation keeps the dominant term
        let full = capped.to_full().unwrap();
        assert!((full[0] - 1.0).abs() < 1e-10);
        assert!(full[3].abs() < 1e-10);
    }

    #[test]
    fn test_ortho_left_produces_orthonormal_cores() {
        let (device, client) = setup();
        let x = TensorTrain::<CpuRuntime>::kron_state(&[vec![1.0, 2.0], vec![3.0, 4.0]], &device).unwrap();
        let y = TensorTrain::<CpuRuntime>::kron_state(&[vec![2.0, -1.0], vec![1.0, 1.0]], &device).unwrap();
        let sum = tt_add_impl(&client, &x, &y).unwrap();

        let left = tt_ortho_left_impl(&client, &sum, 0.0, usize::MAX).unwrap();
        let core: Vec<f64> = left.core(0).to_vec();
        let r = left.ranks()[1];
        // Columns of the [m, r] first core are orthonormal
        for p in 0..r {
            for q in 0..r {
                let dot: f64 = (0..2).map(|i| core[i * r + p] * core[i * r + q]).sum();
                let expected = if p == q { 1.0 } else { 0.0 };
                assert!((dot - expected).abs() < 1e-10);
            }
        }
        for (l, s) in left.to_full().unwrap().iter().zip(sum.to_full().unwrap()) {
            assert!((l - s).abs() < 1e-10);
        }
    }
}
