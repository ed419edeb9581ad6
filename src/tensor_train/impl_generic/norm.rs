//! Norms of tensor trains.

use numr::error::Result;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

use super::ortho::tt_ortho_right_impl;
use crate::tensor_train::TtClient;
use crate::tensor_train::host::matmul_2d;
use crate::tensor_train::types::{TensorTrain, TtNorm};

pub fn tt_norm_impl<R, C>(client: &C, a: &TensorTrain<R>, norm: TtNorm) -> Result<f64>
where
    R: Runtime,
    C: TtClient<R>,
{
    match norm {
        TtNorm::Manhattan => manhattan_norm(client, a),
        TtNorm::Euclidean => euclidean_norm(client, a),
    }
}

/// `|Σ entries|`, contracted core by core through the row vector of rank sums.
fn manhattan_norm<R, C>(client: &C, a: &TensorTrain<R>) -> Result<f64>
where
    R: Runtime,
    C: TtClient<R>,
{
    let mut acc = Tensor::<R>::from_slice(&[1.0], &[1, 1], client.device());
    for (k, core) in a.cores().iter().enumerate() {
        let r = a.ranks()[k];
        let r_next = a.ranks()[k + 1];
        let summed = client.sum(core, &[1, 2], false)?;
        acc = matmul_2d(client, &acc, [1, r], &summed, [r, r_next])?;
    }
    let value: Vec<f64> = acc.to_vec();
    Ok(value[0].abs())
}

/// Frobenius norm of the first core after right-orthonormalization.
///
/// Cores `1..d` become row-orthonormal, so the norm of the train equals the
/// norm of core 0 and is resolved to machine precision relative to `‖a‖`,
/// including for differences of nearly equal trains.
fn euclidean_norm<R, C>(client: &C, a: &TensorTrain<R>) -> Result<f64>
where
    R: Runtime,
    C: TtClient<R>,
{
    let ortho = tt_ortho_right_impl(client, a, 0.0, usize::MAX)?;
    let head = ortho.core(0);
    let squares = client.mul(head, head)?;
    let total = client.sum(&squares, &[0, 1, 2, 3], false)?;
    let value: Vec<f64> = total.to_vec();
    Ok(value[0].max(0.0).sqrt())
}
