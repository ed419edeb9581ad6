//! Addition, scaling and operator application for tensor trains.

use numr::error::{Error, Result};
use numr::runtime::Runtime;
use numr::tensor::Tensor;

use crate::tensor_train::TtClient;
use crate::tensor_train::host::{matmul_2d, permuted};
use crate::tensor_train::types::TensorTrain;

fn core_shape<R: Runtime>(core: &Tensor<R>) -> [usize; 4] {
    let s = core.shape();
    [s[0], s[1], s[2], s[3]]
}

fn check_same_dims<R: Runtime>(a: &TensorTrain<R>, b: &TensorTrain<R>) -> Result<()> {
    if a.row_dims() != b.row_dims() || a.col_dims() != b.col_dims() {
        return Err(Error::InvalidArgument {
            arg: "b",
            reason: format!(
                "dimension mismatch: {:?}x{:?} vs {:?}x{:?}",
                a.row_dims(),
                a.col_dims(),
                b.row_dims(),
                b.col_dims()
            ),
        });
    }
    Ok(())
}

/// Place the cores of `a` and `b` on the block diagonal of one core.
///
/// The first core is concatenated along its right rank and the last along
/// its left rank. For a single-core train the two cores are summed.
fn block_core<R, C>(client: &C, a: &Tensor<R>, b: &Tensor<R>, first: bool, last: bool) -> Result<Tensor<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    match (first, last) {
        (true, true) => client.add(a, b),
        (true, false) => client.cat(&[a, b], 3),
        (false, true) => client.cat(&[a, b], 0),
        (false, false) => {
            let [ra, _, _, ra_next] = core_shape(a);
            let [rb, _, _, rb_next] = core_shape(b);
            // Padding pairs run from the last axis to the first
            let a_block = client.pad(a, &[0, rb_next, 0, 0, 0, 0, 0, rb], 0.0)?;
            let b_block = client.pad(b, &[ra_next, 0, 0, 0, 0, 0, ra, 0], 0.0)?;
            client.add(&a_block, &b_block)
        }
    }
}

/// Sum of two trains with equal dimensions.
pub fn tt_add_impl<R, C>(client: &C, a: &TensorTrain<R>, b: &TensorTrain<R>) -> Result<TensorTrain<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    check_same_dims(a, b)?;

    let d = a.order();
    let cores = (0..d)
        .map(|k| block_core(client, a.core(k), b.core(k), k == 0, k == d - 1))
        .collect::<Result<Vec<_>>>()?;
    TensorTrain::new(cores)
}

/// Scalar multiple, applied to the first core.
pub fn tt_scale_impl<R, C>(client: &C, a: &TensorTrain<R>, alpha: f64) -> Result<TensorTrain<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    let mut cores = a.cores().to_vec();
    cores[0] = client.mul_scalar(&cores[0], alpha)?;
    TensorTrain::new(cores)
}

pub fn tt_sub_impl<R, C>(client: &C, a: &TensorTrain<R>, b: &TensorTrain<R>) -> Result<TensorTrain<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    let neg_b = tt_scale_impl(client, b, -1.0)?;
    tt_add_impl(client, a, &neg_b)
}

/// Core-wise contraction of an operator with a state or operator.
///
/// For cores `A_k: [ra, m, l, ra']` and `B_k: [rb, l, n, rb']` the result core
/// is `[ra·rb, m, n, ra'·rb']`.
pub fn tt_dot_impl<R, C>(client: &C, a: &TensorTrain<R>, b: &TensorTrain<R>) -> Result<TensorTrain<R>>
where
    R: Runtime,
    C: TtClient<R>,
{
    if a.col_dims() != b.row_dims() {
        return Err(Error::InvalidArgument {
            arg: "b",
            reason: format!(
                "operator columns {:?} do not match row dimensions {:?}",
                a.col_dims(),
                b.row_dims()
            ),
        });
    }

    let mut cores = Vec::with_capacity(a.order());
    for k in 0..a.order() {
        let [ra, m, l, ra_next] = core_shape(a.core(k));
        let [rb, _, n, rb_next] = core_shape(b.core(k));

        // [ra, m, ra', l] x [l, rb, n, rb']
        let a_perm = permuted(a.core(k), &[0, 1, 3, 2])?;
        let b_perm = permuted(b.core(k), &[1, 0, 2, 3])?;
        let prod = matmul_2d(
            client,
            &a_perm,
            [ra * m * ra_next, l],
            &b_perm,
            [l, rb * n * rb_next],
        )?;

        let prod = prod.reshape(&[ra, m, ra_next, rb, n, rb_next])?;
        let core = permuted(&prod, &[0, 3, 1, 4, 2, 5])?.reshape(&[ra * rb, m, n, ra_next * rb_next])?;
        cores.push(core);
    }
    TensorTrain::new(cores)
}
