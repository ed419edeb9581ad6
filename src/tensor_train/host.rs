//! Shared helpers for the tensor-train kernels.
//!
//! Cores are reshaped into matrices for every contraction; these helpers keep
//! that bookkeeping in one place. All arithmetic is dispatched to the runtime
//! client.

use numr::algorithm::linalg::LinearAlgebraAlgorithms;
use numr::error::{Error, Result};
use numr::ops::{BinaryOps, MatmulOps};
use numr::runtime::Runtime;
use numr::tensor::Tensor;

/// Permute the axes of a tensor into a contiguous copy.
///
/// Axis `k` of the output is axis `perm[k]` of the input.
pub(crate) fn permuted<R: Runtime>(t: &Tensor<R>, perm: &[usize]) -> Result<Tensor<R>> {
    Ok(t.permute(perm)?.contiguous())
}

/// Matrix product of two tensors viewed as `[m, k]` and `[k, n]` matrices.
pub(crate) fn matmul_2d<R, C>(
    client: &C,
    a: &Tensor<R>,
    a_shape: [usize; 2],
    b: &Tensor<R>,
    b_shape: [usize; 2],
) -> Result<Tensor<R>>
where
    R: Runtime,
    C: MatmulOps<R>,
{
    if a_shape[1] != b_shape[0] {
        return Err(Error::InvalidArgument {
            arg: "b",
            reason: format!(
                "inner dimensions differ: [{}, {}] x [{}, {}]",
                a_shape[0], a_shape[1], b_shape[0], b_shape[1]
            ),
        });
    }
    let a_mat = a.contiguous().reshape(&a_shape)?;
    let b_mat = b.contiguous().reshape(&b_shape)?;
    client.matmul(&a_mat, &b_mat)
}

/// Thin singular value decomposition `M = U · diag(s) · Vt`.
pub(crate) struct ThinSvd<R: Runtime> {
    /// Left singular vectors, `[rows, k]`
    pub u: Tensor<R>,
    /// Singular values in descending order, `[k]`
    pub s: Tensor<R>,
    /// Right singular vectors, `[k, cols]`
    pub vt: Tensor<R>,
}

impl<R: Runtime> ThinSvd<R> {
    /// Singular values copied to the host, for rank decisions.
    pub fn values(&self) -> Vec<f64> {
        self.s.to_vec()
    }

    /// Keep the leading `rank` singular triplets.
    pub fn truncate(self, rank: usize) -> Result<Self> {
        let k = self.s.shape()[0];
        if rank >= k {
            return Ok(self);
        }
        Ok(Self {
            u: self.u.narrow(1, 0, rank)?.contiguous(),
            s: self.s.narrow(0, 0, rank)?.contiguous(),
            vt: self.vt.narrow(0, 0, rank)?.contiguous(),
        })
    }

    /// `U · diag(s)`, broadcasting `s` over the rows.
    pub fn weighted_u<C: BinaryOps<R>>(&self, client: &C) -> Result<Tensor<R>> {
        let k = self.s.shape()[0];
        client.mul(&self.u, &self.s.reshape(&[1, k])?)
    }

    /// `diag(s) · Vt`, broadcasting `s` over the columns.
    pub fn weighted_vt<C: BinaryOps<R>>(&self, client: &C) -> Result<Tensor<R>> {
        let k = self.s.shape()[0];
        client.mul(&self.s.reshape(&[k, 1])?, &self.vt)
    }
}

/// Thin SVD of a `[rows, cols]` matrix.
///
/// Wide matrices are factorized through their transpose so the decomposition
/// is always computed on a tall matrix.
pub(crate) fn thin_svd<R, C>(client: &C, m: &Tensor<R>, shape: [usize; 2]) -> Result<ThinSvd<R>>
where
    R: Runtime,
    C: LinearAlgebraAlgorithms<R>,
{
    let [rows, cols] = shape;
    let mat = m.contiguous().reshape(&shape)?;

    if rows < cols {
        let transposed = mat.transpose(0, 1)?.contiguous();
        let svd = client.svd_decompose(&transposed)?;
        let k = svd.s.shape()[0];
        let u = leading_cols(&svd.vt.transpose(0, 1)?.contiguous(), k)?;
        let vt = leading_rows(&svd.u.transpose(0, 1)?.contiguous(), k)?;
        return Ok(ThinSvd { u, s: svd.s, vt });
    }

    let svd = client.svd_decompose(&mat)?;
    let k = svd.s.shape()[0];
    let u = leading_cols(&svd.u, k)?;
    let vt = leading_rows(&svd.vt, k)?;
    Ok(ThinSvd { u, s: svd.s, vt })
}

fn leading_cols<R: Runtime>(m: &Tensor<R>, k: usize) -> Result<Tensor<R>> {
    if m.shape()[1] > k {
        Ok(m.narrow(1, 0, k)?.contiguous())
    } else {
        Ok(m.contiguous())
    }
}

fn leading_rows<R: Runtime>(m: &Tensor<R>, k: usize) -> Result<Tensor<R>> {
    if m.shape()[0] > k {
        Ok(m.narrow(0, 0, k)?.contiguous())
    } else {
        Ok(m.contiguous())
    }
}
