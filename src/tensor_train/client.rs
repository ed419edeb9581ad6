//! Unified client trait for tensor-train kernels.
//!
//! Every TT algorithm in this crate needs the same set of numr capabilities:
//! elementwise and scalar arithmetic, reductions, matrix products and the SVD.
//! `TtClient` bundles them so signatures stay short.

use numr::algorithm::linalg::LinearAlgebraAlgorithms;
use numr::ops::{MatmulOps, ReduceOps, ScalarOps, TensorOps};
use numr::runtime::{Runtime, RuntimeClient};

/// Client trait for tensor-train arithmetic, orthonormalization and solvers.
pub trait TtClient<R: Runtime>:
    TensorOps<R>
    + ScalarOps<R>
    + ReduceOps<R>
    + MatmulOps<R>
    + LinearAlgebraAlgorithms<R>
    + RuntimeClient<R>
{
}

impl<R, T> TtClient<R> for T
where
    R: Runtime,
    T: TensorOps<R>
        + ScalarOps<R>
        + ReduceOps<R>
        + MatmulOps<R>
        + LinearAlgebraAlgorithms<R>
        + RuntimeClient<R>,
{
}
