//! Tensor-train algebra trait.

use numr::error::Result;
use numr::runtime::Runtime;

use super::types::{TensorTrain, TtNorm};

/// Arithmetic, contraction and rank reduction of tensor trains.
///
/// All operations return new trains; inputs are never modified.
pub trait TensorTrainAlgorithms<R: Runtime> {
    /// Sum `a + b`. Ranks add up.
    fn tt_add(&self, a: &TensorTrain<R>, b: &TensorTrain<R>) -> Result<TensorTrain<R>>;

    /// Difference `a - b`.
    fn tt_sub(&self, a: &TensorTrain<R>, b: &TensorTrain<R>) -> Result<TensorTrain<R>>;

    /// Scalar multiple `alpha · a`.
    fn tt_scale(&self, a: &TensorTrain<R>, alpha: f64) -> Result<TensorTrain<R>>;

    /// Product `a · b` of an operator with a state or with another operator.
    ///
    /// The column dimensions of `a` must equal the row dimensions of `b`.
    /// Ranks multiply.
    fn tt_dot(&self, a: &TensorTrain<R>, b: &TensorTrain<R>) -> Result<TensorTrain<R>>;

    /// Manhattan or Euclidean norm of the full tensor.
    fn tt_norm(&self, a: &TensorTrain<R>, norm: TtNorm) -> Result<f64>;

    /// Left-orthonormalize and then truncate from right to left.
    ///
    /// Bond ranks of the result are chosen per bond as the smallest `r` such
    /// that the discarded singular values satisfy
    /// `Σ_{i>r} σ_i² ≤ threshold² · Σ_i σ_i²`, clamped to `1..=max_rank`.
    fn tt_ortho(&self, a: &TensorTrain<R>, threshold: f64, max_rank: usize)
    -> Result<TensorTrain<R>>;

    /// Left-to-right SVD sweep; all cores but the last become left-orthonormal.
    fn tt_ortho_left(
        &self,
        a: &TensorTrain<R>,
        threshold: f64,
        max_rank: usize,
    ) -> Result<TensorTrain<R>>;

    /// Right-to-left SVD sweep; all cores but the first become right-orthonormal.
    fn tt_ortho_right(
        &self,
        a: &TensorTrain<R>,
        threshold: f64,
        max_rank: usize,
    ) -> Result<TensorTrain<R>>;
}
