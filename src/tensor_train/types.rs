//! Tensor-train value type.

use numr::error::{Error, Result};
use numr::runtime::Runtime;
use numr::tensor::Tensor;

use super::host::permuted;

/// Norm used by [`TensorTrainAlgorithms::tt_norm`](super::TensorTrainAlgorithms::tt_norm).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtNorm {
    /// Sum of all entries, in absolute value.
    ///
    /// Exact for nonnegative tensors such as probability distributions.
    Manhattan,
    /// Frobenius norm of the full tensor.
    #[default]
    Euclidean,
}

/// A tensor in tensor-train (TT) format.
///
/// Core `k` has shape `[r_k, m_k, n_k, r_{k+1}]` with boundary ranks
/// `r_0 = r_d = 1`. States have all column dimensions `n_k = 1`; operators
/// act from `n_1 × ... × n_d` onto `m_1 × ... × m_d`.
///
/// Values are immutable: every algorithm returns a new train and never
/// modifies its inputs.
#[derive(Debug, Clone)]
pub struct TensorTrain<R: Runtime> {
    cores: Vec<Tensor<R>>,
    row_dims: Vec<usize>,
    col_dims: Vec<usize>,
    ranks: Vec<usize>,
}

impl<R: Runtime> TensorTrain<R> {
    /// Build a train from its cores, validating shapes and the rank chain.
    pub fn new(cores: Vec<Tensor<R>>) -> Result<Self> {
        if cores.is_empty() {
            return Err(Error::InvalidArgument {
                arg: "cores",
                reason: "a tensor train needs at least one core".to_string(),
            });
        }

        let mut row_dims = Vec::with_capacity(cores.len());
        let mut col_dims = Vec::with_capacity(cores.len());
        let mut ranks = Vec::with_capacity(cores.len() + 1);

        for (k, core) in cores.iter().enumerate() {
            let shape = core.shape();
            if shape.len() != 4 {
                return Err(Error::InvalidArgument {
                    arg: "cores",
                    reason: format!("core {} must be 4-D, got shape {:?}", k, shape),
                });
            }
            if shape.contains(&0) {
                return Err(Error::InvalidArgument {
                    arg: "cores",
                    reason: format!("core {} has an empty dimension: {:?}", k, shape),
                });
            }
            match ranks.last() {
                None => ranks.push(shape[0]),
                Some(&r) if r != shape[0] => {
                    return Err(Error::InvalidArgument {
                        arg: "cores",
                        reason: format!(
                            "rank mismatch between cores {} and {}: {} vs {}",
                            k - 1,
                            k,
                            r,
                            shape[0]
                        ),
                    });
                }
                Some(_) => {}
            }
            row_dims.push(shape[1]);
            col_dims.push(shape[2]);
            ranks.push(shape[3]);
        }

        if ranks[0] != 1 || ranks[cores.len()] != 1 {
            return Err(Error::InvalidArgument {
                arg: "cores",
                reason: format!("boundary ranks must be 1, got {:?}", ranks),
            });
        }

        let cores = cores.into_iter().map(|c| c.contiguous()).collect();
        Ok(Self {
            cores,
            row_dims,
            col_dims,
            ranks,
        })
    }

    /// Identity operator on `row_dims[0] × ... × row_dims[d-1]`, all ranks 1.
    pub fn eye(row_dims: &[usize], device: &R::Device) -> Result<Self> {
        let cores = row_dims
            .iter()
            .map(|&m| {
                let mut data = vec![0.0; m * m];
                for i in 0..m {
                    data[i * m + i] = 1.0;
                }
                Tensor::<R>::from_slice(&data, &[1, m, m, 1], device)
            })
            .collect();
        Self::new(cores)
    }

    /// Tensor of all ones, all ranks 1.
    pub fn ones(row_dims: &[usize], col_dims: &[usize], device: &R::Device) -> Result<Self> {
        if row_dims.len() != col_dims.len() {
            return Err(Error::InvalidArgument {
                arg: "col_dims",
                reason: format!(
                    "expected {} column dimensions, got {}",
                    row_dims.len(),
                    col_dims.len()
                ),
            });
        }
        let cores = row_dims
            .iter()
            .zip(col_dims)
            .map(|(&m, &n)| Tensor::<R>::from_slice(&vec![1.0; m * n], &[1, m, n, 1], device))
            .collect();
        Self::new(cores)
    }

    /// Rank-one state `v_1 ⊗ v_2 ⊗ ... ⊗ v_d`.
    pub fn kron_state(factors: &[Vec<f64>], device: &R::Device) -> Result<Self> {
        let cores = factors
            .iter()
            .map(|v| Tensor::<R>::from_slice(v, &[1, v.len(), 1, 1], device))
            .collect();
        Self::new(cores)
    }

    /// Rank-one operator `M_1 ⊗ M_2 ⊗ ... ⊗ M_d`.
    ///
    /// `factors[k]` holds the row-major `dims[k] × dims[k]` matrix `M_k`.
    pub fn kron_operator(factors: &[Vec<f64>], dims: &[usize], device: &R::Device) -> Result<Self> {
        if factors.len() != dims.len() {
            return Err(Error::InvalidArgument {
                arg: "dims",
                reason: format!("{} factors but {} dimensions", factors.len(), dims.len()),
            });
        }
        let mut cores = Vec::with_capacity(dims.len());
        for (k, (factor, &m)) in factors.iter().zip(dims).enumerate() {
            if factor.len() != m * m {
                return Err(Error::InvalidArgument {
                    arg: "factors",
                    reason: format!(
                        "factor {} has {} entries, expected {}x{}",
                        k,
                        factor.len(),
                        m,
                        m
                    ),
                });
            }
            cores.push(Tensor::<R>::from_slice(factor, &[1, m, m, 1], device));
        }
        Self::new(cores)
    }

    /// Number of cores.
    pub fn order(&self) -> usize {
        self.cores.len()
    }

    pub fn row_dims(&self) -> &[usize] {
        &self.row_dims
    }

    pub fn col_dims(&self) -> &[usize] {
        &self.col_dims
    }

    /// Rank chain `[r_0, r_1, ..., r_d]`.
    pub fn ranks(&self) -> &[usize] {
        &self.ranks
    }

    /// Largest bond rank.
    pub fn rank(&self) -> usize {
        self.ranks.iter().copied().max().unwrap_or(1)
    }

    pub fn cores(&self) -> &[Tensor<R>] {
        &self.cores
    }

    pub fn core(&self, k: usize) -> &Tensor<R> {
        &self.cores[k]
    }

    /// True if any column dimension differs from 1.
    pub fn is_operator(&self) -> bool {
        self.col_dims.iter().any(|&n| n != 1)
    }

    /// Device the cores live on.
    pub fn device(&self) -> &R::Device {
        self.cores[0].device()
    }

    pub fn into_cores(self) -> Vec<Tensor<R>> {
        self.cores
    }

    /// Contract the train into a dense row-major buffer on the host.
    ///
    /// Operators are laid out as `[m_1, ..., m_d, n_1, ..., n_d]`. Intended
    /// for inspection and tests on small trains.
    pub fn to_full(&self) -> Result<Vec<f64>> {
        // acc is [(i_1 j_1 ... i_k j_k), r_{k+1}]
        let mut acc = vec![1.0];
        let mut outer = 1usize;

        for (k, core) in self.cores.iter().enumerate() {
            let r = self.ranks[k];
            let mn = self.row_dims[k] * self.col_dims[k];
            let r_next = self.ranks[k + 1];
            let data: Vec<f64> = core.to_vec();

            let mut next = vec![0.0; outer * mn * r_next];
            for p in 0..outer {
                for a in 0..r {
                    let lhs = acc[p * r + a];
                    if lhs == 0.0 {
                        continue;
                    }
                    let block = &data[a * mn * r_next..(a + 1) * mn * r_next];
                    let dst = &mut next[p * mn * r_next..(p + 1) * mn * r_next];
                    dst.iter_mut().zip(block).for_each(|(d, c)| *d += lhs * c);
                }
            }
            acc = next;
            outer *= mn;
        }

        if !self.is_operator() {
            return Ok(acc);
        }

        let d = self.order();
        let mut shape = Vec::with_capacity(2 * d);
        for k in 0..d {
            shape.push(self.row_dims[k]);
            shape.push(self.col_dims[k]);
        }
        let perm: Vec<usize> = (0..d).map(|k| 2 * k).chain((0..d).map(|k| 2 * k + 1)).collect();
        let full = Tensor::<R>::from_slice(&acc, &shape, self.device());
        Ok(permuted(&full, &perm)?.to_vec())
    }
}
