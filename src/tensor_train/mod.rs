//! Tensor trains: compressed storage of high-dimensional states and operators.
//!
//! A tensor train stores a `d`-dimensional array as a chain of small 4-D cores.
//! States (vectors over `m_1 × ... × m_d`) and linear operators on such
//! states share one representation, [`TensorTrain`].
//!
//! # Operations
//!
//! - [`TensorTrainAlgorithms::tt_add`] / [`TensorTrainAlgorithms::tt_sub`] - Sums (ranks add)
//! - [`TensorTrainAlgorithms::tt_scale`] - Scalar multiples
//! - [`TensorTrainAlgorithms::tt_dot`] - Operator application and composition (ranks multiply)
//! - [`TensorTrainAlgorithms::tt_norm`] - Manhattan and Euclidean norms
//! - [`TensorTrainAlgorithms::tt_ortho`] - Orthonormalization with rank truncation
//!
//! # Example
//!
//! ```ignore
//! use ttsolvr::tensor_train::{TensorTrain, TensorTrainAlgorithms, TtNorm};
//! use numr::runtime::cpu::{CpuClient, CpuDevice};
//!
//! let device = CpuDevice::new();
//! let client = CpuClient::new(device.clone());
//!
//! let x = TensorTrain::kron_state(&[vec![0.5, 0.5], vec![0.9, 0.1]], &device)?;
//! let eye = TensorTrain::eye(&[2, 2], &device)?;
//! let y = client.tt_dot(&eye, &x)?;
//! let norm = client.tt_norm(&y, TtNorm::Manhattan)?;
//! ```

mod client;
mod cpu;
pub(crate) mod host;
pub mod impl_generic;
mod traits;
mod types;

pub use client::TtClient;
pub use traits::TensorTrainAlgorithms;
pub use types::{TensorTrain, TtNorm};
