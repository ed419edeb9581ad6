//! ttsolvr - Time Integration in the Tensor-Train Format
//!
//! ttsolvr integrates linear ODEs `dx/dt = A x` whose operator and states are
//! far too large to store densely, such as master equations of Markov
//! processes on many coupled sites. Operators and states are kept as tensor
//! trains; every time step is a sequence of TT products, rank truncations and
//! alternating linear solves. Built on numr's tensor primitives, the generic
//! implementations work with any numr `Runtime`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      integrate                           │
//! │   (explicit/implicit schemes, adaptive step control)    │
//! └──────────────┬───────────────────────────┬──────────────┘
//!                │ solves with               │ uses
//! ┌──────────────▼──────────────┐            │
//! │             sle             │            │
//! │     (ALS / MALS sweeps)     │            │
//! └──────────────┬──────────────┘            │
//!                │ uses                      │
//! ┌──────────────▼───────────────────────────▼──────────────┐
//! │                     tensor_train                         │
//! │    (TT algebra: add, scale, dot, norm, orthonormalize)  │
//! └──────────────────────────┬──────────────────────────────┘
//!                            │ uses
//! ┌──────────────────────────▼──────────────────────────────┐
//! │                       numr                               │
//! │          (tensors, matmul, SVD, dense solve)            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`tensor_train`] - Tensor-train format and its algebra
//! - [`sle`] - Linear systems in tensor-train format (ALS, MALS)
//! - [`integrate`] - Fixed-step and adaptive time integration
//!
//! # Logging
//!
//! The crate logs through the `log` facade: rejected steps and termination
//! reasons at `debug`, failed runs at `warn`. Progress goes to a
//! [`ProgressReporter`]; [`LogProgress`] forwards it at `info`.
//!
//! # Example
//!
//! ```ignore
//! use ttsolvr::integrate::{AdaptiveOptions, NoProgress, TtOdeAlgorithms};
//! use ttsolvr::tensor_train::{TensorTrain, TensorTrainAlgorithms};
//! use numr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
//!
//! let device = CpuDevice::new();
//! let client = CpuClient::new(device.clone());
//!
//! // Two independent two-state chains
//! let g = vec![-1.0, 0.5, 1.0, -0.5];
//! let eye = vec![1.0, 0.0, 0.0, 1.0];
//! let a = client.tt_add(
//!     &TensorTrain::<CpuRuntime>::kron_operator(&[g.clone(), eye.clone()], &[2, 2], &device)?,
//!     &TensorTrain::<CpuRuntime>::kron_operator(&[eye, g], &[2, 2], &device)?,
//! )?;
//! let x0 = TensorTrain::<CpuRuntime>::kron_state(&[vec![1.0, 0.0], vec![1.0, 0.0]], &device)?;
//!
//! let result = client
//!     .adaptive_step_size(&a, &x0, &x0, 100.0, &AdaptiveOptions::default(), &NoProgress)?
//!     .into_result()?;
//! println!("stationary after t = {:?}", result.t.last());
//! ```

pub mod integrate;
pub mod sle;
pub mod tensor_train;

// Re-export main types for convenience
pub use integrate::{
    AdaptiveOptions, FixedStepMethod, FixedStepOptions, IntegrateError, IntegrateResult,
    LogProgress, NoProgress, Normalization, ProgressReporter, SecondMethod, StepSizeSchedule,
    TtOdeAlgorithms, TtOdeMethod, TtOdeResult,
};
pub use sle::{MicroSolver, SleError, SleOptions, SleResult, TtLinearSolvers, TtSolver};
pub use tensor_train::{TensorTrain, TensorTrainAlgorithms, TtClient, TtNorm};

// Re-export numr types that users will commonly need
pub use numr::error::{Error, Result};
pub use numr::runtime::{Runtime, RuntimeClient};
pub use numr::tensor::Tensor;
