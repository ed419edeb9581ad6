//! Time integration of linear ODEs in tensor-train format.
//!
//! Solves `dx/dt = A x` where the operator `A` and all states are
//! [`TensorTrain`](crate::tensor_train::TensorTrain)s, as arising from
//! master equations of high-dimensional Markov processes.
//!
//! # Fixed step sizes
//!
//! - [`TtOdeAlgorithms::explicit_euler`] - Explicit Euler with truncation
//! - [`TtOdeAlgorithms::sod`] - Second order differencing
//! - [`TtOdeAlgorithms::implicit_euler`] - Implicit Euler via ALS/MALS
//! - [`TtOdeAlgorithms::trapezoidal_rule`] - Trapezoidal rule via ALS/MALS
//! - [`TtOdeAlgorithms::solve_fixed_step`] - Dispatch on [`FixedStepMethod`]
//!
//! The matching `errors_*` methods compute the per-step residuals of a
//! trajectory.
//!
//! # Adaptive step sizes
//!
//! - [`TtOdeAlgorithms::adaptive_step_size`] - Embedded implicit pair with
//!   closeness-based termination
//!
//! # Progress
//!
//! Every run reports to a [`ProgressReporter`]; use [`NoProgress`] to stay
//! silent or [`LogProgress`] to forward to the `log` facade.

mod cpu;
pub mod error;
pub mod impl_generic;
pub mod ode;
pub mod progress;
mod traits;

pub use error::{IntegrateError, IntegrateResult};
pub use impl_generic::TtOdeResult;
pub use ode::{
    AdaptiveOptions, FixedStepMethod, FixedStepOptions, Normalization, SecondMethod,
    StepSizeSchedule, TtOdeMethod,
};
pub use progress::{LogProgress, NoProgress, ProgressReporter};
pub use traits::TtOdeAlgorithms;
