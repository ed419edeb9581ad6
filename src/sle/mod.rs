//! Linear systems in tensor-train format.
//!
//! Implicit time steps need the solution of `A · x = b` where the operator,
//! the right-hand side and the unknown are all tensor trains. This module
//! provides the alternating sweep solvers used for that.
//!
//! # Solvers
//!
//! - [`TtLinearSolvers::tt_als`] - Alternating linear scheme (fixed ranks)
//! - [`TtLinearSolvers::tt_mals`] - Modified alternating linear scheme (adaptive ranks)
//! - [`TtLinearSolvers::tt_solve`] - Dispatch on [`SleOptions::tt_solver`]
//!
//! Local systems are solved densely, either with numr's solver or with an LU
//! factorization ([`MicroSolver`]).

mod cpu;
pub mod error;
pub mod impl_generic;
mod traits;
mod types;

pub use error::{SleError, SleResult};
pub use traits::TtLinearSolvers;
pub use types::{MicroSolver, SleOptions, TtSolver};
