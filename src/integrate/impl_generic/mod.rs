//! Generic implementations of integration algorithms.
//!
//! These functions work with any runtime whose client provides the
//! tensor-train operations (see [`TtClient`](crate::tensor_train::TtClient)).

pub mod ode;

pub use ode::{
    TtOdeResult, adaptive_step_size_impl, errors_expl_euler_impl, errors_impl_euler_impl,
    errors_trapezoidal_impl, explicit_euler_impl, fixed_step_impl, implicit_euler_impl,
    sod_impl, trapezoidal_rule_impl,
};
