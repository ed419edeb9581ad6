//! Configuration types for tensor-train time integration.
//!
//! The implementations live behind the
//! [`TtOdeAlgorithms`](crate::integrate::TtOdeAlgorithms) trait.
//!
//! # Fixed-step schemes
//!
//! | Scheme | Order | Linear solves | Normalization |
//! |--------|-------|---------------|---------------|
//! | `explicit_euler` | 1 | none | `FixedStepOptions::normalize` |
//! | `sod` | 2 | none | `FixedStepOptions::normalize` |
//! | `implicit_euler` | 1 | one per step | `FixedStepOptions::normalize` |
//! | `trapezoidal_rule` | 2 | one per step | always Manhattan |
//!
//! # Adaptive steps
//!
//! `adaptive_step_size` pairs implicit Euler with a [`SecondMethod`] and
//! controls the step size from the local error and the change in closeness to
//! a stationary state. See [`AdaptiveOptions`].

mod types;

pub use types::{
    AdaptiveOptions, FixedStepMethod, FixedStepOptions, Normalization, SecondMethod,
    StepSizeSchedule, TtOdeMethod,
};
