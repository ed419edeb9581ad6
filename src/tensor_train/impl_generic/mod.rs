//! Generic tensor-train kernels over any numr runtime.

mod arithmetic;
mod norm;
mod ortho;

pub use arithmetic::{tt_add_impl, tt_dot_impl, tt_scale_impl, tt_sub_impl};
pub use norm::tt_norm_impl;
pub(crate) use ortho::truncation_rank;
pub use ortho::{tt_ortho_impl, tt_ortho_left_impl, tt_ortho_right_impl};
