//!
//! # adtape-driver
//!
//! Ready made derivative computations on a recorded [`Function`]
//! (`lib_adtape_core::Function`), built from the forward and reverse sweeps:
//!
//! - dense [`jacobian`], [`gradient`] and [`hessian`], returned as `nalgebra`
//!   matrices and vectors
//! - [`sparse_jacobian`] and [`sparse_hessian`], which take a sparsity pattern
//!   and use [`color_columns`] to recover several columns per sweep
//!
//! [`Function`]: lib_adtape_core::Function
//!

mod coloring;
mod dense;
mod sparse;

pub use coloring::color_columns;
pub use dense::{gradient, hessian, jacobian};
pub use sparse::{sparse_hessian, sparse_jacobian, SparseMatrix};
