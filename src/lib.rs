//!
//! # adtape
//!
//! ## Core API
//!
//! Tape based automatic differentiation of `f64` functions `F: R^n -> R^m`.
//! Operations on [`Var`]s inside a [`Tape::scope`] are recorded and sealed
//! into an immutable [`Function`], which can then be replayed any number of
//! times, from any number of threads:
//!
//! - [`sweep`] propagates Taylor coefficients of any order forward and
//!   partials of any order in reverse
//! - [`sparse`] computes Jacobian and Hessian sparsity patterns without
//!   evaluating anything
//! - [`driver`] offers dense and sparse Jacobians, gradients and Hessians
//!
//! ```
//! use lib_adtape::sweep::FunctionExt;
//! use lib_adtape::Tape;
//!
//! # fn main() -> lib_adtape::Result<()> {
//! let f = Tape::new().scope(|guard| {
//!   let x = guard.independent(&[1.0, 2.0]);
//!   let y = x[0] * x[1].sin();
//!   guard.lock().seal(&[y])
//! })?;
//! let grad = f.vjp(&[3.0, 0.5], &[1.0])?;
//! assert!((grad[0] - 0.5f64.sin()).abs() < 1e-12);
//! assert!((grad[1] - 3.0 * 0.5f64.cos()).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```
//!

pub use lib_adtape_core::*;

#[cfg(feature = "sweep")]
pub use lib_adtape_sweep as sweep;

#[cfg(feature = "sparse")]
pub use lib_adtape_sparse as sparse;

#[cfg(feature = "driver")]
pub use lib_adtape_driver as driver;
