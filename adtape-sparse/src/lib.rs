//!
//! # adtape-sparse
//!
//! Sparsity analysis of a recorded [`Function`]. The sweeps here look only at
//! the structure of the tape, never at values, so every pattern holds for all
//! inputs: an entry missing from a pattern is zero wherever the recorded
//! operation sequence is valid.
//!
//! - [`for_sparse_jac`] pushes the pattern of a seed `R` forward, giving the
//!   pattern of `F'(x) R`
//! - [`rev_sparse_jac`] pulls the pattern of a seed `S` back, giving the
//!   pattern of `S F'(x)`
//! - [`rev_sparse_hes`] combines a forward Jacobian sweep with a reverse sweep
//!   over the selected range components to give the pattern of
//!   `R^T (s^T F)''(x)`
//!

mod dependency;
mod hessian;
mod jacobian;
mod pattern;

use lib_adtape_core::{Function, Result};

pub use hessian::rev_sparse_hes;
pub use jacobian::{for_sparse_jac, rev_sparse_jac, ForwardJacobian};
pub use pattern::SparsityPattern;

/// Extension trait providing full Jacobian and Hessian patterns of a
/// [`Function`]
pub trait SparsityExt {
  /// Pattern of `F'(x)`, `m x n`
  fn jacobian_sparsity(&self) -> Result<SparsityPattern>;

  /// Pattern of the Hessian of the sum of the range components picked by
  /// `select`, `n x n`
  fn hessian_sparsity(&self, select: &[bool]) -> Result<SparsityPattern>;
}

impl SparsityExt for Function {
  fn jacobian_sparsity(&self) -> Result<SparsityPattern> {
    // sweep in whichever direction needs the narrower sets
    if self.domain() <= self.range() {
      Ok(for_sparse_jac(self, &SparsityPattern::identity(self.domain()))?.into_pattern())
    } else {
      rev_sparse_jac(self, &SparsityPattern::identity(self.range()))
    }
  }

  fn hessian_sparsity(&self, select: &[bool]) -> Result<SparsityPattern> {
    let jac = for_sparse_jac(self, &SparsityPattern::identity(self.domain()))?;
    rev_sparse_hes(self, &jac, select)
  }
}
