use bit_set::BitSet;

use lib_adtape_core::{ensure_len, Function, Result, VarIndex};

use crate::dependency::{dependency, operands, Dependency};
use crate::pattern::SparsityPattern;

/// Result of a forward Jacobian sparsity sweep.
///
/// Besides the pattern of `F'(x) R` it keeps the pattern of every variable on
/// the tape, which a following Hessian sweep needs.
#[derive(Debug, Clone)]
pub struct ForwardJacobian {
  sets: Vec<BitSet>,
  pattern: SparsityPattern,
}

impl ForwardJacobian {
  /// Pattern of `F'(x) R`, `m x q`
  #[inline]
  pub fn pattern(&self) -> &SparsityPattern {
    &self.pattern
  }

  #[inline]
  pub fn into_pattern(self) -> SparsityPattern {
    self.pattern
  }

  /// Number of columns of `R`
  #[inline]
  pub fn n_cols(&self) -> usize {
    self.pattern.n_cols()
  }

  /// Columns of `R` that a variable of the tape may depend on
  #[inline]
  pub fn var(&self, var: VarIndex) -> &BitSet {
    &self.sets[var]
  }

  pub(crate) fn sets(&self) -> &[BitSet] {
    &self.sets
  }
}

/// Forward Jacobian sparsity: given the pattern of `R` (`n x q`), compute the
/// pattern of `F'(x) R` (`m x q`) for every `x`
pub fn for_sparse_jac(f: &Function, r: &SparsityPattern) -> Result<ForwardJacobian> {
  ensure_len("for_sparse_jac rows", f.domain(), r.n_rows())?;
  let q = r.n_cols();
  tracing::trace!(q, vars = f.num_var(), "forward jacobian sparsity");

  let mut sets = vec![BitSet::with_capacity(q); f.num_var()];
  for (j, &x) in f.independents().iter().enumerate() {
    sets[x] = r.row(j).clone();
  }
  for record in f.records() {
    if dependency(record.op) == Dependency::Nothing {
      continue;
    }
    let (lo, hi) = sets.split_at_mut(record.result);
    for arg in operands(record) {
      hi[0].union_with(&lo[arg]);
    }
    if record.op.num_results() == 2 {
      hi[1] = hi[0].clone();
    }
  }

  let rows = f.dependents().iter().map(|&y| sets[y].clone()).collect();
  Ok(ForwardJacobian {
    sets,
    pattern: SparsityPattern::from_sets(rows, q),
  })
}

/// Reverse Jacobian sparsity: given the pattern of `S` (`p x m`), compute the
/// pattern of `S F'(x)` (`p x n`) for every `x`
pub fn rev_sparse_jac(f: &Function, s: &SparsityPattern) -> Result<SparsityPattern> {
  ensure_len("rev_sparse_jac columns", f.range(), s.n_cols())?;
  let p = s.n_rows();
  tracing::trace!(p, vars = f.num_var(), "reverse jacobian sparsity");

  // row indices of `S` that reach each variable
  let mut sets = vec![BitSet::with_capacity(p); f.num_var()];
  for (row, i) in s.iter() {
    sets[f.dependents()[i]].insert(row);
  }
  for record in f.records().iter().rev() {
    if dependency(record.op) == Dependency::Nothing {
      continue;
    }
    let results = record.op.num_results();
    let (lo, hi) = sets.split_at_mut(record.result);
    for arg in operands(record) {
      for set in &hi[..results] {
        lo[arg].union_with(set);
      }
    }
  }

  let mut out = SparsityPattern::new(p, f.domain());
  for (j, &x) in f.independents().iter().enumerate() {
    for row in sets[x].iter() {
      out.insert(row, j);
    }
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use lib_adtape_core::{CompareOp, Error, Tape};

  use super::*;

  /// `[x0 * x1, sin(x2), x0 + 2, 3, cond(x0 < x3, x2, 1)]`
  fn mixed() -> Function {
    Tape::new()
      .scope(|guard| {
        let x = guard.independent(&[1.0, 2.0, 3.0, 4.0]);
        let a = x[0] * x[1];
        let b = x[2].sin();
        let c = x[0] + 2.0;
        let d = guard.constant(3.0);
        let e = guard.cond_exp(CompareOp::Lt, x[0], x[3], x[2], 1.0);
        // comparisons leave no trace in the pattern
        let _ = x[3].gt(x[1]);
        guard.lock().seal(&[a, b, c, d, e])
      })
      .unwrap()
  }

  fn expected() -> SparsityPattern {
    SparsityPattern::from_rows(4, [vec![0, 1], vec![2], vec![0], vec![], vec![2]])
  }

  mod forward {
    use super::*;

    #[test]
    fn identity_seed() {
      let f = mixed();
      let jac = for_sparse_jac(&f, &SparsityPattern::identity(4)).unwrap();
      assert_eq!(jac.pattern(), &expected());
      assert_eq!(jac.n_cols(), 4);
    }

    #[test]
    fn compressed_seed() {
      // R sums columns {0, 2} and {1, 3}
      let f = mixed();
      let r = SparsityPattern::from_rows(2, [vec![0], vec![1], vec![0], vec![1]]);
      let jac = for_sparse_jac(&f, &r).unwrap();
      let want = SparsityPattern::from_rows(2, [vec![0, 1], vec![0], vec![0], vec![], vec![0]]);
      assert_eq!(jac.into_pattern(), want);
    }

    #[test]
    fn auxiliary_results_follow_primary() {
      let f = mixed();
      let jac = for_sparse_jac(&f, &SparsityPattern::identity(4)).unwrap();
      let sin = f.dependents()[1];
      assert_eq!(jac.var(sin), jac.var(sin + 1));
    }

    #[test]
    fn wrong_seed_rows() {
      let f = mixed();
      assert!(matches!(
        for_sparse_jac(&f, &SparsityPattern::identity(3)),
        Err(Error::DimensionMismatch { expected: 4, got: 3, .. })
      ));
    }
  }

  mod reverse {
    use super::*;

    #[test]
    fn matches_forward() {
      let f = mixed();
      let rev = rev_sparse_jac(&f, &SparsityPattern::identity(5)).unwrap();
      assert_eq!(rev, expected());
    }

    #[test]
    fn selected_rows() {
      // S picks y0 + y4 and y1
      let f = mixed();
      let s = SparsityPattern::from_rows(5, [vec![0, 4], vec![1]]);
      let rev = rev_sparse_jac(&f, &s).unwrap();
      assert_eq!(rev, SparsityPattern::from_rows(4, [vec![0, 1, 2], vec![2]]));
    }

    #[test]
    fn independent_as_dependent() {
      let f = Tape::new()
        .scope(|guard| {
          let x = guard.independent(&[1.0, 2.0]);
          guard.lock().seal(&[x[1], x[0]])
        })
        .unwrap();
      let rev = rev_sparse_jac(&f, &SparsityPattern::identity(2)).unwrap();
      assert_eq!(rev, SparsityPattern::from_rows(2, [vec![1], vec![0]]));
    }

    #[test]
    fn wrong_seed_columns() {
      let f = mixed();
      assert!(rev_sparse_jac(&f, &SparsityPattern::identity(4)).is_err());
    }
  }
}
