use nalgebra::DMatrix;
use rustc_hash::FxHashMap;

use lib_adtape_core::{ensure_len, Function, Result};
use lib_adtape_sparse::SparsityPattern;
use lib_adtape_sweep::Evaluator;

use crate::coloring::color_columns;

/// Values of a matrix at the entries of a sparsity pattern
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SparseMatrix {
  n_rows: usize,
  n_cols: usize,
  entries: FxHashMap<(usize, usize), f64>,
}

impl SparseMatrix {
  fn new(n_rows: usize, n_cols: usize, nnz: usize) -> Self {
    let mut entries = FxHashMap::default();
    entries.reserve(nnz);
    Self {
      n_rows,
      n_cols,
      entries,
    }
  }

  #[inline]
  pub fn n_rows(&self) -> usize {
    self.n_rows
  }

  #[inline]
  pub fn n_cols(&self) -> usize {
    self.n_cols
  }

  /// Value at `(row, col)`, zero outside the pattern
  pub fn get(&self, row: usize, col: usize) -> f64 {
    self.entries.get(&(row, col)).copied().unwrap_or(0.0)
  }

  /// Number of stored entries, the pattern's entry count
  pub fn nnz(&self) -> usize {
    self.entries.len()
  }

  /// Stored entries as `(row, col, value)` in row-major order
  pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
    let mut keys: Vec<_> = self.entries.keys().copied().collect();
    keys.sort_unstable();
    keys.into_iter().map(|(i, j)| (i, j, self.entries[&(i, j)]))
  }

  pub fn to_dense(&self) -> DMatrix<f64> {
    let mut dense = DMatrix::zeros(self.n_rows, self.n_cols);
    for (&(i, j), &v) in &self.entries {
      dense[(i, j)] = v;
    }
    dense
  }
}

/// Jacobian at the entries of `pattern` (`m x n`), which must contain every
/// non zero of `F'(x)`, e.g. one from
/// [`jacobian_sparsity`](lib_adtape_sparse::SparsityExt::jacobian_sparsity).
///
/// Columns are colored and recovered with one forward sweep per color when
/// `n <= m`; otherwise rows are colored and recovered with one reverse sweep
/// per color.
pub fn sparse_jacobian(f: &Function, x: &[f64], pattern: &SparsityPattern) -> Result<SparseMatrix> {
  let (n, m) = (f.domain(), f.range());
  ensure_len("sparse_jacobian pattern rows", m, pattern.n_rows())?;
  ensure_len("sparse_jacobian pattern columns", n, pattern.n_cols())?;
  let mut eval = Evaluator::new(f);
  eval.forward(0, x)?;

  let mut jac = SparseMatrix::new(m, n, pattern.nnz());
  if n <= m {
    let (colors, n_colors) = color_columns(pattern);
    tracing::debug!(n, n_colors, "sparse jacobian, forward");
    for color in 0..n_colors {
      let dir: Vec<f64> = colors.iter().map(|&c| if c == color { 1.0 } else { 0.0 }).collect();
      let y = eval.forward(1, &dir)?;
      for (i, j) in pattern.iter().filter(|&(_, j)| colors[j] == color) {
        jac.entries.insert((i, j), y[i]);
      }
    }
  } else {
    let (colors, n_colors) = color_columns(&pattern.transpose());
    tracing::debug!(m, n_colors, "sparse jacobian, reverse");
    for color in 0..n_colors {
      let w: Vec<f64> = colors.iter().map(|&c| if c == color { 1.0 } else { 0.0 }).collect();
      let dw = eval.reverse(1, &w)?;
      for (i, j) in pattern.iter().filter(|&(i, _)| colors[i] == color) {
        jac.entries.insert((i, j), dw[j]);
      }
    }
  }
  Ok(jac)
}

/// Hessian of `w^T F` at the entries of `pattern` (`n x n`), which must
/// contain every non zero of the Hessian, e.g. one from
/// [`hessian_sparsity`](lib_adtape_sparse::SparsityExt::hessian_sparsity).
/// One forward and one second order reverse sweep per column color.
pub fn sparse_hessian(
  f: &Function,
  x: &[f64],
  w: &[f64],
  pattern: &SparsityPattern,
) -> Result<SparseMatrix> {
  let n = f.domain();
  ensure_len("sparse_hessian weights", f.range(), w.len())?;
  ensure_len("sparse_hessian pattern rows", n, pattern.n_rows())?;
  ensure_len("sparse_hessian pattern columns", n, pattern.n_cols())?;
  let mut eval = Evaluator::new(f);
  eval.forward(0, x)?;

  let (colors, n_colors) = color_columns(pattern);
  tracing::debug!(n, n_colors, "sparse hessian");
  let mut hes = SparseMatrix::new(n, n, pattern.nnz());
  for color in 0..n_colors {
    let dir: Vec<f64> = colors.iter().map(|&c| if c == color { 1.0 } else { 0.0 }).collect();
    eval.forward(1, &dir)?;
    let dw = eval.reverse(2, w)?;
    for (i, j) in pattern.iter().filter(|&(_, j)| colors[j] == color) {
      hes.entries.insert((i, j), dw[i * 2]);
    }
  }
  Ok(hes)
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;

  use lib_adtape_core::{Error, Tape};
  use lib_adtape_sparse::SparsityExt;

  use super::*;
  use crate::{hessian, jacobian};

  /// Chained Rosenbrock in `n` variables
  fn rosenbrock(n: usize) -> Function {
    Tape::new()
      .scope(|guard| {
        let x = guard.independent(&vec![0.0; n]);
        let mut sum = guard.constant(0.0);
        for pair in x.windows(2) {
          let a = 1.0 - pair[0];
          let b = pair[1] - pair[0] * pair[0];
          sum += a * a + 100.0 * b * b;
        }
        guard.lock().seal(&[sum])
      })
      .unwrap()
  }

  /// `y_i = x_i^2 * x_{i+1}` for `i < n - 1`, and `y_{n-1} = exp(x_{n-1})`
  fn banded(n: usize) -> Function {
    Tape::new()
      .scope(|guard| {
        let x = guard.independent(&vec![0.0; n]);
        let mut y: Vec<_> = x.windows(2).map(|p| p[0] * p[0] * p[1]).collect();
        y.push(x[n - 1].exp());
        guard.lock().seal(&y)
      })
      .unwrap()
  }

  fn point(n: usize) -> Vec<f64> {
    (0..n).map(|i| 0.3 + 0.1 * i as f64).collect()
  }

  mod jacobian {
    use super::*;

    #[test]
    fn forward_matches_dense() {
      let f = banded(6);
      let x = point(6);
      let pattern = f.jacobian_sparsity().unwrap();
      let jac = sparse_jacobian(&f, &x, &pattern).unwrap();
      assert_eq!(jac.nnz(), pattern.nnz());
      assert_eq!(jac.nnz(), 11);
      assert_relative_eq!(jac.to_dense(), jacobian(&f, &x).unwrap(), epsilon = 1e-14);
    }

    #[test]
    fn reverse_matches_dense() {
      // more inputs than outputs: rows are colored instead
      let f = Tape::new()
        .scope(|guard| {
          let x = guard.independent(&[0.0; 4]);
          let y = [x[0] * x[1], x[2].sin() + x[3]];
          guard.lock().seal(&y)
        })
        .unwrap();
      let x = [1.0, 2.0, 0.5, -1.0];
      let pattern = f.jacobian_sparsity().unwrap();
      let jac = sparse_jacobian(&f, &x, &pattern).unwrap();
      assert_eq!(jac.get(0, 0), 2.0);
      assert_eq!(jac.get(0, 1), 1.0);
      assert_eq!(jac.get(0, 2), 0.0);
      assert_relative_eq!(jac.get(1, 2), 0.5f64.cos(), epsilon = 1e-15);
      assert_relative_eq!(jac.to_dense(), jacobian(&f, &x).unwrap(), epsilon = 1e-14);
    }

    #[test]
    fn row_major_iteration() {
      let f = banded(3);
      let pattern = f.jacobian_sparsity().unwrap();
      let jac = sparse_jacobian(&f, &point(3), &pattern).unwrap();
      let positions: Vec<_> = jac.iter().map(|(i, j, _)| (i, j)).collect();
      assert_eq!(positions, vec![(0, 0), (0, 1), (1, 1), (1, 2), (2, 2)]);
    }

    #[test]
    fn pattern_shape_is_checked() {
      let f = banded(3);
      let pattern = SparsityPattern::identity(4);
      assert!(matches!(
        sparse_jacobian(&f, &point(3), &pattern),
        Err(Error::DimensionMismatch { expected: 3, got: 4, .. })
      ));
    }
  }

  mod hessian {
    use super::*;

    #[test]
    fn rosenbrock_matches_dense() {
      let n = 8;
      let f = rosenbrock(n);
      let x = point(n);
      let pattern = f.hessian_sparsity(&[true]).unwrap();
      let hes = sparse_hessian(&f, &x, &[1.0], &pattern).unwrap();
      assert_eq!(hes.nnz(), 3 * n - 2);
      let dense = hessian(&f, &x, &[1.0]).unwrap();
      assert_relative_eq!(hes.to_dense(), dense, epsilon = 1e-10);
      // three colors are enough for a tridiagonal pattern
      assert_eq!(color_columns(&pattern).1, 3);
    }

    #[test]
    fn weighted_vector_function() {
      let f = banded(5);
      let x = point(5);
      let w = [1.0, -2.0, 0.5, 3.0, 1.5];
      let select: Vec<bool> = w.iter().map(|&w| w != 0.0).collect();
      let pattern = f.hessian_sparsity(&select).unwrap();
      let hes = sparse_hessian(&f, &x, &w, &pattern).unwrap();
      let dense = hessian(&f, &x, &w).unwrap();
      assert_relative_eq!(hes.to_dense(), dense, epsilon = 1e-12);
      for (i, j, v) in hes.iter() {
        assert_relative_eq!(v, hes.get(j, i), epsilon = 1e-12);
      }
    }

    #[test]
    fn weights_are_checked() {
      let f = rosenbrock(3);
      let pattern = SparsityPattern::identity(3);
      assert!(sparse_hessian(&f, &point(3), &[1.0, 1.0], &pattern).is_err());
    }
  }
}
