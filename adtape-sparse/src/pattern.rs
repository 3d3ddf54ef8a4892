use std::fmt;

use bit_set::BitSet;

/// Boolean sparsity pattern of an `n_rows x n_cols` matrix, one bit set of
/// column indices per row.
///
/// Patterns produced by the analysis are conservative: a missing entry is
/// known to be zero, a present one only might be non zero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SparsityPattern {
  rows: Vec<BitSet>,
  n_cols: usize,
}

impl SparsityPattern {
  /// Empty pattern
  pub fn new(n_rows: usize, n_cols: usize) -> Self {
    Self {
      rows: vec![BitSet::with_capacity(n_cols); n_rows],
      n_cols,
    }
  }

  pub fn identity(n: usize) -> Self {
    let mut pattern = Self::new(n, n);
    for i in 0..n {
      pattern.insert(i, i);
    }
    pattern
  }

  /// Build from the column indices of each row
  pub fn from_rows<I, R>(n_cols: usize, rows: I) -> Self
  where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = usize>,
  {
    let mut pattern = Self::new(0, n_cols);
    for row in rows {
      let mut set = BitSet::with_capacity(n_cols);
      for col in row {
        assert!(col < n_cols, "column {col} out of bounds for {n_cols} columns");
        set.insert(col);
      }
      pattern.rows.push(set);
    }
    pattern
  }

  /// Build from a row-major boolean matrix
  pub fn from_dense(n_rows: usize, n_cols: usize, dense: &[bool]) -> Self {
    assert_eq!(dense.len(), n_rows * n_cols, "dense pattern has the wrong size");
    let mut pattern = Self::new(n_rows, n_cols);
    for (k, _) in dense.iter().enumerate().filter(|&(_, &b)| b) {
      pattern.insert(k / n_cols, k % n_cols);
    }
    pattern
  }

  /// Wrap per-row sets computed elsewhere in this crate
  pub(crate) fn from_sets(rows: Vec<BitSet>, n_cols: usize) -> Self {
    Self { rows, n_cols }
  }

  /// Mark `(row, col)`, returns `false` if it was already present
  pub fn insert(&mut self, row: usize, col: usize) -> bool {
    assert!(col < self.n_cols, "column {col} out of bounds for {} columns", self.n_cols);
    self.rows[row].insert(col)
  }

  #[inline]
  pub fn contains(&self, row: usize, col: usize) -> bool {
    self.rows.get(row).is_some_and(|set| set.contains(col))
  }

  #[inline]
  pub fn row(&self, row: usize) -> &BitSet {
    &self.rows[row]
  }

  #[inline]
  pub fn n_rows(&self) -> usize {
    self.rows.len()
  }

  #[inline]
  pub fn n_cols(&self) -> usize {
    self.n_cols
  }

  /// Number of possibly non zero entries
  pub fn nnz(&self) -> usize {
    self.rows.iter().map(BitSet::len).sum()
  }

  pub fn transpose(&self) -> Self {
    let mut out = Self::new(self.n_cols, self.n_rows());
    for (i, j) in self.iter() {
      out.insert(j, i);
    }
    out
  }

  /// Row-major boolean matrix
  pub fn to_dense(&self) -> Vec<bool> {
    let mut dense = vec![false; self.n_rows() * self.n_cols];
    for (i, j) in self.iter() {
      dense[i * self.n_cols + j] = true;
    }
    dense
  }

  /// Entries in row-major order
  pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
    self
      .rows
      .iter()
      .enumerate()
      .flat_map(|(i, set)| set.iter().map(move |j| (i, j)))
  }
}

impl fmt::Display for SparsityPattern {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for set in &self.rows {
      let line: String = (0..self.n_cols)
        .map(|j| if set.contains(j) { 'x' } else { '.' })
        .collect();
      writeln!(f, "{line}")?;
    }
    Ok(())
  }
}
