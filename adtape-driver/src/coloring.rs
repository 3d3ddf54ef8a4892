use lib_adtape_sparse::SparsityPattern;

/// Greedy column coloring: columns with the same color never have an entry in
/// the same row, so a single sweep along the sum of their unit vectors
/// recovers all of them.
///
/// Columns are colored in order, each with the smallest color not already
/// taken by a column it shares a row with. Returns the color of every column
/// and the number of colors used.
pub fn color_columns(pattern: &SparsityPattern) -> (Vec<usize>, usize) {
  let n = pattern.n_cols();
  let columns = pattern.transpose();
  let mut colors = vec![usize::MAX; n];
  let mut n_colors = 0;
  // forbidden[c] == j marks color c as taken for column j
  let mut forbidden = vec![usize::MAX; n];

  for j in 0..n {
    for i in columns.row(j).iter() {
      for k in pattern.row(i).iter() {
        if colors[k] != usize::MAX {
          forbidden[colors[k]] = j;
        }
      }
    }
    let color = (0..n).find(|&c| forbidden[c] != j).unwrap_or(0);
    colors[j] = color;
    n_colors = n_colors.max(color + 1);
  }
  tracing::trace!(columns = n, n_colors, "colored columns");
  (colors, n_colors)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn assert_valid(pattern: &SparsityPattern, colors: &[usize]) {
    for i in 0..pattern.n_rows() {
      let row: Vec<_> = pattern.row(i).iter().collect();
      for (a, &j) in row.iter().enumerate() {
        for &k in &row[a + 1..] {
          assert_ne!(colors[j], colors[k], "columns {j} and {k} share row {i}");
        }
      }
    }
  }

  #[test]
  fn diagonal_needs_one_color() {
    let (colors, n_colors) = color_columns(&SparsityPattern::identity(5));
    assert_eq!(n_colors, 1);
    assert_eq!(colors, vec![0; 5]);
  }

  #[test]
  fn dense_row_needs_every_color() {
    let pattern = SparsityPattern::from_rows(4, [vec![0, 1, 2, 3]]);
    let (colors, n_colors) = color_columns(&pattern);
    assert_eq!(n_colors, 4);
    assert_eq!(colors, vec![0, 1, 2, 3]);
  }

  #[test]
  fn tridiagonal() {
    let rows: Vec<Vec<usize>> = (0..6usize)
      .map(|i| (i.saturating_sub(1)..(i + 2).min(6)).collect())
      .collect();
    let pattern = SparsityPattern::from_rows(6, rows);
    let (colors, n_colors) = color_columns(&pattern);
    assert_eq!(n_colors, 3);
    assert_eq!(colors, vec![0, 1, 2, 0, 1, 2]);
    assert_valid(&pattern, &colors);
  }

  #[test]
  fn arrow() {
    // first row and column dense, diagonal elsewhere
    let mut pattern = SparsityPattern::identity(5);
    for j in 1..5 {
      pattern.insert(0, j);
      pattern.insert(j, 0);
    }
    let (colors, n_colors) = color_columns(&pattern);
    assert_eq!(n_colors, 5);
    assert_valid(&pattern, &colors);
  }

  #[test]
  fn empty_columns() {
    let pattern = SparsityPattern::new(3, 4);
    let (colors, n_colors) = color_columns(&pattern);
    assert_eq!(colors, vec![0; 4]);
    assert_eq!(n_colors, 1);
  }
}
