use nalgebra::{DMatrix, DVector};

use lib_adtape_core::{ensure_len, Function, Result};
use lib_adtape_sweep::Evaluator;

/// Jacobian `F'(x)`, `m x n`.
///
/// One first order forward sweep per column when `n <= m`, one first order
/// reverse sweep per row otherwise.
pub fn jacobian(f: &Function, x: &[f64]) -> Result<DMatrix<f64>> {
  let (n, m) = (f.domain(), f.range());
  let mut eval = Evaluator::new(f);
  eval.forward(0, x)?;

  let mut jac = DMatrix::zeros(m, n);
  if n <= m {
    let mut dir = vec![0.0; n];
    for j in 0..n {
      dir[j] = 1.0;
      let col = eval.forward(1, &dir)?;
      dir[j] = 0.0;
      for (i, v) in col.into_iter().enumerate() {
        jac[(i, j)] = v;
      }
    }
  } else {
    let mut w = vec![0.0; m];
    for i in 0..m {
      w[i] = 1.0;
      let row = eval.reverse(1, &w)?;
      w[i] = 0.0;
      for (j, v) in row.into_iter().enumerate() {
        jac[(i, j)] = v;
      }
    }
  }
  Ok(jac)
}

/// Gradient of a scalar function
pub fn gradient(f: &Function, x: &[f64]) -> Result<DVector<f64>> {
  ensure_len("gradient range", 1, f.range())?;
  let mut eval = Evaluator::new(f);
  eval.forward(0, x)?;
  Ok(DVector::from_vec(eval.reverse(1, &[1.0])?))
}

/// Hessian of `w^T F` at `x`, `n x n`; one forward and one second order
/// reverse sweep per column
pub fn hessian(f: &Function, x: &[f64], w: &[f64]) -> Result<DMatrix<f64>> {
  let n = f.domain();
  ensure_len("hessian weights", f.range(), w.len())?;
  let mut eval = Evaluator::new(f);
  eval.forward(0, x)?;

  let mut hes = DMatrix::zeros(n, n);
  let mut dir = vec![0.0; n];
  for j in 0..n {
    dir[j] = 1.0;
    eval.forward(1, &dir)?;
    dir[j] = 0.0;
    let dw = eval.reverse(2, w)?;
    for i in 0..n {
      hes[(i, j)] = dw[i * 2];
    }
  }
  Ok(hes)
}

#[cfg(test)]
mod tests {
  use approx::assert_relative_eq;
  use nalgebra::{dmatrix, dvector};

  use lib_adtape_core::{Error, Tape};

  use super::*;

  /// `[x0 * x1, x0 + sin(x1), exp(x0)]`
  fn tall() -> Function {
    Tape::new()
      .scope(|guard| {
        let x = guard.independent(&[0.0, 0.0]);
        let y = [x[0] * x[1], x[0] + x[1].sin(), x[0].exp()];
        guard.lock().seal(&y)
      })
      .unwrap()
  }

  /// `x0^2 x1 + x1 x2^3`
  fn wide() -> Function {
    Tape::new()
      .scope(|guard| {
        let x = guard.independent(&[0.0, 0.0, 0.0]);
        let y = x[0] * x[0] * x[1] + x[1] * x[2].powi(3);
        guard.lock().seal(&[y])
      })
      .unwrap()
  }

  mod jacobian {
    use super::*;

    #[test]
    fn forward_columns() {
      let jac = jacobian(&tall(), &[2.0, 0.5]).unwrap();
      let want = dmatrix![
        0.5, 2.0;
        1.0, 0.5f64.cos();
        2.0f64.exp(), 0.0
      ];
      assert_relative_eq!(jac, want, epsilon = 1e-14);
    }

    #[test]
    fn reverse_rows() {
      let jac = jacobian(&wide(), &[1.0, 2.0, 3.0]).unwrap();
      assert_eq!(jac.shape(), (1, 3));
      assert_relative_eq!(jac, dmatrix![4.0, 28.0, 54.0], epsilon = 1e-12);
    }

    #[test]
    fn wrong_input() {
      assert!(matches!(
        jacobian(&tall(), &[1.0]),
        Err(Error::DimensionMismatch { .. })
      ));
    }
  }

  mod gradient {
    use super::*;

    #[test]
    fn scalar() {
      let grad = gradient(&wide(), &[1.0, 2.0, 3.0]).unwrap();
      assert_relative_eq!(grad, dvector![4.0, 28.0, 54.0], epsilon = 1e-12);
    }

    #[test]
    fn vector_valued_is_rejected() {
      assert!(matches!(
        gradient(&tall(), &[1.0, 1.0]),
        Err(Error::DimensionMismatch { expected: 1, got: 3, .. })
      ));
    }
  }

  mod hessian {
    use super::*;

    #[test]
    fn scalar() {
      let hes = hessian(&wide(), &[1.0, 2.0, 3.0], &[1.0]).unwrap();
      // [2 x1, 2 x0, 0; 2 x0, 0, 3 x2^2; 0, 3 x2^2, 6 x1 x2]
      let want = dmatrix![
        4.0, 2.0, 0.0;
        2.0, 0.0, 27.0;
        0.0, 27.0, 36.0
      ];
      assert_relative_eq!(hes, want, epsilon = 1e-12);
    }

    #[test]
    fn weighted_sum() {
      let x = [2.0, 0.5];
      let hes = hessian(&tall(), &x, &[1.0, 2.0, -1.0]).unwrap();
      let want = dmatrix![
        -(2.0f64.exp()), 1.0;
        1.0, -2.0 * 0.5f64.sin()
      ];
      assert_relative_eq!(hes, want, epsilon = 1e-12);
      assert_relative_eq!(hes, hes.transpose(), epsilon = 1e-14);
    }

    #[test]
    fn wrong_weights() {
      assert!(hessian(&tall(), &[1.0, 1.0], &[1.0]).is_err());
    }
  }
}
