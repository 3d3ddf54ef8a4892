//!
//! # adtape-sweep
//!
//! Numeric replays of a recorded [`Function`]: forward sweeps propagate
//! Taylor coefficients of any order from the domain to the range, reverse
//! sweeps propagate partials of a weighted sum of those coefficients back to
//! the domain.
//!
//! ```
//! use lib_adtape_core::Tape;
//! use lib_adtape_sweep::FunctionExt;
//!
//! # fn main() -> lib_adtape_core::Result<()> {
//! let f = Tape::new().scope(|guard| {
//!   let x = guard.var(0.5);
//!   guard.lock().seal(&[x.exp()])
//! })?;
//! let mut eval = f.evaluator();
//! let y = eval.forward(0, &[1.0])?;
//! let grad = eval.reverse(1, &[1.0])?;
//! assert_eq!(y, grad);
//! # Ok(())
//! # }
//! ```
//!

mod evaluator;
mod forward;
mod reverse;
mod table;

use lib_adtape_core::{Function, Result};

pub use evaluator::Evaluator;

/// Extension trait providing sweeps directly on a [`Function`]
pub trait FunctionExt {
  /// Fresh evaluator borrowing this function
  fn evaluator(&self) -> Evaluator<'_>;

  /// Value of the function at `x`
  fn eval(&self, x: &[f64]) -> Result<Vec<f64>>;

  /// `w^T F'(x)`, one forward and one reverse sweep
  fn vjp(&self, x: &[f64], w: &[f64]) -> Result<Vec<f64>>;

  /// `F'(x) v`, a first order forward sweep
  fn jvp(&self, x: &[f64], v: &[f64]) -> Result<Vec<f64>>;
}

impl FunctionExt for Function {
  #[inline]
  fn evaluator(&self) -> Evaluator<'_> {
    Evaluator::new(self)
  }

  fn eval(&self, x: &[f64]) -> Result<Vec<f64>> {
    self.evaluator().forward(0, x)
  }

  fn vjp(&self, x: &[f64], w: &[f64]) -> Result<Vec<f64>> {
    let mut eval = self.evaluator();
    eval.forward(0, x)?;
    eval.reverse(1, w)
  }

  fn jvp(&self, x: &[f64], v: &[f64]) -> Result<Vec<f64>> {
    let mut eval = self.evaluator();
    eval.forward(0, x)?;
    eval.forward(1, v)
  }
}

#[cfg(test)]
mod tests {
  use lib_adtape_core::{Error, Tape};

  use super::*;

  fn hypot() -> Function {
    Tape::new()
      .scope(|guard| {
        let x = guard.independent(&[3.0, 4.0]);
        let r = (x[0] * x[0] + x[1] * x[1]).sqrt();
        guard.lock().seal(&[r])
      })
      .unwrap()
  }

  #[test]
  fn eval_matches_recording() {
    let f = hypot();
    assert_eq!(f.eval(&[3.0, 4.0]).unwrap(), vec![5.0]);
    assert_eq!(f.eval(&[6.0, 8.0]).unwrap(), vec![10.0]);
  }

  #[test]
  fn products() {
    let f = hypot();
    let grad = f.vjp(&[3.0, 4.0], &[1.0]).unwrap();
    approx::assert_abs_diff_eq!(grad[0], 0.6, epsilon = 1e-15);
    approx::assert_abs_diff_eq!(grad[1], 0.8, epsilon = 1e-15);
    let dir = f.jvp(&[3.0, 4.0], &[1.0, 1.0]).unwrap();
    approx::assert_abs_diff_eq!(dir[0], 1.4, epsilon = 1e-15);
  }

  #[test]
  fn replays_below_zero() {
    let f = Tape::new()
      .scope(|guard| {
        let x = guard.var(2.0);
        guard.lock().seal(&[x.asinh(), x.cbrt()])
      })
      .unwrap();
    for x in [-1e8, -1e4, -8.0] {
      let y = f.eval(&[x]).unwrap();
      approx::assert_relative_eq!(y[0], x.asinh(), max_relative = 1e-14);
      approx::assert_relative_eq!(y[1], x.cbrt(), max_relative = 1e-13);
    }
  }

  #[test]
  fn wrong_input_length() {
    let f = hypot();
    assert!(matches!(
      f.eval(&[1.0]),
      Err(Error::DimensionMismatch { expected: 2, got: 1, .. })
    ));
  }
}
