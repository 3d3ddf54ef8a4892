use lib_adtape_core::{Arg, VarIndex};

/// Taylor coefficients of every variable of one evaluation, `cap` orders per
/// variable stored contiguously
#[derive(Debug, Clone, Default)]
pub(crate) struct TaylorTable {
  coef: Vec<f64>,
  cap: usize,
}

impl TaylorTable {
  pub(crate) fn new(num_var: usize, cap: usize) -> Self {
    Self {
      coef: vec![0.0; num_var * cap],
      cap,
    }
  }

  #[inline(always)]
  pub(crate) fn cap(&self) -> usize {
    self.cap
  }

  #[inline(always)]
  pub(crate) fn get(&self, var: VarIndex, k: usize) -> f64 {
    self.coef[var * self.cap + k]
  }

  #[inline(always)]
  pub(crate) fn set(&mut self, var: VarIndex, k: usize, value: f64) {
    self.coef[var * self.cap + k] = value;
  }

  #[inline(always)]
  pub(crate) fn row(&self, var: VarIndex) -> &[f64] {
    &self.coef[var * self.cap..(var + 1) * self.cap]
  }

  /// Change capacity to `cap` orders, keeping the first `keep` of each row
  pub(crate) fn resize(&mut self, num_var: usize, cap: usize, keep: usize) {
    let keep = keep.min(cap).min(self.cap);
    let mut coef = vec![0.0; num_var * cap];
    for var in 0..num_var {
      let old = &self.coef[var * self.cap..var * self.cap + keep];
      coef[var * cap..var * cap + keep].copy_from_slice(old);
    }
    self.coef = coef;
    self.cap = cap;
  }

  /// Split the table at the rows produced by a record: the returned lower part
  /// holds every operand (operands are always recorded before their result),
  /// the upper part starts at `result`
  #[inline(always)]
  pub(crate) fn split_at(&mut self, result: VarIndex) -> (&[f64], &mut [f64]) {
    let (lo, hi) = self.coef.split_at_mut(result * self.cap);
    (lo, hi)
  }
}

/// Read-only view of the coefficients of one operand; a parameter is a
/// constant so only its zero order coefficient is non-zero
#[derive(Debug, Clone, Copy)]
pub(crate) enum Coef<'a> {
  Var(&'a [f64]),
  Par(f64),
}

impl<'a> Coef<'a> {
  #[inline(always)]
  pub(crate) fn at(&self, k: usize) -> f64 {
    match *self {
      Coef::Var(row) => row[k],
      Coef::Par(value) if k == 0 => value,
      Coef::Par(_) => 0.0,
    }
  }

  /// Look up an operand in the rows below a result; `stride` is the number
  /// of coefficients per row
  #[inline(always)]
  pub(crate) fn of(arg: Arg, rows: &'a [f64], stride: usize, parameters: &[f64]) -> Self {
    match arg {
      Arg::Var(index) => Coef::Var(&rows[index * stride..(index + 1) * stride]),
      Arg::Par(index) => Coef::Par(parameters[index]),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn resize_keeps_lower_orders() {
    let mut table = TaylorTable::new(2, 2);
    table.set(0, 0, 1.0);
    table.set(0, 1, 2.0);
    table.set(1, 0, 3.0);
    table.set(1, 1, 4.0);
    table.resize(2, 4, 2);
    assert_eq!(table.cap(), 4);
    assert_eq!(table.row(0), &[1.0, 2.0, 0.0, 0.0]);
    assert_eq!(table.row(1), &[3.0, 4.0, 0.0, 0.0]);
    table.resize(2, 1, 2);
    assert_eq!(table.row(1), &[3.0]);
  }

  #[test]
  fn parameter_coefficients() {
    let par = Coef::Par(2.5);
    assert_eq!(par.at(0), 2.5);
    assert_eq!(par.at(3), 0.0);
    let rows = [1.0, 2.0, 3.0, 4.0];
    let var = Coef::of(Arg::Var(1), &rows, 2, &[]);
    assert_eq!(var.at(1), 4.0);
  }
}
