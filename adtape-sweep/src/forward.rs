//! Taylor recurrences: the order `k` coefficient of a record's results from
//! the coefficients of its operands up to order `k` and of its results below
//! order `k`.

use lib_adtape_core::{OpCode, Record};

use crate::table::{Coef, TaylorTable};

/// Sign with `sign(0) == 0`, the convention used for `abs`
#[inline(always)]
pub(crate) fn sign(x: f64) -> f64 {
  if x > 0.0 {
    1.0
  } else if x < 0.0 {
    -1.0
  } else {
    0.0
  }
}

/// Compute coefficient `k` of the results of `record`
pub(crate) fn forward_op(record: &Record, k: usize, table: &mut TaylorTable, parameters: &[f64]) {
  let cap = table.cap();
  let (lo, hi) = table.split_at(record.result);
  let arg = |i: usize| Coef::of(record.args[i], lo, cap, parameters);

  match record.op {
    // independents are seeded by the sweep, comparisons produce nothing
    OpCode::Inv | OpCode::Compare { .. } => {}
    OpCode::Par => hi[k] = arg(0).at(k),
    OpCode::Add => hi[k] = arg(0).at(k) + arg(1).at(k),
    OpCode::Sub => hi[k] = arg(0).at(k) - arg(1).at(k),
    OpCode::Neg => hi[k] = -arg(0).at(k),
    OpCode::Mul => {
      let (x, y) = (arg(0), arg(1));
      hi[k] = (0..=k).map(|j| x.at(j) * y.at(k - j)).sum();
    }
    OpCode::Div => {
      let (x, y) = (arg(0), arg(1));
      let z = &mut hi[..cap];
      let mut acc = x.at(k);
      for j in 1..=k {
        acc -= z[k - j] * y.at(j);
      }
      z[k] = acc / y.at(0);
    }
    OpCode::Abs => {
      let x = arg(0);
      hi[k] = match k {
        0 => x.at(0).abs(),
        _ => sign(x.at(0)) * x.at(k),
      };
    }
    OpCode::Sqrt => {
      let x = arg(0);
      let z = &mut hi[..cap];
      if k == 0 {
        z[0] = x.at(0).sqrt();
      } else {
        let mut acc = x.at(k);
        for j in 1..k {
          acc -= z[j] * z[k - j];
        }
        z[k] = acc / (2.0 * z[0]);
      }
    }
    OpCode::Exp => {
      let x = arg(0);
      let z = &mut hi[..cap];
      if k == 0 {
        z[0] = x.at(0).exp();
      } else {
        let acc: f64 = (1..=k).map(|j| j as f64 * x.at(j) * z[k - j]).sum();
        z[k] = acc / k as f64;
      }
    }
    OpCode::Ln => {
      let x = arg(0);
      let z = &mut hi[..cap];
      if k == 0 {
        z[0] = x.at(0).ln();
      } else {
        let acc: f64 = (1..k).map(|j| j as f64 * z[j] * x.at(k - j)).sum();
        z[k] = (x.at(k) - acc / k as f64) / x.at(0);
      }
    }
    OpCode::Sin | OpCode::Cos => {
      let x = arg(0);
      let (z, rest) = hi.split_at_mut(cap);
      let b = &mut rest[..cap];
      // keep sin in `s` and cos in `c` whichever is the primary result
      let (s, c) = match record.op {
        OpCode::Sin => (z, b),
        _ => (b, z),
      };
      if k == 0 {
        s[0] = x.at(0).sin();
        c[0] = x.at(0).cos();
      } else {
        let mut ds = 0.0;
        let mut dc = 0.0;
        for j in 1..=k {
          let jx = j as f64 * x.at(j);
          ds += jx * c[k - j];
          dc -= jx * s[k - j];
        }
        s[k] = ds / k as f64;
        c[k] = dc / k as f64;
      }
    }
    OpCode::Sinh | OpCode::Cosh => {
      let x = arg(0);
      let (z, rest) = hi.split_at_mut(cap);
      let b = &mut rest[..cap];
      let (s, c) = match record.op {
        OpCode::Sinh => (z, b),
        _ => (b, z),
      };
      if k == 0 {
        s[0] = x.at(0).sinh();
        c[0] = x.at(0).cosh();
      } else {
        let mut ds = 0.0;
        let mut dc = 0.0;
        for j in 1..=k {
          let jx = j as f64 * x.at(j);
          ds += jx * c[k - j];
          dc += jx * s[k - j];
        }
        s[k] = ds / k as f64;
        c[k] = dc / k as f64;
      }
    }
    OpCode::Tan | OpCode::Tanh => {
      // z' = (1 +- y) x' with y = z^2
      let x = arg(0);
      let (z, rest) = hi.split_at_mut(cap);
      let y = &mut rest[..cap];
      let tan = record.op == OpCode::Tan;
      if k == 0 {
        z[0] = if tan { x.at(0).tan() } else { x.at(0).tanh() };
      } else {
        let acc: f64 = (1..=k).map(|j| j as f64 * x.at(j) * y[k - j]).sum();
        let acc = acc / k as f64;
        z[k] = if tan { x.at(k) + acc } else { x.at(k) - acc };
      }
      y[k] = (0..=k).map(|j| z[j] * z[k - j]).sum();
    }
    OpCode::Atan => {
      // b = 1 + x^2, b z' = x'
      let x = arg(0);
      let (z, rest) = hi.split_at_mut(cap);
      let b = &mut rest[..cap];
      if k == 0 {
        z[0] = x.at(0).atan();
        b[0] = 1.0 + x.at(0) * x.at(0);
      } else {
        b[k] = (0..=k).map(|j| x.at(j) * x.at(k - j)).sum();
        let acc: f64 = (1..k).map(|j| j as f64 * z[j] * b[k - j]).sum();
        z[k] = (x.at(k) - acc / k as f64) / b[0];
      }
    }
    OpCode::Asin | OpCode::Acos | OpCode::Asinh => {
      // asin, acos: b = sqrt(1 - x^2), b z' = +-x'
      // asinh: b = sqrt(1 + x^2), b z' = x'
      let x = arg(0);
      let (z, rest) = hi.split_at_mut(cap);
      let b = &mut rest[..cap];
      let (s, c) = inverse_signs(record.op);
      if k == 0 {
        let x0 = x.at(0);
        z[0] = match record.op {
          OpCode::Asin => x0.asin(),
          OpCode::Acos => x0.acos(),
          _ => x0.asinh(),
        };
        b[0] = if c > 0.0 {
          x0.hypot(1.0)
        } else {
          (1.0 - x0 * x0).sqrt()
        };
      } else {
        let u: f64 = c * (0..=k).map(|j| x.at(j) * x.at(k - j)).sum::<f64>();
        let mut bk = 0.0;
        let mut zk = 0.0;
        for j in 1..k {
          bk -= j as f64 * b[j] * b[k - j];
          zk -= j as f64 * z[j] * b[k - j];
        }
        bk = bk / k as f64 + u / 2.0;
        zk = zk / k as f64 + s * x.at(k);
        b[k] = bk / b[0];
        z[k] = zk / b[0];
      }
    }
    OpCode::CondExp(cmp) => {
      let branch = if cmp.eval(arg(0).at(0), arg(1).at(0)) {
        arg(2)
      } else {
        arg(3)
      };
      hi[k] = branch.at(k);
    }
  }
}

/// Signs `(s, c)` of the arc functions with `b = sqrt(1 + c x^2)` and `b z' = s x'`
pub(crate) fn inverse_signs(op: OpCode) -> (f64, f64) {
  match op {
    OpCode::Acos => (-1.0, -1.0),
    OpCode::Asinh => (1.0, 1.0),
    _ => (1.0, -1.0),
  }
}
