//! Adjoints of the Taylor recurrences in `forward`.
//!
//! Partials are stored `q` per variable; `pz`/`pb` are the partials of a
//! record's primary and auxiliary results and are consumed in place (every
//! use of a result has already been swept when its record is reached).
//! Operand partials are accumulated into scratch buffers `px`/`py` so that
//! records like `x * x` need no special casing.

use lib_adtape_core::{OpCode, Record};

use crate::forward::{inverse_signs, sign};
use crate::table::Coef;

/// Run the adjoint of `record` for orders `0..=d`
#[allow(clippy::too_many_arguments)]
pub(crate) fn reverse_op(
  record: &Record,
  d: usize,
  x: Coef<'_>,
  y: Coef<'_>,
  z: &[f64],
  b: &[f64],
  pz: &mut [f64],
  pb: &mut [f64],
  px: &mut [f64],
  py: &mut [f64],
) {
  match record.op {
    OpCode::Inv | OpCode::Par | OpCode::Compare { .. } | OpCode::CondExp(_) => {}
    OpCode::Add => {
      for k in 0..=d {
        px[k] += pz[k];
        py[k] += pz[k];
      }
    }
    OpCode::Sub => {
      for k in 0..=d {
        px[k] += pz[k];
        py[k] -= pz[k];
      }
    }
    OpCode::Neg => {
      for k in 0..=d {
        px[k] -= pz[k];
      }
    }
    OpCode::Abs => {
      let s = sign(x.at(0));
      for k in 0..=d {
        px[k] += s * pz[k];
      }
    }
    OpCode::Mul => {
      for k in 0..=d {
        for j in 0..=k {
          px[j] += pz[k] * y.at(k - j);
          py[k - j] += pz[k] * x.at(j);
        }
      }
    }
    OpCode::Div => {
      let y0 = y.at(0);
      for j in (0..=d).rev() {
        pz[j] /= y0;
        px[j] += pz[j];
        for k in 1..=j {
          pz[j - k] -= pz[j] * y.at(k);
          py[k] -= pz[j] * z[j - k];
        }
        py[0] -= pz[j] * z[j];
      }
    }
    OpCode::Sqrt => {
      for j in (1..=d).rev() {
        pz[j] /= z[0];
        pz[0] -= pz[j] * z[j];
        px[j] += pz[j] / 2.0;
        for k in 1..j {
          pz[k] -= pz[j] * z[j - k];
        }
      }
      px[0] += pz[0] / (2.0 * z[0]);
    }
    OpCode::Exp => {
      for j in (1..=d).rev() {
        pz[j] /= j as f64;
        for k in 1..=j {
          px[k] += pz[j] * k as f64 * z[j - k];
          pz[j - k] += pz[j] * k as f64 * x.at(k);
        }
      }
      px[0] += pz[0] * z[0];
    }
    OpCode::Ln => {
      let x0 = x.at(0);
      for j in (1..=d).rev() {
        pz[j] /= x0;
        px[0] -= pz[j] * z[j];
        px[j] += pz[j];
        pz[j] /= j as f64;
        for k in 1..j {
          pz[k] -= pz[j] * k as f64 * x.at(j - k);
          px[j - k] -= pz[j] * k as f64 * z[k];
        }
      }
      px[0] += pz[0] / x0;
    }
    OpCode::Sin => reverse_sin_cos(d, x, z, b, pz, pb, px),
    OpCode::Cos => reverse_sin_cos(d, x, b, z, pb, pz, px),
    OpCode::Sinh => reverse_sinh_cosh(d, x, z, b, pz, pb, px),
    OpCode::Cosh => reverse_sinh_cosh(d, x, b, z, pb, pz, px),
    OpCode::Tan => reverse_tan(d, 1.0, x, z, b, pz, pb, px),
    OpCode::Tanh => reverse_tan(d, -1.0, x, z, b, pz, pb, px),
    OpCode::Atan => {
      let x0 = x.at(0);
      for j in (1..=d).rev() {
        pz[j] /= b[0];
        pb[j] *= 2.0;
        pb[0] -= pz[j] * z[j];
        px[j] += pz[j] + pb[j] * x0;
        px[0] += pb[j] * x.at(j);
        pz[j] /= j as f64;
        for k in 1..j {
          pb[j - k] -= pz[j] * k as f64 * z[k];
          pz[k] -= pz[j] * k as f64 * b[j - k];
          px[k] += pb[j] * x.at(j - k);
        }
      }
      px[0] += pz[0] / b[0] + pb[0] * 2.0 * x0;
    }
    OpCode::Asin | OpCode::Acos | OpCode::Asinh => {
      let (s, c) = inverse_signs(record.op);
      let x0 = x.at(0);
      for j in (1..=d).rev() {
        pb[j] /= b[0];
        pz[j] /= b[0];
        pb[0] -= pz[j] * z[j] + pb[j] * b[j];
        px[0] += c * pb[j] * x.at(j);
        px[j] += s * pz[j] + c * pb[j] * x0;
        pz[j] /= j as f64;
        for k in 1..j {
          pb[j - k] -= k as f64 * pz[j] * z[k] + pb[j] * b[k];
          px[k] += c * pb[j] * x.at(j - k);
          pz[k] -= pz[j] * k as f64 * b[j - k];
        }
      }
      px[0] += (s * pz[0] + c * pb[0] * x0) / b[0];
    }
  }
}

/// `s' = c x'`, `c' = -s x'`
fn reverse_sin_cos(
  d: usize,
  x: Coef<'_>,
  s: &[f64],
  c: &[f64],
  ps: &mut [f64],
  pc: &mut [f64],
  px: &mut [f64],
) {
  for j in (1..=d).rev() {
    ps[j] /= j as f64;
    pc[j] /= j as f64;
    for k in 1..=j {
      let kf = k as f64;
      px[k] += ps[j] * kf * c[j - k] - pc[j] * kf * s[j - k];
      ps[j - k] -= pc[j] * kf * x.at(k);
      pc[j - k] += ps[j] * kf * x.at(k);
    }
  }
  px[0] += ps[0] * c[0] - pc[0] * s[0];
}

/// `s' = c x'`, `c' = s x'`
fn reverse_sinh_cosh(
  d: usize,
  x: Coef<'_>,
  s: &[f64],
  c: &[f64],
  ps: &mut [f64],
  pc: &mut [f64],
  px: &mut [f64],
) {
  for j in (1..=d).rev() {
    ps[j] /= j as f64;
    pc[j] /= j as f64;
    for k in 1..=j {
      let kf = k as f64;
      px[k] += ps[j] * kf * c[j - k] + pc[j] * kf * s[j - k];
      ps[j - k] += pc[j] * kf * x.at(k);
      pc[j - k] += ps[j] * kf * x.at(k);
    }
  }
  px[0] += ps[0] * c[0] + pc[0] * s[0];
}

/// `z' = (1 + s y) x'` with `y = z^2`; `s` is `1` for tan and `-1` for tanh
#[allow(clippy::too_many_arguments)]
fn reverse_tan(
  d: usize,
  s: f64,
  x: Coef<'_>,
  z: &[f64],
  y: &[f64],
  pz: &mut [f64],
  py: &mut [f64],
  px: &mut [f64],
) {
  for j in (1..=d).rev() {
    px[j] += pz[j];
    pz[j] /= j as f64;
    for k in 1..=j {
      let kf = k as f64;
      px[k] += s * pz[j] * y[j - k] * kf;
      py[j - k] += s * pz[j] * x.at(k) * kf;
    }
    for k in 0..j {
      pz[k] += py[j - 1] * z[j - k - 1] * 2.0;
    }
  }
  px[0] += pz[0] * (1.0 + s * y[0]);
}
