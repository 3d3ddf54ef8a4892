use smallvec::{smallvec, SmallVec};

use lib_adtape_core::{ensure_len, Arg, Error, Function, OpCode, Result, VarIndex};

use crate::forward::forward_op;
use crate::reverse::reverse_op;
use crate::table::{Coef, TaylorTable};

/// Scratch space for operand partials, most sweeps stay well below 4 orders
type Partials = SmallVec<[f64; 4]>;

/// Replays a [`Function`] with its own value table.
///
/// An evaluator only borrows the function, so any number of them can work on
/// the same function at once (one per thread, say). Forward sweeps fill the
/// table order by order; reverse sweeps read it and leave it untouched.
#[derive(Debug, Clone)]
pub struct Evaluator<'f> {
  function: &'f Function,
  taylor: TaylorTable,
  num_order: usize,
  compare_change: usize,
}

impl<'f> Evaluator<'f> {
  pub fn new(function: &'f Function) -> Self {
    Self {
      function,
      taylor: TaylorTable::new(function.num_var(), 1),
      num_order: 0,
      compare_change: 0,
    }
  }

  #[inline]
  pub fn function(&self) -> &'f Function {
    self.function
  }

  /// Number of Taylor orders currently held for every variable
  #[inline]
  pub fn num_order(&self) -> usize {
    self.num_order
  }

  /// Number of orders the value table has room for
  #[inline]
  pub fn capacity_order(&self) -> usize {
    self.taylor.cap()
  }

  /// Number of recorded comparisons whose outcome differed from the recording
  /// during the last order zero sweep; when non zero, the tape may no longer
  /// represent the function at that point
  #[inline]
  pub fn compare_change(&self) -> usize {
    self.compare_change
  }

  /// Order `k` Taylor coefficient of a variable, if it has been computed
  pub fn taylor(&self, var: VarIndex, k: usize) -> Option<f64> {
    (var < self.function.num_var() && k < self.num_order).then(|| self.taylor.get(var, k))
  }

  /// Resize the value table to hold `cap` orders, dropping any computed order
  /// that no longer fits
  pub fn set_capacity_order(&mut self, cap: usize) {
    if cap == self.taylor.cap() {
      return;
    }
    self
      .taylor
      .resize(self.function.num_var(), cap, self.num_order);
    self.num_order = self.num_order.min(cap);
  }

  /// Forward sweep.
  ///
  /// With `xq.len() == n`, computes order `q` from the orders below it, which
  /// must already be available; `xq[j]` is the order `q` coefficient of input
  /// `j`. With `xq.len() == n * (q + 1)`, computes every order up to `q`;
  /// `xq[j * (q + 1) + k]` is the order `k` coefficient of input `j`.
  ///
  /// The result uses the same layout for the range.
  pub fn forward(&mut self, q: usize, xq: &[f64]) -> Result<Vec<f64>> {
    let f = self.function;
    let n = f.domain();
    let m = f.range();
    let (p, stride) = if xq.len() == n {
      if q > self.num_order {
        return Err(Error::OrderNotAvailable {
          requested: q,
          available: self.num_order,
        });
      }
      (q, 1)
    } else {
      let expected = q.checked_add(1).and_then(|orders| orders.checked_mul(n));
      ensure_len("forward xq", expected.unwrap_or(usize::MAX), xq.len())?;
      (0, q + 1)
    };
    tracing::trace!(p, q, vars = f.num_var(), "forward sweep");

    if self.taylor.cap() < q + 1 {
      self.set_capacity_order(q + 1);
    }

    for (j, &x) in f.independents().iter().enumerate() {
      for k in p..=q {
        self.taylor.set(x, k, xq[j * stride + k - p]);
      }
    }

    let parameters = f.parameters();
    let mut compare_change = 0;
    for record in f.records() {
      match record.op {
        OpCode::Inv => {}
        OpCode::Compare { cmp, outcome } => {
          if p == 0 {
            let left = self.coef(record.args[0]).at(0);
            let right = self.coef(record.args[1]).at(0);
            if cmp.eval(left, right) != outcome {
              compare_change += 1;
            }
          }
        }
        _ => {
          for k in p..=q {
            forward_op(record, k, &mut self.taylor, parameters);
          }
        }
      }
    }
    if p == 0 {
      if compare_change > 0 {
        tracing::debug!(compare_change, "comparison outcomes changed since recording");
      }
      self.compare_change = compare_change;
    }
    self.num_order = q + 1;

    let mut yq = vec![0.0; m * stride];
    for (i, &y) in f.dependents().iter().enumerate() {
      for k in p..=q {
        yq[i * stride + k - p] = self.taylor.get(y, k);
      }
    }

    if f.config().check_for_nan && !xq.iter().any(|x| x.is_nan()) {
      if let Some(pos) = yq.iter().position(|y| y.is_nan()) {
        return Err(Error::NanResult {
          index: f.dependents()[pos / stride],
          order: p + pos % stride,
        });
      }
    }
    Ok(yq)
  }

  /// Reverse sweep of order `q`, needs `num_order() >= q`.
  ///
  /// With `w.len() == m` the weight function is
  /// `W(u) = sum_i w[i] * y_i^(q-1)(u)`; with `w.len() == m * q` it is
  /// `W(u) = sum_i sum_k w[i * q + k] * y_i^(k)(u)`. The result `dw` has
  /// `dw[j * q + k]` equal to the partial of `W` with respect to the order `k`
  /// coefficient of input `j`.
  pub fn reverse(&self, q: usize, w: &[f64]) -> Result<Vec<f64>> {
    if q == 0 {
      return Err(Error::ZeroOrder);
    }
    if q > self.num_order {
      return Err(Error::OrderNotAvailable {
        requested: q,
        available: self.num_order,
      });
    }
    let f = self.function;
    let m = f.range();
    let per_order = w.len() == m * q && q > 1;
    if !per_order {
      ensure_len("reverse w", m, w.len())?;
    }
    tracing::trace!(q, vars = f.num_var(), "reverse sweep");

    let mut partial = vec![0.0; f.num_var() * q];
    for (i, &y) in f.dependents().iter().enumerate() {
      if per_order {
        for k in 0..q {
          partial[y * q + k] += w[i * q + k];
        }
      } else {
        partial[y * q + q - 1] += w[i];
      }
    }

    let d = q - 1;
    for record in f.records().iter().rev() {
      let results = record.op.num_results();
      if results == 0 || record.op == OpCode::Inv {
        continue;
      }
      let (lo, hi) = partial.split_at_mut(record.result * q);
      let (pz, rest) = hi.split_at_mut(q);
      // an op whose results do not reach the range has nothing to propagate,
      // skipping it also keeps nan from unused branches out of the partials
      let pb: &mut [f64] = if results == 2 { &mut rest[..q] } else { &mut [] };
      if pz.iter().chain(pb.iter()).all(|p| *p == 0.0) {
        continue;
      }

      if let OpCode::CondExp(cmp) = record.op {
        let left = self.coef(record.args[0]).at(0);
        let right = self.coef(record.args[1]).at(0);
        let branch = if cmp.eval(left, right) {
          record.args[2]
        } else {
          record.args[3]
        };
        if let Arg::Var(index) = branch {
          for k in 0..q {
            lo[index * q + k] += pz[k];
          }
        }
        continue;
      }

      let x = self.coef(record.args[0]);
      let y = match record.args.get(1) {
        Some(&arg) => self.coef(arg),
        None => Coef::Par(0.0),
      };
      let z = self.taylor.row(record.result);
      let b: &[f64] = if results == 2 {
        self.taylor.row(record.aux())
      } else {
        &[]
      };
      let mut px: Partials = smallvec![0.0; q];
      let mut py: Partials = smallvec![0.0; q];
      reverse_op(record, d, x, y, z, b, pz, pb, &mut px, &mut py);

      for (arg, buf) in record.args.iter().zip([&px, &py]) {
        if let Arg::Var(index) = *arg {
          for k in 0..q {
            lo[index * q + k] += buf[k];
          }
        }
      }
    }

    let n = f.domain();
    let mut dw = vec![0.0; n * q];
    for (j, &x) in f.independents().iter().enumerate() {
      dw[j * q..(j + 1) * q].copy_from_slice(&partial[x * q..(x + 1) * q]);
    }
    Ok(dw)
  }

  #[inline]
  fn coef(&self, arg: Arg) -> Coef<'_> {
    match arg {
      Arg::Var(index) => Coef::Var(self.taylor.row(index)),
      Arg::Par(index) => Coef::Par(self.function.parameters()[index]),
    }
  }
}
