use bit_set::BitSet;

use lib_adtape_core::{ensure_len, Function, Result};

use crate::dependency::{dependency, operands, Dependency};
use crate::jacobian::ForwardJacobian;
use crate::pattern::SparsityPattern;

/// Reverse Hessian sparsity.
///
/// `jac` must come from [`for_sparse_jac`](crate::for_sparse_jac) on the same
/// function with some `R` (`n x q`); `select` picks the range components
/// summed into `s^T F`. The result is the pattern of `R^T (s^T F)''(x)`
/// (`q x n`) for every `x`.
pub fn rev_sparse_hes(
  f: &Function,
  jac: &ForwardJacobian,
  select: &[bool],
) -> Result<SparsityPattern> {
  ensure_len("rev_sparse_hes select", f.range(), select.len())?;
  ensure_len("rev_sparse_hes variables", f.num_var(), jac.sets().len())?;
  let q = jac.n_cols();
  let fwd = jac.sets();
  tracing::trace!(q, vars = f.num_var(), "reverse hessian sparsity");

  // whether a variable reaches `s^T F` at all
  let mut reach = vec![false; f.num_var()];
  // columns of `R` in the second derivative of `s^T F` by each variable
  let mut hes = vec![BitSet::with_capacity(q); f.num_var()];
  for (&y, &s) in f.dependents().iter().zip(select) {
    reach[y] |= s;
  }

  for record in f.records().iter().rev() {
    let kind = dependency(record.op);
    if kind == Dependency::Nothing {
      continue;
    }
    let z = record.result;
    let results = record.op.num_results();
    let reached = reach[z..z + results].iter().any(|&r| r);
    let (lo, hi) = hes.split_at_mut(z);
    for arg in operands(record) {
      reach[arg] |= reached;
      for set in &hi[..results] {
        lo[arg].union_with(set);
      }
    }
    if !reached {
      continue;
    }

    let x = record.args.first().and_then(|arg| arg.var());
    let y = record.args.get(1).and_then(|arg| arg.var());
    match (kind, x, y) {
      (Dependency::Product, Some(x), Some(y)) => {
        lo[x].union_with(&fwd[y]);
        lo[y].union_with(&fwd[x]);
      }
      (Dependency::Quotient, x, Some(y)) => {
        if let Some(x) = x {
          lo[x].union_with(&fwd[y]);
          lo[y].union_with(&fwd[x]);
        }
        lo[y].union_with(&fwd[y]);
      }
      (Dependency::Nonlinear, Some(x), _) => lo[x].union_with(&fwd[x]),
      _ => {}
    }
  }

  let mut out = SparsityPattern::new(q, f.domain());
  for (j, &x) in f.independents().iter().enumerate() {
    for col in hes[x].iter() {
      out.insert(col, j);
    }
  }
  Ok(out)
}
