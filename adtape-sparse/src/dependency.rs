use lib_adtape_core::{OpCode, Record, VarIndex};

/// How the results of an op depend on its variable operands, as far as the
/// sparsity sweeps care
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Dependency {
  /// no variable operands: independents, promoted parameters, comparisons
  Nothing,
  /// first derivatives are constant
  Linear,
  /// `x * y`, only the mixed second derivative is non zero
  Product,
  /// `x / y`, second derivatives in `(x, y)` and `(y, y)`
  Quotient,
  /// any other unary function
  Nonlinear,
  /// conditional expression, depends linearly on whichever branch is chosen
  Select,
}

pub(crate) fn dependency(op: OpCode) -> Dependency {
  match op {
    OpCode::Inv | OpCode::Par | OpCode::Compare { .. } => Dependency::Nothing,
    // abs is piecewise linear, its second derivative is zero almost everywhere
    OpCode::Add | OpCode::Sub | OpCode::Neg | OpCode::Abs => Dependency::Linear,
    OpCode::Mul => Dependency::Product,
    OpCode::Div => Dependency::Quotient,
    OpCode::CondExp(_) => Dependency::Select,
    OpCode::Sqrt
    | OpCode::Exp
    | OpCode::Ln
    | OpCode::Sin
    | OpCode::Cos
    | OpCode::Sinh
    | OpCode::Cosh
    | OpCode::Tan
    | OpCode::Tanh
    | OpCode::Atan
    | OpCode::Asin
    | OpCode::Acos
    | OpCode::Asinh => Dependency::Nonlinear,
  }
}

/// Variable operands the results of `record` depend on; the compared values
/// of a conditional expression only pick a branch and are left out
pub(crate) fn operands(record: &Record) -> impl Iterator<Item = VarIndex> + '_ {
  let args = match record.op {
    OpCode::CondExp(_) => &record.args[2..],
    _ => &record.args[..],
  };
  args.iter().filter_map(|arg| arg.var())
}
