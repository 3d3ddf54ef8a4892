use std::fmt;

use smallvec::SmallVec;

/// Index of a variable in the value table of a recording
pub type VarIndex = usize;

/// An operand of a recorded operation, either a variable or an entry of the
/// parameter table...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arg {
  Var(VarIndex),
  Par(usize),
}

impl Arg {
  #[inline(always)]
  pub fn var(&self) -> Option<VarIndex> {
    match *self {
      Arg::Var(index) => Some(index),
      Arg::Par(_) => None,
    }
  }
}

impl fmt::Display for Arg {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Arg::Var(index) => write!(f, "v{index}"),
      Arg::Par(index) => write!(f, "p{index}"),
    }
  }
}

/// Comparison used by conditional expressions and recorded comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
  Lt,
  Le,
  Eq,
  Ge,
  Gt,
  Ne,
}

impl CompareOp {
  #[inline]
  pub fn eval(self, left: f64, right: f64) -> bool {
    match self {
      CompareOp::Lt => left < right,
      CompareOp::Le => left <= right,
      CompareOp::Eq => left == right,
      CompareOp::Ge => left >= right,
      CompareOp::Gt => left > right,
      CompareOp::Ne => left != right,
    }
  }

  fn symbol(self) -> &'static str {
    match self {
      CompareOp::Lt => "<",
      CompareOp::Le => "<=",
      CompareOp::Eq => "==",
      CompareOp::Ge => ">=",
      CompareOp::Gt => ">",
      CompareOp::Ne => "!=",
    }
  }
}

/// Elementary operations that can appear on a tape.
///
/// Every other differentiable function offered by the recorder is expressed
/// as a sequence of these; the sweeps only ever need to know about this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
  /// Independent variable, no operands
  Inv,
  /// Promote a parameter to a variable: `[par]`
  Par,
  Add,
  Sub,
  Mul,
  Div,
  Neg,
  Abs,
  Sqrt,
  Exp,
  Ln,
  /// Sine, auxiliary result is the cosine
  Sin,
  /// Cosine, auxiliary result is the sine
  Cos,
  /// Hyperbolic sine, auxiliary result is the hyperbolic cosine
  Sinh,
  /// Hyperbolic cosine, auxiliary result is the hyperbolic sine
  Cosh,
  /// Tangent, auxiliary result is its square
  Tan,
  /// Hyperbolic tangent, auxiliary result is its square
  Tanh,
  /// Arctangent, auxiliary result is `1 + x^2`
  Atan,
  /// Arcsine, auxiliary result is `sqrt(1 - x^2)`
  Asin,
  /// Arccosine, auxiliary result is `sqrt(1 - x^2)`
  Acos,
  /// Inverse hyperbolic sine, auxiliary result is `sqrt(1 + x^2)`
  Asinh,
  /// `if left cmp right { if_true } else { if_false }`: `[left, right, if_true, if_false]`
  CondExp(CompareOp),
  /// A comparison made while recording, and the outcome it had
  Compare { cmp: CompareOp, outcome: bool },
}

impl OpCode {
  /// Number of operands a record of this op carries
  pub fn num_args(&self) -> usize {
    match self {
      OpCode::Inv => 0,
      OpCode::Par => 1,
      OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div => 2,
      OpCode::Compare { .. } => 2,
      OpCode::CondExp(_) => 4,
      _ => 1,
    }
  }

  /// Number of variables a record of this op produces
  pub fn num_results(&self) -> usize {
    match self {
      OpCode::Compare { .. } => 0,
      OpCode::Sin
      | OpCode::Cos
      | OpCode::Sinh
      | OpCode::Cosh
      | OpCode::Tan
      | OpCode::Tanh
      | OpCode::Atan
      | OpCode::Asin
      | OpCode::Acos
      | OpCode::Asinh => 2,
      _ => 1,
    }
  }

  fn name(&self) -> &'static str {
    match self {
      OpCode::Inv => "inv",
      OpCode::Par => "par",
      OpCode::Add => "add",
      OpCode::Sub => "sub",
      OpCode::Mul => "mul",
      OpCode::Div => "div",
      OpCode::Neg => "neg",
      OpCode::Abs => "abs",
      OpCode::Sqrt => "sqrt",
      OpCode::Exp => "exp",
      OpCode::Ln => "ln",
      OpCode::Sin => "sin",
      OpCode::Cos => "cos",
      OpCode::Sinh => "sinh",
      OpCode::Cosh => "cosh",
      OpCode::Tan => "tan",
      OpCode::Tanh => "tanh",
      OpCode::Atan => "atan",
      OpCode::Asin => "asin",
      OpCode::Acos => "acos",
      OpCode::Asinh => "asinh",
      OpCode::CondExp(_) => "cond",
      OpCode::Compare { .. } => "cmp",
    }
  }
}

impl fmt::Display for OpCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      OpCode::CondExp(cmp) => write!(f, "cond[{}]", cmp.symbol()),
      OpCode::Compare { cmp, outcome } => write!(f, "cmp[{}]={}", cmp.symbol(), outcome),
      op => f.write_str(op.name()),
    }
  }
}

/// One entry of the tape
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
  pub op: OpCode,
  pub args: SmallVec<[Arg; 2]>,
  /// First variable produced by this record; an auxiliary result, when the op
  /// has one, lives at `result + 1`
  pub result: VarIndex,
}

impl Record {
  #[inline(always)]
  pub fn aux(&self) -> VarIndex {
    self.result + 1
  }
}

impl fmt::Display for Record {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.op.num_results() {
      0 => write!(f, "      {}", self.op)?,
      _ => write!(f, "v{:<4} = {}", self.result, self.op)?,
    }
    for arg in &self.args {
      write!(f, " {arg}")?;
    }
    Ok(())
  }
}
