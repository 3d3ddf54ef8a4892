use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::ptr;

use smallvec::{smallvec, SmallVec};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::function::Function;
use crate::op::{Arg, CompareOp, OpCode, Record, VarIndex};

#[derive(Default)]
struct RecordingInner {
  records: Vec<Record>,
  parameters: Vec<f64>,
  /// zero order value of every variable, indexed like the value table
  values: Vec<f64>,
  independents: Vec<VarIndex>,
}

/// The append-only state behind a recording scope; everything goes through a
/// `RefCell` since many `Var`s share it by reference
struct Recording {
  inner: RefCell<RecordingInner>,
  config: Config,
}

impl Recording {
  fn new(config: Config) -> Self {
    let inner = RecordingInner {
      records: Vec::with_capacity(config.record_capacity),
      values: Vec::with_capacity(config.record_capacity),
      ..Default::default()
    };
    Self {
      inner: RefCell::new(inner),
      config,
    }
  }

  /// Append a record; `values` holds the zero order value of each result
  #[inline]
  fn push(&self, op: OpCode, args: SmallVec<[Arg; 2]>, values: &[f64]) -> VarIndex {
    debug_assert_eq!(op.num_args(), args.len());
    debug_assert_eq!(op.num_results(), values.len());
    let mut inner = self.inner.borrow_mut();
    let result = inner.values.len();
    inner.values.extend_from_slice(values);
    inner.records.push(Record { op, args, result });
    result
  }

  #[inline]
  fn parameter(&self, value: f64) -> Arg {
    let mut inner = self.inner.borrow_mut();
    let index = inner.parameters.len();
    inner.parameters.push(value);
    Arg::Par(index)
  }

  fn independent(&self, value: f64) -> VarIndex {
    let index = self.push(OpCode::Inv, SmallVec::new(), &[value]);
    self.inner.borrow_mut().independents.push(index);
    index
  }

  fn clear(&self) {
    let mut inner = self.inner.borrow_mut();
    inner.records.clear();
    inner.parameters.clear();
    inner.values.clear();
    inner.independents.clear();
  }

  fn seal(&self, dependents: &[Var<'_>]) -> Result<Function> {
    let inner = self.inner.borrow();
    if inner.independents.is_empty() {
      return Err(Error::NoIndependents);
    }
    if dependents.is_empty() {
      return Err(Error::NoDependents);
    }
    let mut deps = Vec::with_capacity(dependents.len());
    for (index, var) in dependents.iter().enumerate() {
      if !ptr::eq(var.recording, self) {
        return Err(Error::ForeignVariable { index });
      }
      deps.push(var.index);
    }
    tracing::debug!(
      n = inner.independents.len(),
      m = deps.len(),
      vars = inner.values.len(),
      records = inner.records.len(),
      "sealed recording"
    );
    Ok(Function::new(
      inner.records.clone(),
      inner.parameters.clone(),
      inner.independents.clone(),
      deps,
      inner.values.clone(),
      self.config,
    ))
  }
}

/// Clears the recording once a scope is left, however it is left
struct ScopeGuard<'tape> {
  recording: &'tape Recording,
}

impl Drop for ScopeGuard<'_> {
  fn drop(&mut self) {
    self.recording.clear();
  }
}

/// A `Tape` records the operations performed on `Var`s inside a scope into a
/// Wengert list, which is sealed into an immutable [`Function`]...
///
/// The tape itself is reusable, every scope starts from an empty recording.
pub struct Tape {
  recording: Recording,
}

impl Tape {
  pub fn new() -> Self {
    Self::with_config(Config::default())
  }

  pub fn with_config(config: Config) -> Self {
    Self {
      recording: Recording::new(config),
    }
  }

  #[inline]
  pub fn config(&self) -> &Config {
    &self.recording.config
  }

  /// Open a recording scope; variables created in it cannot escape it, only
  /// sealed functions can
  pub fn scope<G, R>(&mut self, f: G) -> R
  where
    G: for<'scope> FnOnce(Guard<'scope, Unlocked>) -> R,
  {
    let _scope = ScopeGuard {
      recording: &self.recording,
    };
    self.recording.clear();
    f(Guard {
      recording: &self.recording,
      phantom: PhantomData,
    })
  }
}

impl Default for Tape {
  fn default() -> Self {
    Self::new()
  }
}

/// Phantom type for a locked guard; a locked guard can no longer declare
/// variables, it can only be sealed into a function
pub struct Locked;

/// Phantom type for an unlocked guard, something we CAN create variables on...
pub struct Unlocked;

/// An unlocked `Guard` declares independent variables and constants for a
/// specific scope, once locked it can seal the recording
pub struct Guard<'scope, S = Unlocked> {
  recording: &'scope Recording,
  phantom: PhantomData<S>,
}

impl<'scope> Guard<'scope, Unlocked> {
  /// Declare a single independent variable
  #[inline]
  pub fn var(&self, value: f64) -> Var<'scope> {
    Var {
      value,
      index: self.recording.independent(value),
      recording: self.recording,
    }
  }

  /// Declare independent variables, in domain order
  pub fn independent(&self, values: &[f64]) -> Vec<Var<'scope>> {
    values.iter().map(|&value| self.var(value)).collect()
  }

  /// A constant that lives on the tape as a variable, so it can be used as a
  /// dependent
  pub fn constant(&self, value: f64) -> Var<'scope> {
    let arg = self.recording.parameter(value);
    Var {
      value,
      index: self.recording.push(OpCode::Par, smallvec![arg], &[value]),
      recording: self.recording,
    }
  }

  /// Record `if left cmp right { if_true } else { if_false }` such that the
  /// branch is chosen again on every replay
  pub fn cond_exp<L, R, T, F>(
    &self,
    cmp: CompareOp,
    left: L,
    right: R,
    if_true: T,
    if_false: F,
  ) -> Var<'scope>
  where
    L: Into<Operand<'scope>>,
    R: Into<Operand<'scope>>,
    T: Into<Operand<'scope>>,
    F: Into<Operand<'scope>>,
  {
    let (left, right) = (left.into(), right.into());
    let (if_true, if_false) = (if_true.into(), if_false.into());
    let value = if cmp.eval(left.value(), right.value()) {
      if_true.value()
    } else {
      if_false.value()
    };
    let rec = self.recording;
    let args = smallvec![left.arg(rec), right.arg(rec), if_true.arg(rec), if_false.arg(rec)];
    Var {
      value,
      index: rec.push(OpCode::CondExp(cmp), args, &[value]),
      recording: rec,
    }
  }

  /// Lock a guard...
  ///
  /// Consume an unlocked guard and produce a locked guard with same lifetimes
  #[inline]
  pub fn lock(self) -> Guard<'scope, Locked> {
    Guard {
      recording: self.recording,
      phantom: PhantomData,
    }
  }
}

impl<'scope> Guard<'scope, Locked> {
  /// Seal the recording into a function whose range is `dependents`, in order
  pub fn seal(self, dependents: &[Var<'scope>]) -> Result<Function> {
    self.recording.seal(dependents)
  }
}

/// A tracked value; every operation on it is appended to the recording of the
/// scope it was created in
#[derive(Clone, Copy)]
pub struct Var<'scope> {
  value: f64,
  index: VarIndex,
  recording: &'scope Recording,
}

/// Either side of a recorded operation, a tracked variable or a plain constant
#[derive(Debug, Clone, Copy)]
pub enum Operand<'scope> {
  Var(Var<'scope>),
  Const(f64),
}

impl<'scope> Operand<'scope> {
  #[inline]
  pub fn value(&self) -> f64 {
    match self {
      Operand::Var(var) => var.value,
      Operand::Const(value) => *value,
    }
  }

  #[inline]
  fn arg(&self, recording: &Recording) -> Arg {
    match self {
      Operand::Var(var) => {
        assert!(
          ptr::eq(var.recording, recording),
          "variables from different recordings cannot be mixed"
        );
        Arg::Var(var.index)
      }
      Operand::Const(value) => recording.parameter(*value),
    }
  }
}

impl<'scope> From<Var<'scope>> for Operand<'scope> {
  fn from(var: Var<'scope>) -> Self {
    Operand::Var(var)
  }
}

impl<'scope> From<&Var<'scope>> for Operand<'scope> {
  fn from(var: &Var<'scope>) -> Self {
    Operand::Var(*var)
  }
}

impl From<f64> for Operand<'_> {
  fn from(value: f64) -> Self {
    Operand::Const(value)
  }
}

#[inline]
fn eval_binary(op: OpCode, a: f64, b: f64) -> f64 {
  match op {
    OpCode::Add => a + b,
    OpCode::Sub => a - b,
    OpCode::Mul => a * b,
    OpCode::Div => a / b,
    _ => unreachable!("{op} is not a binary arithmetic op"),
  }
}

impl<'scope> Var<'scope> {
  /// Get the value this variable had while recording
  #[inline(always)]
  pub fn value(&self) -> f64 {
    self.value
  }

  /// Position of this variable in the value table
  #[inline(always)]
  pub fn index(&self) -> VarIndex {
    self.index
  }

  #[inline]
  fn unary(&self, op: OpCode, values: &[f64]) -> Self {
    let index = self
      .recording
      .push(op, smallvec![Arg::Var(self.index)], values);
    Self {
      value: values[0],
      index,
      recording: self.recording,
    }
  }

  /// Record `self op other`, or `other op self` when `swapped`
  #[inline]
  fn arith(self, op: OpCode, other: Operand<'scope>, swapped: bool) -> Self {
    let rec = self.recording;
    let this = Arg::Var(self.index);
    let that = other.arg(rec);
    let (args, value) = if swapped {
      (smallvec![that, this], eval_binary(op, other.value(), self.value))
    } else {
      (smallvec![this, that], eval_binary(op, self.value, other.value()))
    };
    Self {
      value,
      index: rec.push(op, args, &[value]),
      recording: rec,
    }
  }

  fn constant(&self, value: f64) -> Self {
    let arg = self.recording.parameter(value);
    Self {
      value,
      index: self.recording.push(OpCode::Par, smallvec![arg], &[value]),
      recording: self.recording,
    }
  }

  fn compare(&self, cmp: CompareOp, other: Operand<'scope>) -> bool {
    let outcome = cmp.eval(self.value, other.value());
    let args = smallvec![Arg::Var(self.index), other.arg(self.recording)];
    self
      .recording
      .push(OpCode::Compare { cmp, outcome }, args, &[]);
    outcome
  }

  pub fn lt(&self, other: impl Into<Operand<'scope>>) -> bool {
    self.compare(CompareOp::Lt, other.into())
  }

  pub fn le(&self, other: impl Into<Operand<'scope>>) -> bool {
    self.compare(CompareOp::Le, other.into())
  }

  pub fn gt(&self, other: impl Into<Operand<'scope>>) -> bool {
    self.compare(CompareOp::Gt, other.into())
  }

  pub fn ge(&self, other: impl Into<Operand<'scope>>) -> bool {
    self.compare(CompareOp::Ge, other.into())
  }

  pub fn eq(&self, other: impl Into<Operand<'scope>>) -> bool {
    self.compare(CompareOp::Eq, other.into())
  }

  pub fn ne(&self, other: impl Into<Operand<'scope>>) -> bool {
    self.compare(CompareOp::Ne, other.into())
  }

  pub fn abs(&self) -> Self {
    self.unary(OpCode::Abs, &[self.value.abs()])
  }

  pub fn sqrt(&self) -> Self {
    self.unary(OpCode::Sqrt, &[self.value.sqrt()])
  }

  pub fn exp(&self) -> Self {
    self.unary(OpCode::Exp, &[self.value.exp()])
  }

  pub fn ln(&self) -> Self {
    self.unary(OpCode::Ln, &[self.value.ln()])
  }

  pub fn sin(&self) -> Self {
    let v = self.value;
    self.unary(OpCode::Sin, &[v.sin(), v.cos()])
  }

  pub fn cos(&self) -> Self {
    let v = self.value;
    self.unary(OpCode::Cos, &[v.cos(), v.sin()])
  }

  pub fn sinh(&self) -> Self {
    let v = self.value;
    self.unary(OpCode::Sinh, &[v.sinh(), v.cosh()])
  }

  pub fn cosh(&self) -> Self {
    let v = self.value;
    self.unary(OpCode::Cosh, &[v.cosh(), v.sinh()])
  }

  pub fn tan(&self) -> Self {
    let t = self.value.tan();
    self.unary(OpCode::Tan, &[t, t * t])
  }

  pub fn tanh(&self) -> Self {
    let t = self.value.tanh();
    self.unary(OpCode::Tanh, &[t, t * t])
  }

  pub fn atan(&self) -> Self {
    let v = self.value;
    self.unary(OpCode::Atan, &[v.atan(), 1.0 + v * v])
  }

  pub fn asin(&self) -> Self {
    let v = self.value;
    self.unary(OpCode::Asin, &[v.asin(), (1.0 - v * v).sqrt()])
  }

  pub fn acos(&self) -> Self {
    let v = self.value;
    self.unary(OpCode::Acos, &[v.acos(), (1.0 - v * v).sqrt()])
  }

  pub fn asinh(&self) -> Self {
    let v = self.value;
    self.unary(OpCode::Asinh, &[v.asinh(), v.hypot(1.0)])
  }

  /// `self^other` recorded as `exp(other * ln(self))`, defined for `self > 0`
  pub fn pow(&self, other: impl Into<Operand<'scope>>) -> Self {
    match other.into() {
      Operand::Const(exp) => self.powf(exp),
      Operand::Var(exp) => (self.ln() * exp).exp(),
    }
  }

  /// Integer powers are recorded as repeated multiplication, so they stay
  /// defined for negative bases
  pub fn powi(&self, n: i32) -> Self {
    if n == 0 {
      return self.constant(1.0);
    }
    let mut base = *self;
    let mut rest = n.unsigned_abs();
    let mut acc: Option<Self> = None;
    while rest > 0 {
      if rest & 1 == 1 {
        acc = Some(match acc {
          Some(acc) => acc * base,
          None => base,
        });
      }
      rest >>= 1;
      if rest > 0 {
        base = base * base;
      }
    }
    // n != 0 so at least one bit was set
    let acc = acc.unwrap_or(base);
    if n < 0 {
      acc.recip()
    } else {
      acc
    }
  }

  /// Real power; integral exponents go through `powi`, the rest through
  /// `exp(exp * ln(self))`
  pub fn powf(&self, exp: f64) -> Self {
    if exp.fract() == 0.0 && exp.abs() <= i32::MAX as f64 {
      self.powi(exp as i32)
    } else {
      (self.ln() * exp).exp()
    }
  }

  pub fn log(&self, base: f64) -> Self {
    self.ln() * base.ln().recip()
  }

  pub fn log2(&self) -> Self {
    self.log(2.0)
  }

  pub fn log10(&self) -> Self {
    self.log(10.0)
  }

  pub fn exp2(&self) -> Self {
    (*self * std::f64::consts::LN_2).exp()
  }

  /// Cube root, recorded as `self * exp(-2/3 ln|self|)`, defined for `self != 0`
  pub fn cbrt(&self) -> Self {
    *self * (self.abs().ln() * (-2.0 / 3.0)).exp()
  }

  pub fn recip(&self) -> Self {
    1.0 / *self
  }

  pub fn acosh(&self) -> Self {
    let x = *self;
    (x + (x * x - 1.0).sqrt()).ln()
  }

  pub fn atanh(&self) -> Self {
    let x = *self;
    ((1.0 + x) / (1.0 - x)).ln() * 0.5
  }
}

impl fmt::Debug for Var<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Var")
      .field("value", &self.value)
      .field("index", &self.index)
      .finish()
  }
}

impl<'scope> Neg for Var<'scope> {
  type Output = Var<'scope>;

  #[inline]
  fn neg(self) -> Self::Output {
    self.unary(OpCode::Neg, &[-self.value])
  }
}

impl<'scope> Neg for &Var<'scope> {
  type Output = Var<'scope>;

  #[inline(always)]
  fn neg(self) -> Self::Output {
    (*self).neg()
  }
}

macro_rules! binary_op {
  ($trait:ident, $method:ident, $assign_trait:ident, $assign:ident, $op:expr) => {
    impl<'scope> $trait<Var<'scope>> for Var<'scope> {
      type Output = Var<'scope>;

      #[inline(always)]
      fn $method(self, other: Var<'scope>) -> Self::Output {
        self.arith($op, Operand::Var(other), false)
      }
    }

    impl<'scope> $trait<&Var<'scope>> for Var<'scope> {
      type Output = Var<'scope>;

      #[inline(always)]
      fn $method(self, other: &Var<'scope>) -> Self::Output {
        self.arith($op, Operand::Var(*other), false)
      }
    }

    impl<'scope> $trait<Var<'scope>> for &Var<'scope> {
      type Output = Var<'scope>;

      #[inline(always)]
      fn $method(self, other: Var<'scope>) -> Self::Output {
        (*self).arith($op, Operand::Var(other), false)
      }
    }

    impl<'scope> $trait<&Var<'scope>> for &Var<'scope> {
      type Output = Var<'scope>;

      #[inline(always)]
      fn $method(self, other: &Var<'scope>) -> Self::Output {
        (*self).arith($op, Operand::Var(*other), false)
      }
    }

    impl<'scope> $trait<f64> for Var<'scope> {
      type Output = Var<'scope>;

      #[inline(always)]
      fn $method(self, other: f64) -> Self::Output {
        self.arith($op, Operand::Const(other), false)
      }
    }

    impl<'scope> $trait<f64> for &Var<'scope> {
      type Output = Var<'scope>;

      #[inline(always)]
      fn $method(self, other: f64) -> Self::Output {
        (*self).arith($op, Operand::Const(other), false)
      }
    }

    impl<'scope> $trait<Var<'scope>> for f64 {
      type Output = Var<'scope>;

      #[inline(always)]
      fn $method(self, other: Var<'scope>) -> Self::Output {
        other.arith($op, Operand::Const(self), true)
      }
    }

    impl<'scope> $trait<&Var<'scope>> for f64 {
      type Output = Var<'scope>;

      #[inline(always)]
      fn $method(self, other: &Var<'scope>) -> Self::Output {
        (*other).arith($op, Operand::Const(self), true)
      }
    }

    impl<'scope> $assign_trait<Var<'scope>> for Var<'scope> {
      #[inline(always)]
      fn $assign(&mut self, other: Var<'scope>) {
        *self = self.arith($op, Operand::Var(other), false);
      }
    }

    impl<'scope> $assign_trait<&Var<'scope>> for Var<'scope> {
      #[inline(always)]
      fn $assign(&mut self, other: &Var<'scope>) {
        *self = self.arith($op, Operand::Var(*other), false);
      }
    }

    impl<'scope> $assign_trait<f64> for Var<'scope> {
      #[inline(always)]
      fn $assign(&mut self, other: f64) {
        *self = self.arith($op, Operand::Const(other), false);
      }
    }
  };
}

binary_op!(Add, add, AddAssign, add_assign, OpCode::Add);
binary_op!(Sub, sub, SubAssign, sub_assign, OpCode::Sub);
binary_op!(Mul, mul, MulAssign, mul_assign, OpCode::Mul);
binary_op!(Div, div, DivAssign, div_assign, OpCode::Div);

#[cfg(test)]
mod tests {
  use super::*;

  mod tape {
    use super::*;

    #[test]
    fn independents_come_first_in_domain_order() {
      let mut tape = Tape::new();
      let f = tape
        .scope(|guard| {
          let x = guard.independent(&[2.0, 3.0]);
          let y = x[0] * x[1];
          guard.lock().seal(&[y])
        })
        .unwrap();
      assert_eq!(f.domain(), 2);
      assert_eq!(f.range(), 1);
      assert_eq!(f.independents(), &[0, 1]);
      assert_eq!(f.dependents(), &[2]);
      assert_eq!(f.recorded_range(), vec![6.0]);
    }

    #[test]
    fn scope_resets_recording() {
      let mut tape = Tape::new();
      let first = tape
        .scope(|guard| {
          let x = guard.var(1.0);
          let y = x.sin().exp();
          guard.lock().seal(&[y])
        })
        .unwrap();
      let second = tape
        .scope(|guard| {
          let x = guard.var(1.0);
          guard.lock().seal(&[x])
        })
        .unwrap();
      assert_eq!(first.num_records(), 3);
      assert_eq!(second.num_records(), 1);
      assert_eq!(second.num_var(), 1);
    }

    #[test]
    fn seal_errors() {
      let mut tape = Tape::new();
      let err = tape.scope(|guard| {
        let c = guard.constant(1.0);
        guard.lock().seal(&[c])
      });
      assert_eq!(err.unwrap_err(), Error::NoIndependents);
      let err = tape.scope(|guard| {
        let _x = guard.var(1.0);
        guard.lock().seal(&[])
      });
      assert_eq!(err.unwrap_err(), Error::NoDependents);
    }

    #[test]
    fn foreign_dependent() {
      let mut outer = Tape::new();
      let mut inner = Tape::new();
      outer.scope(|guard| {
        let x = guard.var(1.0);
        let err = inner.scope(|other| {
          let _y = other.var(2.0);
          other.lock().seal(&[x])
        });
        assert_eq!(err.unwrap_err(), Error::ForeignVariable { index: 0 });
      });
    }

    #[test]
    fn config_is_carried_into_function() {
      let config = Config::new().check_for_nan(false).record_capacity(4);
      let mut tape = Tape::with_config(config);
      assert_eq!(tape.config(), &config);
      let f = tape
        .scope(|guard| {
          let x = guard.var(1.0);
          guard.lock().seal(&[x.exp()])
        })
        .unwrap();
      assert_eq!(f.config(), &config);
    }

    #[test]
    #[should_panic(expected = "different recordings")]
    fn mixing_recordings_panics() {
      let mut outer = Tape::new();
      let mut inner = Tape::new();
      outer.scope(|guard| {
        let x = guard.var(1.0);
        inner.scope(|other| {
          let y = other.var(2.0);
          let _ = y + x;
        });
      });
    }
  }

  mod var {
    use super::*;

    fn record<G>(x: f64, f: G) -> Function
    where
      G: for<'s> Fn(Var<'s>) -> Var<'s>,
    {
      Tape::new()
        .scope(|guard| {
          let x = guard.var(x);
          let y = f(x);
          guard.lock().seal(&[y])
        })
        .unwrap()
    }

    #[test]
    fn arithmetic_values() {
      let mut tape = Tape::new();
      tape.scope(|guard| {
        let a = guard.var(6.0);
        let b = guard.var(3.0);
        assert_eq!((a + b).value(), 9.0);
        assert_eq!((&a - &b).value(), 3.0);
        assert_eq!((a * 2.0).value(), 12.0);
        assert_eq!((2.0 / b).value(), 2.0 / 3.0);
        assert_eq!((1.0 - a).value(), -5.0);
        assert_eq!((-a).value(), -6.0);
        let mut c = a;
        c += b;
        c *= 2.0;
        assert_eq!(c.value(), 18.0);
      });
    }

    #[test]
    fn constant_operands_become_parameters() {
      let f = record(2.0, |x| 3.0 * x + 1.0);
      assert_eq!(f.parameters(), &[3.0, 1.0]);
      let records = f.records();
      assert_eq!(records[1].op, OpCode::Mul);
      assert_eq!(records[1].args.as_slice(), &[Arg::Par(0), Arg::Var(0)]);
      assert_eq!(records[2].args.as_slice(), &[Arg::Var(1), Arg::Par(1)]);
      assert_eq!(f.recorded_range(), vec![7.0]);
    }

    #[test]
    fn auxiliary_results_take_a_slot() {
      let f = record(0.5, |x| x.sin().exp());
      // inv, sin (+cos), exp
      assert_eq!(f.num_var(), 4);
      assert_eq!(f.recorded_values()[2], 0.5f64.cos());
      assert_eq!(f.dependents(), &[3]);
    }

    #[test]
    fn powi_is_repeated_multiplication() {
      let f = record(-2.0, |x| x.powi(5));
      assert_eq!(f.recorded_range(), vec![-32.0]);
      assert!(f.records().iter().skip(1).all(|r| r.op == OpCode::Mul));
      let f = record(-2.0, |x| x.powf(-2.0));
      assert_eq!(f.recorded_range(), vec![0.25]);
      let f = record(4.0, |x| x.powf(0.5));
      assert!((f.recorded_range()[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn composite_values() {
      let x = 0.3;
      let close = |f: Function, expected: f64| {
        assert!((f.recorded_range()[0] - expected).abs() < 1e-12);
      };
      close(record(x, |v| v.asinh()), f64::asinh(x));
      close(record(x, |v| v.atanh()), f64::atanh(x));
      close(record(1.0 + x, |v| v.acosh()), f64::acosh(1.0 + x));
      close(record(x, |v| v.log10()), f64::log10(x));
      close(record(x, |v| v.exp2()), f64::exp2(x));
      close(record(x, |v| v.cbrt()), f64::cbrt(x));
      close(record(x, |v| v.pow(2.5)), f64::powf(x, 2.5));
    }

    #[test]
    fn composite_values_below_zero() {
      let close = |f: Function, expected: f64| {
        let got = f.recorded_range()[0];
        assert!(
          (got - expected).abs() <= 1e-12 * expected.abs(),
          "{got} != {expected}"
        );
      };
      for x in [-1e200, -1e8, -1e4, -8.0, -0.3, -1e-9] {
        close(record(x, |v| v.asinh()), f64::asinh(x));
        close(record(x, |v| v.cbrt()), f64::cbrt(x));
      }
      close(record(8.0, |v| v.cbrt()), 2.0);
    }

    #[test]
    fn comparisons_are_recorded() {
      let mut tape = Tape::new();
      let f = tape
        .scope(|guard| {
          let x = guard.var(1.0);
          assert!(x.lt(2.0));
          assert!(!x.gt(&x));
          guard.lock().seal(&[x])
        })
        .unwrap();
      assert_eq!(f.num_var(), 1);
      assert_eq!(
        f.records()[1].op,
        OpCode::Compare {
          cmp: CompareOp::Lt,
          outcome: true
        }
      );
    }

    #[test]
    fn cond_exp_picks_branch() {
      let mut tape = Tape::new();
      tape.scope(|guard| {
        let x = guard.var(1.0);
        let y = guard.var(4.0);
        let z = guard.cond_exp(CompareOp::Lt, x, y, x * 10.0, &y);
        assert_eq!(z.value(), 10.0);
        let z = guard.cond_exp(CompareOp::Gt, x, 0.5, 1.0, 2.0);
        assert_eq!(z.value(), 1.0);
      });
    }
  }

  #[test]
  fn display_dumps_records() {
    let mut tape = Tape::new();
    let f = tape
      .scope(|guard| {
        let x = guard.var(2.0);
        let y = x.exp() * 3.0;
        guard.lock().seal(&[y])
      })
      .unwrap();
    let dump = f.to_string();
    assert!(dump.starts_with("function: n = 1, m = 1, vars = 3, records = 3"));
    assert!(dump.contains("p0 = 3"));
    assert!(dump.contains("exp v0"));
    assert!(dump.ends_with("out [v2]"));
  }
}
