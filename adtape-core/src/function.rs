use std::fmt;

use crate::config::Config;
use crate::op::{Record, VarIndex};

/// A sealed recording: the immutable operation sequence of some
/// `F: R^n -> R^m`, together with everything needed to replay it.
///
/// A `Function` never changes after sealing, every sweep borrows it
/// immutably and keeps its own value table, so one function can be evaluated
/// from several threads at once.
#[derive(Debug, Clone)]
pub struct Function {
  records: Vec<Record>,
  parameters: Vec<f64>,
  independents: Vec<VarIndex>,
  dependents: Vec<VarIndex>,
  num_var: usize,
  values: Vec<f64>,
  config: Config,
}

impl Function {
  pub(crate) fn new(
    records: Vec<Record>,
    parameters: Vec<f64>,
    independents: Vec<VarIndex>,
    dependents: Vec<VarIndex>,
    values: Vec<f64>,
    config: Config,
  ) -> Self {
    let num_var = values.len();
    Self {
      records,
      parameters,
      independents,
      dependents,
      num_var,
      values,
      config,
    }
  }

  /// Dimension of the domain, `n`
  #[inline]
  pub fn domain(&self) -> usize {
    self.independents.len()
  }

  /// Dimension of the range, `m`
  #[inline]
  pub fn range(&self) -> usize {
    self.dependents.len()
  }

  /// Number of variables (rows of a value table)
  #[inline]
  pub fn num_var(&self) -> usize {
    self.num_var
  }

  #[inline]
  pub fn num_records(&self) -> usize {
    self.records.len()
  }

  #[inline]
  pub fn records(&self) -> &[Record] {
    &self.records
  }

  #[inline]
  pub fn parameters(&self) -> &[f64] {
    &self.parameters
  }

  #[inline]
  pub fn independents(&self) -> &[VarIndex] {
    &self.independents
  }

  #[inline]
  pub fn dependents(&self) -> &[VarIndex] {
    &self.dependents
  }

  /// Value of every variable at the point the function was recorded at
  #[inline]
  pub fn recorded_values(&self) -> &[f64] {
    &self.values
  }

  #[inline]
  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Range values at the recording point
  pub fn recorded_range(&self) -> Vec<f64> {
    self.dependents.iter().map(|&i| self.values[i]).collect()
  }
}

impl fmt::Display for Function {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(
      f,
      "function: n = {}, m = {}, vars = {}, records = {}",
      self.domain(),
      self.range(),
      self.num_var,
      self.records.len()
    )?;
    for (index, value) in self.parameters.iter().enumerate() {
      writeln!(f, "  p{index} = {value}")?;
    }
    for record in &self.records {
      writeln!(f, "  {record}")?;
    }
    let deps: Vec<String> = self.dependents.iter().map(|i| format!("v{i}")).collect();
    write!(f, "  out [{}]", deps.join(", "))
  }
}
