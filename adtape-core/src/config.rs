/// Knobs shared by a recording and every sweep over the function it produces
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
  /// Fail a forward sweep when it turns finite inputs into a nan
  pub check_for_nan: bool,
  /// Number of records to reserve up front when a recording starts
  pub record_capacity: usize,
}

impl Config {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn check_for_nan(mut self, yes: bool) -> Self {
    self.check_for_nan = yes;
    self
  }

  pub fn record_capacity(mut self, capacity: usize) -> Self {
    self.record_capacity = capacity;
    self
  }
}

impl Default for Config {
  fn default() -> Self {
    Self {
      check_for_nan: cfg!(debug_assertions),
      record_capacity: 512,
    }
  }
}
