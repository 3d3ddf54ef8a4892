use thiserror::Error;

use crate::op::VarIndex;

/// Everything that can go wrong while sealing a recording or evaluating,
/// differentiating or analysing a recorded function
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
  #[error("recording declares no independent variables")]
  NoIndependents,
  #[error("recording declares no dependent variables")]
  NoDependents,
  #[error("dependent {index} was recorded on a different tape")]
  ForeignVariable { index: usize },
  #[error("{what}: expected {expected} values, got {got}")]
  DimensionMismatch {
    what: &'static str,
    expected: usize,
    got: usize,
  },
  #[error("order {requested} requested but only {available} orders are available")]
  OrderNotAvailable { requested: usize, available: usize },
  #[error("reverse sweep needs at least one order")]
  ZeroOrder,
  #[error("forward sweep produced nan for variable v{index} at order {order}")]
  NanResult { index: VarIndex, order: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Check that `got` matches `expected` or name the offending argument
#[inline]
pub fn ensure_len(what: &'static str, expected: usize, got: usize) -> Result<()> {
  if expected == got {
    Ok(())
  } else {
    Err(Error::DimensionMismatch {
      what,
      expected,
      got,
    })
  }
}
