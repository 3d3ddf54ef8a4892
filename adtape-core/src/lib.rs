//!
//! # adtape-core
//!
//! Recording side of the library: the op codes a tape is made of, the
//! recorder that produces tapes, and the sealed [`Function`] every sweep
//! consumes.
//!
//! ## Invariants
//!
//! 1. Recording is append-only and single threaded; a [`Tape`] hands out
//!    `Var`s that cannot leave the scope they were recorded in
//! 2. Operands always refer to variables recorded earlier, so replaying
//!    records in order is a valid evaluation order
//! 3. A sealed [`Function`] is immutable, sweeps only ever borrow it
//!

mod config;
mod error;
mod function;
mod op;
mod recorder;

pub use config::Config;
pub use error::{ensure_len, Error, Result};
pub use function::Function;
pub use op::{Arg, CompareOp, OpCode, Record, VarIndex};
pub use recorder::{Guard, Locked, Operand, Tape, Unlocked, Var};
