//! Expression tree types.
//!
//! Formula text is parsed upstream; this crate only defines the tree the
//! evaluator walks, plus small builders for hosts and tests that assemble
//! trees by hand.

pub mod ast;

pub use ast::*;
pub use sheetcalc_common::{ExcelError, ExcelErrorKind, LiteralValue};
