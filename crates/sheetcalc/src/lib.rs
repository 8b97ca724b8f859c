//! Meta crate that re-exports the sheetcalc building blocks. Downstream
//! users can depend on this crate and opt into specific layers via feature
//! flags while keeping access to the underlying crates.

#[cfg(feature = "common")]
pub use sheetcalc_common as common;

#[cfg(feature = "core")]
pub use sheetcalc_core as ast;

#[cfg(feature = "eval")]
pub use sheetcalc_eval as eval;

#[cfg(feature = "common")]
pub use sheetcalc_common::{ExcelError, ExcelErrorKind, LiteralValue};

#[cfg(feature = "core")]
pub use sheetcalc_core::{ASTNode, ASTNodeType, BinaryOperator, ReferenceType, UnaryOperator};

#[cfg(feature = "eval")]
pub use sheetcalc_eval::{
    CellContent, CellSource, Engine, EngineError, EvalConfig, EvaluationContext, FunctionProvider,
    NameResolver,
};

#[cfg(feature = "eval")]
pub mod doc_examples;
