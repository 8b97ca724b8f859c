//! sheetcalc-eval: operand resolution, the function library, lazy range
//! views and the caching cell evaluator.

mod macros;

pub mod args;
pub mod builtins;
pub mod coercion;
pub mod function;
pub mod function_registry;
pub mod interpreter;
pub mod reference;
pub mod traits;

pub use reference::CellRef;
pub use reference::Coord;
pub use reference::RangeRef;
pub use reference::SheetId;

#[cfg(test)]
mod test_utils;
pub mod test_workbook;

pub mod engine;
pub mod telemetry;

pub use engine::{Engine, EngineError, EvalConfig};
pub use traits::{
    CalcValue, CellContent, CellEvaluator, CellSource, EvaluationContext, FunctionProvider,
    NameResolver,
};
