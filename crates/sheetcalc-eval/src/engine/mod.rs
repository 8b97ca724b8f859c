//! Sheetcalc evaluation engine
//!
//! Demand-driven, depth-first evaluation of single cells with a per-cell
//! result cache and circular reference detection.

pub mod cache;
pub mod eval;
pub mod named_range;
pub mod range_view;

#[cfg(test)]
mod tests;

pub use cache::{CacheStats, CellState};
pub use eval::Engine;
pub use named_range::{NameScope, NameTable, NamedDefinition};
pub use range_view::{RangeView, RefView};

use sheetcalc_common::CoordError;

use crate::traits::EvaluationContext;

/// Configuration for the evaluation engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalConfig {
    /// Sheet used by [`Engine::evaluate`] when the caller passes an empty
    /// sheet name.
    pub default_sheet: String,
    /// A formula whose result is blank yields `0`, as a spreadsheet shows it.
    pub blank_result_as_zero: bool,
    /// Match sheet names in references exactly instead of ignoring ASCII case.
    pub case_sensitive_sheet_names: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            default_sheet: "Sheet1".to_string(),
            blank_result_as_zero: true,
            case_sensitive_sheet_names: false,
        }
    }
}

impl EvalConfig {
    pub fn with_default_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.default_sheet = sheet.into();
        self
    }

    pub fn with_blank_result_as_zero(mut self, on: bool) -> Self {
        self.blank_result_as_zero = on;
        self
    }

    pub fn with_case_sensitive_sheet_names(mut self, on: bool) -> Self {
        self.case_sensitive_sheet_names = on;
        self
    }
}

/// Host-level failures. Spreadsheet errors such as `#REF!` are values, not
/// `EngineError`s.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("unknown sheet `{0}`")]
    UnknownSheet(String),
    #[error("invalid cell address `{address}`: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: CoordError,
    },
}

/// Construct a new engine with the given context and configuration
pub fn new_engine<C>(context: C, config: EvalConfig) -> Engine<C>
where
    C: EvaluationContext,
{
    Engine::new(context, config)
}
