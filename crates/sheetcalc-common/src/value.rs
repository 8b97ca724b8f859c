use std::{
    fmt::{self, Display},
    hash::{Hash, Hasher},
};

use crate::{ExcelError, ExcelErrorKind};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A resolved scalar as produced by the evaluator or stored in a cell.
///
/// References and ranges are not literals: the evaluator represents them as
/// views over the grid and narrows them to a `LiteralValue` on demand.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Always finite. Use [`LiteralValue::from_number`] when the input may
    /// be NaN or infinite.
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(ExcelError),
    /// An empty cell or an omitted argument.
    Blank,
}

impl Hash for LiteralValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            LiteralValue::Number(n) => n.to_bits().hash(state),
            LiteralValue::Text(s) => s.hash(state),
            LiteralValue::Boolean(b) => b.hash(state),
            LiteralValue::Error(e) => e.hash(state),
            LiteralValue::Blank => {}
        }
    }
}

impl Eq for LiteralValue {}

impl Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Number(n) => write!(f, "{n}"),
            LiteralValue::Text(s) => write!(f, "{s}"),
            LiteralValue::Boolean(true) => write!(f, "TRUE"),
            LiteralValue::Boolean(false) => write!(f, "FALSE"),
            LiteralValue::Error(e) => write!(f, "{}", e.kind),
            LiteralValue::Blank => Ok(()),
        }
    }
}

impl LiteralValue {
    /// Wrap a float, turning NaN and infinities into `#NUM!`.
    pub fn from_number(n: f64) -> Self {
        if n.is_finite() {
            LiteralValue::Number(n)
        } else {
            LiteralValue::Error(ExcelError::new(ExcelErrorKind::Num))
        }
    }

    pub fn error(kind: ExcelErrorKind) -> Self {
        LiteralValue::Error(ExcelError::new(kind))
    }

    pub fn text<S: Into<String>>(s: S) -> Self {
        LiteralValue::Text(s.into())
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, LiteralValue::Blank)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LiteralValue::Error(_))
    }

    pub fn as_error(&self) -> Option<&ExcelError> {
        match self {
            LiteralValue::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn error_kind(&self) -> Option<ExcelErrorKind> {
        self.as_error().map(|e| e.kind)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            LiteralValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Short lowercase tag, handy in log lines and test failures.
    pub fn type_name(&self) -> &'static str {
        match self {
            LiteralValue::Number(_) => "number",
            LiteralValue::Text(_) => "text",
            LiteralValue::Boolean(_) => "boolean",
            LiteralValue::Error(_) => "error",
            LiteralValue::Blank => "blank",
        }
    }
}

impl From<f64> for LiteralValue {
    fn from(n: f64) -> Self {
        LiteralValue::from_number(n)
    }
}

impl From<i32> for LiteralValue {
    fn from(n: i32) -> Self {
        LiteralValue::Number(n as f64)
    }
}

impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self {
        LiteralValue::Boolean(b)
    }
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self {
        LiteralValue::Text(s.to_string())
    }
}

impl From<String> for LiteralValue {
    fn from(s: String) -> Self {
        LiteralValue::Text(s)
    }
}

impl From<ExcelErrorKind> for LiteralValue {
    fn from(kind: ExcelErrorKind) -> Self {
        LiteralValue::error(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_numbers_become_num_errors() {
        assert_eq!(
            LiteralValue::from_number(f64::NAN),
            LiteralValue::error(ExcelErrorKind::Num)
        );
        assert_eq!(
            LiteralValue::from(f64::NEG_INFINITY),
            LiteralValue::error(ExcelErrorKind::Num)
        );
        assert_eq!(LiteralValue::from(2.5), LiteralValue::Number(2.5));
    }

    #[test]
    fn display_matches_cell_rendering() {
        assert_eq!(LiteralValue::Boolean(true).to_string(), "TRUE");
        assert_eq!(LiteralValue::Blank.to_string(), "");
        assert_eq!(LiteralValue::error(ExcelErrorKind::Na).to_string(), "#N/A");
    }
}
