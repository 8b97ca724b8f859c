//! Spreadsheet error values.
//!
//! - **`ExcelErrorKind`** : the closed set of error codes a formula can produce
//! - **`ErrorContext`**   : optional location of the cell that raised the error
//! - **`ExcelError`**     : kind plus optional diagnostics
//!
//! Errors are ordinary values: they flow through operators and functions
//! like numbers do. Two errors are equal when their kinds are equal; the
//! message and location are diagnostics only.

use std::{
    error::Error,
    fmt,
    hash::{Hash, Hasher},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::LiteralValue;

/// All error codes the evaluator can produce.
///
/// **Note:** names are CamelCase while `Display` renders them exactly as a
/// spreadsheet shows them (`#DIV/0!`, …).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ExcelErrorKind {
    Div,
    Value,
    Ref,
    Name,
    Num,
    Na,
    Null,
    /// Circular reference detected during evaluation.
    Circ,
    /// A well-known function that this engine does not implement.
    NImpl,
}

impl fmt::Display for ExcelErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.literal())
    }
}

impl ExcelErrorKind {
    pub const ALL: [ExcelErrorKind; 9] = [
        Self::Div,
        Self::Value,
        Self::Ref,
        Self::Name,
        Self::Num,
        Self::Na,
        Self::Null,
        Self::Circ,
        Self::NImpl,
    ];

    /// The literal as typed into a cell.
    pub fn literal(self) -> &'static str {
        match self {
            Self::Div => "#DIV/0!",
            Self::Value => "#VALUE!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Num => "#NUM!",
            Self::Na => "#N/A",
            Self::Null => "#NULL!",
            Self::Circ => "#CIRC!",
            Self::NImpl => "#N/IMPL!",
        }
    }

    /// Parse an error literal, case-insensitively. Returns `None` for
    /// anything that is not one of the known literals.
    pub fn try_parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.literal().eq_ignore_ascii_case(s))
    }
}

/// Where an error was raised.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ErrorContext {
    pub sheet: Option<String>,
    pub row: Option<u32>,
    pub col: Option<u32>,
}

/// The error value passed around by the evaluator.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct ExcelError {
    pub kind: ExcelErrorKind,
    pub message: Option<String>,
    pub context: Option<ErrorContext>,
}

/* ───────────────────── Constructors & helpers ─────────────────────── */

impl From<ExcelErrorKind> for ExcelError {
    fn from(kind: ExcelErrorKind) -> Self {
        Self {
            kind,
            message: None,
            context: None,
        }
    }
}

impl ExcelError {
    pub fn new(kind: ExcelErrorKind) -> Self {
        kind.into()
    }

    pub fn new_value() -> Self {
        Self::new(ExcelErrorKind::Value)
    }

    pub fn new_div() -> Self {
        Self::new(ExcelErrorKind::Div)
    }

    pub fn new_num() -> Self {
        Self::new(ExcelErrorKind::Num)
    }

    pub fn new_na() -> Self {
        Self::new(ExcelErrorKind::Na)
    }

    pub fn new_ref() -> Self {
        Self::new(ExcelErrorKind::Ref)
    }

    pub fn new_name() -> Self {
        Self::new(ExcelErrorKind::Name)
    }

    /// Attach a human-readable explanation.
    pub fn with_message<S: Into<String>>(mut self, msg: S) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Attach the location of the cell that raised the error.
    pub fn with_location(mut self, sheet: Option<String>, row: u32, col: u32) -> Self {
        self.context = Some(ErrorContext {
            sheet,
            row: Some(row),
            col: Some(col),
        });
        self
    }

    pub fn from_error_string(s: &str) -> Option<Self> {
        ExcelErrorKind::try_parse(s).map(Self::new)
    }
}

impl PartialEq for ExcelError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for ExcelError {}

impl Hash for ExcelError {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
    }
}

/* ───────────────────────── Display / Error ────────────────────────── */

impl fmt::Display for ExcelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(ref msg) = self.message {
            write!(f, ": {msg}")?;
        }

        if let Some(ErrorContext {
            sheet,
            row: Some(r),
            col: Some(c),
        }) = &self.context
        {
            match sheet {
                Some(sheet) => write!(f, " ({sheet}!R{r}C{c})")?,
                None => write!(f, " (R{r}C{c})")?,
            }
        }

        Ok(())
    }
}

impl Error for ExcelError {}

impl From<ExcelError> for LiteralValue {
    fn from(error: ExcelError) -> Self {
        LiteralValue::Error(error)
    }
}

impl PartialEq<ExcelErrorKind> for ExcelError {
    fn eq(&self, other: &ExcelErrorKind) -> bool {
        self.kind == *other
    }
}

impl PartialEq<&str> for ExcelError {
    fn eq(&self, other: &&str) -> bool {
        self.kind.literal() == *other
    }
}
