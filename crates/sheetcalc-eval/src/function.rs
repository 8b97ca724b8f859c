//! sheetcalc-eval/src/function.rs
// The `Function` trait every built-in and host function implements, plus
// its capability flags.

use sheetcalc_common::{ExcelError, ExcelErrorKind};

use crate::traits::{ArgumentHandle, CalcValue, FunctionContext};

bitflags::bitflags! {
    /// Describes the properties of a function.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct FnCaps: u16 {
        /// Same output for the same input, no side effects.
        const PURE              = 0b0000_0001;
        /// Reduces one or more ranges to a single value (`SUM`, `COUNT`).
        const REDUCTION         = 0b0000_0010;
        /// Searches a range (`MATCH`, `VLOOKUP`).
        const LOOKUP            = 0b0000_0100;
        /// Evaluates only some of its arguments (`IF`, `CHOOSE`).
        const SHORT_CIRCUIT     = 0b0000_1000;
        /// May return a reference or range instead of a scalar (`OFFSET`).
        /// Results of functions without this flag are narrowed to a scalar.
        const RETURNS_REFERENCE = 0b0001_0000;
        /// Builds criteria predicates (`SUMIF`, `COUNTIFS`).
        const CRITERIA          = 0b0010_0000;
        /// Inspects error arguments instead of propagating them (`ISERROR`).
        const ERROR_AWARE       = 0b0100_0000;
    }
}

/// Expands to a `caps()` method.
#[macro_export]
macro_rules! func_caps {
    ($($cap:ident),+ $(,)?) => {
        fn caps(&self) -> $crate::function::FnCaps {
            $crate::function::FnCaps::empty() $(| $crate::function::FnCaps::$cap)+
        }
    };
}

pub trait Function: Send + Sync + 'static {
    fn caps(&self) -> FnCaps {
        FnCaps::PURE
    }

    /// Upper-case canonical name.
    fn name(&self) -> &'static str;

    /// Alternative names registered alongside `name`.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn min_args(&self) -> usize {
        0
    }

    /// `None` for variadic functions.
    fn max_args(&self) -> Option<usize> {
        Some(self.min_args())
    }

    fn eval<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError>;

    /// Arity check, then `eval`.
    fn dispatch<'a, 'b, 'c>(
        &self,
        args: &'c [ArgumentHandle<'a, 'b>],
        ctx: &dyn FunctionContext<'b>,
    ) -> Result<CalcValue<'b>, ExcelError> {
        let n = args.len();
        let too_many = self.max_args().is_some_and(|max| n > max);
        if n < self.min_args() || too_many {
            return Err(ExcelError::new(ExcelErrorKind::Value).with_message(format!(
                "{} called with {n} argument(s)",
                self.name()
            )));
        }
        self.eval(args, ctx)
    }
}
