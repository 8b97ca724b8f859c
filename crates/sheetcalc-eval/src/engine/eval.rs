use sheetcalc_common::{Coord, ExcelError, ExcelErrorKind, LiteralValue};
use sheetcalc_core::ASTNode;

use crate::coercion;
use crate::engine::cache::{CacheStats, CellState, Entry, EvalCache};
use crate::engine::{EngineError, EvalConfig};
use crate::interpreter::Interpreter;
use crate::reference::{CellRef, SheetId};
use crate::traits::{CellContent, CellEvaluator, EvaluationContext};

/// Evaluates cells of an [`EvaluationContext`] on demand.
///
/// Formula results are cached per cell. [`Engine::update_cell`] and
/// [`Engine::notify_update`] drop the results that depend on one cell;
/// [`Engine::clear_cache`] (or [`Engine::update`]) drops everything.
/// Evaluation is single-threaded and depth-first: a reference to a formula
/// cell evaluates that cell before the referencing formula continues.
pub struct Engine<C> {
    context: C,
    pub config: EvalConfig,
    cache: EvalCache,
}

impl<C> Engine<C>
where
    C: EvaluationContext,
{
    pub fn new(context: C, config: EvalConfig) -> Self {
        Self {
            context,
            config,
            cache: EvalCache::new(),
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    /// Mutate the backing cells or names. The cache is cleared afterwards,
    /// since any input may have changed.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut C) -> R) -> R {
        let out = f(&mut self.context);
        self.clear_cache();
        out
    }

    /// Mutate the backing context at `cell` only. The cached results of
    /// that cell and of the formulas depending on it are dropped; nothing
    /// is dropped when the cell's content did not change.
    pub fn update_cell<R>(&mut self, cell: CellRef, f: impl FnOnce(&mut C) -> R) -> R {
        let before = self.context.lookup(cell.sheet_id, cell.row(), cell.col());
        let out = f(&mut self.context);
        let after = self.context.lookup(cell.sheet_id, cell.row(), cell.col());
        if !same_content(&before, &after) {
            self.notify_update(cell);
        }
        out
    }

    /// Forget the cached results that depend on `cell`, directly or
    /// through other formulas, after it changed outside
    /// [`Engine::update_cell`]. Returns how many results were dropped.
    pub fn notify_update(&self, cell: CellRef) -> usize {
        let dropped = self.cache.invalidate(cell);
        #[cfg(feature = "tracing")]
        tracing::debug!(cell = %cell, dropped, "invalidated dependents");
        dropped
    }

    pub fn clear_cache(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(entries = self.cache.len(), "clearing evaluation cache");
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cell_state(&self, cell: CellRef) -> CellState {
        self.cache.state(cell)
    }

    /// Evaluate the cell at an A1 address such as `"B7"` or `"$B$7"`. An
    /// empty sheet name means [`EvalConfig::default_sheet`].
    pub fn evaluate(&self, sheet: &str, a1: &str) -> Result<LiteralValue, EngineError> {
        let cell = self.cell_ref(sheet, a1)?;
        Ok(self.evaluate_cell(cell))
    }

    /// Resolve a sheet name and A1 address to a cell.
    pub fn cell_ref(&self, sheet: &str, a1: &str) -> Result<CellRef, EngineError> {
        let sheet = if sheet.is_empty() {
            self.config.default_sheet.as_str()
        } else {
            sheet
        };
        let sheet_id = self
            .sheet_id(sheet)
            .ok_or_else(|| EngineError::UnknownSheet(sheet.to_string()))?;
        let coord = Coord::parse_a1(a1).map_err(|source| EngineError::InvalidAddress {
            address: a1.to_string(),
            source,
        })?;
        Ok(CellRef::new(sheet_id, coord))
    }

    pub fn sheet_id(&self, name: &str) -> Option<SheetId> {
        if let Some(id) = self.context.sheet_id(name) {
            return Some(id);
        }
        if self.config.case_sensitive_sheet_names {
            return None;
        }
        self.context.sheet_ids().into_iter().find(|id| {
            self.context
                .sheet_name(*id)
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
    }

    /// Evaluate one cell. Stored values are returned as they are; formula
    /// results are served from the cache when present.
    pub fn evaluate_cell(&self, cell: CellRef) -> LiteralValue {
        self.cache.record_read(cell);
        let ast = match self.context.lookup(cell.sheet_id, cell.row(), cell.col()) {
            CellContent::Value(v) => return v,
            CellContent::Formula(ast) => ast,
        };
        let guard = match self.cache.begin(cell) {
            Entry::Cached(v) => return v,
            Entry::Cycle => {
                #[cfg(feature = "tracing")]
                tracing::debug!(cell = %cell, "circular reference");
                return LiteralValue::Error(
                    ExcelError::new(ExcelErrorKind::Circ)
                        .with_message("circular reference")
                        .with_location(self.sheet_name(cell.sheet_id), cell.row() + 1, cell.col() + 1),
                );
            }
            Entry::Started(guard) => guard,
        };

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("evaluate_cell", cell = %cell).entered();

        let value = self.evaluate_formula(cell, &ast);
        guard.finish(&value);
        value
    }

    /// Evaluate `ast` as though it were the formula of `cell`, without
    /// caching the result under `cell`. References inside it still go
    /// through the cache.
    pub fn evaluate_formula(&self, cell: CellRef, ast: &ASTNode) -> LiteralValue {
        let interp = Interpreter::new(self, cell);
        let result = interp.evaluate_ast(ast);
        match coercion::get_single_value(&result, cell.row(), cell.col()) {
            Ok(LiteralValue::Blank) if self.config.blank_result_as_zero => LiteralValue::Number(0.0),
            Ok(v) => v,
            Err(e) => LiteralValue::Error(e),
        }
    }

    fn sheet_name(&self, id: SheetId) -> Option<String> {
        self.context.sheet_name(id).map(str::to_string)
    }
}

/// `0` and `-0` are different contents.
fn same_content(a: &CellContent, b: &CellContent) -> bool {
    match (a, b) {
        (CellContent::Value(LiteralValue::Number(x)), CellContent::Value(LiteralValue::Number(y))) => {
            x.to_bits() == y.to_bits()
        }
        _ => a == b,
    }
}

impl<C> CellEvaluator for Engine<C>
where
    C: EvaluationContext,
{
    fn evaluate_cell(&self, cell: CellRef) -> LiteralValue {
        Engine::evaluate_cell(self, cell)
    }

    fn context(&self) -> &dyn EvaluationContext {
        &self.context
    }

    fn resolve_sheet(&self, name: &str) -> Option<SheetId> {
        self.sheet_id(name)
    }
}
