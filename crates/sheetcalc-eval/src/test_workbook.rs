//! crates/sheetcalc-eval/src/test_workbook.rs
//! --------------------------------------------
//! Lightweight in-memory workbook for unit/prop tests and benchmarks.
//!
//! Builders take one-based rows and columns (or A1 text), like formulas do.
use std::sync::Arc;

use rustc_hash::FxHashMap;
use sheetcalc_common::{Coord, LiteralValue};
use sheetcalc_core::ASTNode;

use crate::engine::named_range::{NameScope, NameTable, NamedDefinition};
use crate::engine::{Engine, EvalConfig};
use crate::function::Function;
use crate::reference::{CellRef, RangeRef, SheetId};
use crate::traits::{CellContent, CellSource, FunctionProvider, NameResolver};

type V = LiteralValue;

#[derive(Clone)]
pub struct TestWorkbook {
    sheets: Vec<String>,
    cells: FxHashMap<CellRef, CellContent>,
    names: NameTable,
    fns: FxHashMap<String, Arc<dyn Function>>,
}

impl Default for TestWorkbook {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorkbook {
    /* ─────────────── constructors ─────────────── */

    /// A workbook with one empty sheet, `Sheet1`.
    pub fn new() -> Self {
        Self {
            sheets: vec!["Sheet1".to_string()],
            cells: FxHashMap::default(),
            names: NameTable::new(),
            fns: FxHashMap::default(),
        }
    }

    pub fn with_sheet(mut self, name: &str) -> Self {
        self.sheet(name);
        self
    }

    /// Id of `name`, adding the sheet if it does not exist yet.
    fn sheet(&mut self, name: &str) -> SheetId {
        match self.sheets.iter().position(|s| s == name) {
            Some(i) => i as SheetId,
            None => {
                self.sheets.push(name.to_string());
                (self.sheets.len() - 1) as SheetId
            }
        }
    }

    fn cell_ref(&mut self, sheet: &str, row: u32, col: u32) -> CellRef {
        let coord = Coord::from_excel(row, col).expect("bad one-based position in TestWorkbook");
        CellRef::new(self.sheet(sheet), coord)
    }

    fn a1_ref(&mut self, sheet: &str, a1: &str) -> CellRef {
        let coord = Coord::parse_a1(a1).expect("bad A1 ref in TestWorkbook");
        CellRef::new(self.sheet(sheet), coord)
    }

    /* ─────────────── cell helpers ─────────────── */

    pub fn with_cell(mut self, sheet: &str, row: u32, col: u32, v: V) -> Self {
        let cell = self.cell_ref(sheet, row, col);
        self.cells.insert(cell, CellContent::Value(v));
        self
    }

    pub fn with_cell_a1(mut self, sheet: &str, a1: &str, v: V) -> Self {
        self.set_value_a1(sheet, a1, v);
        self
    }

    pub fn with_formula(mut self, sheet: &str, row: u32, col: u32, ast: ASTNode) -> Self {
        let cell = self.cell_ref(sheet, row, col);
        self.cells.insert(cell, CellContent::Formula(Arc::new(ast)));
        self
    }

    pub fn with_formula_a1(mut self, sheet: &str, a1: &str, ast: ASTNode) -> Self {
        self.set_formula_a1(sheet, a1, ast);
        self
    }

    /// Values laid out row-major from the one-based (`row`, `col`) corner.
    pub fn with_range(mut self, sheet: &str, row: u32, col: u32, data: Vec<Vec<V>>) -> Self {
        for (r_off, r) in data.into_iter().enumerate() {
            for (c_off, v) in r.into_iter().enumerate() {
                let cell = self.cell_ref(sheet, row + r_off as u32, col + c_off as u32);
                self.cells.insert(cell, CellContent::Value(v));
            }
        }
        self
    }

    pub fn set_value_a1(&mut self, sheet: &str, a1: &str, v: V) {
        let cell = self.a1_ref(sheet, a1);
        self.cells.insert(cell, CellContent::Value(v));
    }

    pub fn set_formula_a1(&mut self, sheet: &str, a1: &str, ast: ASTNode) {
        let cell = self.a1_ref(sheet, a1);
        self.cells.insert(cell, CellContent::Formula(Arc::new(ast)));
    }

    pub fn clear_a1(&mut self, sheet: &str, a1: &str) {
        let cell = self.a1_ref(sheet, a1);
        self.cells.remove(&cell);
    }

    /* ─────────────── named ranges ─────────────── */

    /// Workbook-scoped name for one cell.
    pub fn with_named_cell(mut self, name: &str, sheet: &str, a1: &str) -> Self {
        let cell = self.a1_ref(sheet, a1);
        self.names
            .define(name, NameScope::Workbook, NamedDefinition::Cell(cell));
        self
    }

    /// Workbook-scoped name for the one-based, inclusive area.
    pub fn with_named_range(
        mut self,
        name: &str,
        sheet: &str,
        (start_row, start_col): (u32, u32),
        (end_row, end_col): (u32, u32),
    ) -> Self {
        let start = self.cell_ref(sheet, start_row, start_col);
        let end = self.cell_ref(sheet, end_row, end_col);
        let range =
            RangeRef::new(start.sheet_id, start.coord, end.coord).expect("inverted named range");
        self.names
            .define(name, NameScope::Workbook, NamedDefinition::Range(range));
        self
    }

    pub fn with_named_formula(mut self, name: &str, ast: ASTNode) -> Self {
        self.names.define(
            name,
            NameScope::Workbook,
            NamedDefinition::Formula(Arc::new(ast)),
        );
        self
    }

    /// A name visible only to formulas on `sheet`.
    pub fn with_sheet_name(mut self, sheet: &str, name: &str, definition: NamedDefinition) -> Self {
        let id = self.sheet(sheet);
        self.names.define(name, NameScope::Sheet(id), definition);
        self
    }

    /* ─────────────── function helpers ─────────── */

    pub fn with_function(mut self, func: Arc<dyn Function>) -> Self {
        self.fns.insert(func.name().to_ascii_uppercase(), func);
        self
    }

    /* ─────────────── engine shortcut ──────────── */

    pub fn engine(&self) -> Engine<TestWorkbook> {
        Engine::new(self.clone(), EvalConfig::default())
    }
}

/* ─────────────────────── trait impls ─────────────────────── */

impl CellSource for TestWorkbook {
    fn sheet_id(&self, name: &str) -> Option<SheetId> {
        self.sheets
            .iter()
            .position(|s| s == name)
            .map(|i| i as SheetId)
    }

    fn sheet_ids(&self) -> Vec<SheetId> {
        (0..self.sheets.len()).map(|i| i as SheetId).collect()
    }

    fn sheet_name(&self, id: SheetId) -> Option<&str> {
        self.sheets.get(id as usize).map(String::as_str)
    }

    fn lookup(&self, sheet: SheetId, row: u32, col: u32) -> CellContent {
        self.cells
            .get(&CellRef::new(sheet, Coord::new(row, col)))
            .cloned()
            .unwrap_or_default()
    }
}

impl NameResolver for TestWorkbook {
    fn resolve_name(&self, name: &str, sheet: SheetId) -> Option<NamedDefinition> {
        self.names.resolve(name, sheet).cloned()
    }
}

impl FunctionProvider for TestWorkbook {
    fn get_function(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.fns.get(&name.to_ascii_uppercase()).cloned()
    }
}
