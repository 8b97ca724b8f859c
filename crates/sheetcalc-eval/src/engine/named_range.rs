use std::sync::Arc;

use rustc_hash::FxHashMap;
use sheetcalc_core::ASTNode;

use crate::reference::{CellRef, RangeRef, SheetId};

/// Scope of a named range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameScope {
    /// Available throughout workbook
    Workbook,
    /// Only available in specific sheet
    Sheet(SheetId),
}

/// Definition of what a name refers to
#[derive(Debug, Clone, PartialEq)]
pub enum NamedDefinition {
    /// Direct reference to a single cell
    Cell(CellRef),
    /// Reference to a range of cells
    Range(RangeRef),
    /// Named formula, evaluated in the context of the cell that uses it.
    Formula(Arc<ASTNode>),
}

/// Defined names keyed case-insensitively. A sheet-scoped name shadows a
/// workbook-scoped name of the same spelling on that sheet.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    names: FxHashMap<(String, NameScope), NamedDefinition>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or redefine `name` in `scope`. Returns the previous
    /// definition, if any.
    pub fn define(
        &mut self,
        name: &str,
        scope: NameScope,
        definition: NamedDefinition,
    ) -> Option<NamedDefinition> {
        self.names
            .insert((name.to_ascii_uppercase(), scope), definition)
    }

    pub fn remove(&mut self, name: &str, scope: NameScope) -> Option<NamedDefinition> {
        self.names.remove(&(name.to_ascii_uppercase(), scope))
    }

    /// Lookup as seen from a formula on `sheet`.
    pub fn resolve(&self, name: &str, sheet: SheetId) -> Option<&NamedDefinition> {
        let key = name.to_ascii_uppercase();
        self.names
            .get(&(key.clone(), NameScope::Sheet(sheet)))
            .or_else(|| self.names.get(&(key, NameScope::Workbook)))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Coord;

    #[test]
    fn sheet_scope_shadows_workbook_scope() {
        let global = NamedDefinition::Cell(CellRef::new(0, Coord::new(0, 0)));
        let local = NamedDefinition::Cell(CellRef::new(1, Coord::new(4, 4)));
        let mut names = NameTable::new();
        names.define("Rate", NameScope::Workbook, global.clone());
        names.define("RATE", NameScope::Sheet(1), local.clone());

        assert_eq!(names.resolve("rate", 0), Some(&global));
        assert_eq!(names.resolve("rate", 1), Some(&local));
        assert_eq!(names.resolve("missing", 0), None);

        assert_eq!(names.remove("Rate", NameScope::Sheet(1)), Some(local));
        assert_eq!(names.resolve("rate", 1), Some(&global));
        assert_eq!(names.len(), 1);
    }
}
