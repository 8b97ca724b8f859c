use std::sync::{Arc, Once};

use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::function::Function;

/// Upper-case name (or alias) to implementation.
static REG: Lazy<DashMap<String, Arc<dyn Function>>> = Lazy::new(DashMap::new);

static BUILTINS: Once = Once::new();

/// Spreadsheet functions this engine knows by name but does not implement.
/// Calls to them evaluate to `#N/IMPL!` rather than `#NAME?`.
const KNOWN_UNIMPLEMENTED: &[&str] = &[
    "ADDRESS", "AREAS", "CELL", "DATE", "DATEVALUE", "DAY", "DB", "DDB", "DSUM", "FV", "GETPIVOTDATA",
    "HOUR", "HYPERLINK", "INDIRECT", "INFO", "IPMT", "IRR", "LOOKUP", "MEDIAN", "MINUTE", "MIRR",
    "MODE", "MONTH", "NOW", "NPER", "NPV", "PERCENTILE", "PMT", "PPMT", "PV", "RAND", "RANK",
    "RATE", "SECOND", "SUMPRODUCT", "TEXT", "TIME", "TODAY", "TRANSPOSE",
    "WEEKDAY", "YEAR",
];

fn ensure_builtins() {
    BUILTINS.call_once(crate::builtins::load_builtins);
}

fn insert(f: Arc<dyn Function>) {
    for alias in f.aliases() {
        REG.insert(alias.to_string(), Arc::clone(&f));
    }
    REG.insert(f.name().to_string(), f);
}

/// Register (or replace) a function process-wide. Built-ins are loaded
/// first, so a registration under a built-in name replaces it.
pub fn register(f: Arc<dyn Function>) {
    ensure_builtins();
    insert(f);
}

pub(crate) fn register_builtin(f: Arc<dyn Function>) {
    insert(f);
}

/// Case-insensitive lookup.
pub fn get(name: &str) -> Option<Arc<dyn Function>> {
    ensure_builtins();
    if let Some(f) = REG.get(name) {
        return Some(Arc::clone(f.value()));
    }
    REG.get(&name.to_ascii_uppercase())
        .map(|f| Arc::clone(f.value()))
}

pub fn is_known_unimplemented(name: &str) -> bool {
    KNOWN_UNIMPLEMENTED
        .iter()
        .any(|known| known.eq_ignore_ascii_case(name))
}

/// Sorted list of every registered name, aliases included.
pub fn registered_names() -> Vec<String> {
    ensure_builtins();
    let mut names: Vec<String> = REG.iter().map(|e| e.key().clone()).collect();
    names.sort();
    names
}
