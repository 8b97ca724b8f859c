pub mod core;
pub mod lookup_utils;

pub use self::core::*;

pub fn register_builtins() {
    self::core::register_builtins();
}
