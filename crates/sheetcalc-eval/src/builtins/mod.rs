pub mod engineering;
pub mod info;
pub mod logical;
pub mod lookup;
pub mod math;
pub mod operators;
pub mod reference_fns;
pub mod stats;
pub mod text;
mod utils;

pub fn load_builtins() {
    logical::register_builtins();
    info::register_builtins();
    math::register_builtins();
    lookup::register_builtins();
    reference_fns::register_builtins();
    engineering::register_builtins();
    stats::register_builtins();
    text::register_builtins();
}
