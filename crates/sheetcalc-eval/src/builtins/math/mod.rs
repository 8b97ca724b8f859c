pub mod aggregate;
pub mod criteria_aggregates;
pub mod numeric;
pub mod trig;

pub use aggregate::*;
pub use criteria_aggregates::*;
pub use numeric::*;
pub use trig::*;

pub fn register_builtins() {
    aggregate::register_builtins();
    criteria_aggregates::register_builtins();
    numeric::register_builtins();
    trig::register_builtins();
}
