// State engine
//
// The single source of truth for named, typed, observable variables.
// Actions read values during validation and write them during run; GUI
// widgets observe per-variable change signals.

pub mod engine;
pub mod variable;

pub use engine::StateEngine;
pub use variable::{StateHandle, StateVariable};
