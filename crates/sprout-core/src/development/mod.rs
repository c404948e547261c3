//! # Development Module
//!
//! Age arithmetic and developmental stage classification.
//!
//! Everything here is a pure function of its inputs: no I/O, no clocks, no
//! shared state. Callers pass the reference instant explicitly.

mod age;
mod stage;

pub use age::*;
pub use stage::*;
