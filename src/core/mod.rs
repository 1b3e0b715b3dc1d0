//! Foundation layer: math primitives and shared data types.

pub mod math;
pub mod types;
