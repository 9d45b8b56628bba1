//! Dot-path key parsing and upstream pattern construction.

pub mod parser;

pub use parser::*;
