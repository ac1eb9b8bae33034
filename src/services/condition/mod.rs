//! The condition language: a small boolean DSL any metadata value may
//! reference to gate itself on the installed game's state.

pub mod evaluator;
pub mod parser;

pub use evaluator::ConditionEvaluator;
pub use parser::{parse, validate, Comparison, Expr, Function};
