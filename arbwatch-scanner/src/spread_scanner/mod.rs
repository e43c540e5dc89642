pub mod core_types;
pub mod evaluator;
