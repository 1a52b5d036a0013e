//! Predicates for filtered and index-guided scans

pub mod condition;

pub use condition::{CompareOp, Condition};
