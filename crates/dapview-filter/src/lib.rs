//! dapview Filter - Per-record boolean filters over sequences
//!
//! This crate provides the filter expression tree attached to sequence
//! selections, the record source contract it reads from, and the
//! forward-only iterator that yields matching records.

mod evaluator;
mod expr;
mod record;
mod value;

pub use evaluator::RecordFilter;
pub use expr::{CompareOp, Expr};
pub use record::{MemoryRecord, MemorySequence, Record, RecordSource};
pub use value::Value;
