//! dapview Schema - Dataset schema introspection
//!
//! This crate provides the read-only dataset model that views are computed
//! over: a tree of groups holding dimensions, enumerations, and variables,
//! stored as arenas and addressed by the handles from `dapview-core`.

mod builder;
mod dataset;
mod loader;
mod types;

pub use builder::DatasetBuilder;
pub use dataset::{
    Attribute, AttributeDecl, Dataset, Dimension, Enumeration, Group, VarKind, VarParent,
    Variable,
};
pub use types::AtomicType;
