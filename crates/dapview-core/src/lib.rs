//! dapview Core - Foundational types for the dapview engine
//!
//! This crate provides the types that all other dapview crates depend on:
//! - `GroupId`, `DimId`, `EnumId`, `VarId`, `AttrId` - Arena handles into a dataset
//! - `NodeRef` - A handle to any declaration, tagged by kind
//! - `Slice` - Dimension subsetting descriptor
//! - Error types and Result alias

mod error;
mod id;
mod slice;

pub use error::{DapviewError, Result};
pub use id::{AttrId, DimId, EnumId, GroupId, NodeKind, NodeRef, VarId};
pub use slice::Slice;
