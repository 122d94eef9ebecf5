//! CLI command implementations

pub mod filter;
pub mod schema;
pub mod view;

use anyhow::{Context, Result};
use dapview_constraint::ViewRequest;
use dapview_schema::Dataset;
use std::path::Path;

pub(crate) fn load_dataset(path: &str) -> Result<Dataset> {
    Dataset::load_file(Path::new(path))
        .with_context(|| format!("Failed to load dataset description {}", path))
}

pub(crate) fn load_request(path: &str) -> Result<ViewRequest> {
    ViewRequest::load_file(Path::new(path))
        .with_context(|| format!("Failed to load view request {}", path))
}
