//! View command

use super::{load_dataset, load_request};
use anyhow::{Context, Result};
use dapview_constraint::{RenderMode, View};

pub fn run(dataset_path: &str, request_path: &str, format: &str) -> Result<()> {
    let dataset = load_dataset(dataset_path)?;
    let request = load_request(request_path)?;
    let view = request.build(&dataset).context("Failed to build view")?;
    println!("{}", render(view.as_ref(), format)?);
    Ok(())
}

pub(crate) fn render(view: &dyn View<'_>, format: &str) -> Result<String> {
    let output = match format {
        "display" => view.render(RenderMode::Display)?,
        "constraint" => view.render(RenderMode::Constraint)?,
        "json" => serde_json::to_string_pretty(&view.summary()?)?,
        _ => anyhow::bail!("Unknown format: {}", format),
    };
    Ok(output)
}
