//! Filter command

use super::{load_dataset, load_request};
use anyhow::{Context, Result};
use dapview_constraint::View;
use dapview_filter::{MemorySequence, RecordFilter};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

pub struct FilterArgs {
    pub dataset: String,
    pub request: String,
    pub sequence: String,
    pub records: String,
}

#[derive(Serialize)]
struct Match<'r, R> {
    index: u64,
    record: &'r R,
}

pub fn run(args: FilterArgs) -> Result<()> {
    let dataset = load_dataset(&args.dataset)?;
    let request = load_request(&args.request)?;
    let view = request.build(&dataset).context("Failed to build view")?;

    let content = std::fs::read_to_string(Path::new(&args.records))
        .with_context(|| format!("Failed to read records {}", args.records))?;
    let records = MemorySequence::from_toml_str(&content)
        .with_context(|| format!("Failed to parse records {}", args.records))?;

    for line in filter_lines(view.as_ref(), &args.sequence, records)? {
        println!("{}", line);
    }
    Ok(())
}

/// One JSON line per matching record. A record that fails to evaluate is
/// logged and skipped.
pub(crate) fn filter_lines(
    view: &dyn View<'_>,
    sequence: &str,
    records: MemorySequence,
) -> Result<Vec<String>> {
    let dataset = view.dataset();
    let seq = dataset
        .find_variable(sequence)
        .with_context(|| format!("Sequence not found: {}", sequence))?;

    let total = records.len();
    let mut filter = RecordFilter::new(dataset, seq, records, view.filter(seq))?;
    let mut lines = Vec::new();
    loop {
        match filter.has_next() {
            Ok(true) => {
                let (index, record) = filter.next_indexed()?;
                lines.push(serde_json::to_string(&Match {
                    index,
                    record: &record,
                })?);
            }
            Ok(false) => break,
            Err(e) => warn!(error = %e, "skipping record"),
        }
    }
    info!(matched = lines.len(), total, "filtered {}", sequence);
    Ok(lines)
}
