//! Rendering a finished view back to text

use crate::segment::Segment;
use crate::view::ConstraintView;
use dapview_core::{DapviewError, Result, VarId};
use serde::{Deserialize, Serialize};

/// Leaf formatting used by the view printer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// `[first:stride:last]` for every constrained slice; filters omitted
    Display,
    /// Compact, round-trippable constraint expression with `|filter` suffixes
    Constraint,
}

impl ConstraintView<'_> {
    pub(crate) fn format(&self, mode: RenderMode) -> Result<String> {
        if !self.is_finished() {
            return Err(DapviewError::Usage(
                "view must be finalized before it is printed".to_string(),
            ));
        }
        let mut out = String::new();
        let mut first = true;
        for segment in &self.segments {
            if !self.dataset.variable(segment.var).is_top_level() {
                continue;
            }
            if !first {
                out.push(';');
            }
            first = false;
            self.dump_segment(segment, mode, &mut out)?;
        }
        Ok(out)
    }

    fn dump_segment(&self, segment: &Segment, mode: RenderMode, out: &mut String) -> Result<()> {
        let dataset = self.dataset;
        let var = dataset.variable(segment.var);
        if var.is_top_level() {
            out.push_str(&dataset.variable_fqn(var.id));
        } else {
            out.push_str(&var.name);
        }

        if segment.slices.len() != var.rank() {
            return Err(DapviewError::SchemaInconsistency(format!(
                "'{}' has rank {} but {} slices",
                dataset.variable_fqn(var.id),
                var.rank(),
                segment.slices.len()
            )));
        }
        for slice in &segment.slices {
            if slice.is_whole() && !slice.is_constrained() {
                out.push_str("[]");
            } else {
                match mode {
                    RenderMode::Display => out.push_str(&slice.to_string()),
                    RenderMode::Constraint => out.push_str(&slice.to_constraint_string()),
                }
            }
        }

        if var.is_compound() && !self.is_whole_structure(var.id) {
            let selected: Vec<&Segment> = var
                .fields()
                .iter()
                .filter_map(|f| self.segment(*f))
                .collect();
            if selected.is_empty() {
                return Err(DapviewError::SchemaInconsistency(format!(
                    "no field of '{}' is in the view",
                    dataset.variable_fqn(var.id)
                )));
            }
            out.push('{');
            for (i, field) in selected.into_iter().enumerate() {
                if i > 0 {
                    out.push(';');
                }
                self.dump_segment(field, mode, out)?;
            }
            out.push('}');
        }

        if mode == RenderMode::Constraint {
            if let Some(filter) = &segment.filter {
                out.push('|');
                out.push_str(&filter.to_string());
            }
        }
        Ok(())
    }

    /// Every field, recursively, is in the view
    fn is_whole_structure(&self, compound: VarId) -> bool {
        self.dataset.fields(compound).iter().all(|f| {
            self.contains(*f)
                && (!self.dataset.variable(*f).is_compound() || self.is_whole_structure(*f))
        })
    }
}
