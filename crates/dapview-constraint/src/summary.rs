//! Serializable snapshot of a finished view

use crate::view::ConstraintView;
use dapview_core::{DapviewError, DimId, Result, Slice};
use dapview_schema::Dataset;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSummary {
    pub variable: String,
    pub slices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedefSummary {
    pub dimension: String,
    pub original_size: u64,
    pub size: u64,
}

/// Everything a serializer needs to know about a view, by name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSummary {
    pub segments: Vec<SegmentSummary>,
    pub dimensions: Vec<String>,
    pub redefinitions: Vec<RedefSummary>,
    pub enums: Vec<String>,
    pub groups: Vec<String>,
}

/// Shared dimensions by FQN, anonymous ones by size
fn dimension_label(dataset: &Dataset, id: DimId) -> String {
    dataset
        .dimension_fqn(id)
        .unwrap_or_else(|| format!("[{}]", dataset.dimension(id).size))
}

impl ViewSummary {
    pub(crate) fn from_view(view: &ConstraintView<'_>) -> Result<Self> {
        if !view.is_finished() {
            return Err(DapviewError::Usage(
                "view must be finalized before it is summarized".to_string(),
            ));
        }
        let dataset = view.dataset;

        let segments = view
            .segments
            .iter()
            .map(|s| SegmentSummary {
                variable: dataset.variable_fqn(s.var),
                slices: s.slices.iter().map(Slice::to_constraint_string).collect(),
                filter: s.filter.as_ref().map(|f| f.to_string()),
            })
            .collect();

        let redefinitions: Vec<RedefSummary> = view
            .redef_slices
            .iter()
            .filter_map(|(id, _)| view.redefs.get(id))
            .map(|clone| RedefSummary {
                dimension: dimension_label(dataset, clone.id),
                original_size: dataset.dimension(clone.id).size,
                size: clone.size,
            })
            .collect();

        Ok(Self {
            segments,
            dimensions: view
                .dim_refs
                .iter()
                .map(|d| dimension_label(dataset, *d))
                .collect(),
            redefinitions,
            enums: view.enums.iter().map(|e| dataset.enum_fqn(*e)).collect(),
            groups: view.groups.iter().map(|g| dataset.group_fqn(*g)).collect(),
        })
    }

    /// Summary of a view that selects the whole dataset
    pub(crate) fn from_dataset(dataset: &Dataset) -> Self {
        let segments = dataset
            .variables()
            .map(|v| SegmentSummary {
                variable: dataset.variable_fqn(v.id),
                slices: v
                    .dimensions
                    .iter()
                    .map(|d| Slice::fill(dataset.dimension(*d).size).to_constraint_string())
                    .collect(),
                filter: None,
            })
            .collect();

        let mut dimensions = Vec::new();
        let mut enums = Vec::new();
        let mut groups = Vec::new();
        for group in dataset.groups() {
            groups.push(dataset.group_fqn(group.id));
            dimensions.extend(group.dimensions.iter().map(|d| dimension_label(dataset, *d)));
            enums.extend(group.enums.iter().map(|e| dataset.enum_fqn(*e)));
        }

        Self {
            segments,
            dimensions,
            redefinitions: Vec::new(),
            enums,
            groups,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::view::{ConstraintView, View};
    use crate::UniversalView;
    use dapview_core::Slice;
    use dapview_filter::{CompareOp, Expr};
    use dapview_schema::{AtomicType, DatasetBuilder};

    #[test]
    fn test_summary_json() {
        let mut b = DatasetBuilder::new("d");
        let time = b.add_dimension(b.root(), "time", 10).unwrap();
        let g = b.add_group(b.root(), "g").unwrap();
        let v = b.add_atomic(g, "v", AtomicType::Int32, vec![time]).unwrap();
        let s = b.add_sequence(b.root(), "s", vec![]).unwrap();
        b.add_atomic(s, "depth", AtomicType::Int32, vec![]).unwrap();
        let ds = b.build();

        let mut view = ConstraintView::new(&ds);
        view.add_redef(time, Slice::of_count(4).unwrap()).unwrap();
        view.add_variable(v, None).unwrap();
        view.add_variable(s, None).unwrap();
        view.set_filter(s, Expr::field_cmp("depth", CompareOp::Gt, 100i64))
            .unwrap();
        view.finalize(true).unwrap();

        let summary = view.summary().unwrap();
        assert_eq!(summary.segments[0].variable, "/g/v");
        assert_eq!(summary.segments[0].slices, vec!["[0:3]"]);
        assert_eq!(summary.segments[1].filter.as_deref(), Some("depth>100"));
        assert_eq!(summary.dimensions, vec!["/time"]);
        assert_eq!(summary.redefinitions[0].size, 4);
        assert_eq!(summary.redefinitions[0].original_size, 10);
        assert_eq!(summary.groups, vec!["/", "/g"]);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["segments"][2]["variable"], "/s.depth");
        assert!(json["segments"][0].get("filter").is_none());
    }

    #[test]
    fn test_universal_summary() {
        let mut b = DatasetBuilder::new("d");
        let x = b.add_dimension(b.root(), "x", 2).unwrap();
        let g = b.add_group(b.root(), "g").unwrap();
        b.add_atomic(g, "v", AtomicType::Int32, vec![x]).unwrap();
        let ds = b.build();

        let summary = UniversalView::new(&ds).summary().unwrap();
        assert_eq!(summary.groups, vec!["/", "/g"]);
        assert_eq!(summary.dimensions, vec!["/x"]);
        assert_eq!(summary.segments[0].slices, vec!["[0:1]"]);
    }

    #[test]
    fn test_unfinished_view_cannot_be_summarized() {
        let ds = DatasetBuilder::new("d").build();
        let view = ConstraintView::new(&ds);
        assert!(view.summary().is_err());
    }
}
