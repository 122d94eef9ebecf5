//! Enumeration and group closures

use crate::view::{push_unique, ConstraintView};
use dapview_core::{GroupId, NodeRef};
use tracing::debug;

impl ConstraintView<'_> {
    /// Collect the enumerations used as base types by selected atomics, in
    /// first-discovery order.
    pub(crate) fn compute_enums(&mut self) {
        let dataset = self.dataset;
        for segment in &self.segments {
            if let Some(id) = dataset
                .variable(segment.var)
                .base_type()
                .and_then(|t| t.enum_id())
            {
                push_unique(&mut self.enums, id);
            }
        }
        debug!(enums = self.enums.len(), "computed enumeration closure");
    }

    /// Collect every group on the path from the root to each selected
    /// variable, shared referenced dimension, and referenced enumeration.
    pub(crate) fn compute_groups(&mut self) {
        let dataset = self.dataset;
        let mut groups: Vec<GroupId> = Vec::new();

        let variables = self.segments.iter().map(|s| NodeRef::Variable(s.var));
        let dimensions = self
            .dim_refs
            .iter()
            .filter(|d| dataset.dimension(**d).shared)
            .map(|d| NodeRef::Dimension(*d));
        let enums = self.enums.iter().map(|e| NodeRef::Enumeration(*e));

        for node in variables.chain(dimensions).chain(enums) {
            for group in dataset.group_path(node) {
                push_unique(&mut groups, *group);
            }
        }

        self.groups = groups;
        debug!(groups = self.groups.len(), "computed group closure");
    }
}

#[cfg(test)]
mod tests {
    use crate::view::{ConstraintView, View};
    use dapview_core::{GroupId, NodeRef};
    use dapview_schema::{AtomicType, DatasetBuilder};

    #[test]
    fn test_enum_closure_order() {
        let mut b = DatasetBuilder::new("d");
        let e1 = b
            .add_enum(b.root(), "flag", AtomicType::UInt8, vec![("a".into(), 0)])
            .unwrap();
        let e2 = b
            .add_enum(b.root(), "mode", AtomicType::Int16, vec![("b".into(), 1)])
            .unwrap();
        let v1 = b.add_atomic(b.root(), "v1", AtomicType::Enum(e2), vec![]).unwrap();
        let v2 = b.add_atomic(b.root(), "v2", AtomicType::Enum(e1), vec![]).unwrap();
        let v3 = b.add_atomic(b.root(), "v3", AtomicType::Enum(e2), vec![]).unwrap();
        let ds = b.build();

        let mut view = ConstraintView::new(&ds);
        for v in [v1, v2, v3] {
            view.add_variable(v, None).unwrap();
        }
        view.finalize(false).unwrap();
        assert_eq!(view.referenced_enums(), &[e2, e1]);
        assert!(view.references(NodeRef::Enumeration(e1)));
    }

    #[test]
    fn test_group_closure_covers_paths_once() {
        let mut b = DatasetBuilder::new("d");
        let a = b.add_group(b.root(), "a").unwrap();
        let ab = b.add_group(a, "b").unwrap();
        let c = b.add_group(b.root(), "c").unwrap();
        let unused = b.add_group(b.root(), "unused").unwrap();
        let dim = b.add_dimension(c, "n", 3).unwrap();
        let e = b
            .add_enum(a, "kind", AtomicType::Int8, vec![("x".into(), 1)])
            .unwrap();
        let v = b.add_atomic(ab, "v", AtomicType::Enum(e), vec![dim]).unwrap();
        let ds = b.build();

        let mut view = ConstraintView::new(&ds);
        view.add_variable(v, None).unwrap();
        view.finalize(false).unwrap();

        // variable path first, then the dimension's group
        assert_eq!(view.referenced_groups(), &[GroupId::ROOT, a, ab, c]);
        assert!(!view.references(NodeRef::Group(unused)));
    }

    #[test]
    fn test_anonymous_dimension_adds_no_group() {
        let mut b = DatasetBuilder::new("d");
        let g = b.add_group(b.root(), "g").unwrap();
        let anon = b.add_anonymous_dimension(g, 5).unwrap();
        let v = b.add_atomic(b.root(), "v", AtomicType::Int32, vec![anon]).unwrap();
        let ds = b.build();

        let mut view = ConstraintView::new(&ds);
        view.add_variable(v, None).unwrap();
        view.finalize(false).unwrap();
        assert_eq!(view.referenced_groups(), &[GroupId::ROOT]);
        assert!(view.references(NodeRef::Dimension(anon)));
    }
}
