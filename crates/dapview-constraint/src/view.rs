//! The constraint view and the capability interface shared with the
//! universal view

use crate::format::RenderMode;
use crate::segment::Segment;
use crate::summary::ViewSummary;
use dapview_core::{DapviewError, DimId, EnumId, GroupId, NodeRef, Result, Slice, VarId};
use dapview_filter::{Expr, RecordFilter, RecordSource};
use dapview_schema::{Attribute, Dataset, Dimension};
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Construction and query API shared by every kind of view.
///
/// A parser drives the mutators, calls [`View::finalize`] once, and from then
/// on the view is a read-only snapshot.
pub trait View<'a> {
    fn dataset(&self) -> &'a Dataset;

    /// Project `var`. `None` defers slicing to finalization (whole dimensions).
    fn add_variable(&mut self, var: VarId, slices: Option<Vec<Slice>>) -> Result<()>;

    /// Resize `dim` to the element count of `slice`.
    fn add_redef(&mut self, dim: DimId, slice: Slice) -> Result<()>;

    fn add_attribute(&mut self, node: NodeRef, attribute: Attribute) -> Result<()>;

    /// Attach a record filter to an already projected variable.
    fn set_filter(&mut self, var: VarId, expr: Expr) -> Result<()>;

    /// Close the view. Once it succeeds, later calls do nothing. A failed
    /// call leaves the view open and unchanged.
    fn finalize(&mut self, expand: bool) -> Result<()>;

    fn variable_slices(&self, var: VarId) -> Option<Cow<'_, [Slice]>>;

    fn redef_dim(&self, dim: DimId) -> Option<&Dimension>;

    fn references(&self, node: NodeRef) -> bool;

    /// Extra attributes to merge into `node` on output
    fn attributes(&self, node: NodeRef) -> &[Attribute];

    fn filter(&self, var: VarId) -> Option<&Expr>;

    fn render(&self, mode: RenderMode) -> Result<String>;

    fn summary(&self) -> Result<ViewSummary>;

    fn to_display_string(&self) -> Result<String> {
        self.render(RenderMode::Display)
    }

    fn to_constraint_string(&self) -> Result<String> {
        self.render(RenderMode::Constraint)
    }

    /// Iterate the records of sequence `seq` that pass this view's filter.
    fn filter_records<'s, S: RecordSource>(
        &'s self,
        seq: VarId,
        source: S,
    ) -> Result<RecordFilter<'s, S>>
    where
        Self: Sized,
        'a: 's,
    {
        RecordFilter::new(self.dataset(), seq, source, self.filter(seq))
    }
}

/// Lifecycle of a [`ConstraintView`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Building,
    Finished,
}

/// A view built from explicit projections, slices, redefinitions, and
/// filters.
#[derive(Debug)]
pub struct ConstraintView<'a> {
    pub(crate) dataset: &'a Dataset,
    /// Selected variables at every nesting level, in insertion order
    pub(crate) segments: Vec<Segment>,
    pub(crate) positions: HashMap<VarId, usize>,
    /// Requested resizes, in request order
    pub(crate) redef_slices: Vec<(DimId, Slice)>,
    pub(crate) attributes: HashMap<NodeRef, Vec<Attribute>>,
    pub(crate) redefs: HashMap<DimId, Dimension>,
    /// Referenced original dimensions, in first-discovery order
    pub(crate) dim_refs: Vec<DimId>,
    pub(crate) enums: Vec<EnumId>,
    pub(crate) groups: Vec<GroupId>,
    pub(crate) state: ViewState,
}

impl<'a> ConstraintView<'a> {
    /// Create an empty view over `dataset`
    pub fn new(dataset: &'a Dataset) -> Self {
        Self {
            dataset,
            segments: Vec::new(),
            positions: HashMap::new(),
            redef_slices: Vec::new(),
            attributes: HashMap::new(),
            redefs: HashMap::new(),
            dim_refs: Vec::new(),
            enums: Vec::new(),
            groups: Vec::new(),
            state: ViewState::Building,
        }
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == ViewState::Finished
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, var: VarId) -> Option<&Segment> {
        self.positions.get(&var).map(|i| &self.segments[*i])
    }

    pub fn contains(&self, var: VarId) -> bool {
        self.positions.contains_key(&var)
    }

    /// Referenced original dimensions, in first-discovery order
    pub fn referenced_dimensions(&self) -> &[DimId] {
        &self.dim_refs
    }

    pub fn referenced_enums(&self) -> &[EnumId] {
        &self.enums
    }

    pub fn referenced_groups(&self) -> &[GroupId] {
        &self.groups
    }

    /// The redefined clone of `dim` if there is one, else the original
    pub fn effective_dimension(&self, dim: DimId) -> &Dimension {
        self.redefs
            .get(&dim)
            .unwrap_or_else(|| self.dataset.dimension(dim))
    }

    pub(crate) fn push_segment(&mut self, segment: Segment) {
        self.positions.insert(segment.var, self.segments.len());
        self.segments.push(segment);
    }

    /// Number of direct fields of `compound` already in the view
    pub(crate) fn expansion_count(&self, compound: VarId) -> usize {
        self.dataset
            .fields(compound)
            .iter()
            .filter(|f| self.contains(**f))
            .count()
    }

    fn ensure_building(&self, operation: &str) -> Result<()> {
        match self.state {
            ViewState::Building => Ok(()),
            ViewState::Finished => Err(DapviewError::Usage(format!(
                "{} called on a finished view",
                operation
            ))),
        }
    }
}

pub(crate) fn push_unique<T: PartialEq>(list: &mut Vec<T>, item: T) {
    if !list.contains(&item) {
        list.push(item);
    }
}

impl<'a> View<'a> for ConstraintView<'a> {
    fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    fn add_variable(&mut self, var: VarId, slices: Option<Vec<Slice>>) -> Result<()> {
        self.ensure_building("add_variable")?;
        if !self.contains(var) {
            self.push_segment(Segment::new(var, slices.unwrap_or_default()));
        }
        Ok(())
    }

    fn add_redef(&mut self, dim: DimId, slice: Slice) -> Result<()> {
        self.ensure_building("add_redef")?;
        if self.redef_slices.iter().any(|(d, _)| *d == dim) {
            warn!(
                dimension = ?dim,
                "dimension already redefined; keeping the first redefinition"
            );
            return Ok(());
        }
        self.redef_slices.push((dim, slice));
        Ok(())
    }

    fn add_attribute(&mut self, node: NodeRef, attribute: Attribute) -> Result<()> {
        self.ensure_building("add_attribute")?;
        self.attributes.entry(node).or_default().push(attribute);
        Ok(())
    }

    fn set_filter(&mut self, var: VarId, expr: Expr) -> Result<()> {
        self.ensure_building("set_filter")?;
        if let Some(i) = self.positions.get(&var) {
            self.segments[*i].filter = Some(expr);
        }
        Ok(())
    }

    fn finalize(&mut self, expand: bool) -> Result<()> {
        if self.is_finished() {
            return Ok(());
        }

        let segments = self.segments.clone();
        let positions = self.positions.clone();

        // order matters: each pass reads what the previous one built
        if expand {
            self.expand_compound_types();
        }
        self.compute_enums();
        if let Err(e) = self.compute_dimensions() {
            // leave the view open with its inputs intact
            self.segments = segments;
            self.positions = positions;
            self.enums.clear();
            return Err(e);
        }
        self.compute_groups();
        self.state = ViewState::Finished;

        debug!(
            segments = self.segments.len(),
            dimensions = self.dim_refs.len(),
            redefinitions = self.redefs.len(),
            enums = self.enums.len(),
            groups = self.groups.len(),
            "view finalized"
        );
        Ok(())
    }

    fn variable_slices(&self, var: VarId) -> Option<Cow<'_, [Slice]>> {
        self.segment(var).map(|s| Cow::Borrowed(s.slices.as_slice()))
    }

    fn redef_dim(&self, dim: DimId) -> Option<&Dimension> {
        self.redefs.get(&dim)
    }

    fn references(&self, node: NodeRef) -> bool {
        match node {
            // redefined clones keep the original's id
            NodeRef::Dimension(id) => {
                let resolved = self.redefs.get(&id).map(|d| d.id).unwrap_or(id);
                self.dim_refs.contains(&resolved)
            }
            NodeRef::Enumeration(id) => self.enums.contains(&id),
            NodeRef::Variable(id) => self.contains(id),
            NodeRef::Group(id) => self.groups.contains(&id),
            NodeRef::Attribute(_) => false,
        }
    }

    fn attributes(&self, node: NodeRef) -> &[Attribute] {
        self.attributes
            .get(&node)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    fn filter(&self, var: VarId) -> Option<&Expr> {
        self.segment(var).and_then(|s| s.filter.as_ref())
    }

    fn render(&self, mode: RenderMode) -> Result<String> {
        self.format(mode)
    }

    fn summary(&self) -> Result<ViewSummary> {
        ViewSummary::from_view(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dapview_filter::CompareOp;
    use dapview_schema::{AtomicType, DatasetBuilder};

    fn setup() -> (Dataset, VarId, VarId, DimId) {
        let mut b = DatasetBuilder::new("d");
        let x = b.add_dimension(b.root(), "x", 10).unwrap();
        let v = b.add_atomic(b.root(), "v", AtomicType::Int32, vec![x]).unwrap();
        let seq = b.add_sequence(b.root(), "s", vec![]).unwrap();
        b.add_atomic(seq, "depth", AtomicType::Int32, vec![]).unwrap();
        (b.build(), v, seq, x)
    }

    #[test]
    fn test_add_variable_is_set_like() {
        let (ds, v, _, _) = setup();
        let mut view = ConstraintView::new(&ds);
        view.add_variable(v, Some(vec![Slice::index(3)])).unwrap();
        view.add_variable(v, None).unwrap();
        assert_eq!(view.segments().len(), 1);
        assert_eq!(view.segments()[0].slices, vec![Slice::index(3)]);
    }

    #[test]
    fn test_set_filter_requires_segment() {
        let (ds, _, seq, _) = setup();
        let mut view = ConstraintView::new(&ds);
        let expr = Expr::field_cmp("depth", CompareOp::Gt, 1i64);
        view.set_filter(seq, expr.clone()).unwrap();
        assert!(view.filter(seq).is_none());

        view.add_variable(seq, None).unwrap();
        view.set_filter(seq, expr.clone()).unwrap();
        assert_eq!(view.filter(seq), Some(&expr));
    }

    #[test]
    fn test_mutators_after_finalize_are_usage_errors() {
        let (ds, v, seq, x) = setup();
        let mut view = ConstraintView::new(&ds);
        view.add_variable(v, None).unwrap();
        view.finalize(false).unwrap();
        assert!(view.is_finished());

        assert!(matches!(view.add_variable(seq, None), Err(DapviewError::Usage(_))));
        assert!(matches!(
            view.add_redef(x, Slice::of_count(2).unwrap()),
            Err(DapviewError::Usage(_))
        ));
        assert!(matches!(
            view.add_attribute(
                NodeRef::Variable(v),
                Attribute::new("a", AtomicType::String, vec![])
            ),
            Err(DapviewError::Usage(_))
        ));
        assert!(matches!(
            view.set_filter(v, Expr::literal(true)),
            Err(DapviewError::Usage(_))
        ));
    }

    #[test]
    fn test_failed_finalize_leaves_view_open() {
        let (ds, v, seq, _) = setup();
        let mut view = ConstraintView::new(&ds);
        view.add_variable(seq, None).unwrap();
        view.add_variable(v, Some(vec![Slice::index(12)])).unwrap();

        assert!(matches!(view.finalize(true), Err(DapviewError::InvalidSlice(_))));
        assert!(!view.is_finished());
        // expansion of the sequence is undone with the rest
        assert_eq!(view.segments().len(), 2);
        assert_eq!(view.variable_slices(v).unwrap().as_ref(), &[Slice::index(12)]);
        assert!(view.referenced_dimensions().is_empty());
        assert!(view.referenced_groups().is_empty());
        assert!(view.referenced_enums().is_empty());
        assert!(matches!(view.to_display_string(), Err(DapviewError::Usage(_))));

        // the same inputs fail the same way
        assert!(view.finalize(true).is_err());
        assert!(!view.is_finished());
    }

    #[test]
    fn test_attribute_overlay_appends() {
        let (ds, v, _, _) = setup();
        let mut view = ConstraintView::new(&ds);
        let node = NodeRef::Variable(v);
        view.add_attribute(node, Attribute::new("a", AtomicType::String, vec!["1".into()]))
            .unwrap();
        view.add_attribute(node, Attribute::new("b", AtomicType::String, vec!["2".into()]))
            .unwrap();
        let names: Vec<&str> = view.attributes(node).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(view.attributes(NodeRef::Group(GroupId::ROOT)).is_empty());
    }

    #[test]
    fn test_first_redefinition_wins() {
        let (ds, v, _, x) = setup();
        let mut view = ConstraintView::new(&ds);
        view.add_redef(x, Slice::of_count(4).unwrap()).unwrap();
        view.add_redef(x, Slice::of_count(7).unwrap()).unwrap();
        view.add_variable(v, None).unwrap();
        view.finalize(false).unwrap();
        assert_eq!(view.redef_dim(x).map(|d| d.size), Some(4));
    }

    #[test]
    fn test_references_by_kind() {
        let (ds, v, seq, x) = setup();
        let mut view = ConstraintView::new(&ds);
        view.add_variable(v, None).unwrap();
        view.finalize(false).unwrap();

        assert!(view.references(NodeRef::Variable(v)));
        assert!(!view.references(NodeRef::Variable(seq)));
        assert!(view.references(NodeRef::Dimension(x)));
        assert!(view.references(NodeRef::Group(GroupId::ROOT)));
        assert!(!view.references(NodeRef::Attribute(dapview_core::AttrId(0))));
    }

    #[test]
    fn test_filter_records_uses_segment_filter() {
        let (ds, _, seq, _) = setup();
        let mut view = ConstraintView::new(&ds);
        view.add_variable(seq, None).unwrap();
        view.set_filter(seq, Expr::field_cmp("depth", CompareOp::Gt, 100i64))
            .unwrap();
        view.finalize(true).unwrap();

        let data = dapview_filter::MemorySequence::from_column("depth", [50i64, 150, 90, 300]);
        let mut records = view.filter_records(seq, data).unwrap();
        let mut seen = Vec::new();
        while records.has_next().unwrap() {
            seen.push(records.next_indexed().unwrap().0);
        }
        assert_eq!(seen, vec![1, 3]);
    }
}
