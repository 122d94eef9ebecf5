//! The select-everything view

use crate::format::RenderMode;
use crate::summary::ViewSummary;
use crate::view::View;
use dapview_core::{DimId, NodeRef, Result, Slice, VarId};
use dapview_filter::Expr;
use dapview_schema::{Attribute, Dataset, Dimension};
use std::borrow::Cow;

/// A view of the whole dataset with fixed answers.
///
/// Mutators succeed and change nothing; every structural node is
/// referenced and every dimension is taken whole.
#[derive(Debug, Clone, Copy)]
pub struct UniversalView<'a> {
    dataset: &'a Dataset,
}

impl<'a> UniversalView<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }
}

impl<'a> View<'a> for UniversalView<'a> {
    fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    fn add_variable(&mut self, _var: VarId, _slices: Option<Vec<Slice>>) -> Result<()> {
        Ok(())
    }

    fn add_redef(&mut self, _dim: DimId, _slice: Slice) -> Result<()> {
        Ok(())
    }

    fn add_attribute(&mut self, _node: NodeRef, _attribute: Attribute) -> Result<()> {
        Ok(())
    }

    fn set_filter(&mut self, _var: VarId, _expr: Expr) -> Result<()> {
        Ok(())
    }

    fn finalize(&mut self, _expand: bool) -> Result<()> {
        Ok(())
    }

    fn variable_slices(&self, var: VarId) -> Option<Cow<'_, [Slice]>> {
        let slices = self
            .dataset
            .variable(var)
            .dimensions
            .iter()
            .map(|d| Slice::fill(self.dataset.dimension(*d).size))
            .collect::<Vec<_>>();
        Some(Cow::Owned(slices))
    }

    fn redef_dim(&self, _dim: DimId) -> Option<&Dimension> {
        None
    }

    fn references(&self, node: NodeRef) -> bool {
        node.is_structural()
    }

    fn attributes(&self, _node: NodeRef) -> &[Attribute] {
        &[]
    }

    fn filter(&self, _var: VarId) -> Option<&Expr> {
        None
    }

    /// Top-level variables with `[]` per dimension; compounds are always whole
    fn render(&self, _mode: RenderMode) -> Result<String> {
        let parts: Vec<String> = self
            .dataset
            .top_level_variables()
            .into_iter()
            .map(|v| {
                let rank = self.dataset.rank(v);
                format!("{}{}", self.dataset.variable_fqn(v), "[]".repeat(rank))
            })
            .collect();
        Ok(parts.join(";"))
    }

    fn summary(&self) -> Result<ViewSummary> {
        Ok(ViewSummary::from_dataset(self.dataset))
    }
}
