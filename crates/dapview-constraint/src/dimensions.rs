//! Dimension resolution: redefinitions, slice completion, and the dimension
//! closure

use crate::view::{push_unique, ConstraintView};
use dapview_core::{DapviewError, DimId, Result, Slice};
use std::collections::HashMap;
use tracing::debug;

impl ConstraintView<'_> {
    /// Materialize redefinitions, then give every segment exactly one
    /// complete slice per dimension.
    pub(crate) fn compute_dimensions(&mut self) -> Result<()> {
        let dataset = self.dataset;

        let mut redefs = HashMap::new();
        for (dim, slice) in &self.redef_slices {
            let original = dataset.dimension(*dim);
            let size = slice.count_within(original.size);
            redefs.insert(*dim, original.with_size(size));
        }
        let effective_size = |dim: DimId| {
            redefs
                .get(&dim)
                .map_or_else(|| dataset.dimension(dim).size, |d| d.size)
        };

        // nothing is written back until every segment resolves
        let mut resolved = Vec::with_capacity(self.segments.len());
        let mut dim_refs = Vec::new();
        for segment in &self.segments {
            let var = dataset.variable(segment.var);
            let rank = var.rank();
            if segment.slices.len() > rank {
                return Err(DapviewError::SchemaInconsistency(format!(
                    "'{}' has rank {} but {} slices",
                    dataset.variable_fqn(var.id),
                    rank,
                    segment.slices.len()
                )));
            }

            let mut slices = segment.slices.clone();
            slices.resize_with(rank, Slice::unconstrained);
            for (slice, dim) in slices.iter_mut().zip(&var.dimensions) {
                let len = effective_size(*dim);
                if slice.is_constrained() {
                    slice.complete(len)?;
                } else {
                    *slice = Slice::fill(len);
                    push_unique(&mut dim_refs, *dim);
                }
            }
            resolved.push(slices);
        }

        for (segment, slices) in self.segments.iter_mut().zip(resolved) {
            segment.slices = slices;
        }
        self.redefs = redefs;
        self.dim_refs = dim_refs;

        debug!(
            dimensions = self.dim_refs.len(),
            redefinitions = self.redefs.len(),
            "computed dimension closure"
        );
        Ok(())
    }
}
