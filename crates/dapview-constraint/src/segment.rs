//! A selected variable with its slices and optional filter

use dapview_core::{Slice, VarId};
use dapview_filter::Expr;
use dapview_schema::Dataset;
use std::fmt;

/// One projected variable.
///
/// Before finalization `slices` holds whatever the request gave (possibly
/// fewer entries than the variable's rank, or none). Afterwards it holds
/// exactly one resolved slice per dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub var: VarId,
    pub slices: Vec<Slice>,
    pub filter: Option<Expr>,
}

impl Segment {
    pub fn new(var: VarId, slices: Vec<Slice>) -> Self {
        Self {
            var,
            slices,
            filter: None,
        }
    }

    /// `fqn[slices]|filter`, for diagnostics
    pub fn display<'a>(&'a self, dataset: &'a Dataset) -> SegmentDisplay<'a> {
        SegmentDisplay {
            segment: self,
            dataset,
        }
    }
}

pub struct SegmentDisplay<'a> {
    segment: &'a Segment,
    dataset: &'a Dataset,
}

impl fmt::Display for SegmentDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dataset.variable_fqn(self.segment.var))?;
        for slice in &self.segment.slices {
            write!(f, "{}", slice)?;
        }
        if let Some(filter) = &self.segment.filter {
            write!(f, "|{}", filter)?;
        }
        Ok(())
    }
}
