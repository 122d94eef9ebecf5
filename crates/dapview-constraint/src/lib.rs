//! dapview Constraint - Views over a dataset schema
//!
//! A constraint view records which variables a request projects, how each of
//! their dimensions is sliced, which dimensions are resized, and which
//! sequences are filtered. Finalizing the view closes it over the
//! dimensions, enumerations, and groups the selection depends on, so a
//! serializer can emit a self-consistent subset of the dataset.

mod closure;
mod dimensions;
mod expand;
mod format;
mod request;
mod segment;
mod summary;
mod universal;
mod view;

pub use format::RenderMode;
pub use request::{
    resolve_expand, AttributeRequest, FilterRequest, ProjectRequest, RedefRequest, SliceSpec,
    ViewRequest, EXPAND_ENV,
};
pub use segment::{Segment, SegmentDisplay};
pub use summary::{RedefSummary, SegmentSummary, ViewSummary};
pub use universal::UniversalView;
pub use view::{ConstraintView, View, ViewState};
