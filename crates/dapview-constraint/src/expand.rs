//! Automatic field expansion for compound selections

use crate::segment::Segment;
use crate::view::ConstraintView;
use dapview_core::VarId;
use std::collections::{HashSet, VecDeque};
use tracing::trace;

impl ConstraintView<'_> {
    /// Select every field of each compound variable none of whose fields were
    /// picked explicitly, recursively.
    ///
    /// A compound with at least one selected field is a deliberate partial
    /// projection and is left alone. Nested compounds are seeded on their own,
    /// so one with no selected fields is filled in even under such a parent.
    pub(crate) fn expand_compound_types(&mut self) {
        let dataset = self.dataset;
        let mut queue: VecDeque<VarId> = VecDeque::new();
        let mut seen: HashSet<VarId> = HashSet::new();

        for segment in &self.segments {
            let var = segment.var;
            if dataset.variable(var).is_compound()
                && self.expansion_count(var) == 0
                && seen.insert(var)
            {
                queue.push_back(var);
            }
        }

        while let Some(compound) = queue.pop_front() {
            for &field in dataset.fields(compound) {
                if self.contains(field) {
                    continue;
                }
                trace!(
                    field = %dataset.variable_fqn(field),
                    "expanding compound field"
                );
                self.push_segment(Segment::new(field, Vec::new()));
                if dataset.variable(field).is_compound()
                    && self.expansion_count(field) == 0
                    && seen.insert(field)
                {
                    queue.push_back(field);
                }
            }
        }
    }
}
