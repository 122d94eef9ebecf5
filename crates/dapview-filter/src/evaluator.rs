//! Filter evaluation over a sequence's record stream

use crate::expr::{CompareOp, Expr};
use crate::record::{Record, RecordSource};
use crate::value::Value;
use dapview_core::{DapviewError, Result, VarId};
use dapview_schema::{Dataset, VarKind};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::trace;

/// A forward-only, single-use pull iterator that yields the records of one
/// sequence that satisfy an optional filter, in index order.
///
/// `has_next` advances the read cursor until it finds a match and caches it;
/// `next_record` hands the cached match out. If evaluating a record fails,
/// the cursor is already past it, so the caller may report the error and
/// keep pulling.
pub struct RecordFilter<'a, S: RecordSource> {
    dataset: &'a Dataset,
    sequence: VarId,
    source: S,
    filter: Option<&'a Expr>,
    nrecords: u64,
    /// Index of the next record to read
    recno: u64,
    current: Option<(u64, S::Record)>,
    patterns: HashMap<String, Regex>,
}

/// Outcome of comparing two scalars
enum Comparison {
    Ordered(Ordering),
    /// Comparable types, but no order exists (a NaN was involved)
    Unordered,
    Incompatible,
}

impl<'a, S: RecordSource> RecordFilter<'a, S> {
    /// Bind a filter to one sequence and its record source.
    pub fn new(
        dataset: &'a Dataset,
        sequence: VarId,
        source: S,
        filter: Option<&'a Expr>,
    ) -> Result<Self> {
        if !dataset.variable(sequence).is_sequence() {
            return Err(DapviewError::Usage(format!(
                "'{}' is not a sequence",
                dataset.variable_fqn(sequence)
            )));
        }
        let nrecords = source.record_count();
        Ok(Self {
            dataset,
            sequence,
            source,
            filter,
            nrecords,
            recno: 0,
            current: None,
            patterns: HashMap::new(),
        })
    }

    /// True iff an unconsumed record that passes the filter exists.
    pub fn has_next(&mut self) -> Result<bool> {
        if self.current.is_some() {
            return Ok(true);
        }
        while self.recno < self.nrecords {
            let index = self.recno;
            self.recno += 1;
            let record = self.source.read_record(index)?;
            let keep = match self.filter {
                None => true,
                Some(expr) => self.matches(expr, &record)?,
            };
            if keep {
                trace!(record = index, "filter matched");
                self.current = Some((index, record));
                return Ok(true);
            }
            trace!(record = index, "filter rejected");
        }
        Ok(false)
    }

    /// The match found by the last successful `has_next`, with its index.
    pub fn next_indexed(&mut self) -> Result<(u64, S::Record)> {
        self.current.take().ok_or_else(|| {
            DapviewError::Usage("next_record called without a successful has_next".to_string())
        })
    }

    /// The match found by the last successful `has_next`.
    pub fn next_record(&mut self) -> Result<S::Record> {
        self.next_indexed().map(|(_, record)| record)
    }

    fn matches(&mut self, expr: &Expr, record: &S::Record) -> Result<bool> {
        match expr {
            Expr::And(lhs, rhs) => {
                let l = self.matches(lhs, record)?;
                let r = self.matches(rhs, record)?;
                Ok(l && r)
            }
            Expr::Compare { op, lhs, rhs } => {
                let lvalue = self.operand(lhs, record)?;
                let rvalue = self.operand(rhs, record)?;
                self.apply(*op, &lvalue, &rvalue)
            }
            Expr::Field(_) | Expr::Literal(_) => {
                let value = self.operand(expr, record)?;
                value.as_bool().ok_or_else(|| {
                    DapviewError::FilterType(format!(
                        "filter must be boolean, got {} '{}'",
                        value.type_name(),
                        value
                    ))
                })
            }
        }
    }

    fn operand(&self, expr: &Expr, record: &S::Record) -> Result<Value> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Field(name) => self.eval_field(name, record),
            other => Err(DapviewError::FilterType(format!(
                "comparison operand must be a field or literal: {}",
                other
            ))),
        }
    }

    fn eval_field(&self, name: &str, record: &S::Record) -> Result<Value> {
        let field = self
            .dataset
            .find_field(self.sequence, name)
            .ok_or_else(|| DapviewError::FilterType(format!("Unknown variable in filter: {}", name)))?;
        let var = self.dataset.variable(field);
        if !matches!(var.kind, VarKind::Atomic(_)) {
            return Err(DapviewError::FilterType(format!(
                "Non-atomic variable in filter: {}",
                name
            )));
        }
        if var.rank() > 0 {
            return Err(DapviewError::FilterType(format!(
                "Non-scalar variable in filter: {}",
                name
            )));
        }
        record.read_field(name)
    }

    fn apply(&mut self, op: CompareOp, lvalue: &Value, rvalue: &Value) -> Result<bool> {
        if op == CompareOp::Match {
            let pattern = rvalue.to_string();
            let subject = lvalue.to_string();
            return Ok(self.pattern(&pattern)?.is_match(&subject));
        }
        let result = match compare(lvalue, rvalue) {
            Comparison::Ordered(ord) => match op {
                CompareOp::Lt => ord == Ordering::Less,
                CompareOp::Le => ord != Ordering::Greater,
                CompareOp::Gt => ord == Ordering::Greater,
                CompareOp::Ge => ord != Ordering::Less,
                CompareOp::Eq => ord == Ordering::Equal,
                CompareOp::Ne => ord != Ordering::Equal,
                CompareOp::Match => unreachable!("handled above"),
            },
            Comparison::Unordered => op == CompareOp::Ne,
            Comparison::Incompatible if op.is_ordering() => {
                return Err(DapviewError::FilterType(format!(
                    "cannot order {} '{}' against {} '{}'",
                    lvalue.type_name(),
                    lvalue,
                    rvalue.type_name(),
                    rvalue
                )));
            }
            Comparison::Incompatible => op == CompareOp::Ne,
        };
        Ok(result)
    }

    /// Compiled, whole-string-anchored pattern, cached across records
    fn pattern(&mut self, pattern: &str) -> Result<&Regex> {
        if !self.patterns.contains_key(pattern) {
            let re = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
                DapviewError::FilterType(format!("invalid regex pattern '{}': {}", pattern, e))
            })?;
            self.patterns.insert(pattern.to_string(), re);
        }
        Ok(&self.patterns[pattern])
    }
}

fn compare(lvalue: &Value, rvalue: &Value) -> Comparison {
    let ordering = match (lvalue, rvalue) {
        (Value::Str(l), Value::Str(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some((*l as i64).cmp(&(*r as i64))),
        (Value::Float(_), Value::Int(_) | Value::Float(_))
        | (Value::Int(_), Value::Float(_)) => {
            let (Some(l), Some(r)) = (lvalue.as_f64(), rvalue.as_f64()) else {
                return Comparison::Incompatible;
            };
            match l.partial_cmp(&r) {
                Some(ord) => Some(ord),
                None => return Comparison::Unordered,
            }
        }
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        _ => None,
    };
    match ordering {
        Some(ord) => Comparison::Ordered(ord),
        None => Comparison::Incompatible,
    }
}

impl<S: RecordSource> Iterator for RecordFilter<'_, S> {
    type Item = Result<S::Record>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.has_next() {
            Ok(true) => Some(self.next_record()),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{MemoryRecord, MemorySequence};
    use dapview_schema::{AtomicType, DatasetBuilder};

    fn setup_dataset() -> (Dataset, VarId) {
        let mut b = DatasetBuilder::new("casts");
        let n = b.add_dimension(b.root(), "n", 3).unwrap();
        let seq = b.add_sequence(b.root(), "obs", vec![]).unwrap();
        b.add_atomic(seq, "depth", AtomicType::Int32, vec![]).unwrap();
        b.add_atomic(seq, "temp", AtomicType::Float64, vec![]).unwrap();
        b.add_atomic(seq, "station", AtomicType::String, vec![]).unwrap();
        b.add_atomic(seq, "valid", AtomicType::Int8, vec![]).unwrap();
        b.add_atomic(seq, "profile", AtomicType::Float32, vec![n]).unwrap();
        let inner = b.add_structure(seq, "meta", vec![]).unwrap();
        b.add_atomic(inner, "id", AtomicType::Int32, vec![]).unwrap();
        (b.build(), seq)
    }

    fn depths() -> MemorySequence {
        MemorySequence::from_column("depth", [50i64, 150, 90, 300, 500])
    }

    fn collect_indices<S: RecordSource>(filter: &mut RecordFilter<'_, S>) -> Vec<u64> {
        let mut out = Vec::new();
        while filter.has_next().unwrap() {
            out.push(filter.next_indexed().unwrap().0);
        }
        out
    }

    #[test]
    fn test_depth_greater_than_100() {
        let (ds, seq) = setup_dataset();
        let expr = Expr::field_cmp("depth", CompareOp::Gt, 100i64);
        let data = MemorySequence::from_column("depth", [50i64, 150, 90, 300, 500]);
        let mut filter = RecordFilter::new(&ds, seq, data, Some(&expr)).unwrap();

        assert!(filter.has_next().unwrap());
        let r = filter.next_record().unwrap();
        assert_eq!(r.read_field("depth").unwrap(), Value::Int(150));
        assert!(filter.has_next().unwrap());
        let r = filter.next_record().unwrap();
        assert_eq!(r.read_field("depth").unwrap(), Value::Int(300));
        assert!(filter.has_next().unwrap());
        let r = filter.next_record().unwrap();
        assert_eq!(r.read_field("depth").unwrap(), Value::Int(500));
        assert!(!filter.has_next().unwrap());
    }

    #[test]
    fn test_bounded_range_yields_indices_1_and_3() {
        let (ds, seq) = setup_dataset();
        let expr = Expr::and(
            Expr::field_cmp("depth", CompareOp::Gt, 100i64),
            Expr::field_cmp("depth", CompareOp::Lt, 400i64),
        );
        let mut filter = RecordFilter::new(&ds, seq, depths(), Some(&expr)).unwrap();
        assert_eq!(collect_indices(&mut filter), vec![1, 3]);
        assert!(!filter.has_next().unwrap());
    }

    #[test]
    fn test_no_filter_yields_everything_in_order() {
        let (ds, seq) = setup_dataset();
        let mut filter = RecordFilter::new(&ds, seq, depths(), None).unwrap();
        assert_eq!(collect_indices(&mut filter), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_has_next_is_idempotent() {
        let (ds, seq) = setup_dataset();
        let mut filter = RecordFilter::new(&ds, seq, depths(), None).unwrap();
        assert!(filter.has_next().unwrap());
        assert!(filter.has_next().unwrap());
        assert_eq!(filter.next_indexed().unwrap().0, 0);
        assert!(filter.has_next().unwrap());
        assert_eq!(filter.next_indexed().unwrap().0, 1);
    }

    #[test]
    fn test_next_without_has_next_is_usage_error() {
        let (ds, seq) = setup_dataset();
        let mut filter = RecordFilter::new(&ds, seq, depths(), None).unwrap();
        assert!(matches!(filter.next_record(), Err(DapviewError::Usage(_))));
        assert!(filter.has_next().unwrap());
        filter.next_record().unwrap();
        assert!(matches!(filter.next_record(), Err(DapviewError::Usage(_))));
    }

    #[test]
    fn test_empty_sequence() {
        let (ds, seq) = setup_dataset();
        let mut filter = RecordFilter::new(&ds, seq, MemorySequence::default(), None).unwrap();
        assert!(!filter.has_next().unwrap());
    }

    #[test]
    fn test_iterator_adapter() {
        let (ds, seq) = setup_dataset();
        let expr = Expr::field_cmp("depth", CompareOp::Le, 90i64);
        let filter = RecordFilter::new(&ds, seq, depths(), Some(&expr)).unwrap();
        let values: Vec<Value> = filter
            .map(|r| r.unwrap().read_field("depth").unwrap())
            .collect();
        assert_eq!(values, vec![Value::Int(50), Value::Int(90)]);
    }

    #[test]
    fn test_float_comparison_uses_both_operands() {
        let (ds, seq) = setup_dataset();
        let data = MemorySequence::from_column("temp", [1.5f64, 2.5, 3.5]);
        let expr = Expr::field_cmp("temp", CompareOp::Gt, 2i64);
        let mut filter = RecordFilter::new(&ds, seq, data, Some(&expr)).unwrap();
        assert_eq!(collect_indices(&mut filter), vec![1, 2]);
    }

    #[test]
    fn test_nan_only_unequal() {
        let (ds, seq) = setup_dataset();
        let data = MemorySequence::from_column("temp", [f64::NAN]);
        for (op, expected) in [
            (CompareOp::Lt, false),
            (CompareOp::Ge, false),
            (CompareOp::Eq, false),
            (CompareOp::Ne, true),
        ] {
            let expr = Expr::field_cmp("temp", op, 1.0f64);
            let mut filter = RecordFilter::new(&ds, seq, data.clone(), Some(&expr)).unwrap();
            assert_eq!(filter.has_next().unwrap(), expected, "{:?}", op);
        }
    }

    #[test]
    fn test_string_ordering_and_regex() {
        let (ds, seq) = setup_dataset();
        let data = MemorySequence::from_column("station", ["alpha", "bravo", "station-9"]);

        let expr = Expr::field_cmp("station", CompareOp::Ge, "b");
        let mut filter = RecordFilter::new(&ds, seq, data.clone(), Some(&expr)).unwrap();
        assert_eq!(collect_indices(&mut filter), vec![1, 2]);

        let expr = Expr::field_cmp("station", CompareOp::Match, "st.*[0-9]");
        let mut filter = RecordFilter::new(&ds, seq, data.clone(), Some(&expr)).unwrap();
        assert_eq!(collect_indices(&mut filter), vec![2]);

        // anchored: a partial match is not enough
        let expr = Expr::field_cmp("station", CompareOp::Match, "lph");
        let mut filter = RecordFilter::new(&ds, seq, data, Some(&expr)).unwrap();
        assert!(!filter.has_next().unwrap());
    }

    #[test]
    fn test_boolean_compares_as_integer() {
        let (ds, seq) = setup_dataset();
        let data = MemorySequence::from_column("valid", [true, false, true]);
        let expr = Expr::field_cmp("valid", CompareOp::Gt, false);
        let mut filter = RecordFilter::new(&ds, seq, data, Some(&expr)).unwrap();
        assert_eq!(collect_indices(&mut filter), vec![0, 2]);
    }

    #[test]
    fn test_incompatible_types() {
        let (ds, seq) = setup_dataset();
        let data = MemorySequence::from_column("station", ["alpha"]);

        let expr = Expr::field_cmp("station", CompareOp::Eq, 3i64);
        let mut filter = RecordFilter::new(&ds, seq, data.clone(), Some(&expr)).unwrap();
        assert!(!filter.has_next().unwrap());

        let expr = Expr::field_cmp("station", CompareOp::Ne, 3i64);
        let mut filter = RecordFilter::new(&ds, seq, data.clone(), Some(&expr)).unwrap();
        assert!(filter.has_next().unwrap());

        let expr = Expr::field_cmp("station", CompareOp::Lt, 3i64);
        let mut filter = RecordFilter::new(&ds, seq, data, Some(&expr)).unwrap();
        assert!(matches!(filter.has_next(), Err(DapviewError::FilterType(_))));
    }

    #[test]
    fn test_field_errors() {
        let (ds, seq) = setup_dataset();
        let rec = MemoryRecord::new()
            .with("depth", 1i64)
            .with("profile", 1.0f64)
            .with("meta", 1i64);
        for (name, fragment) in [
            ("missing", "Unknown variable"),
            ("meta", "Non-atomic"),
            ("profile", "Non-scalar"),
        ] {
            let expr = Expr::field_cmp(name, CompareOp::Eq, 1i64);
            let data = MemorySequence::new(vec![rec.clone()]);
            let mut filter = RecordFilter::new(&ds, seq, data, Some(&expr)).unwrap();
            match filter.has_next() {
                Err(DapviewError::FilterType(msg)) => assert!(msg.contains(fragment), "{}", msg),
                other => panic!("expected filter type error, got {:?}", other.map(|_| ())),
            }
        }
    }

    #[test]
    fn test_error_does_not_stall_iteration() {
        let (ds, seq) = setup_dataset();
        let data = MemorySequence::new(vec![
            MemoryRecord::new().with("station", "x"),
            MemoryRecord::new().with("station", 5i64),
            MemoryRecord::new().with("station", "y"),
        ]);
        let expr = Expr::field_cmp("station", CompareOp::Gt, "a");
        let mut filter = RecordFilter::new(&ds, seq, data, Some(&expr)).unwrap();

        assert!(filter.has_next().unwrap());
        assert_eq!(filter.next_indexed().unwrap().0, 0);
        assert!(filter.has_next().is_err());
        assert!(filter.has_next().unwrap());
        assert_eq!(filter.next_indexed().unwrap().0, 2);
    }

    #[test]
    fn test_literal_filter() {
        let (ds, seq) = setup_dataset();
        let always = Expr::literal(true);
        let mut filter = RecordFilter::new(&ds, seq, depths(), Some(&always)).unwrap();
        assert_eq!(collect_indices(&mut filter).len(), 5);

        let bogus = Expr::literal(3i64);
        let mut filter = RecordFilter::new(&ds, seq, depths(), Some(&bogus)).unwrap();
        assert!(matches!(filter.has_next(), Err(DapviewError::FilterType(_))));
    }

    #[test]
    fn test_invalid_regex() {
        let (ds, seq) = setup_dataset();
        let data = MemorySequence::from_column("station", ["alpha"]);
        let expr = Expr::field_cmp("station", CompareOp::Match, "(unclosed");
        let mut filter = RecordFilter::new(&ds, seq, data, Some(&expr)).unwrap();
        assert!(matches!(filter.has_next(), Err(DapviewError::FilterType(_))));
    }

    #[test]
    fn test_rejects_non_sequence() {
        let (ds, seq) = setup_dataset();
        let depth = ds.find_field(seq, "depth").unwrap();
        assert!(matches!(
            RecordFilter::new(&ds, depth, depths(), None),
            Err(DapviewError::Usage(_))
        ));
    }
}
