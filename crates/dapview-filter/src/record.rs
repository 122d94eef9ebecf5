//! Record source contract and an in-memory implementation

use crate::value::Value;
use dapview_core::{DapviewError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One record of a sequence
pub trait Record {
    /// Decoded value of a scalar atomic field
    fn read_field(&self, name: &str) -> Result<Value>;
}

/// The records of one sequence instance, read one at a time by index.
///
/// Reading may block; the filter never reads ahead more than one record.
pub trait RecordSource {
    type Record: Record;

    fn record_count(&self) -> u64;

    fn read_record(&mut self, index: u64) -> Result<Self::Record>;
}

impl<S: RecordSource + ?Sized> RecordSource for &mut S {
    type Record = S::Record;

    fn record_count(&self) -> u64 {
        (**self).record_count()
    }

    fn read_record(&mut self, index: u64) -> Result<Self::Record> {
        (**self).read_record(index)
    }
}

/// A record held as a name → value table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryRecord {
    fields: BTreeMap<String, Value>,
}

impl MemoryRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl Record for MemoryRecord {
    fn read_field(&self, name: &str) -> Result<Value> {
        self.fields
            .get(name)
            .cloned()
            .ok_or_else(|| DapviewError::RecordSource(format!("record has no field '{}'", name)))
    }
}

/// A fully materialized sequence
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySequence {
    #[serde(default, rename = "record")]
    records: Vec<MemoryRecord>,
}

impl MemorySequence {
    pub fn new(records: Vec<MemoryRecord>) -> Self {
        Self { records }
    }

    /// Build a sequence with a single field per record
    pub fn from_column(name: &str, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Self {
            records: values
                .into_iter()
                .map(|v| MemoryRecord::new().with(name, v))
                .collect(),
        }
    }

    /// Parse `[[record]]` tables from TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn push(&mut self, record: MemoryRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordSource for MemorySequence {
    type Record = MemoryRecord;

    fn record_count(&self) -> u64 {
        self.records.len() as u64
    }

    fn read_record(&mut self, index: u64) -> Result<MemoryRecord> {
        self.records.get(index as usize).cloned().ok_or_else(|| {
            DapviewError::RecordSource(format!(
                "record {} out of range ({} records)",
                index,
                self.records.len()
            ))
        })
    }
}
