//! Loading dataset descriptions from TOML
//!
//! ```toml
//! name = "ocean"
//!
//! [[dimension]]
//! name = "time"
//! size = 10
//!
//! [[enum]]
//! name = "quality"
//! base = "uint8"
//! constants = [{ name = "good", value = 0 }, { name = "bad", value = 1 }]
//!
//! [[variable]]
//! name = "temp"
//! type = "float32"
//! dims = ["time", 4]          # shared by name, or anonymous by size
//!
//! [[variable]]
//! name = "obs"
//! type = "sequence"
//! fields = [{ name = "depth", type = "int32" }]
//!
//! [[group]]
//! name = "profiles"           # nested groups take the same tables
//! ```

use crate::builder::DatasetBuilder;
use crate::dataset::{Attribute, Dataset, VarParent};
use crate::types::AtomicType;
use dapview_core::{DapviewError, DimId, EnumId, GroupId, NodeRef, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// TOML file format for a dataset description
#[derive(Debug, Deserialize)]
pub struct DatasetFile {
    pub name: String,
    #[serde(flatten)]
    pub body: GroupDefinition,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroupDefinition {
    #[serde(default, rename = "dimension")]
    pub dimensions: Vec<DimensionDefinition>,
    #[serde(default, rename = "enum")]
    pub enums: Vec<EnumDefinition>,
    #[serde(default, rename = "variable")]
    pub variables: Vec<VariableDefinition>,
    #[serde(default, rename = "group")]
    pub groups: Vec<NamedGroupDefinition>,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct NamedGroupDefinition {
    pub name: String,
    #[serde(flatten)]
    pub body: GroupDefinition,
}

#[derive(Debug, Deserialize)]
pub struct DimensionDefinition {
    pub name: String,
    pub size: u64,
}

#[derive(Debug, Deserialize)]
pub struct EnumDefinition {
    pub name: String,
    #[serde(default = "default_enum_base")]
    pub base: String,
    #[serde(default)]
    pub constants: Vec<EnumConstant>,
}

fn default_enum_base() -> String {
    "int32".to_string()
}

#[derive(Debug, Deserialize)]
pub struct EnumConstant {
    pub name: String,
    pub value: i64,
}

/// A dimension reference: a shared dimension by (relative or absolute) name,
/// or an anonymous dimension by size
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DimensionRef {
    Named(String),
    Anonymous(u64),
}

#[derive(Debug, Deserialize)]
pub struct VariableDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub dims: Vec<DimensionRef>,
    #[serde(default)]
    pub fields: Vec<VariableDefinition>,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
}

#[derive(Debug, Deserialize)]
pub struct AttributeDefinition {
    pub name: String,
    #[serde(rename = "type", default = "default_attribute_type")]
    pub type_name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

fn default_attribute_type() -> String {
    "string".to_string()
}

impl Dataset {
    /// Load a dataset description from a TOML file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load a dataset description from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Dataset> {
        let file: DatasetFile = toml::from_str(content)?;
        let mut builder = DatasetBuilder::new(file.name);
        let root = builder.root();
        load_group(&mut builder, root, &file.body)?;
        let dataset = builder.build();
        debug!(
            dataset = dataset.name(),
            variables = dataset.variables.len(),
            groups = dataset.groups.len(),
            "loaded dataset description"
        );
        Ok(dataset)
    }
}

fn load_group(builder: &mut DatasetBuilder, group: GroupId, def: &GroupDefinition) -> Result<()> {
    for attr in &def.attributes {
        let attribute = attribute_from(builder, group, attr)?;
        builder.add_attribute(NodeRef::Group(group), attribute);
    }
    for dim in &def.dimensions {
        builder.add_dimension(group, dim.name.clone(), dim.size)?;
    }
    for en in &def.enums {
        let base = AtomicType::parse(&en.base).ok_or_else(|| {
            DapviewError::Schema(format!(
                "enumeration '{}' has unknown base type '{}'",
                en.name, en.base
            ))
        })?;
        let constants = en
            .constants
            .iter()
            .map(|c| (c.name.clone(), c.value))
            .collect();
        builder.add_enum(group, en.name.clone(), base, constants)?;
    }
    for var in &def.variables {
        load_variable(builder, group, VarParent::Group(group), var)?;
    }
    for child in &def.groups {
        let id = builder.add_group(group, child.name.clone())?;
        load_group(builder, id, &child.body)?;
    }
    Ok(())
}

fn load_variable(
    builder: &mut DatasetBuilder,
    group: GroupId,
    parent: VarParent,
    def: &VariableDefinition,
) -> Result<()> {
    let mut dims = Vec::with_capacity(def.dims.len());
    for dim in &def.dims {
        dims.push(match dim {
            DimensionRef::Named(name) => resolve_dimension(builder.dataset(), group, name)?,
            DimensionRef::Anonymous(size) => builder.add_anonymous_dimension(group, *size)?,
        });
    }

    let id = match def.type_name.as_str() {
        "structure" => builder.add_structure(parent, def.name.clone(), dims)?,
        "sequence" => builder.add_sequence(parent, def.name.clone(), dims)?,
        other => {
            let base = resolve_type(builder.dataset(), group, other)?;
            if !def.fields.is_empty() {
                return Err(DapviewError::Schema(format!(
                    "atomic variable '{}' cannot declare fields",
                    def.name
                )));
            }
            builder.add_atomic(parent, def.name.clone(), base, dims)?
        }
    };

    for attr in &def.attributes {
        let attribute = attribute_from(builder, group, attr)?;
        builder.add_attribute(NodeRef::Variable(id), attribute);
    }
    for field in &def.fields {
        load_variable(builder, group, VarParent::Compound(id), field)?;
    }
    Ok(())
}

fn attribute_from(
    builder: &DatasetBuilder,
    group: GroupId,
    def: &AttributeDefinition,
) -> Result<Attribute> {
    let kind = resolve_type(builder.dataset(), group, &def.type_name)?;
    Ok(Attribute::new(def.name.clone(), kind, def.values.clone()))
}

/// Primitive type name, or an enumeration visible from `group`
fn resolve_type(dataset: &Dataset, group: GroupId, name: &str) -> Result<AtomicType> {
    if let Some(t) = AtomicType::parse(name) {
        return Ok(t);
    }
    resolve_enum(dataset, group, name)
        .map(AtomicType::Enum)
        .ok_or_else(|| DapviewError::Schema(format!("unknown type '{}'", name)))
}

/// Absolute names resolve from the root; relative names search the current
/// group and then each enclosing group.
fn resolve_dimension(dataset: &Dataset, group: GroupId, name: &str) -> Result<DimId> {
    let found = if name.starts_with('/') {
        dataset.find_dimension(name)
    } else {
        dataset.group(group).path.iter().rev().find_map(|g| {
            dataset
                .group(*g)
                .dimensions
                .iter()
                .copied()
                .find(|d| dataset.dimension(*d).name.as_deref() == Some(name))
        })
    };
    found.ok_or_else(|| DapviewError::NotFound(format!("dimension '{}'", name)))
}

fn resolve_enum(dataset: &Dataset, group: GroupId, name: &str) -> Option<EnumId> {
    if name.starts_with('/') {
        return dataset.find_enum(name);
    }
    dataset.group(group).path.iter().rev().find_map(|g| {
        dataset
            .group(*g)
            .enums
            .iter()
            .copied()
            .find(|e| dataset.enumeration(*e).name == name)
    })
}
