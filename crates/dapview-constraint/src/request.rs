//! Structured view requests loaded from TOML
//!
//! A request is the resolved output of a constraint parser: projections,
//! redefinitions, filters, and attribute overlays, each naming its target by
//! fully-qualified name.

use crate::universal::UniversalView;
use crate::view::{ConstraintView, View};
use dapview_core::{DapviewError, Result, Slice};
use dapview_filter::Expr;
use dapview_schema::{AtomicType, Attribute, Dataset};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, warn};

/// Environment variable overriding a request's `expand` setting
pub const EXPAND_ENV: &str = "DAPVIEW_EXPAND";

/// Effective expansion flag: environment over file over the default (on).
pub fn resolve_expand(file: Option<bool>, env: Option<&str>) -> bool {
    if let Some(raw) = env {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => return true,
            "0" | "false" | "no" | "off" => return false,
            _ => warn!(value = raw, "ignoring unrecognized {}", EXPAND_ENV),
        }
    }
    file.unwrap_or(true)
}

/// `first:stride:stop` bounds for one dimension. All fields absent means the
/// position is left unconstrained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SliceSpec {
    pub first: Option<u64>,
    pub stride: Option<u64>,
    /// Exclusive
    pub stop: Option<u64>,
}

impl SliceSpec {
    pub fn to_slice(&self) -> Result<Slice> {
        if self.first.is_none() && self.stride.is_none() && self.stop.is_none() {
            return Ok(Slice::unconstrained());
        }
        Slice::new(self.first.unwrap_or(0), self.stride.unwrap_or(1), self.stop)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectRequest {
    pub variable: String,
    /// Absent means every dimension is taken whole
    #[serde(default)]
    pub slices: Option<Vec<SliceSpec>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedefRequest {
    pub dimension: String,
    pub slice: SliceSpec,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterRequest {
    pub variable: String,
    pub expr: Expr,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeRequest {
    pub node: String,
    pub name: String,
    #[serde(rename = "type", default = "default_attribute_type")]
    pub kind: String,
    #[serde(default)]
    pub values: Vec<String>,
}

fn default_attribute_type() -> String {
    "string".to_string()
}

/// A complete view request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewRequest {
    /// Select the whole dataset; every other table is ignored
    #[serde(default)]
    pub universal: bool,
    pub expand: Option<bool>,
    #[serde(default)]
    pub project: Vec<ProjectRequest>,
    #[serde(default)]
    pub redef: Vec<RedefRequest>,
    #[serde(default)]
    pub filter: Vec<FilterRequest>,
    #[serde(default)]
    pub attribute: Vec<AttributeRequest>,
}

impl ViewRequest {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let request = Self::from_toml_str(&content).map_err(|e| {
            DapviewError::TomlParseError(format!("{}: {}", path.display(), e))
        })?;
        debug!(
            path = %path.display(),
            projections = request.project.len(),
            filters = request.filter.len(),
            "loaded view request"
        );
        Ok(request)
    }

    /// Expansion flag after applying the environment override
    pub fn expand(&self) -> bool {
        resolve_expand(self.expand, std::env::var(EXPAND_ENV).ok().as_deref())
    }

    /// Drive `view`'s construction API. Redefinitions go first so they are
    /// in place before any projection is resolved.
    pub fn apply<'a>(&self, view: &mut dyn View<'a>) -> Result<()> {
        let dataset = view.dataset();

        for redef in &self.redef {
            let dim = dataset.find_dimension(&redef.dimension).ok_or_else(|| {
                DapviewError::NotFound(format!("dimension '{}'", redef.dimension))
            })?;
            view.add_redef(dim, redef.slice.to_slice()?)?;
        }

        for project in &self.project {
            let var = find_variable(dataset, &project.variable)?;
            let slices = match &project.slices {
                Some(specs) => Some(
                    specs
                        .iter()
                        .map(SliceSpec::to_slice)
                        .collect::<Result<Vec<_>>>()?,
                ),
                None => None,
            };
            view.add_variable(var, slices)?;
        }

        for filter in &self.filter {
            let var = find_variable(dataset, &filter.variable)?;
            if !dataset.variable(var).is_sequence() {
                return Err(DapviewError::FilterType(format!(
                    "filter on '{}', which is not a sequence",
                    filter.variable
                )));
            }
            view.set_filter(var, filter.expr.clone())?;
        }

        for attr in &self.attribute {
            let node = dataset
                .lookup(&attr.node)
                .ok_or_else(|| DapviewError::NotFound(format!("node '{}'", attr.node)))?;
            let kind = AtomicType::parse(&attr.kind).ok_or_else(|| {
                DapviewError::Schema(format!(
                    "unknown attribute type '{}' for '{}'",
                    attr.kind, attr.name
                ))
            })?;
            view.add_attribute(node, Attribute::new(&attr.name, kind, attr.values.clone()))?;
        }
        Ok(())
    }

    /// Build and finalize the view this request describes
    pub fn build<'a>(&self, dataset: &'a Dataset) -> Result<Box<dyn View<'a> + 'a>> {
        let mut view: Box<dyn View<'a> + 'a> = if self.universal {
            Box::new(UniversalView::new(dataset))
        } else {
            Box::new(ConstraintView::new(dataset))
        };
        self.apply(view.as_mut())?;
        view.finalize(self.expand())?;
        Ok(view)
    }
}

fn find_variable(dataset: &Dataset, fqn: &str) -> Result<dapview_core::VarId> {
    dataset
        .find_variable(fqn)
        .ok_or_else(|| DapviewError::NotFound(format!("variable '{}'", fqn)))
}
