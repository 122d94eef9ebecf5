//! The dataset model: arenas of declarations with cached group paths

use crate::types::AtomicType;
use dapview_core::{AttrId, DimId, EnumId, GroupId, NodeRef, VarId};
use serde::Serialize;

/// A group (or the dataset root, `GroupId::ROOT`)
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub parent: Option<GroupId>,
    /// Root-to-self path, inclusive of both ends
    pub path: Vec<GroupId>,
    pub groups: Vec<GroupId>,
    pub dimensions: Vec<DimId>,
    pub enums: Vec<EnumId>,
    pub variables: Vec<VarId>,
}

/// A dimension declaration.
///
/// Shared dimensions are named and declared in a group; anonymous ones only
/// carry a size. A redefinition produces a clone via [`Dimension::with_size`]
/// that keeps the original `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dimension {
    pub id: DimId,
    pub name: Option<String>,
    pub size: u64,
    pub shared: bool,
    pub group: GroupId,
}

impl Dimension {
    /// Clone this dimension with an overridden size
    pub fn with_size(&self, size: u64) -> Dimension {
        Dimension {
            size,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Enumeration {
    pub id: EnumId,
    pub name: String,
    pub base: AtomicType,
    pub constants: Vec<(String, i64)>,
    pub group: GroupId,
}

/// Where a variable hangs in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum VarParent {
    Group(GroupId),
    /// A field of a structure or sequence
    Compound(VarId),
}

impl From<GroupId> for VarParent {
    fn from(id: GroupId) -> Self {
        VarParent::Group(id)
    }
}

impl From<VarId> for VarParent {
    fn from(id: VarId) -> Self {
        VarParent::Compound(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum VarKind {
    Atomic(AtomicType),
    Structure { fields: Vec<VarId> },
    /// A structure whose instances arrive as a stream of records
    Sequence { fields: Vec<VarId> },
}

#[derive(Debug, Clone, Serialize)]
pub struct Variable {
    pub id: VarId,
    pub name: String,
    pub parent: VarParent,
    /// Nearest enclosing group
    pub group: GroupId,
    pub dimensions: Vec<DimId>,
    pub kind: VarKind,
}

impl Variable {
    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_top_level(&self) -> bool {
        matches!(self.parent, VarParent::Group(_))
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self.kind, VarKind::Atomic(_))
    }

    /// Structure or sequence
    pub fn is_compound(&self) -> bool {
        !self.is_atomic()
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, VarKind::Sequence { .. })
    }

    pub fn base_type(&self) -> Option<AtomicType> {
        match &self.kind {
            VarKind::Atomic(t) => Some(*t),
            _ => None,
        }
    }

    /// Fields of a structure or sequence; empty for atomics
    pub fn fields(&self) -> &[VarId] {
        match &self.kind {
            VarKind::Atomic(_) => &[],
            VarKind::Structure { fields } | VarKind::Sequence { fields } => fields.as_slice(),
        }
    }
}

/// A name/type/values attribute, either declared in the dataset or added to a
/// view's overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub kind: AtomicType,
    pub values: Vec<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, kind: AtomicType, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeDecl {
    pub id: AttrId,
    pub owner: NodeRef,
    pub attribute: Attribute,
}

/// A read-only dataset schema tree.
///
/// Built with [`crate::DatasetBuilder`] or loaded from a TOML description.
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub(crate) name: String,
    pub(crate) groups: Vec<Group>,
    pub(crate) dimensions: Vec<Dimension>,
    pub(crate) enums: Vec<Enumeration>,
    pub(crate) variables: Vec<Variable>,
    pub(crate) attributes: Vec<AttributeDecl>,
}

impl Dataset {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Group {
        &self.groups[GroupId::ROOT.index()]
    }

    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id.index()]
    }

    pub fn dimension(&self, id: DimId) -> &Dimension {
        &self.dimensions[id.index()]
    }

    pub fn enumeration(&self, id: EnumId) -> &Enumeration {
        &self.enums[id.index()]
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id.index()]
    }

    pub fn attribute(&self, id: AttrId) -> &AttributeDecl {
        &self.attributes[id.index()]
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.iter()
    }

    /// Top-level variables in declaration order, walking groups depth-first
    pub fn top_level_variables(&self) -> Vec<VarId> {
        let mut out = Vec::new();
        self.collect_group_variables(GroupId::ROOT, &mut out);
        out
    }

    fn collect_group_variables(&self, group: GroupId, out: &mut Vec<VarId>) {
        let g = self.group(group);
        out.extend(g.variables.iter().copied());
        for child in &g.groups {
            self.collect_group_variables(*child, out);
        }
    }

    /// Attributes declared on `node`
    pub fn attributes_of(&self, node: NodeRef) -> impl Iterator<Item = &AttributeDecl> {
        self.attributes.iter().filter(move |a| a.owner == node)
    }

    pub fn rank(&self, var: VarId) -> usize {
        self.variable(var).rank()
    }

    pub fn fields(&self, var: VarId) -> &[VarId] {
        self.variable(var).fields()
    }

    /// Groups from the root down to the group that owns `node`, inclusive.
    pub fn group_path(&self, node: NodeRef) -> &[GroupId] {
        let group = match node {
            NodeRef::Group(id) => id,
            NodeRef::Dimension(id) => self.dimension(id).group,
            NodeRef::Enumeration(id) => self.enumeration(id).group,
            NodeRef::Variable(id) => self.variable(id).group,
            NodeRef::Attribute(id) => return self.group_path(self.attribute(id).owner),
        };
        &self.group(group).path
    }

    /// Fully-qualified group name: `/` for the root, `/a/b` otherwise.
    pub fn group_fqn(&self, id: GroupId) -> String {
        let path = &self.group(id).path;
        if path.len() <= 1 {
            return "/".to_string();
        }
        path[1..]
            .iter()
            .map(|g| format!("/{}", self.group(*g).name))
            .collect()
    }

    fn qualify(&self, group: GroupId, name: &str) -> String {
        let prefix = self.group_fqn(group);
        if prefix == "/" {
            format!("/{}", name)
        } else {
            format!("{}/{}", prefix, name)
        }
    }

    /// `/group/var` for top-level variables, `/group/struct.field` for fields.
    pub fn variable_fqn(&self, id: VarId) -> String {
        let var = self.variable(id);
        match var.parent {
            VarParent::Group(g) => self.qualify(g, &var.name),
            VarParent::Compound(parent) => format!("{}.{}", self.variable_fqn(parent), var.name),
        }
    }

    pub fn dimension_fqn(&self, id: DimId) -> Option<String> {
        let dim = self.dimension(id);
        dim.name.as_ref().map(|n| self.qualify(dim.group, n))
    }

    pub fn enum_fqn(&self, id: EnumId) -> String {
        let e = self.enumeration(id);
        self.qualify(e.group, &e.name)
    }

    /// Direct field of a compound variable by short name
    pub fn find_field(&self, compound: VarId, name: &str) -> Option<VarId> {
        self.fields(compound)
            .iter()
            .copied()
            .find(|f| self.variable(*f).name == name)
    }

    pub fn find_group(&self, fqn: &str) -> Option<GroupId> {
        let mut current = GroupId::ROOT;
        for part in fqn.split('/').filter(|p| !p.is_empty()) {
            current = *self
                .group(current)
                .groups
                .iter()
                .find(|g| self.group(**g).name == part)?;
        }
        Some(current)
    }

    fn split_fqn(fqn: &str) -> (&str, &str) {
        match fqn.rfind('/') {
            Some(pos) => (&fqn[..pos], &fqn[pos + 1..]),
            None => ("", fqn),
        }
    }

    /// Resolve `/g/var` or `/g/struct.field.subfield`
    pub fn find_variable(&self, fqn: &str) -> Option<VarId> {
        let (group_part, var_part) = Self::split_fqn(fqn);
        let group = self.find_group(group_part)?;
        let mut names = var_part.split('.');
        let first = names.next()?;
        let mut current = *self
            .group(group)
            .variables
            .iter()
            .find(|v| self.variable(**v).name == first)?;
        for name in names {
            current = self.find_field(current, name)?;
        }
        Some(current)
    }

    pub fn find_dimension(&self, fqn: &str) -> Option<DimId> {
        let (group_part, name) = Self::split_fqn(fqn);
        let group = self.find_group(group_part)?;
        self.group(group)
            .dimensions
            .iter()
            .copied()
            .find(|d| self.dimension(*d).name.as_deref() == Some(name))
    }

    pub fn find_enum(&self, fqn: &str) -> Option<EnumId> {
        let (group_part, name) = Self::split_fqn(fqn);
        let group = self.find_group(group_part)?;
        self.group(group)
            .enums
            .iter()
            .copied()
            .find(|e| self.enumeration(*e).name == name)
    }

    /// Resolve a fully-qualified name to any declaration. Variables win over
    /// dimensions, dimensions over enumerations, enumerations over groups.
    pub fn lookup(&self, fqn: &str) -> Option<NodeRef> {
        if fqn == "/" || fqn.is_empty() {
            return Some(NodeRef::Group(GroupId::ROOT));
        }
        self.find_variable(fqn)
            .map(NodeRef::Variable)
            .or_else(|| self.find_dimension(fqn).map(NodeRef::Dimension))
            .or_else(|| self.find_enum(fqn).map(NodeRef::Enumeration))
            .or_else(|| self.find_group(fqn).map(NodeRef::Group))
    }

    /// Indented tree listing, one declaration per line
    pub fn describe(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("dataset {}\n", self.name));
        self.describe_group(GroupId::ROOT, 1, &mut out);
        out
    }

    fn describe_group(&self, id: GroupId, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let group = self.group(id);
        for d in &group.dimensions {
            let dim = self.dimension(*d);
            out.push_str(&format!(
                "{}dimension {} = {}\n",
                indent,
                dim.name.as_deref().unwrap_or("?"),
                dim.size
            ));
        }
        for e in &group.enums {
            let en = self.enumeration(*e);
            out.push_str(&format!(
                "{}enum {} : {}\n",
                indent,
                en.name,
                en.base.type_name()
            ));
        }
        for v in &group.variables {
            self.describe_variable(*v, depth, out);
        }
        for g in &group.groups {
            out.push_str(&format!("{}group {}\n", indent, self.group(*g).name));
            self.describe_group(*g, depth + 1, out);
        }
    }

    fn describe_variable(&self, id: VarId, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        let var = self.variable(id);
        let dims: String = var
            .dimensions
            .iter()
            .map(|d| {
                let dim = self.dimension(*d);
                match &dim.name {
                    Some(n) => format!("[{}]", n),
                    None => format!("[{}]", dim.size),
                }
            })
            .collect();
        let type_name = match &var.kind {
            VarKind::Atomic(AtomicType::Enum(e)) => self.enumeration(*e).name.clone(),
            VarKind::Atomic(t) => t.type_name().to_string(),
            VarKind::Structure { .. } => "structure".to_string(),
            VarKind::Sequence { .. } => "sequence".to_string(),
        };
        out.push_str(&format!("{}{} {}{}\n", indent, type_name, var.name, dims));
        for f in var.fields() {
            self.describe_variable(*f, depth + 1, out);
        }
    }
}
