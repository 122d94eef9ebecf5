//! Incremental construction of a [`Dataset`]

use crate::dataset::{
    Attribute, AttributeDecl, Dataset, Dimension, Enumeration, Group, VarKind, VarParent,
    Variable,
};
use crate::types::AtomicType;
use dapview_core::{AttrId, DapviewError, DimId, EnumId, GroupId, NodeRef, Result, VarId};

/// Builds a dataset tree top-down. Group paths are computed as groups are
/// added, so the finished [`Dataset`] never has to walk parents.
#[derive(Debug)]
pub struct DatasetBuilder {
    dataset: Dataset,
}

impl DatasetBuilder {
    /// Start a dataset containing only the root group
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let root = Group {
            id: GroupId::ROOT,
            name: name.clone(),
            parent: None,
            path: vec![GroupId::ROOT],
            groups: Vec::new(),
            dimensions: Vec::new(),
            enums: Vec::new(),
            variables: Vec::new(),
        };
        Self {
            dataset: Dataset {
                name,
                groups: vec![root],
                dimensions: Vec::new(),
                enums: Vec::new(),
                variables: Vec::new(),
                attributes: Vec::new(),
            },
        }
    }

    pub fn root(&self) -> GroupId {
        GroupId::ROOT
    }

    /// Read access to the partially built dataset
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    fn check_group(&self, group: GroupId) -> Result<()> {
        if group.index() >= self.dataset.groups.len() {
            return Err(DapviewError::Schema(format!("unknown group {:?}", group)));
        }
        Ok(())
    }

    fn check_name_free(&self, group: GroupId, name: &str) -> Result<()> {
        let g = self.dataset.group(group);
        let taken = g.groups.iter().any(|id| self.dataset.group(*id).name == name)
            || g.variables.iter().any(|id| self.dataset.variable(*id).name == name)
            || g.enums.iter().any(|id| self.dataset.enumeration(*id).name == name)
            || g
                .dimensions
                .iter()
                .any(|id| self.dataset.dimension(*id).name.as_deref() == Some(name));
        if taken {
            return Err(DapviewError::Schema(format!(
                "duplicate declaration '{}' in group {}",
                name,
                self.dataset.group_fqn(group)
            )));
        }
        Ok(())
    }

    pub fn add_group(&mut self, parent: GroupId, name: impl Into<String>) -> Result<GroupId> {
        let name = name.into();
        self.check_group(parent)?;
        self.check_name_free(parent, &name)?;

        let id = GroupId(self.dataset.groups.len() as u32);
        let mut path = self.dataset.group(parent).path.clone();
        path.push(id);
        self.dataset.groups.push(Group {
            id,
            name,
            parent: Some(parent),
            path,
            groups: Vec::new(),
            dimensions: Vec::new(),
            enums: Vec::new(),
            variables: Vec::new(),
        });
        self.dataset.groups[parent.index()].groups.push(id);
        Ok(id)
    }

    /// Declare a shared, named dimension
    pub fn add_dimension(
        &mut self,
        group: GroupId,
        name: impl Into<String>,
        size: u64,
    ) -> Result<DimId> {
        let name = name.into();
        self.check_group(group)?;
        self.check_name_free(group, &name)?;

        let id = DimId(self.dataset.dimensions.len() as u32);
        self.dataset.dimensions.push(Dimension {
            id,
            name: Some(name),
            size,
            shared: true,
            group,
        });
        self.dataset.groups[group.index()].dimensions.push(id);
        Ok(id)
    }

    /// Declare an anonymous dimension. It is not listed among the group's
    /// children and never contributes to the group closure.
    pub fn add_anonymous_dimension(&mut self, group: GroupId, size: u64) -> Result<DimId> {
        self.check_group(group)?;
        let id = DimId(self.dataset.dimensions.len() as u32);
        self.dataset.dimensions.push(Dimension {
            id,
            name: None,
            size,
            shared: false,
            group,
        });
        Ok(id)
    }

    pub fn add_enum(
        &mut self,
        group: GroupId,
        name: impl Into<String>,
        base: AtomicType,
        constants: Vec<(String, i64)>,
    ) -> Result<EnumId> {
        let name = name.into();
        self.check_group(group)?;
        self.check_name_free(group, &name)?;
        if !base.is_enum_base() {
            return Err(DapviewError::Schema(format!(
                "enumeration '{}' needs an integer base type, got {}",
                name,
                base.type_name()
            )));
        }

        let id = EnumId(self.dataset.enums.len() as u32);
        self.dataset.enums.push(Enumeration {
            id,
            name,
            base,
            constants,
            group,
        });
        self.dataset.groups[group.index()].enums.push(id);
        Ok(id)
    }

    pub fn add_atomic(
        &mut self,
        parent: impl Into<VarParent>,
        name: impl Into<String>,
        base: AtomicType,
        dimensions: Vec<DimId>,
    ) -> Result<VarId> {
        if let AtomicType::Enum(e) = base {
            if e.index() >= self.dataset.enums.len() {
                return Err(DapviewError::Schema(format!("unknown enumeration {:?}", e)));
            }
        }
        self.add_variable(parent.into(), name.into(), VarKind::Atomic(base), dimensions)
    }

    pub fn add_structure(
        &mut self,
        parent: impl Into<VarParent>,
        name: impl Into<String>,
        dimensions: Vec<DimId>,
    ) -> Result<VarId> {
        self.add_variable(
            parent.into(),
            name.into(),
            VarKind::Structure { fields: Vec::new() },
            dimensions,
        )
    }

    pub fn add_sequence(
        &mut self,
        parent: impl Into<VarParent>,
        name: impl Into<String>,
        dimensions: Vec<DimId>,
    ) -> Result<VarId> {
        self.add_variable(
            parent.into(),
            name.into(),
            VarKind::Sequence { fields: Vec::new() },
            dimensions,
        )
    }

    fn add_variable(
        &mut self,
        parent: VarParent,
        name: String,
        kind: VarKind,
        dimensions: Vec<DimId>,
    ) -> Result<VarId> {
        if let Some(d) = dimensions
            .iter()
            .find(|d| d.index() >= self.dataset.dimensions.len())
        {
            return Err(DapviewError::Schema(format!(
                "variable '{}' uses unknown dimension {:?}",
                name, d
            )));
        }

        let group = match parent {
            VarParent::Group(g) => {
                self.check_group(g)?;
                self.check_name_free(g, &name)?;
                g
            }
            VarParent::Compound(owner) => {
                if owner.index() >= self.dataset.variables.len() {
                    return Err(DapviewError::Schema(format!("unknown variable {:?}", owner)));
                }
                let owner_var = self.dataset.variable(owner);
                if owner_var.is_atomic() {
                    return Err(DapviewError::Schema(format!(
                        "cannot add field '{}' to atomic variable '{}'",
                        name, owner_var.name
                    )));
                }
                if self.dataset.find_field(owner, &name).is_some() {
                    return Err(DapviewError::Schema(format!(
                        "duplicate field '{}' in '{}'",
                        name,
                        self.dataset.variable_fqn(owner)
                    )));
                }
                owner_var.group
            }
        };

        let id = VarId(self.dataset.variables.len() as u32);
        self.dataset.variables.push(Variable {
            id,
            name,
            parent,
            group,
            dimensions,
            kind,
        });

        match parent {
            VarParent::Group(g) => self.dataset.groups[g.index()].variables.push(id),
            VarParent::Compound(owner) => match &mut self.dataset.variables[owner.index()].kind {
                VarKind::Structure { fields } | VarKind::Sequence { fields } => fields.push(id),
                VarKind::Atomic(_) => unreachable!("checked above"),
            },
        }
        Ok(id)
    }

    pub fn add_attribute(&mut self, owner: NodeRef, attribute: Attribute) -> AttrId {
        let id = AttrId(self.dataset.attributes.len() as u32);
        self.dataset.attributes.push(AttributeDecl {
            id,
            owner,
            attribute,
        });
        id
    }

    pub fn build(self) -> Dataset {
        self.dataset
    }
}
