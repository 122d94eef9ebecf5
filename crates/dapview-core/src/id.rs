//! Stable arena handles for dataset declarations
//!
//! A dataset stores each declaration kind in its own arena; these handles are
//! indices into those arenas. Views key everything by handle, never by
//! reference identity.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Create a handle from a raw arena index
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Get the raw arena index
            pub fn raw(&self) -> u32 {
                self.0
            }

            /// Arena index as `usize`, for slot lookup
            pub fn index(&self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", $label, self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

arena_id!(
    /// Handle to a group. `GroupId(0)` is always the dataset root.
    GroupId,
    "GroupId"
);
arena_id!(
    /// Handle to a dimension declaration (shared or anonymous)
    DimId,
    "DimId"
);
arena_id!(
    /// Handle to an enumeration declaration
    EnumId,
    "EnumId"
);
arena_id!(
    /// Handle to a variable: atomic, structure, or sequence, at any nesting level
    VarId,
    "VarId"
);
arena_id!(
    /// Handle to an attribute attached to some declaration
    AttrId,
    "AttrId"
);

impl GroupId {
    /// The dataset root group
    pub const ROOT: GroupId = GroupId(0);
}

/// The kind of a dataset node, as seen through a [`NodeRef`]
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Dataset,
    Group,
    Dimension,
    Enumeration,
    Variable,
    Attribute,
}

/// A handle to any dataset node, tagged with its kind
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum NodeRef {
    Group(GroupId),
    Dimension(DimId),
    Enumeration(EnumId),
    Variable(VarId),
    Attribute(AttrId),
}

impl NodeRef {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeRef::Group(id) if *id == GroupId::ROOT => NodeKind::Dataset,
            NodeRef::Group(_) => NodeKind::Group,
            NodeRef::Dimension(_) => NodeKind::Dimension,
            NodeRef::Enumeration(_) => NodeKind::Enumeration,
            NodeRef::Variable(_) => NodeKind::Variable,
            NodeRef::Attribute(_) => NodeKind::Attribute,
        }
    }

    /// True for declarations that make up the dataset tree itself
    /// (everything except attributes).
    pub fn is_structural(&self) -> bool {
        !matches!(self, NodeRef::Attribute(_))
    }
}

impl From<GroupId> for NodeRef {
    fn from(id: GroupId) -> Self {
        NodeRef::Group(id)
    }
}

impl From<DimId> for NodeRef {
    fn from(id: DimId) -> Self {
        NodeRef::Dimension(id)
    }
}

impl From<EnumId> for NodeRef {
    fn from(id: EnumId) -> Self {
        NodeRef::Enumeration(id)
    }
}

impl From<VarId> for NodeRef {
    fn from(id: VarId) -> Self {
        NodeRef::Variable(id)
    }
}

impl From<AttrId> for NodeRef {
    fn from(id: AttrId) -> Self {
        NodeRef::Attribute(id)
    }
}
