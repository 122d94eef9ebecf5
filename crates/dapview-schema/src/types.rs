//! Atomic base types

use dapview_core::EnumId;
use serde::{Deserialize, Serialize};

/// The base type of an atomic variable or attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AtomicType {
    Char,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    String,
    Url,
    Opaque,
    Enum(EnumId),
}

impl AtomicType {
    pub fn type_name(&self) -> &'static str {
        match self {
            AtomicType::Char => "char",
            AtomicType::Int8 => "int8",
            AtomicType::UInt8 => "uint8",
            AtomicType::Int16 => "int16",
            AtomicType::UInt16 => "uint16",
            AtomicType::Int32 => "int32",
            AtomicType::UInt32 => "uint32",
            AtomicType::Int64 => "int64",
            AtomicType::UInt64 => "uint64",
            AtomicType::Float32 => "float32",
            AtomicType::Float64 => "float64",
            AtomicType::String => "string",
            AtomicType::Url => "url",
            AtomicType::Opaque => "opaque",
            AtomicType::Enum(_) => "enum",
        }
    }

    /// Parse a primitive type name. Enumerations are resolved by the loader,
    /// not here.
    pub fn parse(name: &str) -> Option<AtomicType> {
        let t = match name.to_ascii_lowercase().as_str() {
            "char" => AtomicType::Char,
            "int8" | "byte" => AtomicType::Int8,
            "uint8" | "ubyte" => AtomicType::UInt8,
            "int16" | "short" => AtomicType::Int16,
            "uint16" | "ushort" => AtomicType::UInt16,
            "int32" | "int" => AtomicType::Int32,
            "uint32" | "uint" => AtomicType::UInt32,
            "int64" | "long" => AtomicType::Int64,
            "uint64" | "ulong" => AtomicType::UInt64,
            "float32" | "float" => AtomicType::Float32,
            "float64" | "double" => AtomicType::Float64,
            "string" => AtomicType::String,
            "url" => AtomicType::Url,
            "opaque" => AtomicType::Opaque,
            _ => return None,
        };
        Some(t)
    }

    pub fn enum_id(&self) -> Option<EnumId> {
        match self {
            AtomicType::Enum(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            AtomicType::Int8
                | AtomicType::UInt8
                | AtomicType::Int16
                | AtomicType::UInt16
                | AtomicType::Int32
                | AtomicType::UInt32
                | AtomicType::Int64
                | AtomicType::UInt64
                | AtomicType::Enum(_)
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, AtomicType::Float32 | AtomicType::Float64)
    }

    /// Valid as the base type of an enumeration
    pub fn is_enum_base(&self) -> bool {
        self.is_integer() && self.enum_id().is_none()
    }
}
