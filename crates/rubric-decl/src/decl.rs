//! Declaration nodes.
//!
//! A simplified view of a parsed C++ translation unit: only the entities a
//! binding generator cares about (namespaces, classes, functions, methods,
//! enumerations, typedefs) are represented.

use crate::types::CppType;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Identity of a node inside a [`crate::DeclTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclId(pub(crate) u32);

impl DeclId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// C++ access specifier for class members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// Public access - accessible from anywhere
    #[default]
    Public,
    /// Protected access - accessible from class and derived classes
    Protected,
    /// Private access - accessible only from within the class
    Private,
}

/// A function, method or constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name, if the declaration spelled one
    #[serde(default)]
    pub name: Option<String>,
    pub ty: CppType,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: CppType) -> Self {
        Self {
            name: Some(name.into()),
            ty,
        }
    }

    pub fn unnamed(ty: CppType) -> Self {
        Self { name: None, ty }
    }
}

/// A C++ base class specifier as written in the class head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseSpecifier {
    /// Base class name as spelled (may be qualified)
    pub name: String,
    /// Inheritance access specifier
    #[serde(default)]
    pub access: Access,
    /// Whether this is virtual inheritance
    #[serde(default)]
    pub is_virtual: bool,
}

impl BaseSpecifier {
    pub fn public(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            access: Access::Public,
            is_virtual: false,
        }
    }
}

/// One value of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enumerator {
    pub name: String,
    #[serde(default)]
    pub value: Option<i64>,
}

/// Closed set of declaration kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclKind {
    Namespace,
    Class {
        /// Declared with `struct` rather than `class`
        #[serde(default)]
        is_struct: bool,
        #[serde(default)]
        bases: Vec<BaseSpecifier>,
    },
    Function {
        return_type: CppType,
        #[serde(default)]
        params: Vec<Param>,
    },
    Method {
        return_type: CppType,
        #[serde(default)]
        params: Vec<Param>,
        #[serde(default)]
        is_static: bool,
        #[serde(default)]
        is_virtual: bool,
        #[serde(default)]
        is_pure_virtual: bool,
        #[serde(default)]
        is_const: bool,
    },
    Constructor {
        #[serde(default)]
        params: Vec<Param>,
    },
    Field {
        ty: CppType,
        #[serde(default)]
        is_static: bool,
        /// `const` data member; exposed read-only
        #[serde(default)]
        is_const: bool,
    },
    Enumeration {
        /// `enum class`
        #[serde(default)]
        is_scoped: bool,
        #[serde(default)]
        values: Vec<Enumerator>,
    },
    Typedef {
        underlying: CppType,
    },
}

impl DeclKind {
    /// Short human readable name of the kind, used in diagnostics.
    pub fn describe(&self) -> &'static str {
        match self {
            DeclKind::Namespace => "namespace",
            DeclKind::Class { is_struct: true, .. } => "struct",
            DeclKind::Class { .. } => "class",
            DeclKind::Function { .. } => "function",
            DeclKind::Method { .. } => "method",
            DeclKind::Constructor { .. } => "constructor",
            DeclKind::Field { .. } => "field",
            DeclKind::Enumeration { .. } => "enumeration",
            DeclKind::Typedef { .. } => "typedef",
        }
    }

    /// Parameters of anything callable.
    pub fn params(&self) -> &[Param] {
        match self {
            DeclKind::Function { params, .. }
            | DeclKind::Method { params, .. }
            | DeclKind::Constructor { params } => params,
            _ => &[],
        }
    }

    /// Return type of functions and methods.
    pub fn return_type(&self) -> Option<&CppType> {
        match self {
            DeclKind::Function { return_type, .. } | DeclKind::Method { return_type, .. } => {
                Some(return_type)
            }
            _ => None,
        }
    }
}

/// A parsed C++ entity.
#[derive(Debug, Clone)]
pub struct Decl {
    pub id: DeclId,
    /// Unqualified name; empty for the global and anonymous namespaces
    pub name: SmolStr,
    pub kind: DeclKind,
    pub access: Access,
    /// Enclosing namespace or class (back-reference only)
    pub parent: Option<DeclId>,
    pub children: Vec<DeclId>,
    /// Header the declaration was read from
    pub file: Option<String>,
}

impl Decl {
    pub fn is_public(&self) -> bool {
        self.access == Access::Public
    }

    pub fn is_namespace(&self) -> bool {
        matches!(self.kind, DeclKind::Namespace)
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, DeclKind::Class { .. })
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.kind, DeclKind::Method { is_virtual: true, .. })
    }
}
