//! Declaration model for the rubric binding generator.
//!
//! This crate provides:
//! - [`DeclTree`]: the arena of parsed C++ declarations
//! - [`DeclCache`]: the tree plus per-run annotation state
//! - Typed annotation handles ([`ClassHandle`], [`FunctionHandle`], [`EnumHandle`])
//! - A JSON interchange form for external parsers

mod annotate;
mod cache;
mod decl;
mod error;
mod interchange;
mod tree;
mod types;

pub use annotate::{ClassHandle, EnumHandle, FunctionHandle};
pub use cache::{Annotation, DeclCache};
pub use decl::{Access, BaseSpecifier, Decl, DeclId, DeclKind, Enumerator, Param};
pub use error::{DeclError, Result};
pub use interchange::DeclNode;
pub use tree::DeclTree;
pub use types::CppType;
