//! Rice binding generation for rubric.
//!
//! Turns an annotated [`DeclCache`](rubric_decl::DeclCache) into C++
//! source for Ruby's Rice embedding layer:
//!
//! 1. A [`GenerationContext`] is created for the run.
//! 2. An [`ExtensionBuilder`] walks the declarations and grows a tree of
//!    builders, one per module, class, enumeration and director.
//! 3. A [`Writer`] renders the tree into one or several files.
//!
//! ```ignore
//! let mut ctx = GenerationContext::new(&cache).with_sources(headers);
//! let mut extension = ExtensionBuilder::new("my_math", cache.lookup("my_math"));
//! extension.build(&mut ctx)?;
//! let files = Writer::new(WriterMode::Multiple).render(&extension, ctx)?;
//! ```

pub mod builder;
mod context;
mod error;
pub mod names;
mod types;
mod wrapper;
mod writer;

pub use builder::{
    inheritance_depth, Builder, BuilderBase, ClassBuilder, DirectorBuilder, EnumerationBuilder,
    ExtensionBuilder, ModuleBuilder, ModuleSpec, Registered, Registration,
};
pub use context::GenerationContext;
pub use error::{CodegenError, Result};
pub use types::{class_type, humanizing_typedef, Converter, TypeCache};
pub use wrapper::{build_field_accessors, build_wrapper, Accessors, Receiver};
pub use writer::{GeneratedFile, Writer, WriterMode, PROVENANCE};
