//! Configuration and external tooling for rubric.
//!
//! This crate provides:
//! - The generation configuration format (`rubric.toml`)
//! - Invocation of an external declaration parser
//!
//! # Example
//!
//! ```toml
//! # rubric.toml
//! [extension]
//! name = "my_math"
//! namespace = "math"
//!
//! [sources]
//! headers = ["code/MyMath.h"]
//!
//! [[class]]
//! name = "math::Circle"
//! superclass = "math::Shape"
//! ```

mod config;
mod error;
mod parser;

pub use config::{
    ClassConfig, CustomCode, EnumConfig, ExtensionConfig, FunctionConfig, ModuleConfig,
    ParserConfig, ParserKind, RubricConfig, SourcesConfig, WriterKind,
};
pub use error::{BuildError, Result};
pub use parser::ExternalParser;
