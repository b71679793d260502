//! Error types for rubric-codegen.

use miette::Diagnostic;
use rubric_decl::DeclError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for generation.
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Errors that abort a generation run. No output is written once one of
/// these is raised.
#[derive(Error, Diagnostic, Debug)]
pub enum CodegenError {
    /// Ruby classes have a single superclass.
    #[error("class `{class}` has several superclasses ({}) and none was chosen", candidates.join(", "))]
    #[diagnostic(
        code(rubric::codegen::ambiguous_superclass),
        help("pick one with `superclass = \"...\"` in the class's configuration")
    )]
    AmbiguousSuperclass {
        class: String,
        candidates: Vec<String>,
    },

    /// A builder without its own `build` was asked to build.
    #[error("builder `{builder}` does not implement build")]
    #[diagnostic(code(rubric::codegen::not_implemented))]
    NotImplemented { builder: String },

    /// A class is its own ancestor.
    #[error("class `{class}` inherits from itself")]
    #[diagnostic(code(rubric::codegen::inheritance_cycle))]
    InheritanceCycle { class: String },

    /// Function pointer arguments other than a single callback.
    #[error("cannot wrap `{function}`: {reason}")]
    #[diagnostic(
        code(rubric::codegen::unsupported_callback),
        help("ignore the function or wrap it with custom code")
    )]
    UnsupportedCallback { function: String, reason: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Decl(#[from] DeclError),

    #[error("failed to write {}", path.display())]
    #[diagnostic(code(rubric::codegen::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
